use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};

use crate::options::ClientOptions;
use crate::{Result, WharfError};

/// TLS configuration honoring the trust and client identity options.
///
/// A configured `ca_file` must exist. Everything else is best effort:
/// trust sources that cannot be read are skipped rather than failing
/// the whole client.
pub(crate) fn client_config(options: &ClientOptions) -> Result<ClientConfig> {
    if let Some(path) = options.ca_file.as_deref() {
        match fs::metadata(path) {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(WharfError::CaFileNotFound(path.to_owned()));
            }
            Err(err) => {
                return Err(WharfError::CaFile {
                    path: path.to_owned(),
                    source: err,
                });
            }
        }
    }

    let roots = trust_pool(options.ca_file.as_deref(), options.ca_path.as_deref());
    let builder =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_protocol_versions(&[&rustls::version::TLS12, &rustls::version::TLS13])
            .map_err(|err| WharfError::Tls(err.to_string()))?
            .with_root_certificates(roots);

    match options.client_cert_pair() {
        Some((cert_path, key_path)) => {
            let chain = load_cert_chain(cert_path)?;
            let key = load_private_key(key_path)?;
            builder
                .with_client_auth_cert(chain, key)
                .map_err(|err| WharfError::KeyPair(err.to_string()))
        }
        None => Ok(builder.with_no_client_auth()),
    }
}

/// Trust roots assembled from the system store plus the configured
/// bundle file and certificate directory.
pub(crate) fn trust_pool(ca_file: Option<&Path>, ca_path: Option<&Path>) -> RootCertStore {
    let mut roots = RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    if !native.errors.is_empty() {
        tracing::warn!(errors = ?native.errors, "some system trust roots could not be loaded");
    }
    roots.add_parsable_certificates(native.certs);

    if let Some(path) = ca_file {
        add_cert_file(&mut roots, path);
    }

    if let Some(dir) = ca_path {
        let Ok(entries) = fs::read_dir(dir) else {
            tracing::debug!(path = %dir.display(), "skipping unreadable CA directory");
            return roots;
        };
        for entry in entries.flatten() {
            let Ok(kind) = entry.file_type() else {
                continue;
            };
            if kind.is_dir() {
                continue;
            }
            add_cert_file(&mut roots, &entry.path());
        }
    }

    roots
}

fn add_cert_file(roots: &mut RootCertStore, path: &Path) {
    let Ok(file) = File::open(path) else {
        tracing::debug!(path = %path.display(), "skipping unreadable certificate file");
        return;
    };
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut BufReader::new(file))
        .filter_map(|cert| cert.ok())
        .collect();
    let (added, _) = roots.add_parsable_certificates(certs);
    if added == 0 {
        tracing::debug!(path = %path.display(), "no usable certificates found");
    }
}

fn load_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path).map_err(|err| key_pair_error("certificate", path, &err))?;
    let chain: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::io::Result<_>>()
        .map_err(|err| key_pair_error("certificate", path, &err))?;
    if chain.is_empty() {
        return Err(WharfError::KeyPair(format!(
            "no certificates found in '{}'",
            path.display()
        )));
    }
    Ok(chain)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|err| key_pair_error("private key", path, &err))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|err| key_pair_error("private key", path, &err))?
        .ok_or_else(|| {
            WharfError::KeyPair(format!("no private key found in '{}'", path.display()))
        })
}

fn key_pair_error(kind: &str, path: &Path, err: &std::io::Error) -> WharfError {
    WharfError::KeyPair(format!("reading {} '{}': {}", kind, path.display(), err))
}
