use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

use wharf_http::{ClientOptions, StatusCode, Target, WharfClient, WharfError};

const CA_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ca.pem");
const SERVER_CERT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/server.pem");
const SERVER_KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/server-key.pem");
const CLIENT_CERT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/client.pem");
const CLIENT_KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/client-key.pem");

struct TlsTestServer {
    base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for TlsTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn server_tls_config(require_client_cert: bool) -> Result<rustls::ServerConfig> {
    let certs: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(File::open(SERVER_CERT)?))
        .collect::<std::io::Result<_>>()?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(File::open(SERVER_KEY)?))?
        .context("server key fixture must hold a private key")?;

    let builder = if require_client_cert {
        let ca: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(File::open(CA_FILE)?))
            .collect::<std::io::Result<_>>()?;
        let mut roots = rustls::RootCertStore::empty();
        roots.add_parsable_certificates(ca);
        let verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(roots)).build()?;
        rustls::ServerConfig::builder().with_client_cert_verifier(verifier)
    } else {
        rustls::ServerConfig::builder().with_no_client_auth()
    };
    Ok(builder.with_single_cert(certs, key)?)
}

async fn spawn_tls_server(require_client_cert: bool) -> Result<TlsTestServer> {
    let acceptor = TlsAcceptor::from(Arc::new(server_tls_config(require_client_cert)?));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        loop {
            let Ok((tcp, _)) = listener.accept().await else {
                break;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(tls) = acceptor.accept(tcp).await else {
                    return;
                };
                let service = service_fn(|_request: hyper::Request<Incoming>| async {
                    Ok::<_, std::convert::Infallible>(hyper::Response::new(Full::new(
                        Bytes::from_static(b"{\"status\":\"ok\"}"),
                    )))
                });
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(tls), service)
                    .await;
            });
        }
    });
    Ok(TlsTestServer {
        base_url: format!("https://localhost:{}", addr.port()),
        handle,
    })
}

#[tokio::test]
async fn https_with_custom_ca_file_succeeds() -> Result<()> {
    let server = spawn_tls_server(false).await?;
    let options = ClientOptions {
        ca_file: Some(PathBuf::from(CA_FILE)),
        ..Default::default()
    };
    let client = WharfClient::new(Target::new(server.base_url.as_str()), options)?;

    let response = client.get("/api/ping").await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), r#"{"status":"ok"}"#);
    Ok(())
}

#[tokio::test]
async fn https_without_trusted_ca_is_rejected() -> Result<()> {
    let server = spawn_tls_server(false).await?;
    let options = ClientOptions {
        retry_max: 0,
        ..Default::default()
    };
    let client = WharfClient::new(Target::new(server.base_url.as_str()), options)?;

    let result = client.get("/api/ping").await;
    assert!(matches!(result, Err(WharfError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn https_presents_client_certificate_when_required() -> Result<()> {
    let server = spawn_tls_server(true).await?;
    let options = ClientOptions {
        ca_file: Some(PathBuf::from(CA_FILE)),
        cert_path: Some(PathBuf::from(CLIENT_CERT)),
        key_path: Some(PathBuf::from(CLIENT_KEY)),
        ..Default::default()
    };
    let client = WharfClient::new(Target::new(server.base_url.as_str()), options)?;

    let response = client.get("/api/ping").await?;
    assert_eq!(response.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn https_without_client_certificate_is_rejected_when_required() -> Result<()> {
    let server = spawn_tls_server(true).await?;
    let options = ClientOptions {
        ca_file: Some(PathBuf::from(CA_FILE)),
        retry_max: 0,
        ..Default::default()
    };
    let client = WharfClient::new(Target::new(server.base_url.as_str()), options)?;

    let result = client.get("/api/ping").await;
    assert!(matches!(result, Err(WharfError::Transport(_))));
    Ok(())
}

#[test]
fn missing_ca_file_fails_construction() {
    let options = ClientOptions {
        ca_file: Some(PathBuf::from("/definitely/not/here.pem")),
        ..Default::default()
    };
    let result = WharfClient::new(Target::new("https://wharf.example.com"), options);
    assert!(matches!(result, Err(WharfError::CaFileNotFound(_))));
}
