use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::Uri;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::{Connected, Connection, HttpConnector};
use hyper_util::client::legacy::{self, Client as HyperClient};
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::UnixStream;
use tower_service::Service;

use crate::options::{ClientOptions, Target};
use crate::tls;
use crate::{Result, WharfError};

/// Logical host substituted for Unix socket targets.
const SOCKET_BASE_URL: &str = "http://unix";

const UNIX_SOCKET_PREFIX: &str = "http+unix://";
const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

/// Request body type used throughout the crate.
pub(crate) type Body = Full<Bytes>;

/// Connection pool matching the target's scheme.
#[derive(Clone)]
pub(crate) enum Transport {
    Socket(HyperClient<SocketConnector, Body>),
    Plain(HyperClient<HttpConnector, Body>),
    Tls(HyperClient<HttpsConnector<HttpConnector>, Body>),
}

impl Transport {
    pub(crate) async fn request(
        &self,
        request: http::Request<Body>,
    ) -> std::result::Result<http::Response<Incoming>, legacy::Error> {
        match self {
            Transport::Socket(client) => client.request(request).await,
            Transport::Plain(client) => client.request(request).await,
            Transport::Tls(client) => client.request(request).await,
        }
    }

    /// Scheme label used in logs.
    pub(crate) fn scheme(&self) -> &'static str {
        match self {
            Transport::Socket(_) => "unix",
            Transport::Plain(_) => "http",
            Transport::Tls(_) => "https",
        }
    }
}

/// Selects a transport from the target URL prefix and returns it along
/// with the effective host requests are addressed to.
pub(crate) fn build(target: &Target, options: &ClientOptions) -> Result<(Transport, String)> {
    if let Some(path) = target.url.strip_prefix(UNIX_SOCKET_PREFIX) {
        let transport = socket_transport(Path::new(path));
        return Ok((transport, socket_host(&target.relative_url_root)));
    }
    if target.url.starts_with(HTTP_PREFIX) {
        return Ok((plain_transport(), target.url.clone()));
    }
    if target.url.starts_with(HTTPS_PREFIX) {
        let config = tls::client_config(options)?;
        return Ok((tls_transport(config), target.url.clone()));
    }
    Err(WharfError::UnknownUrlPrefix)
}

fn socket_transport(path: &Path) -> Transport {
    let connector = SocketConnector {
        path: Arc::new(path.to_owned()),
    };
    Transport::Socket(HyperClient::builder(TokioExecutor::new()).build(connector))
}

fn plain_transport() -> Transport {
    Transport::Plain(HyperClient::builder(TokioExecutor::new()).build(HttpConnector::new()))
}

fn tls_transport(config: rustls::ClientConfig) -> Transport {
    let mut inner = HttpConnector::new();
    inner.enforce_http(false);
    let connector = HttpsConnectorBuilder::new()
        .with_tls_config(config)
        .https_or_http()
        .enable_http1()
        .wrap_connector(inner);
    Transport::Tls(HyperClient::builder(TokioExecutor::new()).build(connector))
}

/// Host reported for socket targets, with the relative URL root folded in.
fn socket_host(relative_url_root: &str) -> String {
    let root = relative_url_root.trim_matches('/');
    if root.is_empty() {
        SOCKET_BASE_URL.to_owned()
    } else {
        format!("{}/{}", SOCKET_BASE_URL, root)
    }
}

/// Connector dialing a fixed Unix domain socket. The destination URI
/// names the logical host and plays no part in where bytes are sent.
#[derive(Clone, Debug)]
pub(crate) struct SocketConnector {
    path: Arc<PathBuf>,
}

impl Service<Uri> for SocketConnector {
    type Response = SocketStream;
    type Error = io::Error;
    type Future = Pin<Box<dyn Future<Output = io::Result<SocketStream>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _dst: Uri) -> Self::Future {
        let path = Arc::clone(&self.path);
        Box::pin(async move {
            let stream = UnixStream::connect(path.as_path()).await?;
            Ok(SocketStream(TokioIo::new(stream)))
        })
    }
}

/// Socket connection adapted to the traits the connection pool expects.
pub(crate) struct SocketStream(TokioIo<UnixStream>);

impl Read for SocketStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl Write for SocketStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_shutdown(cx)
    }

    fn is_write_vectored(&self) -> bool {
        self.0.is_write_vectored()
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.0).poll_write_vectored(cx, bufs)
    }
}

impl Connection for SocketStream {
    fn connected(&self) -> Connected {
        Connected::new()
    }
}
