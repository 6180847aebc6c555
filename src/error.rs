use std::path::PathBuf;
use std::time::Duration;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum WharfError {
    /// Target URL did not start with a recognized scheme prefix.
    #[error("unknown target URL prefix")]
    UnknownUrlPrefix,
    /// Configured CA bundle file does not exist.
    #[error("cannot find CA file '{}'", .0.display())]
    CaFileNotFound(PathBuf),
    /// Configured CA bundle file exists but could not be inspected.
    #[error("inspecting CA file '{}': {source}", path.display())]
    CaFile {
        /// Path of the offending bundle.
        path: PathBuf,
        /// Underlying filesystem error.
        source: std::io::Error,
    },
    /// Client certificate or private key could not be loaded.
    #[error("loading client key pair: {0}")]
    KeyPair(String),
    /// TLS client configuration could not be assembled.
    #[error("building TLS configuration: {0}")]
    Tls(String),
    /// Request URL could not be parsed.
    #[error("invalid request url: {0}")]
    Url(http::uri::InvalidUri),
    /// Request could not be constructed.
    #[error("invalid request: {0}")]
    Request(http::Error),
    /// Connection or protocol failure while exchanging the request.
    #[error("transport error: {0}")]
    Transport(hyper_util::client::legacy::Error),
    /// Failure while reading the response body.
    #[error("reading response body: {0}")]
    Body(hyper::Error),
    /// Read timeout elapsed before the response completed.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Request or response JSON conversion error.
    #[error("decode error: {0}")]
    Decode(String),
}
