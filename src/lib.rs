//! `wharf-http` is an async HTTP client for the Wharf internal API.
//!
//! The target URL prefix picks the transport: `http+unix://` dials a
//! Unix domain socket, `http://` plain TCP and `https://` TLS with an
//! optional custom trust bundle and client certificate. Failed requests
//! are retried with exponential backoff within a bounded budget.
//!
//! ```no_run
//! use wharf_http::{ClientOptions, Target, WharfClient};
//!
//! # async fn run() -> wharf_http::Result<()> {
//! let client = WharfClient::new(
//!     Target::new("http+unix:///var/run/wharf/api.sock"),
//!     ClientOptions::default(),
//! )?;
//! let response = client.get("/api/v1/health").await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod options;
mod response;
mod ssh_env;
mod tls;
mod transport;

pub use bytes::Bytes;
pub use client::WharfClient;
pub use error::WharfError;
pub use http::{HeaderMap, Method, StatusCode};
pub use options::{ClientOptions, Target};
pub use response::Response;
pub use ssh_env::SshEnv;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, WharfError>;
