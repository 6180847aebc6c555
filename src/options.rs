use std::path::{Path, PathBuf};
use std::time::Duration;

/// Read timeout applied when the target does not set one.
pub(crate) const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Shortest pause between retries.
pub(crate) const DEFAULT_RETRY_WAIT_MIN: Duration = Duration::from_secs(1);

/// Longest pause between retries.
pub(crate) const DEFAULT_RETRY_WAIT_MAX: Duration = Duration::from_secs(15);

/// Retries allowed after the initial attempt.
pub(crate) const DEFAULT_RETRY_MAX: u32 = 2;

/// Where the Wharf internal API listens.
///
/// The `url` selects the transport by prefix: `http+unix://` for a Unix
/// domain socket, `http://` for plain TCP, `https://` for TLS.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Target {
    /// Full target URL, including the scheme prefix.
    pub url: String,
    /// Path prefix mounted in front of every request when the API is
    /// served from a Unix socket. Ignored for TCP targets.
    pub relative_url_root: String,
    /// Read timeout in whole seconds. Zero selects the 300 second default.
    pub read_timeout_secs: u64,
}

impl Target {
    /// Target with no relative root and the default read timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            relative_url_root: String::new(),
            read_timeout_secs: 0,
        }
    }
}

/// Connection options for [`WharfClient`](crate::WharfClient).
///
/// Construct with struct update syntax over [`Default`]:
///
/// ```no_run
/// use wharf_http::ClientOptions;
///
/// let options = ClientOptions {
///     retry_max: 5,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// PEM bundle appended to the system trust roots. `None` skips it.
    pub ca_file: Option<PathBuf>,
    /// Directory scanned non-recursively for PEM certificates to trust.
    pub ca_path: Option<PathBuf>,
    /// PEM client certificate chain presented during the TLS handshake.
    /// Only used when `key_path` is also set.
    pub cert_path: Option<PathBuf>,
    /// PEM private key matching `cert_path`.
    pub key_path: Option<PathBuf>,
    /// Pause before the first retry. Defaults to one second.
    pub retry_wait_min: Duration,
    /// Upper bound on the pause between retries. Defaults to 15 seconds.
    pub retry_wait_max: Duration,
    /// Retries allowed after the initial attempt. Defaults to 2, so a
    /// failing request is sent at most three times.
    pub retry_max: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            ca_file: None,
            ca_path: None,
            cert_path: None,
            key_path: None,
            retry_wait_min: DEFAULT_RETRY_WAIT_MIN,
            retry_wait_max: DEFAULT_RETRY_WAIT_MAX,
            retry_max: DEFAULT_RETRY_MAX,
        }
    }
}

impl ClientOptions {
    /// Certificate and key paths when both are present. A half pair is
    /// treated as if neither were set.
    pub(crate) fn client_cert_pair(&self) -> Option<(&Path, &Path)> {
        match (self.cert_path.as_deref(), self.key_path.as_deref()) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }
}

/// Effective read timeout for a configured number of seconds.
pub(crate) fn read_timeout(seconds: u64) -> Duration {
    if seconds == 0 {
        DEFAULT_READ_TIMEOUT
    } else {
        Duration::from_secs(seconds)
    }
}
