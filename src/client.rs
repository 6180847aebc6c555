use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use http_body_util::BodyExt;
use serde::Serialize;
use tokio::time::{sleep, timeout};

use crate::options::{self, ClientOptions, Target};
use crate::response::Response;
use crate::transport::{self, Body, Transport};
use crate::{Result, WharfError};

/// `User-Agent` sent when the caller does not provide one.
const DEFAULT_USER_AGENT: &str = concat!("wharf-http/", env!("CARGO_PKG_VERSION"));

/// Asynchronous client for the Wharf internal API.
///
/// Built once per target with [`WharfClient::new`]. Cloning is cheap
/// and clones share the underlying connection pool.
#[derive(Clone)]
pub struct WharfClient {
    transport: Transport,
    host: String,
    read_timeout: Duration,
    options: ClientOptions,
}

impl fmt::Debug for WharfClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WharfClient")
            .field("host", &self.host)
            .field("scheme", &self.transport.scheme())
            .field("read_timeout", &self.read_timeout)
            .field("retry_max", &self.options.retry_max)
            .finish()
    }
}

impl WharfClient {
    /// Builds a client for the given target.
    ///
    /// Fails when the target URL has an unknown prefix or the TLS
    /// options cannot be applied.
    pub fn new(target: Target, options: ClientOptions) -> Result<Self> {
        let (transport, host) = transport::build(&target, &options)?;
        Ok(Self {
            transport,
            host,
            read_timeout: options::read_timeout(target.read_timeout_secs),
            options,
        })
    }

    /// Effective host requests are addressed to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Read timeout applied to every request attempt.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Sends a GET request to `path` under the configured host.
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request(Method::GET, path, None, None).await
    }

    /// Sends `payload` as a JSON POST request to `path`.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response> {
        let body = serde_json::to_vec(payload)
            .map_err(|err| WharfError::Decode(format!("serializing request body: {}", err)))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.request(Method::POST, path, Some(headers), Some(Bytes::from(body)))
            .await
    }

    /// Sends a request with explicit method, headers and body.
    ///
    /// Failed attempts are repeated within the configured retry budget.
    /// A response with a non-success status becomes [`WharfError::Http`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<Bytes>,
    ) -> Result<Response> {
        let uri: Uri = join_url(&self.host, path).parse().map_err(WharfError::Url)?;
        tracing::debug!(%method, %uri, scheme = self.transport.scheme(), "sending request");
        self.send_with_retry(method, uri, headers.as_ref(), body.unwrap_or_default())
            .await
    }

    async fn send_with_retry(
        &self,
        method: Method,
        uri: Uri,
        headers: Option<&HeaderMap>,
        body: Bytes,
    ) -> Result<Response> {
        let mut attempt: u32 = 0;
        loop {
            let request = self.build_request(&method, &uri, headers, &body)?;
            match timeout(self.read_timeout, self.send_once(request)).await {
                Ok(Ok(response)) => {
                    if response.status.is_success() {
                        return Ok(response);
                    }
                    if should_retry_status(response.status) && attempt < self.options.retry_max {
                        self.wait_before_retry(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(WharfError::Http {
                        status: response.status.as_u16(),
                        body: response.text(),
                    });
                }
                Ok(Err(err)) => {
                    if attempt < self.options.retry_max {
                        self.wait_before_retry(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
                Err(_) => {
                    if attempt < self.options.retry_max {
                        self.wait_before_retry(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(WharfError::Timeout(self.read_timeout));
                }
            }
        }
    }

    async fn send_once(&self, request: http::Request<Body>) -> Result<Response> {
        let response = self
            .transport
            .request(request)
            .await
            .map_err(WharfError::Transport)?;
        let (parts, body) = response.into_parts();
        let body = body.collect().await.map_err(WharfError::Body)?.to_bytes();
        Ok(Response {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    fn build_request(
        &self,
        method: &Method,
        uri: &Uri,
        headers: Option<&HeaderMap>,
        body: &Bytes,
    ) -> Result<http::Request<Body>> {
        let mut request = http::Request::builder()
            .method(method.clone())
            .uri(uri.clone())
            .body(Body::new(body.clone()))
            .map_err(WharfError::Request)?;
        if let Some(headers) = headers {
            request.headers_mut().extend(headers.clone());
        }
        if !request.headers().contains_key(USER_AGENT) {
            request
                .headers_mut()
                .insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        }
        Ok(request)
    }

    async fn wait_before_retry(&self, attempt: u32) {
        let delay = backoff_delay(
            self.options.retry_wait_min,
            self.options.retry_wait_max,
            attempt,
        );
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying request");
        sleep(delay).await;
    }
}

/// Joins the host and request path with exactly one slash.
fn join_url(host: &str, path: &str) -> String {
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Statuses worth retrying: throttling and server errors, except 501.
fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

/// Exponential backoff doubling from `wait_min`, capped at `wait_max`.
fn backoff_delay(wait_min: Duration, wait_max: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.min(16);
    wait_min.saturating_mul(factor).min(wait_max)
}
