use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::{Result, WharfError};

/// Successful HTTP response with its body fully read.
#[derive(Clone, Debug)]
pub struct Response {
    /// Status code of the response.
    pub status: StatusCode,
    /// Response headers as received.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Bytes,
}

impl Response {
    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|err| WharfError::Decode(format!("invalid JSON response: {}", err)))
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Health {
        status: String,
    }

    fn response_with_body(body: &str) -> Response {
        Response {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn json_decodes_body() {
        let response = response_with_body(r#"{"status":"ok"}"#);
        let health: Health = response.json().expect("must decode");
        assert_eq!(
            health,
            Health {
                status: "ok".to_owned()
            }
        );
    }

    #[test]
    fn json_reports_malformed_body() {
        let response = response_with_body("not json");
        let result: Result<Health> = response.json();
        assert!(matches!(result, Err(WharfError::Decode(_))));
    }

    #[test]
    fn text_returns_body_verbatim() {
        let response = response_with_body("plain text body");
        assert_eq!(response.text(), "plain text body");
    }
}
