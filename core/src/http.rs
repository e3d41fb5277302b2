//! HTTP transport types shared by the request builders and the transport.
//!
//! # Design
//! Requests and responses are plain data. `WekanApi` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network;
//! a `Transport` executes them. Keeping the wire description separate from
//! the I/O lets every builder be checked without a server.

use serde_json::Value;

pub const AUTHORIZATION: &str = "authorization";
pub const CONTENT_TYPE: &str = "content-type";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP method for a request. The Wekan endpoints used here only read and
/// create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute (base URL joined with the API path). Header names are
/// lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value with the given (lowercase) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A parsed reply whose body was valid JSON.
///
/// The body is kept in both arms: Wekan reports failures as JSON documents
/// (`{"error": ..., "reason": ...}`), and callers of the generic call decide
/// for themselves what a failure body means.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Success { status: u16, body: Value },
    Failure { status: u16, body: Value },
}

impl ApiResponse {
    pub fn status(&self) -> u16 {
        match self {
            ApiResponse::Success { status, .. } | ApiResponse::Failure { status, .. } => *status,
        }
    }

    pub fn body(&self) -> &Value {
        match self {
            ApiResponse::Success { body, .. } | ApiResponse::Failure { body, .. } => body,
        }
    }

    pub fn into_body(self) -> Value {
        match self {
            ApiResponse::Success { body, .. } | ApiResponse::Failure { body, .. } => body,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_lookup_matches_lowercase_name() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/api".to_string(),
            headers: vec![(AUTHORIZATION.to_string(), "Bearer t".to_string())],
            body: None,
        };
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer t"));
        assert_eq!(req.header(CONTENT_TYPE), None);
    }

    #[test]
    fn response_success_range() {
        let mut response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(response.is_success());
        response.status = 302;
        assert!(!response.is_success());
    }

    #[test]
    fn api_response_accessors() {
        let reply = ApiResponse::Failure {
            status: 401,
            body: json!({"error": "Unauthorized"}),
        };
        assert_eq!(reply.status(), 401);
        assert!(!reply.is_success());
        assert_eq!(reply.body()["error"], "Unauthorized");
    }
}
