//! Request context extraction.
//!
//! # Responsibilities
//! - Pull the fields a request log line needs out of `http::Request`
//! - Decide the scheme (`https` iff the connection was TLS-terminated)
//! - Rebuild the absolute request URI from scheme, host and request target
//!
//! # Design Decisions
//! - Correlation ID comes from tower-http's `RequestId` extension, so it is
//!   whatever the request-id layer upstream assigned (or nothing)
//! - TLS acceptors mark connections with the `TlsTerminated` extension;
//!   HTTP/2 requests carrying an `https` scheme count as well
//! - `OriginalUri` wins over the request URI so nesting does not hide the
//!   path the client asked for

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, OriginalUri};
use axum::http::{header, uri::Scheme, Request};
use tower_http::request_id::RequestId;

/// Marker extension for requests that arrived over TLS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlsTerminated;

/// Request fields captured when a request starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    /// Correlation ID assigned upstream, if any.
    pub request_id: Option<String>,
    /// Protocol version, e.g. `HTTP/1.1`.
    pub proto: String,
    /// `https` or `http`.
    pub scheme: &'static str,
    pub method: String,
    pub host: String,
    /// Request target as sent: path plus query.
    pub request_uri: String,
    pub remote_addr: Option<SocketAddr>,
    /// Empty when the client sent none.
    pub user_agent: String,
}

impl RequestInfo {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let extensions = req.extensions();

        let request_id = extensions
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .filter(|id| !id.is_empty())
            .map(str::to_owned);

        let tls = extensions.get::<TlsTerminated>().is_some()
            || req.uri().scheme() == Some(&Scheme::HTTPS);

        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned)
            .or_else(|| req.uri().authority().map(|a| a.to_string()))
            .unwrap_or_default();

        let uri = extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or_else(|| req.uri());
        let request_uri = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| "/".to_owned());

        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|ua| ua.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        Self {
            request_id,
            proto: format!("{:?}", req.version()),
            scheme: if tls { "https" } else { "http" },
            method: req.method().to_string(),
            host,
            request_uri,
            remote_addr: extensions.get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0),
            user_agent,
        }
    }

    /// `scheme://host` followed by the request target.
    pub fn uri(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.request_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Uri, Version};

    #[test]
    fn test_plain_request() {
        let req = Request::get("/files/a.txt?v=2")
            .header("Host", "example.com")
            .header("User-Agent", "curl/8.0")
            .body(Body::empty())
            .unwrap();

        let info = RequestInfo::from_request(&req);
        assert_eq!(info.request_id, None);
        assert_eq!(info.proto, "HTTP/1.1");
        assert_eq!(info.scheme, "http");
        assert_eq!(info.method, "GET");
        assert_eq!(info.user_agent, "curl/8.0");
        assert_eq!(info.remote_addr, None);
        assert_eq!(info.uri(), "http://example.com/files/a.txt?v=2");
    }

    #[test]
    fn test_tls_marker_switches_scheme() {
        let req = Request::post("/login")
            .header("Host", "example.com:8443")
            .extension(TlsTerminated)
            .body(Body::empty())
            .unwrap();

        let info = RequestInfo::from_request(&req);
        assert_eq!(info.scheme, "https");
        assert_eq!(info.uri(), "https://example.com:8443/login");
    }

    #[test]
    fn test_http2_authority_and_scheme() {
        let req = Request::get("https://api.example.com/v1/items")
            .version(Version::HTTP_2)
            .body(Body::empty())
            .unwrap();

        let info = RequestInfo::from_request(&req);
        assert_eq!(info.proto, "HTTP/2.0");
        assert_eq!(info.scheme, "https");
        assert_eq!(info.uri(), "https://api.example.com/v1/items");
    }

    #[test]
    fn test_request_id_and_peer() {
        let peer: SocketAddr = "10.0.0.7:51000".parse().unwrap();
        let req = Request::get("/")
            .extension(RequestId::new(HeaderValue::from_static("req-42")))
            .extension(ConnectInfo(peer))
            .body(Body::empty())
            .unwrap();

        let info = RequestInfo::from_request(&req);
        assert_eq!(info.request_id.as_deref(), Some("req-42"));
        assert_eq!(info.remote_addr, Some(peer));
        assert_eq!(info.user_agent, "");
    }

    #[test]
    fn test_original_uri_preferred() {
        let req = Request::get("/inner")
            .header("Host", "h")
            .extension(OriginalUri(Uri::from_static("/outer/inner?q=1")))
            .body(Body::empty())
            .unwrap();

        assert_eq!(RequestInfo::from_request(&req).uri(), "http://h/outer/inner?q=1");
    }
}
