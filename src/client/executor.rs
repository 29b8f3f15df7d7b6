//! Authenticated HTTP request execution.
//!
//! Wraps a reqwest client whose TLS layer is the bound identity's
//! [`TlsClientContext`], so every connection presents the client
//! certificate when the server asks for one.

use super::response_builder::build_response;
use super::transport::classify;
use super::types::{HttpMethod, HttpRequest, HttpResponse};
use crate::config::HttpTimeouts;
use crate::error::CertError;
use crate::infra::tls::{TlsClientContext, TlsContextError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::str::FromStr;

/// Body sent with a POST that carries none.
pub const DEFAULT_POST_BODY: &[u8] = b"{}";

/// Content type of request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP client bound to one TLS client context.
///
/// Cheap to clone; clones share the connection pool. Requests may run
/// concurrently.
#[derive(Debug, Clone)]
pub struct AuthenticatedHttpClient {
    client: reqwest::Client,
}

impl AuthenticatedHttpClient {
    /// Creates a client that uses `context` for every TLS connection.
    pub fn new(context: &TlsClientContext, timeouts: &HttpTimeouts) -> Result<Self, TlsContextError> {
        let tls = context.client_config().as_ref().clone();

        let client = reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .timeout(timeouts.ceiling())
            .build()?;

        Ok(Self { client })
    }

    /// Executes a GET or POST request.
    ///
    /// Validation failures (method, URL, headers) are reported before any
    /// connection is attempted.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CertError> {
        let method = HttpMethod::from_str(&request.method)?;
        let url = parse_url(&request.url)?;
        let mut headers = build_headers(&request.headers)?;

        let builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
                let body = request
                    .body
                    .unwrap_or_else(|| DEFAULT_POST_BODY.to_vec());
                self.client.post(url).body(body)
            }
        };

        tracing::debug!(method = %method, url = %request.url, "Sending authenticated request");

        let response = builder
            .headers(headers)
            .send()
            .await
            .map_err(transport_failed)?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let body_bytes = response.bytes().await.map_err(transport_failed)?;

        tracing::debug!(status = status.as_u16(), size = body_bytes.len(), "Received response");

        Ok(build_response(status, &response_headers, &body_bytes))
    }
}

fn transport_failed(source: reqwest::Error) -> CertError {
    let kind = classify(&source);
    tracing::warn!(kind = %kind, error = %source, "Authenticated request failed");
    CertError::TransportFailed { kind, source }
}

fn parse_url(raw: &str) -> Result<url::Url, CertError> {
    let url = url::Url::parse(raw)
        .map_err(|e| CertError::InvalidArgument(format!("Invalid URL: {}", e)))?;

    match url.scheme() {
        "https" | "http" => {}
        other => {
            return Err(CertError::InvalidArgument(format!(
                "Unsupported URL scheme: {}",
                other
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(CertError::InvalidArgument("URL has no host".to_string()));
    }
    Ok(url)
}

/// Builds a header map; later duplicates (case-insensitive) win.
fn build_headers(headers: &[(String, String)]) -> Result<HeaderMap, CertError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| CertError::InvalidArgument(format!("Invalid header name: {}", name)))?;
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            CertError::InvalidArgument(format!("Invalid value for header {}", name))
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tls::TlsContextBuilder;
    use crate::test_support::generate_identity;

    fn client() -> AuthenticatedHttpClient {
        let generated = generate_identity("client.test");
        let context = TlsContextBuilder::default()
            .build(&generated.resolved())
            .unwrap();
        AuthenticatedHttpClient::new(&context, &HttpTimeouts::default()).unwrap()
    }

    #[test]
    fn test_headers_last_write_wins_case_insensitively() {
        let headers = vec![
            ("Accept".to_string(), "text/plain".to_string()),
            ("X-Trace".to_string(), "1".to_string()),
            ("accept".to_string(), "application/json".to_string()),
        ];
        let map = build_headers(&headers).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("accept").unwrap(), "application/json");
        assert_eq!(map.get_all("accept").iter().count(), 1);
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let headers = vec![("bad header".to_string(), "x".to_string())];
        assert!(matches!(
            build_headers(&headers),
            Err(CertError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_url_validation() {
        assert!(parse_url("https://example.test/api").is_ok());
        assert!(matches!(parse_url("not a url"), Err(CertError::InvalidArgument(_))));
        assert!(matches!(
            parse_url("ftp://example.test/file"),
            Err(CertError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_put_is_rejected_before_connecting() {
        // The host does not resolve; reaching the network would surface as
        // TransportFailed instead.
        let request = HttpRequest::new("PUT", "https://unreachable.invalid/api");
        let err = client().execute(request).await.unwrap_err();
        assert!(matches!(err, CertError::UnsupportedMethod(m) if m == "PUT"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_connecting() {
        let err = client()
            .execute(HttpRequest::get("https://"))
            .await
            .unwrap_err();
        assert!(matches!(err, CertError::InvalidArgument(_)));
    }
}
