//! Response building utilities.
//!
//! Converts the raw status, headers and body of an authenticated request into
//! an [`HttpResponse`], including binary detection and multi-valued headers.

use super::types::HttpResponse;
use base64::Engine;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use std::collections::BTreeMap;

/// Determines if response body is likely binary based on content-type.
///
/// # Arguments
///
/// * `content_type` - The Content-Type header value
///
/// # Returns
///
/// `true` if the content is likely binary, `false` otherwise.
pub fn is_binary_content(content_type: Option<&str>) -> bool {
    let ct = match content_type {
        Some(ct) => ct.to_lowercase(),
        None => return false,
    };

    let text_types = [
        "text/",
        "application/json",
        "application/xml",
        "application/javascript",
        "application/x-www-form-urlencoded",
        "application/problem",
        "+json",
        "+xml",
    ];

    !text_types.iter().any(|t| ct.contains(t))
}

/// Collects headers into name -> values, keeping every repeated value.
pub fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut collected: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        collected
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    collected
}

/// Builds an [`HttpResponse`] from raw response data.
pub fn build_response(status: StatusCode, headers: &HeaderMap, body_bytes: &[u8]) -> HttpResponse {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    let body_base64 = is_binary_content(content_type)
        .then(|| base64::engine::general_purpose::STANDARD.encode(body_bytes));

    HttpResponse {
        status_code: status.as_u16(),
        body: String::from_utf8_lossy(body_bytes).into_owned(),
        body_base64,
        headers: collect_headers(headers),
        success: status.is_success(),
    }
}
