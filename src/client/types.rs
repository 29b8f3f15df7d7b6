use crate::error::CertError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Methods the authenticated client will send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = CertError;

    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            _ => Err(CertError::UnsupportedMethod(method.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request executed with the bound client identity.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    /// Method name as supplied by the caller; validated at execution.
    pub method: String,
    /// Headers in caller order. Names compare case-insensitively and a later
    /// entry replaces an earlier one.
    pub headers: Vec<(String, String)>,
    /// JSON body for POST; ignored for GET.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Response of an authenticated request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    /// Body decoded as UTF-8, lossily for non-text payloads.
    #[serde(rename = "data")]
    pub body: String,
    /// Raw body, base64 encoded, when the content type is not textual.
    #[serde(rename = "dataBase64", skip_serializing_if = "Option::is_none")]
    pub body_base64: Option<String>,
    /// Lower-cased header names mapped to every value received, in order.
    pub headers: BTreeMap<String, Vec<String>>,
    /// `true` for 2xx status codes.
    pub success: bool,
}

impl HttpResponse {
    /// First value of a header, by lower-case name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}
