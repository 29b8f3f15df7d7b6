//! X.509 certificate parsing utilities.
//!
//! Provides inspection of client certificate chains before they are bound
//! into a TLS context.

use x509_parser::prelude::*;

/// Basic X.509 certificate information extracted from DER-encoded data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicCertInfo {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    /// Expiry as a Unix timestamp.
    pub valid_to: Option<i64>,
}

/// Parses basic certificate information from DER-encoded X.509 data.
///
/// # Arguments
///
/// * `der` - The DER-encoded certificate data
///
/// # Returns
///
/// The parsed certificate information, or a description of why the data is
/// not a well-formed certificate.
pub fn parse_x509_basic(der: &[u8]) -> Result<BasicCertInfo, String> {
    let (rest, cert) = X509Certificate::from_der(der).map_err(|e| e.to_string())?;
    if !rest.is_empty() {
        return Err(format!("{} trailing bytes after certificate", rest.len()));
    }

    Ok(BasicCertInfo {
        subject: common_name_or_full(cert.subject()),
        issuer: common_name_or_full(cert.issuer()),
        valid_to: Some(cert.validity().not_after.timestamp()),
    })
}

fn common_name_or_full(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(|s| s.to_string())
        .or_else(|| Some(name.to_string()))
}
