use crate::client::TransportErrorKind;
use crate::identity::IdentityHandle;
use crate::infra::{ChooserError, ProviderError, TlsContextError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertError {
    #[error("No context available: {0}")]
    NoContext(String),

    #[error("No activity available for certificate selection")]
    NoUiContext,

    #[error("No certificate alias stored. Please select a certificate first.")]
    NoStoredIdentity,

    #[error("Certificate '{0}' is not installed")]
    CertificateNotInstalled(IdentityHandle),

    #[error("Certificate '{0}' is not accessible")]
    CertificateNotFound(IdentityHandle),

    #[error("Failed to retrieve certificate or private key for '{0}'")]
    CertificateIncomplete(IdentityHandle),

    #[error("KeyChain error for '{handle}': {source}")]
    CertificateResolutionFailed {
        handle: IdentityHandle,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to setup client authentication: {0}")]
    ContextConstructionFailed(#[source] TlsContextError),

    #[error("Failed to list certificates: {0}")]
    EnumerationFailed(#[source] ProviderError),

    #[error("{0}")]
    ChooserFailed(#[source] ChooserError),

    #[error("HTTP client not available. Call setupClientAuth first.")]
    NotBound,

    #[error("Method {0} not supported")]
    UnsupportedMethod(String),

    #[error("Request failed ({kind}): {source}")]
    TransportFailed {
        kind: TransportErrorKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    InvalidArgument(String),
}

impl CertError {
    /// Stable wire code reported across the command surface.
    pub fn code(&self) -> &'static str {
        match self {
            CertError::NoContext(_) => "NO_CONTEXT",
            CertError::NoUiContext => "NO_ACTIVITY",
            CertError::NoStoredIdentity => "NO_CERTIFICATE_STORED",
            CertError::CertificateNotInstalled(_) => "CERTIFICATE_NOT_INSTALLED",
            CertError::CertificateNotFound(_) => "CERTIFICATE_NOT_FOUND",
            CertError::CertificateIncomplete(_) => "CERTIFICATE_ERROR",
            CertError::CertificateResolutionFailed { .. } => "KEYCHAIN_ERROR",
            CertError::ContextConstructionFailed(_) => "SETUP_ERROR",
            CertError::EnumerationFailed(_) => "LIST_ERROR",
            CertError::ChooserFailed(_) => "PICKER_ERROR",
            CertError::NotBound => "NO_HTTP_CLIENT",
            CertError::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            CertError::TransportFailed { .. } => "REQUEST_FAILED",
            CertError::InvalidArgument(_) => "INVALID_ARGUMENT",
        }
    }
}

impl From<ChooserError> for CertError {
    fn from(err: ChooserError) -> Self {
        match err {
            ChooserError::Unavailable => CertError::NoUiContext,
            other => CertError::ChooserFailed(other),
        }
    }
}

impl From<TlsContextError> for CertError {
    fn from(err: TlsContextError) -> Self {
        CertError::ContextConstructionFailed(err)
    }
}
