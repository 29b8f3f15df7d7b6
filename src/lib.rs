pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod identity;
pub mod infra;
pub mod routes;
pub mod session;
pub mod shared;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{AuthenticatedHttpClient, HttpRequest, HttpResponse, TransportErrorKind};
pub use commands::{CommandDispatcher, CommandResponse};
pub use config::{Config, HttpTimeouts};
pub use error::CertError;
pub use identity::{IdentityHandle, KeyAlgorithm, ResolvedIdentity};
pub use infra::{
    FileHandleStore, FileKeyStore, IdentityChooser, IdentityHandleStore, IdentityProvider,
    MemoryHandleStore, TlsContextBuilder, TrustPolicy,
};
pub use session::{BindingStatus, CertificateSessionController};
