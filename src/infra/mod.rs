//! Infrastructure layer providing abstractions for external dependencies.
//!
//! This module contains traits and implementations for:
//! - Key store access
//! - Persistence of the selected identity
//! - The host's interactive certificate chooser
//! - TLS client context construction
//!
//! The session controller only talks to these traits, so platform key
//! stores and hosts plug in without touching the selection logic.

pub mod chooser;
pub mod handle_store;
pub mod keystore;
pub mod tls;

pub use chooser::{ChooserError, ChooserFuture, ChooserRequest, IdentityChooser};
pub use handle_store::{FileHandleStore, IdentityHandleStore, MemoryHandleStore, StoreError};
pub use keystore::{FileKeyStore, IdentityProvider, ProviderError};
pub use tls::{TlsClientContext, TlsContextBuilder, TlsContextError, TrustPolicy};
