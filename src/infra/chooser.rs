//! Interactive identity selection.
//!
//! The chooser is the host's certificate picker dialog. It runs on whatever
//! thread owns the interactive surface, so the trait hands back a future and
//! leaves scheduling to the host.

use crate::identity::{IdentityHandle, KeyAlgorithm};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Parameters for one chooser invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChooserRequest {
    /// Key algorithms the user may pick from.
    pub key_algorithms: Vec<KeyAlgorithm>,
    /// Entry highlighted when the dialog opens.
    pub preselected: Option<IdentityHandle>,
}

impl ChooserRequest {
    pub fn new(preselected: Option<IdentityHandle>) -> Self {
        Self {
            key_algorithms: KeyAlgorithm::SUPPORTED.to_vec(),
            preselected,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChooserError {
    /// No interactive surface is attached.
    #[error("No interactive surface available for certificate selection")]
    Unavailable,

    /// The dialog could not be shown.
    #[error("Failed to show certificate picker: {0}")]
    Failed(String),
}

/// Result of a chooser invocation; `Ok(None)` means the user cancelled.
pub type ChooserFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<IdentityHandle>, ChooserError>> + Send + 'a>>;

/// Host-provided identity picker.
pub trait IdentityChooser: Send + Sync {
    /// Shows the picker constrained by `request`.
    fn choose(&self, request: ChooserRequest) -> ChooserFuture<'_>;
}
