use crate::client::AuthenticatedHttpClient;
use crate::identity::IdentityHandle;
use crate::infra::tls::TlsClientContext;
use std::sync::Arc;

/// A TLS context and the client built on it, bound to one identity.
///
/// The pair is replaced as a unit, so readers never see a context from one
/// binding next to a client from another.
#[derive(Debug)]
pub struct Binding {
    handle: IdentityHandle,
    context: TlsClientContext,
    client: AuthenticatedHttpClient,
}

impl Binding {
    pub(crate) fn new(
        handle: IdentityHandle,
        context: TlsClientContext,
        client: AuthenticatedHttpClient,
    ) -> Self {
        Self {
            handle,
            context,
            client,
        }
    }

    pub fn handle(&self) -> &IdentityHandle {
        &self.handle
    }

    pub fn context(&self) -> &TlsClientContext {
        &self.context
    }

    pub fn client(&self) -> &AuthenticatedHttpClient {
        &self.client
    }
}

/// Whether a client identity is currently bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStatus {
    Unbound,
    Bound,
}

/// Session state owned by the controller.
#[derive(Debug, Default)]
pub struct SessionState {
    pub(crate) selected: Option<IdentityHandle>,
    pub(crate) binding: Option<Arc<Binding>>,
}

impl SessionState {
    pub(crate) fn with_selected(selected: Option<IdentityHandle>) -> Self {
        Self {
            selected,
            binding: None,
        }
    }

    pub fn status(&self) -> BindingStatus {
        if self.binding.is_some() {
            BindingStatus::Bound
        } else {
            BindingStatus::Unbound
        }
    }
}
