//! Certificate session orchestration.
//!
//! The controller owns the selected identity and the bound TLS client. It
//! keeps selection and binding apart: choosing an identity never builds TLS
//! material, and a failed binding never falls back to an unauthenticated
//! client.

use super::state::{Binding, BindingStatus, SessionState};
use crate::client::{AuthenticatedHttpClient, HttpRequest, HttpResponse};
use crate::config::HttpTimeouts;
use crate::error::CertError;
use crate::identity::{IdentityHandle, ResolvedIdentity};
use crate::infra::chooser::{ChooserRequest, IdentityChooser};
use crate::infra::handle_store::IdentityHandleStore;
use crate::infra::keystore::{IdentityProvider, ProviderError};
use crate::infra::tls::{TlsContextBuilder, TrustPolicy};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Well-known aliases probed by [`CertificateSessionController::list_available`].
pub const PROBE_ALIASES: [&str; 4] = ["api-auth-cert", "auth-cert", "client-cert", "user-cert"];

pub struct CertificateSessionController {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn IdentityHandleStore>,
    chooser: Option<Arc<dyn IdentityChooser>>,
    tls: TlsContextBuilder,
    timeouts: HttpTimeouts,
    state: RwLock<SessionState>,
    // Held across a state change and its store write so the stored handle
    // follows the same order as the state. Never taken while `state` is.
    store_order: Mutex<()>,
}

impl CertificateSessionController {
    /// Creates a controller, restoring the previously stored handle.
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn IdentityHandleStore>) -> Self {
        let selected = match store.load() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable stored certificate alias");
                None
            }
        };
        if let Some(handle) = &selected {
            tracing::debug!(handle = %handle, "Restored stored certificate alias");
        }

        Self {
            provider,
            store,
            chooser: None,
            tls: TlsContextBuilder::default(),
            timeouts: HttpTimeouts::default(),
            state: RwLock::new(SessionState::with_selected(selected)),
            store_order: Mutex::new(()),
        }
    }

    /// Attaches the host's interactive chooser.
    pub fn with_chooser(mut self, chooser: Arc<dyn IdentityChooser>) -> Self {
        self.chooser = Some(chooser);
        self
    }

    pub fn with_trust_policy(mut self, trust: TrustPolicy) -> Self {
        self.tls = TlsContextBuilder::new(trust);
        self
    }

    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Lets the user pick an identity and stores the choice.
    ///
    /// Returns `Ok(None)` when the user cancels. Does not bind.
    pub async fn select_identity(&self) -> Result<Option<IdentityHandle>, CertError> {
        let chooser = self.chooser.as_ref().ok_or(CertError::NoUiContext)?;

        let chosen = chooser.choose(ChooserRequest::new(None)).await?;
        match &chosen {
            Some(handle) => {
                let _order = self.lock_store_order();
                self.write_state().selected = Some(handle.clone());
                self.persist(handle);
                tracing::info!(handle = %handle, "Certificate selected");
            }
            None => tracing::debug!("Certificate selection cancelled"),
        }
        Ok(chosen)
    }

    /// Re-asks for permission on the stored identity.
    ///
    /// Only a confirmation of that same identity counts; any other pick is
    /// reported as `Ok(None)` and leaves the stored handle untouched.
    pub async fn confirm_access(&self) -> Result<Option<IdentityHandle>, CertError> {
        let chooser = self.chooser.as_ref().ok_or(CertError::NoUiContext)?;
        let stored = self.stored_handle().ok_or(CertError::NoStoredIdentity)?;

        let chosen = chooser
            .choose(ChooserRequest::new(Some(stored.clone())))
            .await?;

        match chosen {
            Some(handle) if handle == stored => {
                self.write_state().selected = Some(handle.clone());
                tracing::info!(handle = %handle, "Certificate access confirmed");
                Ok(Some(handle))
            }
            other => {
                tracing::debug!(
                    stored = %stored,
                    chosen = ?other.as_ref().map(IdentityHandle::as_str),
                    "Certificate access not confirmed"
                );
                Ok(None)
            }
        }
    }

    /// Selects the stored identity without prompting, if it still resolves.
    pub async fn auto_select(&self) -> Result<IdentityHandle, CertError> {
        let stored = self.stored_handle().ok_or(CertError::NoStoredIdentity)?;

        match self.resolve(&stored).await {
            Ok(identity) if identity.is_complete() => {
                self.write_state().selected = Some(stored.clone());
                tracing::info!(handle = %stored, "Stored certificate selected");
                Ok(stored)
            }
            Ok(_) => Err(CertError::CertificateNotFound(stored)),
            Err(ProviderError::NotInstalled(_)) => Err(CertError::CertificateNotInstalled(stored)),
            Err(ProviderError::Unavailable(reason)) => Err(CertError::NoContext(reason)),
            Err(source @ ProviderError::Platform(_)) => {
                Err(CertError::CertificateResolutionFailed {
                    handle: stored,
                    source,
                })
            }
            Err(e) => {
                tracing::debug!(handle = %stored, error = %e, "Stored certificate not usable");
                Err(CertError::CertificateNotFound(stored))
            }
        }
    }

    /// Binds `handle`: builds its TLS context and client and makes them the
    /// session's active pair.
    ///
    /// On failure the previous binding, if any, stays in place.
    pub async fn bind(&self, handle: IdentityHandle) -> Result<(), CertError> {
        let identity = self
            .resolve(&handle)
            .await
            .map_err(|e| binding_error(&handle, e))?;
        if !identity.is_complete() {
            return Err(CertError::CertificateIncomplete(handle));
        }

        let context = self.tls.build(&identity)?;
        drop(identity);
        let client = AuthenticatedHttpClient::new(&context, &self.timeouts)?;
        let binding = Arc::new(Binding::new(handle.clone(), context, client));

        let leaf = binding.context().leaf().clone();
        let order = self.lock_store_order();
        let previous = {
            let mut state = self.write_state();
            state.selected = Some(handle.clone());
            state.binding.replace(binding)
        };
        self.persist(&handle);
        drop(order);
        // The old pair lives on only in requests already holding it.
        drop(previous);

        tracing::info!(
            handle = %handle,
            subject = leaf.subject.as_deref().unwrap_or("-"),
            issuer = leaf.issuer.as_deref().unwrap_or("-"),
            expires = leaf.valid_to,
            "Client authentication configured"
        );
        Ok(())
    }

    /// Reports whether `handle` resolves to a key and a non-empty chain.
    pub async fn check_availability(&self, handle: &IdentityHandle) -> Result<bool, CertError> {
        match self.resolve(handle).await {
            Ok(identity) => Ok(identity.is_complete()),
            Err(
                ProviderError::NotInstalled(_)
                | ProviderError::NotAccessible { .. }
                | ProviderError::Incomplete(_),
            ) => Ok(false),
            Err(ProviderError::Unavailable(reason)) => Err(CertError::NoContext(reason)),
            Err(source) => Err(CertError::CertificateResolutionFailed {
                handle: handle.clone(),
                source,
            }),
        }
    }

    /// Diagnostic listing of installed aliases and well-known probe names.
    pub async fn list_available(&self) -> Result<Vec<String>, CertError> {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || describe_key_store(provider.as_ref()))
            .await
            .unwrap_or_else(|e| Err(ProviderError::Platform(format!("Key store worker failed: {e}"))))
            .map_err(|e| match e {
                ProviderError::Unavailable(reason) => CertError::NoContext(reason),
                other => CertError::EnumerationFailed(other),
            })
    }

    /// Drops the binding and forgets the selected identity.
    pub fn clear(&self) {
        let order = self.lock_store_order();
        let previous = std::mem::take(&mut *self.write_state());
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to erase stored certificate alias");
        }
        drop(order);
        drop(previous);
        tracing::info!("Certificate cleared");
    }

    pub fn current_handle(&self) -> Option<IdentityHandle> {
        self.read_state().selected.clone()
    }

    pub fn status(&self) -> BindingStatus {
        self.read_state().status()
    }

    /// The active binding, if any.
    pub fn binding(&self) -> Option<Arc<Binding>> {
        self.read_state().binding.clone()
    }

    /// Executes a request with the bound identity.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CertError> {
        let binding = self.binding().ok_or(CertError::NotBound)?;
        binding.client().execute(request).await
    }

    async fn resolve(&self, handle: &IdentityHandle) -> Result<ResolvedIdentity, ProviderError> {
        let provider = Arc::clone(&self.provider);
        let handle = handle.clone();
        tokio::task::spawn_blocking(move || provider.resolve(&handle))
            .await
            .unwrap_or_else(|e| Err(ProviderError::Platform(format!("Key store worker failed: {e}"))))
    }

    fn stored_handle(&self) -> Option<IdentityHandle> {
        self.store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read stored certificate alias");
            None
        })
    }

    fn persist(&self, handle: &IdentityHandle) {
        if let Err(e) = self.store.save(handle) {
            tracing::warn!(handle = %handle, error = %e, "Failed to store certificate alias");
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_store_order(&self) -> MutexGuard<'_, ()> {
        self.store_order.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn binding_error(handle: &IdentityHandle, err: ProviderError) -> CertError {
    match err {
        ProviderError::Unavailable(reason) => CertError::NoContext(reason),
        ProviderError::Incomplete(_) => CertError::CertificateIncomplete(handle.clone()),
        source => CertError::CertificateResolutionFailed {
            handle: handle.clone(),
            source,
        },
    }
}

fn describe_key_store(provider: &dyn IdentityProvider) -> Result<Vec<String>, ProviderError> {
    let mut lines: Vec<String> = provider
        .aliases()?
        .iter()
        .map(|alias| format!("KeyStore: {alias}"))
        .collect();

    for name in PROBE_ALIASES {
        let line = match provider.resolve(&IdentityHandle::new(name)) {
            Ok(identity) if identity.is_complete() => format!("KeyChain: {name} (accessible)"),
            Ok(_)
            | Err(
                ProviderError::NotInstalled(_)
                | ProviderError::NotAccessible { .. }
                | ProviderError::Incomplete(_),
            ) => format!("KeyChain: {name} (not accessible)"),
            Err(e) => format!("KeyChain: {name} (error: {e})"),
        };
        lines.push(line);
    }

    Ok(lines)
}
