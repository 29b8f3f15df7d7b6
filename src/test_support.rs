//! Fixtures shared by the unit tests.

use crate::identity::{IdentityHandle, ResolvedIdentity};
use crate::infra::chooser::{ChooserError, ChooserFuture, ChooserRequest, IdentityChooser};
use crate::infra::keystore::{IdentityProvider, ProviderError};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A freshly generated self-signed identity.
pub struct GeneratedIdentity {
    pub cert_der: CertificateDer<'static>,
    pub cert_pem: String,
    pub key_pem: String,
    key_der: Vec<u8>,
}

impl GeneratedIdentity {
    pub fn bundle_pem(&self) -> String {
        format!("{}{}", self.cert_pem, self.key_pem)
    }

    pub fn resolved(&self) -> ResolvedIdentity {
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.key_der.clone()));
        let signing_key = rustls::crypto::ring::sign::any_supported_type(&key).unwrap();
        ResolvedIdentity::new(signing_key, vec![self.cert_der.clone()])
    }
}

pub fn generate_identity(san: &str) -> GeneratedIdentity {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec![san.to_string()]).unwrap();
    GeneratedIdentity {
        cert_der: cert.der().clone(),
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
        key_der: key_pair.serialize_der(),
    }
}

/// An identity whose key algorithm cannot be used for client auth here.
pub fn ed25519_identity() -> ResolvedIdentity {
    let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ED25519).unwrap();
    let cert = rcgen::CertificateParams::new(vec!["ed25519.test".to_string()])
        .unwrap()
        .self_signed(&key_pair)
        .unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    let signing_key = rustls::crypto::ring::sign::any_supported_type(&key).unwrap();
    ResolvedIdentity::new(signing_key, vec![cert.der().clone()])
}

pub fn write_bundle(dir: &Path, alias: &str, pem: &str) {
    std::fs::write(dir.join(format!("{alias}.pem")), pem).unwrap();
}

/// Outcome a [`MockProvider`] produces for an alias.
#[derive(Clone)]
pub enum MockEntry {
    Valid(ResolvedIdentity),
    NotInstalled,
    NotAccessible,
    Incomplete,
    Platform(&'static str),
}

/// In-memory key store that counts resolutions.
#[derive(Default)]
pub struct MockProvider {
    entries: Mutex<HashMap<String, MockEntry>>,
    unavailable: bool,
    resolutions: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with(self, alias: &str, entry: MockEntry) -> Self {
        self.set(alias, entry);
        self
    }

    pub fn set(&self, alias: &str, entry: MockEntry) {
        self.entries
            .lock()
            .unwrap()
            .insert(alias.to_string(), entry);
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for MockProvider {
    fn resolve(&self, handle: &IdentityHandle) -> Result<ResolvedIdentity, ProviderError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(ProviderError::Unavailable("mock key store offline".to_string()));
        }
        let alias = handle.as_str().to_string();
        match self.entries.lock().unwrap().get(&alias).cloned() {
            Some(MockEntry::Valid(identity)) => Ok(identity),
            Some(MockEntry::NotAccessible) => Err(ProviderError::NotAccessible {
                alias,
                reason: "locked".to_string(),
            }),
            Some(MockEntry::Incomplete) => Err(ProviderError::Incomplete(alias)),
            Some(MockEntry::Platform(message)) => Err(ProviderError::Platform(message.to_string())),
            Some(MockEntry::NotInstalled) | None => Err(ProviderError::NotInstalled(alias)),
        }
    }

    fn aliases(&self) -> Result<Vec<IdentityHandle>, ProviderError> {
        if self.unavailable {
            return Err(ProviderError::Unavailable("mock key store offline".to_string()));
        }
        let mut aliases: Vec<IdentityHandle> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, entry)| !matches!(entry, MockEntry::NotInstalled))
            .map(|(alias, _)| IdentityHandle::new(alias.as_str()))
            .collect();
        aliases.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(aliases)
    }
}

/// Answer a [`ScriptedChooser`] gives on every call.
#[derive(Clone)]
enum Script {
    Pick(Option<IdentityHandle>),
    Fail(String),
}

/// Chooser that replays a fixed answer and records its requests.
pub struct ScriptedChooser {
    script: Script,
    requests: Mutex<Vec<ChooserRequest>>,
}

impl ScriptedChooser {
    pub fn picking(alias: &str) -> Arc<Self> {
        Self::scripted(Script::Pick(Some(IdentityHandle::new(alias))))
    }

    pub fn cancelling() -> Arc<Self> {
        Self::scripted(Script::Pick(None))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::scripted(Script::Fail(message.to_string()))
    }

    fn scripted(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChooserRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl IdentityChooser for ScriptedChooser {
    fn choose(&self, request: ChooserRequest) -> ChooserFuture<'_> {
        self.requests.lock().unwrap().push(request);
        let answer = match &self.script {
            Script::Pick(handle) => Ok(handle.clone()),
            Script::Fail(message) => Err(ChooserError::Failed(message.clone())),
        };
        Box::pin(async move { answer })
    }
}
