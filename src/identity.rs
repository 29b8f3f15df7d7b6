//! Client identity data model.
//!
//! An identity is addressed by an opaque [`IdentityHandle`] and, once
//! resolved through a key store, yields a [`ResolvedIdentity`]: a signing key
//! reference owned by the key store plus the certificate chain that goes
//! with it.

use rustls::pki_types::CertificateDer;
use rustls::sign::SigningKey;
use rustls::SignatureAlgorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque, key-store defined name of a client identity entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityHandle(String);

impl IdentityHandle {
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for IdentityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityHandle {
    fn from(alias: &str) -> Self {
        Self::new(alias)
    }
}

impl From<String> for IdentityHandle {
    fn from(alias: String) -> Self {
        Self(alias)
    }
}

/// Key algorithms a client identity may use for mutual TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    #[serde(rename = "RSA")]
    Rsa,
    #[serde(rename = "EC")]
    Ec,
}

impl KeyAlgorithm {
    /// Algorithms offered to the identity chooser.
    pub const SUPPORTED: [KeyAlgorithm; 2] = [KeyAlgorithm::Rsa, KeyAlgorithm::Ec];

    /// Maps a rustls signature algorithm onto the supported set.
    pub fn from_signature_algorithm(algorithm: SignatureAlgorithm) -> Option<Self> {
        match algorithm {
            SignatureAlgorithm::RSA => Some(Self::Rsa),
            SignatureAlgorithm::ECDSA => Some(Self::Ec),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ec => "EC",
        }
    }
}

/// A client identity as handed out by the key store.
///
/// The private key is only reachable through its [`SigningKey`] reference;
/// the key store may back it with hardware and never expose the raw key
/// bytes. Instances are produced per resolution and dropped once the TLS
/// context they feed has been built.
#[derive(Clone)]
pub struct ResolvedIdentity {
    key: Arc<dyn SigningKey>,
    chain: Vec<CertificateDer<'static>>,
}

impl ResolvedIdentity {
    /// Creates an identity from a signing key and its chain, leaf first.
    pub fn new(key: Arc<dyn SigningKey>, chain: Vec<CertificateDer<'static>>) -> Self {
        Self { key, chain }
    }

    pub fn signing_key(&self) -> Arc<dyn SigningKey> {
        Arc::clone(&self.key)
    }

    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    pub fn leaf(&self) -> Option<&CertificateDer<'static>> {
        self.chain.first()
    }

    /// Whether both a key and a non-empty chain are present.
    pub fn is_complete(&self) -> bool {
        !self.chain.is_empty()
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.key.algorithm()
    }
}

impl fmt::Debug for ResolvedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedIdentity")
            .field("algorithm", &self.key.algorithm())
            .field("chain_len", &self.chain.len())
            .finish()
    }
}
