//! TLS/SSL infrastructure.
//!
//! Builds rustls client configurations that present a client identity
//! during the handshake and validate servers against a [`TrustPolicy`].

use crate::identity::{KeyAlgorithm, ResolvedIdentity};
use crate::shared::cert_parser::{parse_x509_basic, BasicCertInfo};
use rustls::client::ResolvesClientCert;
use rustls::crypto::CryptoProvider;
use rustls::sign::CertifiedKey;
use rustls::{ClientConfig, InconsistentKeys, RootCertStore, SignatureScheme};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::CertificateDer;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsContextError {
    #[error("Certificate chain is empty")]
    EmptyChain,

    #[error("Malformed certificate at chain position {index}: {reason}")]
    MalformedCertificate { index: usize, reason: String },

    #[error("Unsupported key type {0:?}; only RSA and EC keys can be used")]
    UnsupportedKeyType(rustls::SignatureAlgorithm),

    #[error("Private key does not match the leaf certificate: {0}")]
    KeyMismatch(rustls::Error),

    #[error("TLS provider rejected configuration: {0}")]
    Provider(#[from] rustls::Error),

    #[error("Invalid trust anchor: {0}")]
    TrustAnchor(String),

    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Trust roots used to validate server certificates.
#[derive(Debug, Clone)]
pub struct TrustPolicy {
    roots: Arc<RootCertStore>,
}

impl TrustPolicy {
    /// Mozilla's root program, as shipped by webpki-roots.
    pub fn platform_default() -> Self {
        let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self {
            roots: Arc::new(roots),
        }
    }

    /// A policy trusting exactly the given anchors.
    pub fn from_anchors(
        anchors: impl IntoIterator<Item = CertificateDer<'static>>,
    ) -> Result<Self, TlsContextError> {
        Self {
            roots: Arc::new(RootCertStore::empty()),
        }
        .with_additional_anchors(anchors)
    }

    /// Extends the policy with further anchors.
    pub fn with_additional_anchors(
        self,
        anchors: impl IntoIterator<Item = CertificateDer<'static>>,
    ) -> Result<Self, TlsContextError> {
        let mut roots = Arc::unwrap_or_clone(self.roots);
        for anchor in anchors {
            roots
                .add(anchor)
                .map_err(|e| TlsContextError::TrustAnchor(e.to_string()))?;
        }
        Ok(Self {
            roots: Arc::new(roots),
        })
    }

    /// Extends the policy with every certificate in a PEM file.
    pub fn with_additional_pem_file(self, path: &Path) -> Result<Self, TlsContextError> {
        let anchors = CertificateDer::pem_file_iter(path)
            .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
            .map_err(|e| TlsContextError::TrustAnchor(format!("{}: {}", path.display(), e)))?;

        if anchors.is_empty() {
            return Err(TlsContextError::TrustAnchor(format!(
                "{}: no certificates found",
                path.display()
            )));
        }
        self.with_additional_anchors(anchors)
    }

    pub fn anchor_count(&self) -> usize {
        self.roots.len()
    }

    fn roots(&self) -> Arc<RootCertStore> {
        Arc::clone(&self.roots)
    }
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Client certificate resolver that always presents one identity.
#[derive(Debug)]
struct BoundIdentityResolver(Arc<CertifiedKey>);

impl ResolvesClientCert for BoundIdentityResolver {
    fn resolve(
        &self,
        _root_hint_subjects: &[&[u8]],
        _sigschemes: &[SignatureScheme],
    ) -> Option<Arc<CertifiedKey>> {
        Some(Arc::clone(&self.0))
    }

    fn has_certs(&self) -> bool {
        true
    }
}

/// An immutable TLS client context bound to one identity.
///
/// Signing during the handshake goes through the identity's key reference;
/// the context never holds raw key bytes.
#[derive(Debug, Clone)]
pub struct TlsClientContext {
    config: Arc<ClientConfig>,
    leaf: BasicCertInfo,
}

impl TlsClientContext {
    pub fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    /// The certificate this context presents.
    pub fn leaf(&self) -> &BasicCertInfo {
        &self.leaf
    }
}

/// Builds [`TlsClientContext`]s from resolved identities.
#[derive(Debug, Clone, Default)]
pub struct TlsContextBuilder {
    trust: TrustPolicy,
}

impl TlsContextBuilder {
    pub fn new(trust: TrustPolicy) -> Self {
        Self { trust }
    }

    pub fn trust_policy(&self) -> &TrustPolicy {
        &self.trust
    }

    /// Constructs a client context presenting `identity`.
    ///
    /// The chain is checked for well-formedness and the key for a supported
    /// algorithm before rustls sees either; protocol versions are the
    /// provider's safe defaults (TLS 1.2 and 1.3).
    pub fn build(&self, identity: &ResolvedIdentity) -> Result<TlsClientContext, TlsContextError> {
        if identity.chain().is_empty() {
            return Err(TlsContextError::EmptyChain);
        }

        let mut leaf = None;
        for (index, cert) in identity.chain().iter().enumerate() {
            let info = parse_x509_basic(cert.as_ref())
                .map_err(|reason| TlsContextError::MalformedCertificate { index, reason })?;
            leaf.get_or_insert(info);
        }

        let algorithm = identity.algorithm();
        if KeyAlgorithm::from_signature_algorithm(algorithm).is_none() {
            return Err(TlsContextError::UnsupportedKeyType(algorithm));
        }

        let certified = CertifiedKey::new(identity.chain().to_vec(), identity.signing_key());
        match certified.keys_match() {
            // Platform keys that cannot report their public half are trusted.
            Ok(()) | Err(rustls::Error::InconsistentKeys(InconsistentKeys::Unknown)) => {}
            Err(e) => return Err(TlsContextError::KeyMismatch(e)),
        }
        let resolver = Arc::new(BoundIdentityResolver(Arc::new(certified)));

        let config = ClientConfig::builder_with_provider(crypto_provider())
            .with_safe_default_protocol_versions()?
            .with_root_certificates(self.trust.roots())
            .with_client_cert_resolver(resolver);

        Ok(TlsClientContext {
            config: Arc::new(config),
            leaf: leaf.unwrap_or_default(),
        })
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}
