//! Key store access.
//!
//! [`IdentityProvider`] is the narrow contract the session controller uses to
//! turn an [`IdentityHandle`] into key material. Platform key stores
//! (hardware-backed keychains, PKCS#11 tokens) implement it by handing out a
//! [`rustls::sign::SigningKey`] that signs inside the platform; the
//! [`FileKeyStore`] here is a software store that keeps one PEM bundle per
//! alias.

use crate::identity::{IdentityHandle, ResolvedIdentity};
use rustls_pki_types::pem::{self, PemObject};
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reported by a key store while resolving an identity.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The key store itself cannot be reached.
    #[error("Key store unavailable: {0}")]
    Unavailable(String),

    /// No entry exists under the alias.
    #[error("Certificate '{0}' is not installed")]
    NotInstalled(String),

    /// The entry exists but this process may not use it right now.
    #[error("Certificate '{alias}' is not accessible: {reason}")]
    NotAccessible { alias: String, reason: String },

    /// The entry lacks a private key or its chain is empty.
    #[error("Certificate '{0}' has no private key or an empty certificate chain")]
    Incomplete(String),

    /// Any other key store failure.
    #[error("Key store error: {0}")]
    Platform(String),
}

/// Contract for key stores holding client identities.
///
/// Both methods may block (hardware access, OS consent prompts) and are
/// called from a blocking-capable worker, never from the async executor.
pub trait IdentityProvider: Send + Sync {
    /// Resolves a handle into its signing key and certificate chain.
    ///
    /// Implementations never report partial success: a key without a chain
    /// (or the reverse) is [`ProviderError::Incomplete`].
    fn resolve(&self, handle: &IdentityHandle) -> Result<ResolvedIdentity, ProviderError>;

    /// Enumerates the aliases currently installed.
    fn aliases(&self) -> Result<Vec<IdentityHandle>, ProviderError>;
}

/// File extension of identity bundles in a [`FileKeyStore`].
const BUNDLE_EXTENSION: &str = "pem";

/// Directory-backed key store.
///
/// Each identity lives in `<dir>/<alias>.pem` and contains the certificate
/// chain (leaf first) followed by one private key (PKCS#8, PKCS#1 or SEC1).
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn bundle_path(&self, alias: &str) -> Option<PathBuf> {
        let valid = !alias.is_empty()
            && !alias.starts_with('.')
            && !alias.contains(['/', '\\']);
        valid.then(|| self.dir.join(format!("{alias}.{BUNDLE_EXTENSION}")))
    }

    fn ensure_available(&self) -> Result<(), ProviderError> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(ProviderError::Unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )))
        }
    }
}

impl IdentityProvider for FileKeyStore {
    fn resolve(&self, handle: &IdentityHandle) -> Result<ResolvedIdentity, ProviderError> {
        self.ensure_available()?;

        let alias = handle.as_str();
        let path = self
            .bundle_path(alias)
            .ok_or_else(|| ProviderError::NotInstalled(alias.to_string()))?;

        let bundle = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProviderError::NotInstalled(alias.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(ProviderError::NotAccessible {
                    alias: alias.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                return Err(ProviderError::Platform(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        parse_bundle(alias, &bundle)
    }

    fn aliases(&self) -> Result<Vec<IdentityHandle>, ProviderError> {
        self.ensure_available()?;

        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| ProviderError::Platform(format!("{}: {}", self.dir.display(), e)))?;

        let mut aliases: Vec<IdentityHandle> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(BUNDLE_EXTENSION)
            })
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(IdentityHandle::new)
            })
            .collect();

        aliases.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(aliases)
    }
}

/// Parses a PEM bundle into an identity.
fn parse_bundle(alias: &str, bundle: &[u8]) -> Result<ResolvedIdentity, ProviderError> {
    let chain = CertificateDer::pem_slice_iter(bundle)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ProviderError::Platform(format!("Malformed certificate in '{alias}': {e}")))?;

    let key = match PrivateKeyDer::from_pem_slice(bundle) {
        Ok(key) => Some(key),
        Err(pem::Error::NoItemsFound) => None,
        Err(e) => {
            return Err(ProviderError::Platform(format!(
                "Malformed private key in '{alias}': {e}"
            )))
        }
    };

    let key = match key {
        Some(key) if !chain.is_empty() => key,
        _ => return Err(ProviderError::Incomplete(alias.to_string())),
    };

    let signing_key = rustls::crypto::ring::sign::any_supported_type(&key)
        .map_err(|e| ProviderError::Platform(format!("Unusable private key in '{alias}': {e}")))?;

    Ok(ResolvedIdentity::new(signing_key, chain))
}
