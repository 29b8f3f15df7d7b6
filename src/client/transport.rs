//! Classification of transport failures.
//!
//! reqwest reports TLS problems as opaque connect errors; the rustls cause
//! sits somewhere down the source chain, often inside an `io::Error`
//! payload. Walking the chain lets callers tell a rejected server
//! certificate or a refused client certificate apart from plain
//! connectivity trouble.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// What went wrong below the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// A connect, read or write bound elapsed.
    Timeout,
    /// The TCP connection could not be established.
    Connect,
    /// The server's certificate failed validation against the trust policy.
    ServerCertificateRejected,
    /// The peer aborted the handshake with an alert, typically because it
    /// refused the presented client certificate.
    HandshakeRejected,
    /// Any other TLS failure.
    Tls,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connection failed",
            TransportErrorKind::ServerCertificateRejected => "server certificate rejected",
            TransportErrorKind::HandshakeRejected => "handshake rejected by peer",
            TransportErrorKind::Tls => "TLS error",
            TransportErrorKind::Other => "transport error",
        };
        f.write_str(label)
    }
}

/// Classifies a reqwest failure.
pub fn classify(err: &reqwest::Error) -> TransportErrorKind {
    if let Some(kind) = tls_failure_kind(err) {
        return kind;
    }
    if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    }
}

/// Finds a rustls error in the chain and maps it to a kind.
pub fn tls_failure_kind(err: &(dyn StdError + 'static)) -> Option<TransportErrorKind> {
    find_rustls_error(err).map(|tls| match tls {
        rustls::Error::InvalidCertificate(_) => TransportErrorKind::ServerCertificateRejected,
        rustls::Error::AlertReceived(_) => TransportErrorKind::HandshakeRejected,
        _ => TransportErrorKind::Tls,
    })
}

fn find_rustls_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        // io::Error::source() skips its own payload, so descend into it.
        current = match e.downcast_ref::<io::Error>().and_then(|io| io.get_ref()) {
            Some(inner) => Some(inner as &(dyn StdError + 'static)),
            None => e.source(),
        };
    }
    None
}
