use crate::infra::handle_store::PREFS_NAME;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Reference timeout for each phase of an authenticated request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Per-phase bounds for authenticated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl HttpTimeouts {
    /// Upper bound on a whole request, connect through body.
    pub fn ceiling(&self) -> Duration {
        self.connect + self.read + self.write
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        let each = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            connect: each,
            read: each,
            write: each,
        }
    }
}

pub struct Config {
    pub port: u16,
    pub key_store_dir: PathBuf,
    pub state_file: PathBuf,
    pub timeouts: HttpTimeouts,
    pub extra_roots: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            key_store_dir: env::var("MTLS_KEY_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("keystore")),
            state_file: env::var("MTLS_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(format!("{PREFS_NAME}.json"))),
            timeouts: HttpTimeouts {
                connect: secs_from_env("MTLS_CONNECT_TIMEOUT_SECS"),
                read: secs_from_env("MTLS_READ_TIMEOUT_SECS"),
                write: secs_from_env("MTLS_WRITE_TIMEOUT_SECS"),
            },
            extra_roots: env::var("MTLS_EXTRA_ROOTS").ok().map(PathBuf::from),
        }
    }
}

fn secs_from_env(name: &str) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect, Duration::from_secs(120));
        assert_eq!(timeouts.read, Duration::from_secs(120));
        assert_eq!(timeouts.write, Duration::from_secs(120));
        assert_eq!(timeouts.ceiling(), Duration::from_secs(360));
    }
}
