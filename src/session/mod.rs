pub mod controller;
pub mod state;

pub use controller::{CertificateSessionController, PROBE_ALIASES};
pub use state::{Binding, BindingStatus, SessionState};
