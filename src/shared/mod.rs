//! Shared utilities used across the certificate picker.

pub mod cert_parser;

pub use cert_parser::{parse_x509_basic, BasicCertInfo};
