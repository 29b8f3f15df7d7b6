pub mod executor;
pub mod response_builder;
pub mod transport;
pub mod types;

pub use executor::{AuthenticatedHttpClient, DEFAULT_POST_BODY, JSON_CONTENT_TYPE};
pub use response_builder::{build_response, collect_headers, is_binary_content};
pub use transport::{classify, TransportErrorKind};
pub use types::*;
