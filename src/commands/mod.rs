//! Command surface.
//!
//! Maps named commands with JSON arguments onto the session controller and
//! reports results in a uniform `{success, data, error}` envelope, whatever
//! transport the host exposes them over.

pub mod types;

pub use types::{Arguments, CommandResponse, ErrorData};

use crate::client::HttpRequest;
use crate::error::CertError;
use crate::identity::IdentityHandle;
use crate::session::CertificateSessionController;
use serde_json::Value;
use std::sync::Arc;

/// Names of every supported command.
pub const COMMANDS: [&str; 9] = [
    "pickCertificate",
    "setupClientAuth",
    "getSelectedAlias",
    "clearCertificate",
    "isCertificateAvailable",
    "listAvailableCertificates",
    "requestCertificateAccess",
    "selectCertificate",
    "makeRequestWithCertificate",
];

#[derive(Clone)]
pub struct CommandDispatcher {
    controller: Arc<CertificateSessionController>,
}

impl CommandDispatcher {
    pub fn new(controller: Arc<CertificateSessionController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &Arc<CertificateSessionController> {
        &self.controller
    }

    /// Runs `method` with `arguments` (a JSON object or `null`).
    pub async fn dispatch(&self, method: &str, arguments: &Value) -> CommandResponse {
        let args = Arguments::new(arguments);

        let result = match method {
            "pickCertificate" => self.controller.auto_select().await.map(handle_value),
            "setupClientAuth" => self.setup_client_auth(&args).await,
            "getSelectedAlias" => Ok(optional_handle_value(self.controller.current_handle())),
            "clearCertificate" => {
                self.controller.clear();
                Ok(Value::Bool(true))
            }
            "isCertificateAvailable" => self.is_certificate_available(&args).await,
            "listAvailableCertificates" => self
                .controller
                .list_available()
                .await
                .map(Value::from),
            "requestCertificateAccess" => {
                return match self.controller.confirm_access().await {
                    Ok(handle) => CommandResponse::success(optional_handle_value(handle)),
                    Err(err @ CertError::ChooserFailed(_)) => {
                        CommandResponse::error(err.to_string(), "PERMISSION_ERROR")
                    }
                    Err(err) => CommandResponse::from_error(&err),
                }
            }
            "selectCertificate" => self
                .controller
                .select_identity()
                .await
                .map(optional_handle_value),
            "makeRequestWithCertificate" => self.make_request(&args).await,
            _ => {
                return CommandResponse::error(
                    format!("Method {} not implemented", method),
                    "NOT_IMPLEMENTED",
                )
            }
        };

        match result {
            Ok(data) => CommandResponse::success(data),
            Err(err) => CommandResponse::from_error(&err),
        }
    }

    async fn setup_client_auth(&self, args: &Arguments<'_>) -> Result<Value, CertError> {
        let alias = args.required_str("alias")?;
        self.controller.bind(IdentityHandle::new(alias)).await?;
        Ok(Value::Bool(true))
    }

    async fn is_certificate_available(&self, args: &Arguments<'_>) -> Result<Value, CertError> {
        let alias = IdentityHandle::new(args.required_str("alias")?);
        self.controller
            .check_availability(&alias)
            .await
            .map(Value::Bool)
    }

    async fn make_request(&self, args: &Arguments<'_>) -> Result<Value, CertError> {
        let url = args.required_str("url")?;
        let method = args.required_str("method")?;
        let headers = args.optional_string_map("headers")?;
        let body = args.optional_str("bodyJson")?;

        let request = HttpRequest {
            url,
            method,
            headers,
            body: body.map(String::into_bytes),
        };

        let response = self.controller.execute(request).await?;
        serde_json::to_value(response)
            .map_err(|e| CertError::InvalidArgument(format!("Unserializable response: {}", e)))
    }
}

fn handle_value(handle: IdentityHandle) -> Value {
    Value::String(handle.into_inner())
}

fn optional_handle_value(handle: Option<IdentityHandle>) -> Value {
    handle.map(handle_value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::handle_store::MemoryHandleStore;
    use crate::test_support::{generate_identity, MockEntry, MockProvider, ScriptedChooser};
    use serde_json::json;

    fn dispatcher(provider: MockProvider, store: MemoryHandleStore) -> CommandDispatcher {
        let controller = CertificateSessionController::new(Arc::new(provider), Arc::new(store));
        CommandDispatcher::new(Arc::new(controller))
    }

    fn valid() -> MockEntry {
        MockEntry::Valid(generate_identity("client.test").resolved())
    }

    #[tokio::test]
    async fn test_pick_certificate_without_stored_alias() {
        let dispatcher = dispatcher(MockProvider::new(), MemoryHandleStore::new());
        let response = dispatcher.dispatch("pickCertificate", &Value::Null).await;
        assert!(!response.success);
        assert_eq!(response.error_code(), Some("NO_CERTIFICATE_STORED"));
    }

    #[tokio::test]
    async fn test_pick_certificate_not_installed() {
        let dispatcher = dispatcher(
            MockProvider::new(),
            MemoryHandleStore::with_handle(IdentityHandle::new("ghost-cert")),
        );
        let response = dispatcher.dispatch("pickCertificate", &Value::Null).await;
        assert_eq!(response.error_code(), Some("CERTIFICATE_NOT_INSTALLED"));
    }

    #[tokio::test]
    async fn test_setup_and_selected_alias() {
        let dispatcher = dispatcher(
            MockProvider::new().with("client-cert", valid()),
            MemoryHandleStore::new(),
        );

        let response = dispatcher
            .dispatch("getSelectedAlias", &Value::Null)
            .await;
        assert!(response.success);
        assert!(response.data.is_null());

        let response = dispatcher
            .dispatch("setupClientAuth", &json!({ "alias": "client-cert" }))
            .await;
        assert!(response.success);
        assert_eq!(response.data, json!(true));

        let response = dispatcher
            .dispatch("getSelectedAlias", &Value::Null)
            .await;
        assert_eq!(response.data, json!("client-cert"));
    }

    #[tokio::test]
    async fn test_missing_alias_is_invalid_argument() {
        let dispatcher = dispatcher(MockProvider::new(), MemoryHandleStore::new());
        for command in ["setupClientAuth", "isCertificateAvailable"] {
            let response = dispatcher.dispatch(command, &json!({})).await;
            assert_eq!(response.error_code(), Some("INVALID_ARGUMENT"));
        }
        let response = dispatcher
            .dispatch("makeRequestWithCertificate", &json!({ "url": "https://example.test" }))
            .await;
        assert_eq!(response.error_code(), Some("INVALID_ARGUMENT"));
    }

    #[tokio::test]
    async fn test_clear_always_succeeds() {
        let dispatcher = dispatcher(MockProvider::new(), MemoryHandleStore::new());
        for _ in 0..2 {
            let response = dispatcher.dispatch("clearCertificate", &Value::Null).await;
            assert!(response.success);
            assert_eq!(response.data, json!(true));
        }
    }

    #[tokio::test]
    async fn test_is_certificate_available() {
        let dispatcher = dispatcher(
            MockProvider::new().with("client-cert", valid()),
            MemoryHandleStore::new(),
        );
        let response = dispatcher
            .dispatch("isCertificateAvailable", &json!({ "alias": "client-cert" }))
            .await;
        assert_eq!(response.data, json!(true));

        let response = dispatcher
            .dispatch("isCertificateAvailable", &json!({ "alias": "ghost-cert" }))
            .await;
        assert_eq!(response.data, json!(false));
    }

    #[tokio::test]
    async fn test_request_without_binding() {
        let dispatcher = dispatcher(MockProvider::new(), MemoryHandleStore::new());
        let response = dispatcher
            .dispatch(
                "makeRequestWithCertificate",
                &json!({ "url": "https://example.test/api", "method": "GET" }),
            )
            .await;
        assert_eq!(response.error_code(), Some("NO_HTTP_CLIENT"));
    }

    #[tokio::test]
    async fn test_request_with_put_is_unsupported() {
        let dispatcher = dispatcher(
            MockProvider::new().with("client-cert", valid()),
            MemoryHandleStore::new(),
        );
        dispatcher
            .dispatch("setupClientAuth", &json!({ "alias": "client-cert" }))
            .await;
        let response = dispatcher
            .dispatch(
                "makeRequestWithCertificate",
                &json!({ "url": "https://unreachable.invalid/api", "method": "PUT" }),
            )
            .await;
        assert_eq!(response.error_code(), Some("UNSUPPORTED_METHOD"));
    }

    #[tokio::test]
    async fn test_request_access_picker_failure_code() {
        let controller = CertificateSessionController::new(
            Arc::new(MockProvider::new()),
            Arc::new(MemoryHandleStore::with_handle(IdentityHandle::new("client-cert"))),
        )
        .with_chooser(ScriptedChooser::failing("dialog crashed"));
        let dispatcher = CommandDispatcher::new(Arc::new(controller));

        let response = dispatcher
            .dispatch("requestCertificateAccess", &Value::Null)
            .await;
        assert_eq!(response.error_code(), Some("PERMISSION_ERROR"));

        let response = dispatcher.dispatch("selectCertificate", &Value::Null).await;
        assert_eq!(response.error_code(), Some("PICKER_ERROR"));
    }

    #[tokio::test]
    async fn test_select_without_surface() {
        let dispatcher = dispatcher(MockProvider::new(), MemoryHandleStore::new());
        let response = dispatcher.dispatch("selectCertificate", &Value::Null).await;
        assert_eq!(response.error_code(), Some("NO_ACTIVITY"));
    }

    #[tokio::test]
    async fn test_list_available_certificates() {
        let dispatcher = dispatcher(
            MockProvider::new().with("client-cert", valid()),
            MemoryHandleStore::new(),
        );
        let response = dispatcher
            .dispatch("listAvailableCertificates", &Value::Null)
            .await;
        assert!(response.success);
        let lines = response.data.as_array().unwrap();
        assert_eq!(lines[0], "KeyStore: client-cert");
        assert!(lines.contains(&json!("KeyChain: client-cert (accessible)")));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let dispatcher = dispatcher(MockProvider::new(), MemoryHandleStore::new());
        let response = dispatcher.dispatch("deleteEverything", &Value::Null).await;
        assert_eq!(response.error_code(), Some("NOT_IMPLEMENTED"));
    }
}
