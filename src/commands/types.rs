use crate::error::CertError;
use serde::Serialize;
use serde_json::Value;

/// Error data reported for a failed command
#[derive(Debug, Clone, Serialize)]
pub struct ErrorData {
    pub message: String,
    pub code: String,
}

/// Full command response
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub success: bool,
    /// Command result; `null` is a valid result (e.g. a cancelled picker).
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorData>,
}

impl CommandResponse {
    pub fn success(data: impl Into<Value>) -> Self {
        Self {
            success: true,
            data: data.into(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(ErrorData {
                message: message.into(),
                code: code.into(),
            }),
        }
    }

    pub fn from_error(err: &CertError) -> Self {
        Self::error(err.to_string(), err.code())
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}

/// Typed access to a command's JSON arguments.
pub struct Arguments<'a>(&'a Value);

impl<'a> Arguments<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self(value)
    }

    /// An optional string argument; `null` counts as absent.
    pub fn optional_str(&self, name: &str) -> Result<Option<String>, CertError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(CertError::InvalidArgument(format!(
                "Parameter '{}' must be a string",
                name
            ))),
        }
    }

    pub fn required_str(&self, name: &str) -> Result<String, CertError> {
        self.optional_str(name)?.ok_or_else(|| {
            CertError::InvalidArgument(format!("Parameter '{}' is required", name))
        })
    }

    /// An optional string-to-string map, in document order.
    pub fn optional_string_map(&self, name: &str) -> Result<Vec<(String, String)>, CertError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => Ok((key.clone(), s.clone())),
                    _ => Err(CertError::InvalidArgument(format!(
                        "Header '{}' must be a string",
                        key
                    ))),
                })
                .collect(),
            Some(_) => Err(CertError::InvalidArgument(format!(
                "Parameter '{}' must be an object",
                name
            ))),
        }
    }
}
