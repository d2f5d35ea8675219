use serde::{Deserialize, Serialize};

/// Body of `POST /api/contact`.
///
/// Every field defaults to empty so a partially filled form still
/// deserializes; the endpoint renders blanks as "N/A".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ContactRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Success body: `{"success": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
}

impl ContactResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Error body: `{"error": "...", "details": "..."}`, `details` omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self { error: error.into(), details: Some(details.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_request_missing_fields_default_to_empty() {
        let req: ContactRequest = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        assert_eq!(req.name, "A");
        assert!(req.email.is_empty());
        assert!(req.token.is_none());
    }

    #[test]
    fn test_error_body_omits_missing_details() {
        let json = serde_json::to_string(&ErrorBody::new("Method not allowed")).unwrap();
        assert_eq!(json, r#"{"error":"Method not allowed"}"#);
    }

    #[test]
    fn test_success_body_shape() {
        let json = serde_json::to_value(ContactResponse::ok()).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));
    }
}
