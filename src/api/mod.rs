pub mod client;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub use client::ApiClient;

/// Synthetic code for requests that never produced a response.
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
/// Synthetic code for responses that did not match the envelope contract.
pub const MALFORMED_RESPONSE: &str = "MALFORMED_RESPONSE";
/// Synthetic code for requests that could not be built locally.
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

impl ApiErrorBody {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(NETWORK_ERROR, message)
    }

    pub fn malformed() -> Self {
        Self::new(MALFORMED_RESPONSE, GENERIC_ERROR_MESSAGE)
    }
}

/// Response body exactly as it arrives on the wire. Nothing in here is
/// trusted until [`ApiEnvelope::into_response`] has checked it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, serde_json::Value>>,
}

impl<T> ApiEnvelope<T> {
    /// Validate the `ok`/`data`/`error` exclusivity. `None` means the
    /// envelope broke the contract.
    pub fn into_response(self) -> Option<ApiResponse<T>> {
        match (self.ok, self.data, self.error) {
            (true, Some(data), None) => Some(ApiResponse::Ok(data)),
            (false, None, Some(error)) => Some(ApiResponse::Err(error)),
            _ => None,
        }
    }
}

/// Structurally valid result of one API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Ok(T),
    Err(ApiErrorBody),
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ApiResponse::Ok(_))
    }

    pub fn error(&self) -> Option<&ApiErrorBody> {
        match self {
            ApiResponse::Ok(_) => None,
            ApiResponse::Err(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, ApiErrorBody> {
        match self {
            ApiResponse::Ok(data) => Ok(data),
            ApiResponse::Err(error) => Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthTokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_in,
            token_type: default_token_type(),
        }
    }

    /// Both tokens present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: String,
    pub detail: String,
    #[serde(default)]
    pub is_threat: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    #[serde(default)]
    pub urls: BTreeSet<String>,
    #[serde(default)]
    pub phones: BTreeSet<String>,
    #[serde(default)]
    pub emails: BTreeSet<String>,
    #[serde(default)]
    pub crypto_addresses: BTreeSet<String>,
    #[serde(default)]
    pub upi_ids: BTreeSet<String>,
}

impl EntityData {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
            && self.phones.is_empty()
            && self.emails.is_empty()
            && self.crypto_addresses.is_empty()
            && self.upi_ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScamCardRef {
    pub card_id: String,
    pub card_url: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_id: String,
    pub risk_score: i32,
    /// Level as reported by the service. Optional on the wire, see
    /// [`crate::risk::resolve_level`].
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub scam_type: Option<String>,
    pub explanation: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub entities: EntityData,
    #[serde(default)]
    pub checks_performed: Vec<String>,
    #[serde(default)]
    pub checks_not_available: Vec<String>,
    #[serde(default)]
    pub confidence_note: String,
    #[serde(default)]
    pub scam_card: Option<ScamCardRef>,
    #[serde(default)]
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    pub card_id: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub risk_level: Option<String>,
    pub risk_score: i32,
    #[serde(default)]
    pub scam_type: Option<String>,
    pub card_url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub share_count: u64,
    #[serde(default)]
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScanRequest<'a> {
    pub content: &'a str,
    pub content_type: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_ok_with_data() {
        let envelope: ApiEnvelope<u32> =
            serde_json::from_str(r#"{"ok": true, "data": 7, "error": null}"#).unwrap();
        assert_eq!(envelope.into_response(), Some(ApiResponse::Ok(7)));
    }

    #[test]
    fn test_envelope_error() {
        let envelope: ApiEnvelope<u32> = serde_json::from_str(
            r#"{"ok": false, "data": null, "error": {"code": "NOT_FOUND", "message": "Card not found"}}"#,
        )
        .unwrap();
        let response = envelope.into_response().unwrap();
        assert!(!response.is_ok());
        assert_eq!(response.error().unwrap().code, "NOT_FOUND");
    }

    #[test]
    fn test_envelope_contract_violations() {
        let ok_without_data: ApiEnvelope<u32> = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(ok_without_data.into_response().is_none());

        let both: ApiEnvelope<u32> = serde_json::from_str(
            r#"{"ok": true, "data": 1, "error": {"code": "X", "message": "y"}}"#,
        )
        .unwrap();
        assert!(both.into_response().is_none());

        let failed_without_error: ApiEnvelope<u32> =
            serde_json::from_str(r#"{"ok": false, "data": null, "error": null}"#).unwrap();
        assert!(failed_without_error.into_response().is_none());
    }

    #[test]
    fn test_scan_result_tolerates_missing_optional_fields() {
        let scan: ScanResult = serde_json::from_value(serde_json::json!({
            "scan_id": "6f1c0d7e-0000-4000-8000-000000000001",
            "risk_score": 12,
            "explanation": "Nothing suspicious",
            "created_at": "2026-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(scan.risk_level, None);
        assert_eq!(scan.scam_type, None);
        assert!(scan.evidence.is_empty());
        assert!(scan.entities.is_empty());
        assert!(scan.scam_card.is_none());
    }

    #[test]
    fn test_token_pair_defaults_token_type() {
        let pair: AuthTokenPair = serde_json::from_str(
            r#"{"access_token": "a", "refresh_token": "r", "expires_in": 900}"#,
        )
        .unwrap();
        assert_eq!(pair.token_type, "bearer");
        assert!(pair.is_complete());
        assert!(!AuthTokenPair::new("a", "", 1).is_complete());
    }
}
