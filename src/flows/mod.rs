//! User-facing flows. Each one makes at most one API call and hands back
//! either something to render or the message to show inline.

use crate::api::{ApiClient, ApiErrorBody, ApiResponse, AuthTokenPair, GENERIC_ERROR_MESSAGE};
use crate::auth::StoreError;
use crate::text;
use crate::view::{CardPage, CardView, PageMetadata, ScanView};

/// Stand-in key for anonymous scans when none has been configured.
pub const DEMO_API_KEY: &str = "demo";

fn api_key_or_demo(api_key: Option<&str>) -> &str {
    api_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .unwrap_or(DEMO_API_KEY)
}

fn message_or(error: &ApiErrorBody, fallback: &str) -> String {
    let message = error.message.trim();
    if message.is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

pub async fn submit_scan(
    client: &ApiClient,
    content: &str,
    api_key: Option<&str>,
) -> Result<ScanView, String> {
    // The trimmed text only gates the request; the message is sent as given.
    text::validate_content(content)?;
    log::info!("Submitting scan: '{}'", text::preview(content, 40));

    match client.scan_text(content, api_key_or_demo(api_key)).await {
        ApiResponse::Ok(scan) => {
            log::info!(
                "Scan {} scored {} in {}ms",
                scan.scan_id,
                scan.risk_score,
                scan.processing_time_ms
            );
            Ok(ScanView::from(scan))
        }
        ApiResponse::Err(e) => Err(message_or(&e, GENERIC_ERROR_MESSAGE)),
    }
}

pub async fn fetch_scan(
    client: &ApiClient,
    scan_id: &str,
    api_key: Option<&str>,
) -> Result<ScanView, String> {
    client
        .get_scan(scan_id, api_key_or_demo(api_key))
        .await
        .into_result()
        .map(ScanView::from)
        .map_err(|e| message_or(&e, "Scan not found"))
}

pub async fn load_card(client: &ApiClient, short_id: &str) -> CardPage {
    match client.get_card(short_id).await {
        ApiResponse::Ok(card) => CardPage::Found(Box::new(CardView::from(card))),
        ApiResponse::Err(e) => {
            log::info!("Card {} unavailable: {} ({})", short_id, e.message, e.code);
            CardPage::NotFound
        }
    }
}

/// Link-preview metadata for a card. Never fails: any lookup problem
/// yields [`PageMetadata::fallback`].
pub async fn card_metadata(client: &ApiClient, short_id: &str) -> PageMetadata {
    match client.get_card(short_id).await {
        ApiResponse::Ok(card) => PageMetadata::for_card(&card),
        ApiResponse::Err(e) => {
            log::debug!("Using fallback metadata for card {}: {}", short_id, e.code);
            PageMetadata::fallback()
        }
    }
}

/// Persist a freshly issued pair. A pair missing a token is treated as a
/// bad response and leaves the current session untouched.
fn store_session(client: &ApiClient, response: ApiResponse<AuthTokenPair>) -> Result<(), String> {
    let pair = response
        .into_result()
        .map_err(|e| message_or(&e, "Something went wrong"))?;

    client.tokens().set(&pair).map_err(|e| match e {
        StoreError::IncompletePair => {
            log::warn!("Auth response carried an incomplete token pair");
            GENERIC_ERROR_MESSAGE.to_string()
        }
        e => {
            log::error!("Failed to persist tokens: {}", e);
            "Signed in, but the session could not be saved on this device.".to_string()
        }
    })
}

pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<(), String> {
    let response = client.login(email, password).await;
    store_session(client, response)
}

pub async fn register(
    client: &ApiClient,
    email: &str,
    password: &str,
    display_name: Option<&str>,
) -> Result<(), String> {
    let display_name = display_name.map(str::trim).filter(|name| !name.is_empty());
    let response = client.register(email, password, display_name).await;
    store_session(client, response)
}

/// Exchange the stored refresh token for a new pair. Without a stored
/// session this returns early and makes no request.
pub async fn refresh_session(client: &ApiClient) -> Result<(), String> {
    let refresh_token = client
        .tokens()
        .refresh_token()
        .ok_or_else(|| "Not signed in.".to_string())?;

    let response = client.refresh_token(&refresh_token).await;
    store_session(client, response)
}

pub fn logout(client: &ApiClient) -> Result<(), String> {
    client.tokens().clear().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_or_demo() {
        assert_eq!(api_key_or_demo(None), DEMO_API_KEY);
        assert_eq!(api_key_or_demo(Some("  ")), DEMO_API_KEY);
        assert_eq!(api_key_or_demo(Some("svd_abc")), "svd_abc");
    }

    #[test]
    fn test_message_or() {
        let error = ApiErrorBody::new("RATE_LIMIT_EXCEEDED", "Rate limit exceeded");
        assert_eq!(message_or(&error, "x"), "Rate limit exceeded");

        let blank = ApiErrorBody::new("X", " ");
        assert_eq!(message_or(&blank, "fallback"), "fallback");
    }
}
