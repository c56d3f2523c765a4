use super::{
    ApiEnvelope, ApiErrorBody, ApiResponse, AuthTokenPair, CardData, LoginRequest,
    RefreshRequest, RegisterRequest, ScanRequest, ScanResult, INVALID_REQUEST,
};
use crate::auth::AuthTokenStore;
use crate::settings::ClientSettings;
use crate::text;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_HEADER: &str = "X-API-Key";

const NETWORK_ERROR_MESSAGE: &str = "Unable to reach Savdhaan. Check your connection and try again.";

#[derive(Error, Debug)]
enum ClientError {
    #[error("Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::InvalidRequest(e.to_string())
    }
}

impl From<ClientError> for ApiErrorBody {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::RequestError(e) if e.is_builder() => {
                ApiErrorBody::new(INVALID_REQUEST, e.to_string())
            }
            ClientError::RequestError(_) => ApiErrorBody::network(NETWORK_ERROR_MESSAGE),
            ClientError::InvalidRequest(message) => ApiErrorBody::new(INVALID_REQUEST, message),
            ClientError::Malformed(_) => ApiErrorBody::malformed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }
}

/// One-shot JSON client for the Savdhaan API. Every call yields an
/// [`ApiResponse`]; transport and decoding failures come back as error
/// bodies rather than `Err`.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<AuthTokenStore>,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings, tokens: Arc<AuthTokenStore>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: settings.base_url().to_string(),
            tokens,
        })
    }

    pub fn with_base_url(base_url: &str, tokens: Arc<AuthTokenStore>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<AuthTokenStore> {
        &self.tokens
    }

    /// Perform exactly one request against `{base_url}{path}`.
    ///
    /// `extra_headers` are merged in; the bearer credential from the token
    /// store is always applied on top of them when present.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        extra_headers: &[(&str, &str)],
    ) -> ApiResponse<T> {
        log::debug!("{} {}", method, path);

        match self.try_request(path, method.clone(), body, extra_headers).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("{} {} failed: {}", method, path, e);
                ApiResponse::Err(e.into())
            }
        }
    }

    async fn try_request<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        extra_headers: &[(&str, &str)],
    ) -> Result<ApiResponse<T>, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::InvalidRequest(format!("bad header name '{}'", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::InvalidRequest(format!("bad value for header '{}'", name)))?;
            headers.insert(name, value);
        }

        if let Some(token) = self.tokens.access_token() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ClientError::InvalidRequest("stored access token is not a valid header".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut request = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .headers(headers);
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let envelope: ApiEnvelope<T> = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Malformed(format!("HTTP {}: {}", status, e)))?;

        envelope.into_response().ok_or_else(|| {
            ClientError::Malformed(format!("HTTP {}: ok/data/error fields disagree", status))
        })
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: &B,
        extra_headers: &[(&str, &str)],
    ) -> ApiResponse<T> {
        match serde_json::to_value(body) {
            Ok(value) => self.request(path, method, Some(&value), extra_headers).await,
            Err(e) => ApiResponse::Err(ClientError::from(e).into()),
        }
    }

    // --- Auth ---

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> ApiResponse<AuthTokenPair> {
        let body = RegisterRequest {
            email,
            password,
            display_name,
        };
        self.send_json("/auth/register", Method::POST, &body, &[]).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResponse<AuthTokenPair> {
        let body = LoginRequest { email, password };
        self.send_json("/auth/login", Method::POST, &body, &[]).await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> ApiResponse<AuthTokenPair> {
        let body = RefreshRequest { refresh_token };
        self.send_json("/auth/refresh", Method::POST, &body, &[]).await
    }

    /// Browser redirect target for social login. Not a typed call.
    pub fn oauth_url(&self, provider: OAuthProvider) -> String {
        format!("{}/auth/{}", self.base_url, provider.as_str())
    }

    // --- Scan ---

    pub async fn scan_text(&self, content: &str, api_key: &str) -> ApiResponse<ScanResult> {
        let body = ScanRequest {
            content,
            content_type: "text",
        };
        self.send_json("/scan", Method::POST, &body, &[(API_KEY_HEADER, api_key)])
            .await
    }

    pub async fn get_scan(&self, scan_id: &str, api_key: &str) -> ApiResponse<ScanResult> {
        if !text::is_safe_identifier(scan_id) {
            return ApiResponse::Err(ApiErrorBody::new(INVALID_REQUEST, "Invalid scan id"));
        }
        self.request(
            &format!("/scan/{}", scan_id),
            Method::GET,
            None,
            &[(API_KEY_HEADER, api_key)],
        )
        .await
    }

    // --- Card ---

    pub async fn get_card(&self, short_id: &str) -> ApiResponse<CardData> {
        if !text::is_safe_identifier(short_id) {
            return ApiResponse::Err(ApiErrorBody::new(INVALID_REQUEST, "Invalid card id"));
        }
        self.request(&format!("/card/{}", short_id), Method::GET, None, &[])
            .await
    }
}
