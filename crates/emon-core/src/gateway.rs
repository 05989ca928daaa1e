//! HTTP gateway for the energy monitoring REST API.
//!
//! [`ApiGateway`] holds the API root, the separate token endpoint and an
//! optional token. When a token is present every resource request carries
//! `Authorization: Token <token>`; the token endpoint is always called
//! without it.
//!
//! # Example
//!
//! ```no_run
//! use emon_core::gateway::ApiGateway;
//! use emon_types::AlertFilter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = ApiGateway::new("http://127.0.0.1:8000/api", "http://127.0.0.1:8000/api-token-auth/")?;
//! let token = gateway.obtain_token("alice", "secret").await?;
//!
//! let signed = gateway.with_token(token);
//! for house in signed.houses().await? {
//!     println!("{}: {} sensors", house.name, house.sensors.len());
//! }
//! let unread = signed.alerts(&AlertFilter::all()).await?;
//! println!("{} alerts", unread.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use emon_types::{
    AdminHouse, Alert, AlertFilter, Credentials, HistoryPoint, House, HouseStatistics, LiveReading,
    NewAlert, NewHouse, Sensor, SensorThresholds, TokenResponse, UserProfile, UserSettings,
    UserSummary,
};

use crate::error::{Error, Result};

/// Default API root.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Default token endpoint. It lives outside the API root.
pub const DEFAULT_AUTH_URL: &str = "http://127.0.0.1:8000/api-token-auth/";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the monitoring API.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiGateway {
    client: Client,
    api_url: String,
    auth_url: String,
    token: Option<String>,
}

fn validate_url(url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            url
        )));
    }
    Ok(())
}

// ==========================================================================
// Construction
// ==========================================================================

impl ApiGateway {
    /// Create a gateway with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `api_url` - API root, e.g. `http://127.0.0.1:8000/api`
    /// * `auth_url` - token endpoint, e.g. `http://127.0.0.1:8000/api-token-auth/`
    pub fn new(api_url: &str, auth_url: &str) -> Result<Self> {
        Self::with_timeout(api_url, auth_url, DEFAULT_TIMEOUT)
    }

    /// Create a gateway with a custom per-request timeout.
    pub fn with_timeout(api_url: &str, auth_url: &str, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("HTTP client: {e}")))?;
        Self::with_client(api_url, auth_url, client)
    }

    /// Create a gateway around an existing reqwest Client.
    pub fn with_client(api_url: &str, auth_url: &str, client: Client) -> Result<Self> {
        // The API root is joined with paths that start with '/'.
        let api_url = api_url.trim_end_matches('/').to_string();
        validate_url(&api_url)?;
        // The token endpoint is used as given; the server expects its trailing slash.
        let auth_url = auth_url.to_string();
        validate_url(&auth_url)?;

        Ok(Self {
            client,
            api_url,
            auth_url,
            token: None,
        })
    }

    /// Copy of this gateway that signs resource requests with `token`.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Copy of this gateway without a token.
    #[must_use]
    pub fn unsigned(&self) -> Self {
        Self {
            token: None,
            ..self.clone()
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Whether resource requests carry a token.
    pub fn is_signed(&self) -> bool {
        self.token.is_some()
    }
}

// ==========================================================================
// Authentication and account
// ==========================================================================

impl ApiGateway {
    /// Exchange credentials for a token.
    ///
    /// This request is never signed, even on a gateway that holds a token.
    pub async fn obtain_token(&self, username: &str, password: &str) -> Result<String> {
        let url = self.auth_url.clone();
        debug!(%url, username, "requesting token");
        let request = self
            .client
            .post(&url)
            .json(&Credentials { username, password });
        let response: TokenResponse = self.send(&url, request).await?;
        Ok(response.token)
    }

    /// Profile of the user the token belongs to.
    pub async fn current_user(&self) -> Result<UserProfile> {
        self.get("/user/me/").await
    }

    /// Replace the user's settings; returns the stored resource.
    pub async fn save_settings(&self, settings: &UserSettings) -> Result<UserSettings> {
        settings.validate()?;
        self.put_json(&format!("/user/settings/{}/", settings.id), settings)
            .await
    }
}

// ==========================================================================
// Houses and sensors
// ==========================================================================

impl ApiGateway {
    /// Houses owned by the user, each with its sensors nested.
    pub async fn houses(&self) -> Result<Vec<House>> {
        self.get("/user/houses/").await
    }

    pub async fn house(&self, id: i64) -> Result<House> {
        self.get(&format!("/user/houses/{id}/")).await
    }

    /// Server-side comparisons, prediction and rankings for one house.
    pub async fn house_statistics(&self, id: i64) -> Result<HouseStatistics> {
        self.get(&format!("/user/houses/{id}/statistics/")).await
    }

    pub async fn sensors(&self) -> Result<Vec<Sensor>> {
        self.get("/user/sensors/").await
    }

    pub async fn sensor(&self, id: i64) -> Result<Sensor> {
        self.get(&format!("/user/sensors/{id}/")).await
    }

    /// Partial update of a sensor's alert thresholds.
    ///
    /// Unset thresholds are sent as `null`, which clears them.
    pub async fn update_thresholds(&self, id: i64, thresholds: &SensorThresholds) -> Result<Sensor> {
        self.send_json(Method::PATCH, &format!("/user/sensors/{id}/"), thresholds)
            .await
    }

    /// Most recent reading for a sensor.
    pub async fn live_reading(&self, sensor_id: i64) -> Result<LiveReading> {
        self.get(&format!("/user/sensor/{sensor_id}/live/")).await
    }

    /// Stored history for a sensor, oldest first.
    pub async fn sensor_history(&self, sensor_id: i64) -> Result<Vec<HistoryPoint>> {
        self.get(&format!("/user/sensor/{sensor_id}/data/")).await
    }
}

// ==========================================================================
// Alerts
// ==========================================================================

impl ApiGateway {
    /// Alerts matching `filter`. Unset filter fields are left out of the query.
    pub async fn alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>> {
        let url = self.url("/user/alerts/");
        let pairs = filter.query_pairs();
        debug!(%url, ?pairs, "GET");
        let request = self.signed(Method::GET, &url).query(&pairs);
        self.send(&url, request).await
    }

    pub async fn create_alert(&self, alert: &NewAlert) -> Result<Alert> {
        self.send_json(Method::POST, "/user/alerts/", alert).await
    }

    pub async fn mark_alert_read(&self, id: i64) -> Result<()> {
        self.post_action(&format!("/user/alerts/{id}/mark_read/"))
            .await
    }

    pub async fn mark_alert_resolved(&self, id: i64) -> Result<()> {
        self.post_action(&format!("/user/alerts/{id}/mark_resolved/"))
            .await
    }
}

// ==========================================================================
// Admin
// ==========================================================================

impl ApiGateway {
    pub async fn admin_houses(&self) -> Result<Vec<AdminHouse>> {
        self.get("/admin/houses/").await
    }

    /// Create a house and assign it to a user.
    pub async fn create_house(&self, house: &NewHouse) -> Result<AdminHouse> {
        self.send_json(Method::POST, "/admin/houses/", house).await
    }

    pub async fn admin_sensors(&self) -> Result<Vec<Sensor>> {
        self.get("/admin/sensors/").await
    }

    /// Users a house can be assigned to.
    pub async fn admin_users(&self) -> Result<Vec<UserSummary>> {
        self.get("/admin/users/").await
    }
}

// ==========================================================================
// Internal HTTP helpers
// ==========================================================================

impl ApiGateway {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn signed(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Token {token}")),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let request = self.signed(Method::GET, &url);
        self.send(&url, request).await
    }

    async fn put_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.send_json(Method::PUT, path, body).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, %method, "sending JSON");
        let request = self.signed(method, &url).json(body);
        self.send(&url, request).await
    }

    async fn post_action(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .signed(Method::POST, &url)
            .send()
            .await
            .map_err(|e| Error::network(url.clone(), e))?;
        // Action endpoints answer with a status blurb that nothing reads.
        Self::read_body(&url, response).await.map(drop)
    }

    async fn send<T: DeserializeOwned>(&self, url: &str, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::network(url, e))?;
        let body = Self::read_body(url, response).await?;
        serde_json::from_str(&body).map_err(|e| Error::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Body of a successful response, or the mapped error.
    async fn read_body(url: &str, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(url, e))?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(map_status(url, status, &body))
        }
    }
}

/// Map a non-success status and its body onto the error taxonomy.
pub(crate) fn map_status(url: &str, status: StatusCode, body: &str) -> Error {
    debug!(%url, status = status.as_u16(), "request failed");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized,
        StatusCode::NOT_FOUND => Error::NotFound {
            url: url.to_string(),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Error::Validation {
            status: status.as_u16(),
            message: server_message(body),
        },
        _ => Error::Api {
            status: status.as_u16(),
            message: server_message(body).unwrap_or_else(|| status.to_string()),
        },
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `message`, `detail` and `error` in that order, then falls back
/// to the first field error of a validation map.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["message", "detail", "error"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }
    value.as_object()?.iter().find_map(|(field, errors)| {
        let text = match errors {
            serde_json::Value::Array(items) => items.first()?.as_str()?,
            serde_json::Value::String(text) => text.as_str(),
            _ => return None,
        };
        if field == "non_field_errors" {
            Some(text.to_string())
        } else {
            Some(format!("{field}: {text}"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_creation() {
        let gateway = ApiGateway::new(DEFAULT_API_URL, DEFAULT_AUTH_URL).unwrap();
        assert_eq!(gateway.api_url(), "http://127.0.0.1:8000/api");
        assert_eq!(gateway.auth_url(), DEFAULT_AUTH_URL);
        assert!(!gateway.is_signed());
    }

    #[test]
    fn test_api_url_normalization() {
        let gateway = ApiGateway::new("https://energy.example/api/", DEFAULT_AUTH_URL).unwrap();
        assert_eq!(gateway.api_url(), "https://energy.example/api");
        assert_eq!(
            gateway.url("/user/me/"),
            "https://energy.example/api/user/me/"
        );
    }

    #[test]
    fn test_invalid_urls() {
        let err = ApiGateway::new("localhost:8000/api", DEFAULT_AUTH_URL).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        let err = ApiGateway::new(DEFAULT_API_URL, "ftp://x/").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ApiGateway::with_timeout(DEFAULT_API_URL, DEFAULT_AUTH_URL, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_with_token_does_not_touch_original() {
        let gateway = ApiGateway::new(DEFAULT_API_URL, DEFAULT_AUTH_URL).unwrap();
        let signed = gateway.with_token("abc");
        assert!(signed.is_signed());
        assert!(!gateway.is_signed());
        assert!(!signed.unsigned().is_signed());
    }

    #[test]
    fn test_status_mapping() {
        let url = "http://x/api/user/me/";
        assert!(matches!(
            map_status(url, StatusCode::UNAUTHORIZED, ""),
            Error::Unauthorized
        ));
        assert!(matches!(
            map_status(url, StatusCode::FORBIDDEN, r#"{"error": "Brak dostępu"}"#),
            Error::Unauthorized
        ));
        assert!(matches!(
            map_status(url, StatusCode::NOT_FOUND, ""),
            Error::NotFound { .. }
        ));
        match map_status(url, StatusCode::INTERNAL_SERVER_ERROR, "oops") {
            Error::Api { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("500"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validation_message_precedence() {
        let url = "http://x/api/admin/houses/";
        let err = map_status(
            url,
            StatusCode::BAD_REQUEST,
            r#"{"message": "Price too high", "detail": "ignored"}"#,
        );
        assert_eq!(err.user_message(), "Price too high");

        let err = map_status(url, StatusCode::BAD_REQUEST, r#"{"detail": "Bad input"}"#);
        assert_eq!(err.user_message(), "Bad input");

        let err = map_status(
            url,
            StatusCode::BAD_REQUEST,
            r#"{"name": ["This field is required."]}"#,
        );
        assert_eq!(err.user_message(), "name: This field is required.");

        let err = map_status(
            url,
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"non_field_errors": ["Duplicate house"]}"#,
        );
        assert_eq!(err.user_message(), "Duplicate house");
    }

    #[test]
    fn test_validation_without_message_uses_fallback() {
        let err = map_status("http://x/", StatusCode::BAD_REQUEST, "<html>bad</html>");
        assert!(matches!(err, Error::Validation { message: None, .. }));
        assert_eq!(err.user_message(), crate::error::GENERIC_FORM_ERROR);
    }
}
