//! Remote database HTTP client
//!
//! Provides a typed HTTP client for the remote record store's web service.
//! Handles authentication headers, endpoint construction, JSON bodies and the
//! translation of HTTP failures into [`RemoteError`] values.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use zonesync_core::config::RemoteConfig;
//! use zonesync_remote::client::RemoteClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RemoteConfig {
//!     container: "iCloud.org.example.books".to_string(),
//!     ..RemoteConfig::default()
//! };
//! let client = RemoteClient::new("api-token-here", &config)?;
//! let identity = zonesync_remote::identity::fetch_current_identity(&client).await?;
//! println!("Signed in as {identity}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::Context;
use reqwest::{header::HeaderMap, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use zonesync_core::config::RemoteConfig;
use zonesync_core::ports::RemoteError;

use crate::wire::map_server_error_code;

/// Default retry-after duration when the header is missing or unparseable
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Longest Retry-After (given as an HTTP date) that is honoured
const MAX_RETRY_AFTER_SECS: u64 = 3600;

/// Error body returned alongside non-success HTTP statuses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    server_error_code: Option<String>,
    reason: Option<String>,
}

// ============================================================================
// RemoteClient
// ============================================================================

/// HTTP client for the remote record store
///
/// Every request goes to `{base_url}/database/1/{container}/{environment}/private`
/// with the API token as bearer credentials. The client never retries:
/// throttling is reported as [`RemoteError::TooManyRequests`].
#[derive(Debug, Clone)]
pub struct RemoteClient {
    /// The underlying HTTP client
    client: Client,
    /// Private database URL all paths are appended to
    database_url: String,
    /// API token sent as bearer credentials
    api_token: String,
}

impl RemoteClient {
    /// Creates a client for the container described by `config`
    ///
    /// # Arguments
    /// * `api_token` - Token authenticating the signed-in account
    /// * `config` - Endpoint, container and timeout settings
    pub fn new(api_token: impl Into<String>, config: &RemoteConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let database_url = format!(
            "{}/database/1/{}/{}/private",
            config.base_url.trim_end_matches('/'),
            config.container,
            config.environment.as_str()
        );

        Ok(Self {
            client,
            database_url,
            api_token: api_token.into(),
        })
    }

    /// Creates a client rooted at an explicit database URL (useful for testing)
    ///
    /// # Arguments
    /// * `api_token` - Token authenticating the signed-in account
    /// * `database_url` - URL that request paths are appended to
    pub fn with_base_url(api_token: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            database_url: database_url.into(),
            api_token: api_token.into(),
        }
    }

    /// Updates the API token (e.g., after the host re-authenticates)
    pub fn set_api_token(&mut self, token: impl Into<String>) {
        self.api_token = token.into();
        debug!("Updated RemoteClient API token");
    }

    /// Returns a reference to the current API token
    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    /// Returns the private database URL requests are sent to
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - Path relative to the database URL (e.g., "/users/current")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.database_url, path);
        self.client.request(method, &url).bearer_auth(&self.api_token)
    }

    /// Sends a GET request and decodes the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        self.send(self.request(Method::GET, path), path).await
    }

    /// Sends a POST request with a JSON body and decodes the JSON response
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, path).json(body), path)
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, RemoteError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "Received response");

        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            warn!(path, error = %e, "Failed to decode response body");
            RemoteError::InvalidResponse(format!("{path}: {e}"))
        })
    }
}

// ============================================================================
// Error mapping
// ============================================================================

/// Classifies a transport-level reqwest failure
fn transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_decode() {
        RemoteError::InvalidResponse(error.to_string())
    } else {
        RemoteError::Network(error.to_string())
    }
}

/// Converts a non-success response into a [`RemoteError`]
///
/// A `serverErrorCode` in the body takes precedence over the HTTP status,
/// except for 429 where the `Retry-After` header is authoritative.
async fn error_from_response(response: Response) -> RemoteError {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return RemoteError::TooManyRequests {
            retry_after: retry_after_from_headers(&headers),
        };
    }

    if let Ok(ErrorBody {
        server_error_code: Some(code),
        reason,
    }) = serde_json::from_str::<ErrorBody>(&body)
    {
        return map_server_error_code(&code, reason.unwrap_or_default());
    }

    map_status(status, body)
}

/// Maps an HTTP status without a recognised error body onto [`RemoteError`]
pub(crate) fn map_status(status: StatusCode, body: String) -> RemoteError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        body
    };

    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(message),
        StatusCode::FORBIDDEN => RemoteError::Forbidden(message),
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        StatusCode::CONFLICT => RemoteError::Conflict { record_ids: vec![] },
        StatusCode::GONE => RemoteError::ChangeTokenExpired,
        StatusCode::PRECONDITION_FAILED => RemoteError::Conflict { record_ids: vec![] },
        StatusCode::TOO_MANY_REQUESTS => RemoteError::TooManyRequests {
            retry_after: DEFAULT_RETRY_AFTER,
        },
        s if s.is_server_error() => RemoteError::ServerError(message),
        _ => RemoteError::InvalidResponse(format!("unexpected status {status}: {message}")),
    }
}

fn retry_after_from_headers(headers: &HeaderMap) -> Duration {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

/// Parses a `Retry-After` header value into a [`Duration`]
///
/// Supports integer seconds and HTTP dates; falls back to `default` for
/// anything else, including dates in the past or too far in the future.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if target > now {
            if let Some(secs) = (target - now)
                .num_seconds()
                .try_into()
                .ok()
                .filter(|&s: &u64| s <= MAX_RETRY_AFTER_SECS)
            {
                return Duration::from_secs(secs);
            }
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
