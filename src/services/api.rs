//! REST client for the analytics backend
//!
//! `DashboardApi` is the seam the rest of the app talks to; `HttpApi` is the
//! reqwest implementation. Calls are blocking and are expected to run on a
//! worker thread (see `dispatcher`).

use crate::model::dataset::{DatasetDetail, DatasetId, DatasetRecord};
use crate::model::session::Session;
use crate::services::token_store::TokenStore;
use anyhow::Result;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single API call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server rejected our bearer token
    #[error("unauthorized")]
    Unauthorized,
    /// Transport failure or timeout
    #[error("network error: {0}")]
    Network(String),
    #[error("request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },
    /// 2xx response whose body did not have the expected shape
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("cannot read {path}: {reason}")]
    File { path: String, reason: String },
}

impl ApiError {
    /// Message for the user, preferring the server's `detail` or `error` field
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::RequestFailed { body, .. } => {
                server_error_message(body).unwrap_or_else(|| fallback.to_string())
            }
            _ => fallback.to_string(),
        }
    }
}

fn server_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

/// Remote operations offered by the backend
pub trait DashboardApi: Send + Sync {
    fn login(&self, username: &str, password: &str) -> Result<Session, ApiError>;
    fn register(&self, username: &str, password: &str) -> Result<(), ApiError>;
    fn upload(&self, path: &Path) -> Result<DatasetRecord, ApiError>;
    /// Newest first, as ordered by the server
    fn list_history(&self) -> Result<Vec<DatasetRecord>, ApiError>;
    fn fetch_summary(&self, id: DatasetId) -> Result<DatasetDetail, ApiError>;
    fn delete_dataset(&self, id: DatasetId) -> Result<(), ApiError>;
}

/// Whether a request carries the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Public,
    Bearer,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

/// reqwest-backed implementation of `DashboardApi`
pub struct HttpApi {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration, tokens: TokenStore) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            tokens,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send(&self, request: RequestBuilder, auth: Auth) -> Result<Response, ApiError> {
        let request = match (auth, self.tokens.access_token()) {
            (Auth::Bearer, Some(token)) => request.bearer_auth(token),
            _ => request,
        };

        let response = request
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(classify_failure(status, body, auth))
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, auth: Auth) -> Result<T, ApiError> {
        let response = self.send(request, auth)?;
        response.json::<T>().map_err(|e| {
            if e.is_timeout() {
                ApiError::Network(e.to_string())
            } else {
                ApiError::Decode(e.to_string())
            }
        })
    }
}

impl DashboardApi for HttpApi {
    fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let request = self
            .client
            .post(self.endpoint("token/"))
            .json(&Credentials { username, password });
        let pair: TokenPair = self.send_json(request, Auth::Public)?;
        Ok(Session {
            access: pair.access,
            refresh: pair.refresh,
        })
    }

    fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.endpoint("register/"))
            .json(&Credentials { username, password });
        self.send(request, Auth::Public)?;
        Ok(())
    }

    fn upload(&self, path: &Path) -> Result<DatasetRecord, ApiError> {
        let form = multipart::Form::new()
            .file("file", path)
            .map_err(|e| ApiError::File {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let request = self.client.post(self.endpoint("upload/")).multipart(form);
        self.send_json(request, Auth::Bearer)
    }

    fn list_history(&self) -> Result<Vec<DatasetRecord>, ApiError> {
        let request = self.client.get(self.endpoint("history/"));
        self.send_json(request, Auth::Bearer)
    }

    fn fetch_summary(&self, id: DatasetId) -> Result<DatasetDetail, ApiError> {
        let request = self.client.get(self.endpoint(&format!("summary/{}/", id)));
        self.send_json(request, Auth::Bearer)
    }

    fn delete_dataset(&self, id: DatasetId) -> Result<(), ApiError> {
        let request = self.client.delete(self.endpoint(&format!("summary/{}/", id)));
        self.send(request, Auth::Bearer)?;
        Ok(())
    }
}

/// Base URLs always end with exactly one slash so paths can be appended
fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim().trim_end_matches('/'))
}

/// Map a non-success status to an error. A 401 only means "session expired"
/// on bearer requests; on login it is an ordinary credential rejection.
fn classify_failure(status: StatusCode, body: String, auth: Auth) -> ApiError {
    if status == StatusCode::UNAUTHORIZED && auth == Auth::Bearer {
        ApiError::Unauthorized
    } else {
        ApiError::RequestFailed {
            status: status.as_u16(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(base, Duration::from_secs(1), TokenStore::at("/nonexistent/session.json")).unwrap()
    }

    #[test]
    fn test_endpoint_joining() {
        assert_eq!(
            api("http://localhost:8000/api").endpoint("history/"),
            "http://localhost:8000/api/history/"
        );
        assert_eq!(
            api("https://chem.example.com/backend/api/").endpoint("/summary/4/"),
            "https://chem.example.com/backend/api/summary/4/"
        );
    }

    #[test]
    fn test_unauthorized_only_for_bearer_calls() {
        assert_eq!(
            classify_failure(StatusCode::UNAUTHORIZED, String::new(), Auth::Bearer),
            ApiError::Unauthorized
        );
        assert_eq!(
            classify_failure(StatusCode::UNAUTHORIZED, "{}".to_string(), Auth::Public),
            ApiError::RequestFailed {
                status: 401,
                body: "{}".to_string()
            }
        );
        assert!(matches!(
            classify_failure(StatusCode::NOT_FOUND, String::new(), Auth::Bearer),
            ApiError::RequestFailed { status: 404, .. }
        ));
    }

    #[test]
    fn test_user_message_prefers_detail() {
        let err = ApiError::RequestFailed {
            status: 401,
            body: r#"{"detail": "No active account found with the given credentials"}"#.to_string(),
        };
        assert_eq!(
            err.user_message("Login failed."),
            "No active account found with the given credentials"
        );

        let err = ApiError::RequestFailed {
            status: 400,
            body: r#"{"error": "Username already exists"}"#.to_string(),
        };
        assert_eq!(err.user_message("Registration failed."), "Username already exists");
    }

    #[test]
    fn test_user_message_fallback() {
        let err = ApiError::RequestFailed {
            status: 500,
            body: "<html>oops</html>".to_string(),
        };
        assert_eq!(err.user_message("Login failed."), "Login failed.");
        assert_eq!(
            ApiError::Network("timed out".to_string()).user_message("Login failed."),
            "Login failed."
        );
    }

    #[test]
    fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is closed on CI machines
        let result = api("http://127.0.0.1:9/api/").list_history();
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
