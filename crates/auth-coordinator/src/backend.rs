//! Backend API contract and the reqwest-backed client.
//!
//! The backend owns login/signup credential checks, the authoritative user
//! profile, and server-side logout. [`HttpBackendClient`] talks to a JSON
//! REST backend; the bearer token for authenticated calls comes from the
//! credential cache.

use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use credential_cache::CredentialCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Backend-issued credential for provider token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialGrant {
    /// Token to exchange with the identity provider for a session.
    pub custom_token: String,
}

/// Backend-owned profile fields, independent of session validity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Any further profile fields the backend returns.
    #[serde(default, flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Black-box backend API collaborator.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Authenticate with email/password; returns a token for provider
    /// exchange.
    async fn login(&self, email: &str, password: &str) -> AuthResult<CredentialGrant>;

    /// Create an account; returns a token for provider exchange.
    async fn signup(&self, email: &str, password: &str) -> AuthResult<CredentialGrant>;

    /// Fetch the authoritative profile for the given subject.
    async fn get_profile(&self, uid: &str) -> AuthResult<ProfileFields>;

    /// Invalidate the backend session. Best-effort from the caller's view.
    async fn logout(&self) -> AuthResult<()>;
}

#[derive(Debug, Serialize)]
struct CredentialRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn extract_error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.or(parsed.message))
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// JSON REST implementation of [`BackendApi`].
pub struct HttpBackendClient {
    http_client: reqwest::Client,
    api_url: String,
    cache: Arc<CredentialCache>,
}

impl HttpBackendClient {
    /// Create a new backend client.
    ///
    /// # Arguments
    /// * `api_url` - Base URL of the backend API (e.g. `https://api.example.com`)
    /// * `cache` - Credential cache supplying the bearer token for
    ///   authenticated calls
    pub fn new(api_url: impl Into<String>, cache: Arc<CredentialCache>) -> AuthResult<Self> {
        let api_url = api_url.into();
        Url::parse(&api_url)?;

        Ok(Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    fn bearer(&self) -> Option<String> {
        match self.cache.access_token() {
            Ok(token) => token,
            Err(error) => {
                warn!(%error, "failed to read cached access token");
                None
            }
        }
    }

    async fn credential_request(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<CredentialGrant> {
        let url = self.endpoint(path);
        debug!(url = %url, email = %email, "sending credential request");

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&CredentialRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "credential request rejected");
            return Err(AuthError::Backend(extract_error_message(&body, status)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl BackendApi for HttpBackendClient {
    async fn login(&self, email: &str, password: &str) -> AuthResult<CredentialGrant> {
        self.credential_request("auth/login", email, password).await
    }

    async fn signup(&self, email: &str, password: &str) -> AuthResult<CredentialGrant> {
        self.credential_request("auth/signup", email, password)
            .await
    }

    async fn get_profile(&self, uid: &str) -> AuthResult<ProfileFields> {
        let url = self.endpoint(&format!("users/{}/profile", uid));
        debug!(url = %url, uid = %uid, "fetching profile");

        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "application/json");
        if let Some(token) = self.bearer() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::ProfileFetch(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, uid = %uid, "profile fetch rejected");
            return Err(AuthError::ProfileFetch(extract_error_message(
                &body, status,
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ProfileFetch(e.to_string()))
    }

    async fn logout(&self) -> AuthResult<()> {
        let url = self.endpoint("auth/logout");
        debug!(url = %url, "sending logout request");

        let mut request = self.http_client.post(&url);
        if let Some(token) = self.bearer() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Backend(extract_error_message(&body, status)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HttpBackendClient {
        HttpBackendClient::new(
            "https://api.example.com",
            Arc::new(CredentialCache::in_memory()),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let client = test_client();
        assert_eq!(
            client.endpoint("auth/login"),
            "https://api.example.com/auth/login"
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = HttpBackendClient::new(
            "https://api.example.com/",
            Arc::new(CredentialCache::in_memory()),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("auth/logout"),
            "https://api.example.com/auth/logout"
        );
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result =
            HttpBackendClient::new("not a url", Arc::new(CredentialCache::in_memory()));
        assert!(matches!(result, Err(AuthError::InvalidUrl(_))));
    }

    #[test]
    fn test_extract_error_message_from_error_field() {
        let status = reqwest::StatusCode::UNAUTHORIZED;
        let message = extract_error_message(r#"{"error":"invalid credentials"}"#, status);
        assert_eq!(message, "invalid credentials");
    }

    #[test]
    fn test_extract_error_message_from_message_field() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        let message = extract_error_message(r#"{"message":"email already taken"}"#, status);
        assert_eq!(message, "email already taken");
    }

    #[test]
    fn test_extract_error_message_falls_back_to_status() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        let message = extract_error_message("<html>oops</html>", status);
        assert_eq!(message, "HTTP 500 Internal Server Error");
    }

    #[test]
    fn test_credential_grant_deserialization() {
        let grant: CredentialGrant =
            serde_json::from_str(r#"{"custom_token":"tok-1"}"#).unwrap();
        assert_eq!(grant.custom_token, "tok-1");
    }

    #[test]
    fn test_profile_fields_capture_extra_fields() {
        let profile: ProfileFields = serde_json::from_str(
            r#"{"email":"a@x.com","display_name":"Ada","plan":"pro","teams":["core"]}"#,
        )
        .unwrap();
        assert_eq!(profile.email.as_deref(), Some("a@x.com"));
        assert_eq!(profile.display_name.as_deref(), Some("Ada"));
        assert_eq!(profile.extra.get("plan"), Some(&serde_json::json!("pro")));
        assert_eq!(
            profile.extra.get("teams"),
            Some(&serde_json::json!(["core"]))
        );
    }
}
