//! Supabase client: auth (GoTrue), rows (PostgREST), and storage.
//!
//! Thin HTTP wrapper over the hosted project's REST surface. Every request
//! carries the project's public key in `apikey`; the `Authorization` bearer
//! is the caller's access token when one exists so row-level policies see
//! the signed-in account. Response parsing lives in pure functions for
//! testability.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Url};
use serde::Deserialize;

use super::config::BackendTimeouts;
use super::query::Query;
use super::types::{AuthSession, AuthUser, Backend, BackendError, SignUpOutcome, Table};

// =============================================================================
// CLIENT
// =============================================================================

pub struct SupabaseClient {
    http: reqwest::Client,
    url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Build a client for the project at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to build.
    pub fn new(url: String, anon_key: String, timeouts: BackendTimeouts) -> Result<Self, BackendError> {
        Url::parse(&url).map_err(|e| BackendError::ConfigParse(format!("invalid SUPABASE_URL: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url, anon_key })
    }

    /// Build `{url}/{prefix...}/{path...}` with each segment percent-encoded.
    fn endpoint(&self, prefix: &[&str], path: &str) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.url).map_err(|e| BackendError::ConfigParse(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| BackendError::ConfigParse("SUPABASE_URL cannot be a base".into()))?;
            segments.pop_if_empty();
            segments.extend(prefix);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    async fn send(builder: RequestBuilder) -> Result<(u16, String), BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait::async_trait]
impl Backend for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, BackendError> {
        let url = self.endpoint(&["auth", "v1", "signup"], "")?;
        let builder = self
            .request(Method::POST, url, None)
            .json(&serde_json::json!({ "email": email, "password": password }));
        let (status, body) = Self::send(builder).await?;
        classify_signup_status(status, &body)?;
        parse_signup(&body)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint(&["auth", "v1", "token"], "")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let builder = self
            .request(Method::POST, url, None)
            .json(&serde_json::json!({ "email": email, "password": password }));
        let (status, body) = Self::send(builder).await?;
        if status == 400 || status == 401 {
            return Err(BackendError::InvalidCredentials);
        }
        classify_status(status, &body)?;
        parse_session(&body)
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        let url = self.endpoint(&["auth", "v1", "user"], "")?;
        let (status, body) = Self::send(self.request(Method::GET, url, Some(access_token))).await?;
        if status == 401 || status == 403 {
            return Ok(None);
        }
        classify_status(status, &body)?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&["auth", "v1", "logout"], "")?;
        let (status, body) = Self::send(self.request(Method::POST, url, Some(access_token))).await?;
        // An already-expired token has nothing left to revoke.
        if status == 401 || status == 403 {
            return Ok(());
        }
        classify_status(status, &body)
    }

    async fn select(
        &self,
        token: Option<&str>,
        table: Table,
        query: &Query,
    ) -> Result<Vec<serde_json::Value>, BackendError> {
        let url = self.endpoint(&["rest", "v1", table.name()], "")?;
        let builder = self
            .request(Method::GET, url, token)
            .query(&query.to_params());
        let (status, body) = Self::send(builder).await?;
        classify_status(status, &body)?;
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn insert(&self, token: Option<&str>, table: Table, row: serde_json::Value) -> Result<(), BackendError> {
        let url = self.endpoint(&["rest", "v1", table.name()], "")?;
        let builder = self
            .request(Method::POST, url, token)
            .header("Prefer", "return=minimal")
            .json(&row);
        let (status, body) = Self::send(builder).await?;
        classify_status(status, &body)
    }

    async fn delete(&self, token: Option<&str>, table: Table, query: &Query) -> Result<(), BackendError> {
        let url = self.endpoint(&["rest", "v1", table.name()], "")?;
        let builder = self
            .request(Method::DELETE, url, token)
            .query(&query.filter_params());
        let (status, body) = Self::send(builder).await?;
        classify_status(status, &body)
    }

    async fn upload(
        &self,
        token: Option<&str>,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let url = self.endpoint(&["storage", "v1", "object", bucket], path)?;
        let builder = self
            .request(Method::POST, url, token)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        let (status, body) = Self::send(builder).await?;
        classify_status(status, &body)?;
        Ok(path.to_owned())
    }

    async fn create_signed_url(
        &self,
        token: Option<&str>,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, BackendError> {
        let url = self.endpoint(&["storage", "v1", "object", "sign", bucket], path)?;
        let builder = self
            .request(Method::POST, url, token)
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }));
        let (status, body) = Self::send(builder).await?;
        classify_status(status, &body)?;
        parse_signed_url(&self.url, &body)
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Map a response status to `Ok(())` or the matching error.
///
/// Storage reports duplicates as a 400 whose body names the `Duplicate`
/// error, so the body is inspected as well as the status.
pub(crate) fn classify_status(status: u16, body: &str) -> Result<(), BackendError> {
    match status {
        200..=299 => Ok(()),
        409 => Err(BackendError::Conflict(body.to_owned())),
        400 if body.contains("\"Duplicate\"") || body.contains("already exists") => {
            Err(BackendError::Conflict(body.to_owned()))
        }
        404 => Err(BackendError::NotFound(body.to_owned())),
        _ => Err(BackendError::Response { status, body: body.to_owned() }),
    }
}

/// GoTrue error body. Newer servers send `error_code` next to a numeric
/// `code`; older ones put the string code in `code`.
#[derive(Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

const EXISTING_ACCOUNT_CODES: &[&str] = &["user_already_exists", "email_exists"];

/// Like [`classify_status`], but only an auth error that names an existing
/// account becomes [`BackendError::Conflict`]. Weak passwords, disabled
/// signups and bad emails come back as 4xx too and keep their status.
pub(crate) fn classify_signup_status(status: u16, body: &str) -> Result<(), BackendError> {
    if (400..500).contains(&status) {
        if let Ok(err) = serde_json::from_str::<AuthErrorBody>(body) {
            let code_matches = err
                .error_code
                .as_deref()
                .or_else(|| err.code.as_ref().and_then(serde_json::Value::as_str))
                .is_some_and(|code| EXISTING_ACCOUNT_CODES.contains(&code));
            let msg_matches = err
                .msg
                .as_deref()
                .or(err.message.as_deref())
                .is_some_and(|msg| msg.to_ascii_lowercase().contains("already registered"));
            if code_matches || msg_matches {
                return Err(BackendError::Conflict(body.to_owned()));
            }
        }
        if status != 409 {
            return Err(BackendError::Response { status, body: body.to_owned() });
        }
    }
    classify_status(status, body)
}

pub(crate) fn parse_session(body: &str) -> Result<AuthSession, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Sign-up returns a full session when addresses are auto-confirmed, and the
/// bare user (or `{ user, session: null }`) when confirmation is pending.
pub(crate) fn parse_signup(body: &str) -> Result<SignUpOutcome, BackendError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;

    if value.get("access_token").is_some() {
        let session: AuthSession = serde_json::from_value(value).map_err(|e| BackendError::Parse(e.to_string()))?;
        return Ok(SignUpOutcome { user: session.user.clone(), session: Some(session) });
    }

    let user_value = value.get("user").cloned().unwrap_or(value);
    let user: AuthUser = serde_json::from_value(user_value).map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(SignUpOutcome { user, session: None })
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

/// The storage service answers with a path relative to `/storage/v1`.
pub(crate) fn parse_signed_url(base_url: &str, body: &str) -> Result<String, BackendError> {
    let resp: SignedUrlResponse = serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;
    if resp.signed_url.starts_with("http://") || resp.signed_url.starts_with("https://") {
        return Ok(resp.signed_url);
    }
    let base = base_url.trim_end_matches('/');
    let relative = resp.signed_url.trim_start_matches('/');
    Ok(format!("{base}/storage/v1/{relative}"))
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
