//! In-process backend for local development and tests.
//!
//! DESIGN
//! ======
//! Mirrors the hosted service's observable behavior closely enough that the
//! services cannot tell the two apart: accounts keyed by email, opaque
//! session tokens that stop resolving once their ttl passes, rows with backend-assigned ids, storage objects keyed by
//! `(bucket, path)` with no silent overwrite, and signed URLs that embed the
//! expiry. Row-level policies are not modelled; every token sees every row.
//!
//! Signed URLs point at `{base_url}/storage/v1/object/sign/...` but nothing
//! serves them; they exist so pages render the same links in both modes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::config::DEFAULT_MEMORY_SESSION_TTL_SECS;
use super::query::Query;
use super::types::{AuthSession, AuthUser, Backend, BackendError, SignUpOutcome, Table};

struct Account {
    id: Uuid,
    password: String,
}

struct Session {
    user: AuthUser,
    expires_at: Instant,
}

struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, Session>,
    tables: HashMap<Table, Vec<Value>>,
    objects: HashMap<(String, String), StoredObject>,
}

pub struct MemoryBackend {
    base_url: String,
    session_ttl: Duration,
    inner: RwLock<Inner>,
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl MemoryBackend {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_ttl: Duration::from_secs(DEFAULT_MEMORY_SESSION_TTL_SECS),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Lifetime of issued access tokens.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Number of rows currently stored in `table`.
    #[cfg(test)]
    pub async fn row_count(&self, table: Table) -> usize {
        let inner = self.inner.read().await;
        inner.tables.get(&table).map_or(0, Vec::len)
    }

    /// Raw bytes and content type of a stored object.
    #[cfg(test)]
    pub async fn object(&self, bucket: &str, path: &str) -> Option<(String, Vec<u8>)> {
        let inner = self.inner.read().await;
        inner
            .objects
            .get(&(bucket.to_owned(), path.to_owned()))
            .map(|o| (o.content_type.clone(), o.bytes.clone()))
    }

    fn issue_session(&self, inner: &mut Inner, user: AuthUser) -> AuthSession {
        let now = Instant::now();
        inner.sessions.retain(|_, s| s.expires_at > now);

        let access_token = generate_token();
        let expires_at = now + self.session_ttl;
        inner
            .sessions
            .insert(access_token.clone(), Session { user: user.clone(), expires_at });
        AuthSession {
            access_token,
            refresh_token: Some(generate_token()),
            expires_in: Some(self.session_ttl.as_secs()),
            user,
        }
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, BackendError> {
        let key = email.trim().to_ascii_lowercase();
        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(&key) {
            return Err(BackendError::Conflict(format!("account {email}")));
        }
        let id = Uuid::new_v4();
        inner
            .accounts
            .insert(key.clone(), Account { id, password: password.to_owned() });
        let user = AuthUser { id, email: Some(key) };
        let session = self.issue_session(&mut inner, user.clone());
        Ok(SignUpOutcome { user, session: Some(session) })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let key = email.trim().to_ascii_lowercase();
        let mut inner = self.inner.write().await;
        let id = match inner.accounts.get(&key) {
            Some(account) if account.password == password => account.id,
            _ => return Err(BackendError::InvalidCredentials),
        };
        Ok(self.issue_session(&mut inner, AuthUser { id, email: Some(key) }))
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .get(access_token)
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.user.clone()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.write().await;
        inner.sessions.remove(access_token);
        Ok(())
    }

    async fn select(&self, _token: Option<&str>, table: Table, query: &Query) -> Result<Vec<Value>, BackendError> {
        let inner = self.inner.read().await;
        let rows = inner.tables.get(&table).map(Vec::as_slice).unwrap_or_default();
        Ok(rows
            .iter()
            .filter(|row| query.matches(row))
            .map(|row| query.project(row))
            .collect())
    }

    async fn insert(&self, _token: Option<&str>, table: Table, row: Value) -> Result<(), BackendError> {
        let Value::Object(mut fields) = row else {
            return Err(BackendError::Response { status: 400, body: "row must be a JSON object".into() });
        };
        if let Some(id_column) = table.id_column() {
            fields
                .entry(id_column)
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        }
        let mut inner = self.inner.write().await;
        inner
            .tables
            .entry(table)
            .or_default()
            .push(Value::Object(fields));
        Ok(())
    }

    async fn delete(&self, _token: Option<&str>, table: Table, query: &Query) -> Result<(), BackendError> {
        let mut inner = self.inner.write().await;
        if let Some(rows) = inner.tables.get_mut(&table) {
            rows.retain(|row| !query.matches(row));
        }
        Ok(())
    }

    async fn upload(
        &self,
        _token: Option<&str>,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let key = (bucket.to_owned(), path.to_owned());
        let mut inner = self.inner.write().await;
        if inner.objects.contains_key(&key) {
            return Err(BackendError::Conflict(format!("{bucket}/{path}")));
        }
        inner
            .objects
            .insert(key, StoredObject { content_type: content_type.to_owned(), bytes });
        Ok(path.to_owned())
    }

    async fn create_signed_url(
        &self,
        _token: Option<&str>,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, BackendError> {
        let inner = self.inner.read().await;
        if !inner
            .objects
            .contains_key(&(bucket.to_owned(), path.to_owned()))
        {
            return Err(BackendError::NotFound(format!("{bucket}/{path}")));
        }
        Ok(format!(
            "{}/storage/v1/object/sign/{bucket}/{path}?token={}&expires_in={expires_in_secs}",
            self.base_url,
            generate_token()
        ))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
