//! Backend configuration parsed from environment variables.

use super::types::BackendError;

pub const DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MEMORY_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_MEMORY_SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Supabase,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Supabase { url: String, anon_key: String, timeouts: BackendTimeouts },
    Memory { base_url: String, session_ttl_secs: u64 },
}

impl BackendConfig {
    /// Build typed backend config from environment variables.
    ///
    /// - `MEDLINK_BACKEND`: `supabase` (default) or `memory`
    ///
    /// For `supabase`, required:
    /// - `SUPABASE_URL` (project URL, trailing slash ignored)
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `BACKEND_REQUEST_TIMEOUT_SECS`: default 30
    /// - `BACKEND_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// For `memory`, optional `MEMORY_BACKEND_BASE_URL` (used to build
    /// signed URLs), default `http://localhost:3000`, and
    /// `MEMORY_SESSION_TTL_SECS`, default 3600.
    pub fn from_env() -> Result<Self, BackendError> {
        match parse_kind(std::env::var("MEDLINK_BACKEND").ok().as_deref())? {
            BackendKind::Supabase => {
                let url = required("SUPABASE_URL")?
                    .trim_end_matches('/')
                    .to_string();
                let anon_key = required("SUPABASE_ANON_KEY")?;
                let timeouts = BackendTimeouts {
                    request_secs: env_parse_u64("BACKEND_REQUEST_TIMEOUT_SECS", DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS),
                    connect_secs: env_parse_u64("BACKEND_CONNECT_TIMEOUT_SECS", DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS),
                };
                Ok(Self::Supabase { url, anon_key, timeouts })
            }
            BackendKind::Memory => {
                let base_url = std::env::var("MEMORY_BACKEND_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_MEMORY_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string();
                let session_ttl_secs = env_parse_u64("MEMORY_SESSION_TTL_SECS", DEFAULT_MEMORY_SESSION_TTL_SECS);
                Ok(Self::Memory { base_url, session_ttl_secs })
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Supabase { .. } => BackendKind::Supabase,
            Self::Memory { .. } => BackendKind::Memory,
        }
    }
}

fn required(key: &str) -> Result<String, BackendError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| BackendError::MissingEnv { var: key.into() })
}

pub(crate) fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_kind(raw: Option<&str>) -> Result<BackendKind, BackendError> {
    match raw.unwrap_or("supabase") {
        "supabase" => Ok(BackendKind::Supabase),
        "memory" => Ok(BackendKind::Memory),
        other => Err(BackendError::ConfigParse(format!("unknown MEDLINK_BACKEND: {other}"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
