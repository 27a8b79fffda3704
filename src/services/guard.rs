//! Role-gated access guard.
//!
//! Every protected page runs the same sequence before rendering: resolve
//! the session token to an account, look the account up in both role
//! tables, and admit the caller only if the required role row exists.
//! Rejections carry no detail to the visitor; routes turn all of them into
//! a redirect to the landing page.

use tracing::{error, warn};
use uuid::Uuid;

use crate::backend::{self, AuthUser, Backend, BackendError, Doctor, Patient, Query, Table};

/// Account roles, one per role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Patient => "patient",
        }
    }

    /// Landing page for a freshly signed-in account of this role.
    #[must_use]
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Self::Doctor => "/doctor/dashboard",
            Self::Patient => "/patient/dashboard",
        }
    }
}

/// An admitted request: the account, its token, and its role rows.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: AuthUser,
    pub access_token: String,
    pub doctor: Option<Doctor>,
    pub patient: Option<Patient>,
}

impl Caller {
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        Some(self.access_token.as_str())
    }

    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        match role {
            Role::Doctor => self.doctor.is_some(),
            Role::Patient => self.patient.is_some(),
        }
    }

    #[must_use]
    pub fn roles(&self) -> Vec<Role> {
        [Role::Doctor, Role::Patient]
            .into_iter()
            .filter(|r| self.has_role(*r))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GuardRejection {
    #[error("no valid session")]
    Unauthenticated,
    #[error("account {user_id} lacks the {} role", role.as_str())]
    Forbidden { user_id: Uuid, role: Role },
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Resolve `token` to a caller, without checking any role.
///
/// # Errors
///
/// [`GuardRejection::Unauthenticated`] for a missing or dead token,
/// [`GuardRejection::Backend`] if a lookup fails.
pub async fn resolve(backend: &dyn Backend, token: Option<&str>) -> Result<Caller, GuardRejection> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Err(GuardRejection::Unauthenticated);
    };
    let user = backend
        .get_user(token)
        .await?
        .ok_or(GuardRejection::Unauthenticated)?;

    let by_uid = Query::all().eq("uid", user.id);
    let (doctors, patients) = futures::try_join!(
        backend::select_rows::<Doctor>(backend, Some(token), Table::Doctors, &by_uid),
        backend::select_rows::<Patient>(backend, Some(token), Table::Patients, &by_uid),
    )?;

    Ok(Caller {
        user,
        access_token: token.to_owned(),
        doctor: doctors.into_iter().next(),
        patient: patients.into_iter().next(),
    })
}

/// Resolve `token` and require `role`.
///
/// # Errors
///
/// As [`resolve`], plus [`GuardRejection::Forbidden`] when the account has
/// no row in the required role table.
pub async fn authorize(backend: &dyn Backend, token: Option<&str>, role: Role) -> Result<Caller, GuardRejection> {
    let caller = resolve(backend, token).await?;
    if !caller.has_role(role) {
        return Err(GuardRejection::Forbidden { user_id: caller.user.id, role });
    }
    Ok(caller)
}

/// Log a rejection at a level matching its cause.
pub fn log_rejection(path: &str, rejection: &GuardRejection) {
    match rejection {
        GuardRejection::Unauthenticated => {}
        GuardRejection::Forbidden { .. } => warn!(%path, error = %rejection, "guard rejected caller"),
        GuardRejection::Backend(e) => error!(%path, error = %e, retryable = e.retryable(), "guard lookup failed"),
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
