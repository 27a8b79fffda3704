//! Account service: sign-up, sign-in, sign-out.
//!
//! Credentials belong to the backend's auth service. Each account also gets
//! a row in exactly one role table (`doctors` or `patients`) keyed by the
//! auth user id; that row is what the guard checks.
//!
//! ERROR HANDLING
//! ==============
//! Sign-up is two writes with no transaction between them. If the role row
//! insert fails after the auth account was created, the account is left
//! without a role (it can sign in to the auth service but passes no guard).
//! The failure is logged with the user id and returned; nothing is undone.

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::guard::Role;
use super::password;
use crate::backend::{self, AuthSession, Backend, BackendError, NewDoctor, NewPatient, Query, Table};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid sign-up form: {0}")]
    Invalid(String),
    #[error("no doctor or patient account for {0}")]
    UnknownAccount(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Sign-up form as posted from the landing page.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpForm {
    pub role: Role,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub specialty: Option<String>,
}

/// Outcome of a sign-up. `session` is `None` when the backend wants the
/// address confirmed before the first sign-in.
#[derive(Debug, Clone)]
pub struct SignUpResult {
    pub role: Role,
    pub session: Option<AuthSession>,
}

#[derive(Debug, Clone)]
pub struct SignInResult {
    pub role: Role,
    pub session: AuthSession,
}

/// Trim and lowercase; role tables are matched on the exact stored text.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Create an auth account plus its role row.
///
/// # Errors
///
/// [`AccountError::Invalid`] for a bad form, [`AccountError::Backend`] for
/// a rejected account (e.g. [`BackendError::Conflict`]) or a failed insert.
pub async fn sign_up(backend: &dyn Backend, mut form: SignUpForm) -> Result<SignUpResult, AccountError> {
    form.name = form.name.trim().to_owned();
    form.email = normalize_email(&form.email);
    let specialty = form
        .specialty
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_owned();

    form.validate()
        .map_err(|e| AccountError::Invalid(validation_message(&e)))?;
    if form.role == Role::Doctor && specialty.is_empty() {
        return Err(AccountError::Invalid("specialty is required for doctors".into()));
    }

    let outcome = backend.sign_up(&form.email, &form.password).await?;
    let passwordhash = password::hash_password(&form.password).map_err(|e| AccountError::Hash(e.to_string()))?;
    let token = outcome.session.as_ref().map(|s| s.access_token.as_str());

    let inserted = match form.role {
        Role::Doctor => {
            let row = NewDoctor { uid: outcome.user.id, name: form.name, email: form.email.clone(), passwordhash, specialty };
            backend::insert_row(backend, token, Table::Doctors, &row).await
        }
        Role::Patient => {
            let row = NewPatient { uid: outcome.user.id, name: form.name, email: form.email.clone(), passwordhash };
            backend::insert_row(backend, token, Table::Patients, &row).await
        }
    };
    if let Err(e) = inserted {
        warn!(user_id = %outcome.user.id, role = form.role.as_str(), error = %e, "auth account created without role row");
        return Err(e.into());
    }

    info!(user_id = %outcome.user.id, role = form.role.as_str(), confirmed = outcome.session.is_some(), "account created");
    Ok(SignUpResult { role: form.role, session: outcome.session })
}

/// Sign in an existing doctor or patient.
///
/// The role tables are consulted first so addresses with no role row never
/// reach the auth service. An address present in both tables signs in as a
/// doctor.
///
/// # Errors
///
/// [`AccountError::UnknownAccount`] if neither table has the address,
/// [`AccountError::Backend`] with [`BackendError::InvalidCredentials`] for a
/// wrong password.
pub async fn sign_in(backend: &dyn Backend, email: &str, password: &str) -> Result<SignInResult, AccountError> {
    let email = normalize_email(email);
    let by_email = Query::new("uid").eq("email", &email);
    let (doctors, patients) = futures::try_join!(
        backend.select(None, Table::Doctors, &by_email),
        backend.select(None, Table::Patients, &by_email),
    )?;

    let role = if !doctors.is_empty() {
        Role::Doctor
    } else if !patients.is_empty() {
        Role::Patient
    } else {
        return Err(AccountError::UnknownAccount(email));
    };

    let session = backend.sign_in_with_password(&email, password).await?;
    info!(user_id = %session.user.id, role = role.as_str(), "signed in");
    Ok(SignInResult { role, session })
}

/// Revoke the session behind `access_token`.
///
/// # Errors
///
/// Returns the backend error; callers log it and clear the cookie anyway.
pub async fn sign_out(backend: &dyn Backend, access_token: &str) -> Result<(), AccountError> {
    backend.sign_out(access_token).await?;
    Ok(())
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
