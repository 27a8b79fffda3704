//! Auth routes: landing page, sign-in/up/out, session cookie, role guards.

use axum::extract::{FromRef, FromRequestParts, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use super::StatusQuery;
use crate::backend::{AuthSession, BackendError, Doctor, Patient};
use crate::pages::{self, Notice};
use crate::services::account::{self, AccountError, SignUpForm};
use crate::services::guard::{self, Caller, GuardRejection, Role};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn cookie_secure() -> bool {
    if let Some(value) = env_bool("COOKIE_SECURE") {
        return value;
    }

    std::env::var("PUBLIC_URL")
        .map(|url| url.starts_with("https://"))
        .unwrap_or(false)
}

fn session_cookie(session: &AuthSession, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((COOKIE_NAME, session.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure);
    if let Some(secs) = session.expires_in {
        cookie = cookie.max_age(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
    }
    cookie.build()
}

fn cleared_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Raw session cookie value, if any. Never rejects.
pub struct SessionToken(pub Option<String>);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(COOKIE_NAME)
            .map(Cookie::value)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        Ok(Self(token))
    }
}

async fn guarded<S>(parts: &mut Parts, state: &S, role: Role) -> Result<Caller, Redirect>
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    let SessionToken(token) = SessionToken::from_request_parts(parts, state)
        .await
        .unwrap_or(SessionToken(None));
    let app_state = AppState::from_ref(state);
    guard::authorize(app_state.backend.as_ref(), token.as_deref(), role)
        .await
        .map_err(|rejection| {
            guard::log_rejection(parts.uri.path(), &rejection);
            Redirect::to("/")
        })
}

/// A caller holding the doctor role. Anyone else is redirected to `/`.
pub struct DoctorSession {
    pub caller: Caller,
    pub doctor: Doctor,
}

impl DoctorSession {
    pub fn token(&self) -> Option<&str> {
        self.caller.token()
    }
}

impl<S> FromRequestParts<S> for DoctorSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = guarded(parts, state, Role::Doctor).await?;
        let Some(doctor) = caller.doctor.clone() else {
            return Err(Redirect::to("/"));
        };
        Ok(Self { caller, doctor })
    }
}

/// A caller holding the patient role. Anyone else is redirected to `/`.
pub struct PatientSession {
    pub caller: Caller,
    pub patient: Patient,
}

impl PatientSession {
    pub fn token(&self) -> Option<&str> {
        self.caller.token()
    }
}

impl<S> FromRequestParts<S> for PatientSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = guarded(parts, state, Role::Patient).await?;
        let Some(patient) = caller.patient.clone() else {
            return Err(Redirect::to("/"));
        };
        Ok(Self { caller, patient })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /`: sign-in and sign-up forms.
pub async fn landing(Query(query): Query<StatusQuery>) -> Html<String> {
    Html(pages::landing(query.notice()))
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

/// `POST /auth/login`: sign in, set cookie, redirect to the role dashboard.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Form(form): Form<LoginForm>) -> Response {
    match account::sign_in(state.backend.as_ref(), &form.email, &form.password).await {
        Ok(signed_in) => {
            let jar = jar.add(session_cookie(&signed_in.session, state.settings.cookie_secure));
            (jar, Redirect::to(signed_in.role.dashboard_path())).into_response()
        }
        Err(AccountError::UnknownAccount(_)) => Redirect::to(&Notice::UnknownAccount.redirect_target("/")).into_response(),
        Err(AccountError::Backend(BackendError::InvalidCredentials)) => {
            Redirect::to(&Notice::SignInFailed.redirect_target("/")).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "sign-in failed");
            Redirect::to(&Notice::SignInFailed.redirect_target("/")).into_response()
        }
    }
}

/// `POST /auth/signup`: create the account and its role row. Sets the
/// cookie when the backend issued a session right away.
pub async fn signup(State(state): State<AppState>, jar: CookieJar, Form(form): Form<SignUpForm>) -> Response {
    match account::sign_up(state.backend.as_ref(), form).await {
        Ok(result) => match result.session {
            Some(session) => {
                let jar = jar.add(session_cookie(&session, state.settings.cookie_secure));
                (jar, Redirect::to(result.role.dashboard_path())).into_response()
            }
            None => Redirect::to(&Notice::ConfirmEmail.redirect_target("/")).into_response(),
        },
        Err(e) => {
            let notice = match &e {
                AccountError::Invalid(_) => Notice::SignUpInvalid,
                AccountError::Backend(BackendError::Conflict(_)) => Notice::AccountExists,
                _ => Notice::SignUpFailed,
            };
            tracing::warn!(error = %e, "sign-up rejected");
            Redirect::to(&notice.redirect_target("/")).into_response()
        }
    }
}

/// `POST /auth/logout`: revoke the session, clear cookie, back to `/`.
pub async fn logout(State(state): State<AppState>, SessionToken(token): SessionToken) -> impl IntoResponse {
    if let Some(token) = token {
        if let Err(e) = account::sign_out(state.backend.as_ref(), &token).await {
            tracing::warn!(error = %e, "sign-out failed");
        }
    }

    let jar = CookieJar::new().add(cleared_cookie(state.settings.cookie_secure));
    (jar, Redirect::to(&Notice::SignedOut.redirect_target("/")))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub roles: Vec<Role>,
}

/// `GET /api/me`: the signed-in account and its roles.
pub async fn me(State(state): State<AppState>, SessionToken(token): SessionToken) -> Response {
    match guard::resolve(state.backend.as_ref(), token.as_deref()).await {
        Ok(caller) => {
            let roles = caller.roles();
            Json(MeResponse { id: caller.user.id, email: caller.user.email, roles }).into_response()
        }
        Err(rejection) => rejection_to_status(&rejection).into_response(),
    }
}

fn rejection_to_status(rejection: &GuardRejection) -> StatusCode {
    match rejection {
        GuardRejection::Unauthenticated => StatusCode::UNAUTHORIZED,
        GuardRejection::Forbidden { .. } => StatusCode::FORBIDDEN,
        GuardRejection::Backend(e) => {
            tracing::error!(error = %e, "session lookup failed");
            StatusCode::BAD_GATEWAY
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
