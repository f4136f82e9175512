use crate::{
    AppState,
    auth::AuthUser,
    backend::BackendError,
    dispatch::{self, DispatchError, DispatchPolicy},
    gate,
    models::{
        DispatchResponse, LoginRequest, LoginResponse, NotificationRequest, Role, SessionInfo,
        StatusResponse,
    },
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

use crate::config::{AppConfig, Env};

// --- Cookie Construction ---

/// Builds the Set-Cookie value carrying a fresh session token. HTTP-only so
/// frontend script can never read it; Secure is added outside local development.
fn session_cookie(token: &str, config: &AppConfig) -> String {
    let secure = match config.env {
        Env::Local => "",
        Env::Production => "; Secure",
    };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
        gate::AUTH_COOKIE,
        token,
        secure
    )
}

/// Builds the Set-Cookie value that deletes the session cookie.
fn clear_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        gate::AUTH_COOKIE
    )
}

// --- Handlers ---

/// login
///
/// [Public Route] Exchanges credentials with the backend API and, on success,
/// establishes the browser session by setting the HTTP-only token cookie.
///
/// *Flow*: The credential check itself lives entirely in the backend; this
/// handler only relays the result and owns the cookie write. The response body
/// tells the frontend which dashboard to navigate to.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = LoginResponse),
        (status = 401, description = "Credentials rejected"),
        (status = 502, description = "Backend unreachable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    match state.backend.login(&payload.email, &payload.password).await {
        Ok(grant) => {
            let cookie = session_cookie(&grant.token, &state.config);
            let body = LoginResponse {
                success: true,
                role: grant.role,
                landing_path: grant.role.landing_path().to_string(),
            };
            Ok(([(header::SET_COOKIE, cookie)], Json(body)))
        }
        // The backend signals bad credentials with a client-error status.
        Err(BackendError::Status(code)) if (400..500).contains(&code) => {
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(error) => {
            tracing::error!(%error, "login relay failed");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

/// logout
///
/// [Public Route] Ends the browser session. The backend is notified on a
/// best-effort basis — even if it is unreachable, the cookie is cleared so the
/// browser's session ends either way.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session cleared", body = StatusResponse))
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = gate::cookie_token(&headers) {
        if let Err(error) = state.backend.logout(&token).await {
            tracing::warn!(%error, "backend logout failed, clearing cookie anyway");
        }
    }

    (
        [(header::SET_COOKIE, clear_cookie())],
        Json(StatusResponse { success: true }),
    )
}

/// get_session
///
/// [Authenticated Route] Reports the caller's role and landing path, resolved
/// fresh by the `AuthUser` extractor on this very request. The frontend uses
/// this to rehydrate navigation state after a reload.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current session", body = SessionInfo),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_session(AuthUser { role, .. }: AuthUser) -> Json<SessionInfo> {
    Json(SessionInfo {
        role,
        landing_path: role.landing_path().to_string(),
    })
}

/// dispatch_notifications
///
/// [Admin Route] The bulk notification entry point. Validates the job type,
/// snapshots the active subscribers from the backend, and sends one templated
/// email per subscriber through the mail transport, sequentially, collecting
/// per-recipient outcomes.
///
/// *RBAC*: Strict enforcement of the "admin" role before any work happens.
///
/// *Failure mapping*: an unknown job type is the caller's mistake (422); a
/// failed subscriber fetch means the backend let us down (502). Per-recipient
/// failures are not errors at this level — they come back inside a 200 body.
#[utoipa::path(
    post,
    path = "/api/admin/notifications",
    request_body = NotificationRequest,
    responses(
        (status = 200, description = "Batch completed", body = DispatchResponse),
        (status = 403, description = "Not an admin"),
        (status = 422, description = "Unknown notification type"),
        (status = 502, description = "Subscriber fetch failed")
    )
)]
pub async fn dispatch_notifications(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<NotificationRequest>,
) -> Result<Json<DispatchResponse>, StatusCode> {
    if role != Role::Admin {
        return Err(StatusCode::FORBIDDEN);
    }

    let policy = DispatchPolicy::from(&state.config);

    match dispatch::dispatch(
        state.backend.as_ref(),
        state.mailer.as_ref(),
        &policy,
        &payload,
    )
    .await
    {
        Ok(report) => Ok(Json(DispatchResponse::completed(report))),
        Err(DispatchError::UnknownKind(kind)) => {
            tracing::warn!(%kind, "dispatch rejected: unknown notification type");
            Err(StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(DispatchError::SubscriberFetch(error)) => {
            tracing::error!(%error, "dispatch aborted: subscriber fetch failed");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}
