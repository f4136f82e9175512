use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};

use crate::backend::BackendState;
use crate::gate;
use crate::models::Role;

/// AuthUser
///
/// The resolved identity of an authenticated API request: the opaque session
/// token it presented and the role the backend reported for it. This is the
/// second layer of defense behind the Access Gate — the gate deliberately
/// checks token presence only, so actual validation happens here, on the
/// first call that needs it.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The opaque bearer token, kept so handlers can forward it to the backend
    /// (e.g. logout). Never decoded locally.
    pub token: String,
    /// The role resolved by the backend for this request. Fetched fresh every
    /// time; nothing is cached between requests.
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. The token is taken from the
/// session cookie first, falling back to a Bearer Authorization header for
/// non-browser API clients. The role is resolved by a backend round trip —
/// this gateway holds no signing secret and never validates tokens itself.
///
/// Rejection: Returns StatusCode::UNAUTHORIZED (401) on any failure, including
/// backend unreachability. API callers get a status, not a redirect; redirects
/// are the gate's business and only apply to page navigation.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the backend client from the app state.
    BackendState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let backend = BackendState::from_ref(state);

        let token = gate::cookie_token(&parts.headers)
            .or_else(|| bearer_token(parts))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let role = backend
            .resolve_role(&token)
            .await
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser { token, role })
    }
}

/// Extracts a token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}
