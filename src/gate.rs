use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::backend::BackendApi;
use crate::models::Role;

// --- Path Policy ---

/// Name of the HTTP-only session cookie. The gate only ever reads it; it is
/// written by the login handler and cleared by the logout handler.
pub const AUTH_COOKIE: &str = "auth_token";

/// The login page path. Requests landing here with a token are bounced to the
/// caller's role home instead.
pub const LOGIN_PATH: &str = "/login";

/// The registration page path. Same token-present handling as the login path.
pub const REGISTER_PATH: &str = "/register";

/// Exact-match set of public page paths. Everything reachable without a
/// session: the content pages, the auth pages, and the legal pages.
const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/announcements",
    "/news",
    "/services",
    "/about",
    "/contact",
    "/cookies",
    "/terms",
    "/privacy",
];

/// File extensions served as static assets regardless of location.
const STATIC_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "map", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif", "woff",
    "woff2", "ttf", "txt", "xml",
];

/// PWA-specific filenames classified as assets regardless of extension rules.
const PWA_FILES: &[&str] = &[
    "/manifest.json",
    "/manifest.webmanifest",
    "/sw.js",
    "/service-worker.js",
];

// --- Classification ---

/// RouteClass
///
/// The four disjoint request categories plus the PWA-file special case. Derived
/// purely from the path string, recomputed per request, never cached. The
/// default bucket is `Protected`, which makes classification total: no path
/// string is ever unclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Api,
    StaticAsset,
    PwaFile,
    Protected,
}

/// classify
///
/// Total classification function over request paths. Match order matters:
/// API prefix first, then the PWA filenames (sw.js would otherwise fall into
/// the extension bucket), then asset prefix/extension, then the public set,
/// and finally the protected default.
pub fn classify(path: &str) -> RouteClass {
    if path == "/api" || path.starts_with("/api/") {
        return RouteClass::Api;
    }

    if is_pwa_file(path) {
        return RouteClass::PwaFile;
    }

    if path.starts_with("/assets/") || has_static_extension(path) {
        return RouteClass::StaticAsset;
    }

    if PUBLIC_PATHS.contains(&path) {
        return RouteClass::Public;
    }

    RouteClass::Protected
}

fn is_pwa_file(path: &str) -> bool {
    PWA_FILES.contains(&path) || (path.starts_with("/workbox-") && path.ends_with(".js"))
}

fn has_static_extension(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => {
            STATIC_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

// --- Decision Procedure ---

/// GateDecision
///
/// The gate's verdict for one request. Pure given `(path, token)` apart from
/// the role lookup, which only happens for token-bearing requests to the
/// login/register paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through unmodified.
    Allow,
    /// Send the browser to the login page. `return_to` carries the original
    /// path when the visit should resume after authentication.
    ToLogin { return_to: Option<String> },
    /// Token-bearing visit to login/register: skip straight to the dashboard.
    ToRoleHome(Role),
}

/// decide
///
/// The gate's decision procedure, evaluated once per inbound request with no
/// state shared across requests.
///
/// Order of checks is binding:
/// 1. API, static-asset, and PWA paths bypass all auth logic — API routes
///    enforce their own auth downstream.
/// 2. A token-less request to a protected path is bounced to login with the
///    original path preserved for the post-login return trip.
/// 3. A token-bearing request to the login/register page resolves the role and
///    is bounced to the matching dashboard; every resolution failure fails
///    closed to a plain login redirect, never open.
/// 4. Everything else passes.
///
/// Only token *presence* is checked here — a forged or expired token passes
/// the gate and is rejected by the backend on the first real data call. The
/// gate is a cheap pre-filter, not a security boundary.
pub async fn decide(path: &str, token: Option<&str>, backend: &dyn BackendApi) -> GateDecision {
    let class = classify(path);

    if matches!(
        class,
        RouteClass::Api | RouteClass::StaticAsset | RouteClass::PwaFile
    ) {
        return GateDecision::Allow;
    }

    let Some(token) = token else {
        if class == RouteClass::Protected {
            return GateDecision::ToLogin {
                return_to: Some(path.to_string()),
            };
        }
        return GateDecision::Allow;
    };

    if path == LOGIN_PATH || path == REGISTER_PATH {
        return match backend.resolve_role(token).await {
            Ok(role) => GateDecision::ToRoleHome(role),
            Err(error) => {
                // Fail closed. Backend unreachability mid-navigation is
                // swallowed into a redirect, never surfaced as a 500.
                tracing::warn!(%error, path, "role resolution failed, redirecting to login");
                GateDecision::ToLogin { return_to: None }
            }
        };
    }

    GateDecision::Allow
}

// --- HTTP Adapter ---

/// access_gate
///
/// The middleware form of the gate, layered over the entire router. Reads the
/// session cookie, runs `decide`, and converts the verdict into either a
/// pass-through or a 302 redirect.
pub async fn access_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let token = cookie_token(request.headers());

    match decide(&path, token.as_deref(), state.backend.as_ref()).await {
        GateDecision::Allow => next.run(request).await,
        GateDecision::ToLogin {
            return_to: Some(original),
        } => found(&format!(
            "{}?redirect={}",
            LOGIN_PATH,
            encode_return_path(&original)
        )),
        GateDecision::ToLogin { return_to: None } => found(LOGIN_PATH),
        GateDecision::ToRoleHome(role) => found(role.landing_path()),
    }
}

/// cookie_token
///
/// Extracts the session token from the Cookie header, if present and non-empty.
/// The token is treated as an opaque capability string.
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == AUTH_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// encode_return_path
///
/// Escapes only the characters that would break query-string parsing. Plain
/// slashes pass through so the redirect target stays readable.
pub fn encode_return_path(path: &str) -> String {
    path.replace('%', "%25")
        .replace('?', "%3F")
        .replace('&', "%26")
        .replace('#', "%23")
}

/// Builds a 302 Found response pointing at `location`.
fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
        Body::empty(),
    )
        .into_response()
}
