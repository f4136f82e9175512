/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. This structure ensures that
/// access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// Every route lives under the `/api` prefix on purpose: the Access Gate
/// bypasses API paths entirely, so each module below carries its own auth.

/// Routes accessible to all clients (health, credential exchange).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a resolvable session token.
pub mod authenticated;

/// Routes restricted exclusively to users with the 'admin' role.
/// Implements mandatory authorization checks.
pub mod admin;
