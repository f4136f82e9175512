use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Identity & Session Schemas ---

/// Role
///
/// The two recognized portal roles, resolved by the backend API from a session
/// token. The role determines exactly one landing path after login; anything
/// the backend reports outside this set is treated as a resolution failure by
/// the caller (never mapped to a default role).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    /// Maps a role string from the backend envelope onto the enum.
    /// Returns None for unrecognized values so the caller can fail closed.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// The dashboard path a freshly authenticated user of this role lands on.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Member => "/dashboard/member",
            Role::Admin => "/dashboard/admin",
        }
    }
}

/// SessionGrant
///
/// The result of a successful credential exchange with the backend: the opaque
/// bearer token to be stored in the session cookie, plus the resolved role.
/// The token is never decoded or inspected by this gateway.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub token: String,
    pub role: Role,
}

/// LoginRequest
///
/// Input payload for POST /api/auth/login. The password is only passed through
/// to the backend API and never persisted or logged by this application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// Output schema for a successful login. The session token itself travels only
/// in the HTTP-only cookie, so it is deliberately absent here; the frontend
/// gets the role and the landing path it should navigate to.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub success: bool,
    pub role: Role,
    pub landing_path: String,
}

/// SessionInfo
///
/// Output schema for GET /api/session: the caller's resolved role and where
/// their dashboard lives. Resolved fresh on every request (nothing cached).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionInfo {
    pub role: Role,
    pub landing_path: String,
}

/// StatusResponse
///
/// Minimal acknowledgement body for endpoints with no data payload (logout).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StatusResponse {
    pub success: bool,
}

// --- Notification Schemas ---

/// Subscriber
///
/// One recipient of bulk notifications: `{ email, token }`, owned and persisted
/// entirely by the backend API. The dispatcher reads a snapshot list at
/// dispatch time; the token is the recipient's personal unsubscribe reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    pub token: String,
}

/// JobKind
///
/// The fixed set of recognized notification templates. Job types arrive from
/// the admin frontend as strings and are validated against this set before any
/// recipient is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum JobKind {
    Announcement,
    News,
}

impl JobKind {
    /// Validates a raw job-type string. None means the batch must be rejected
    /// before the subscriber list is even fetched.
    pub fn parse(value: &str) -> Option<JobKind> {
        match value {
            "announcement" => Some(JobKind::Announcement),
            "news" => Some(JobKind::News),
            _ => None,
        }
    }
}

/// NotificationContent
///
/// The template fields shared by both notification kinds: a title, the body
/// text, and an optional call-to-action link back into the portal.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// NotificationRequest
///
/// Input payload for POST /api/admin/notifications. The `type` field is kept
/// as a raw string here so that unknown values reach the dispatcher and are
/// rejected as a batch-level failure rather than a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NotificationRequest {
    #[serde(rename = "type")]
    pub job_type: String,
    pub data: NotificationContent,
}

/// FailedRecipient
///
/// One entry in the failure side of the dispatch ledger: the address that was
/// rejected and the transport's error message, recorded verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FailedRecipient {
    pub email: String,
    pub error: String,
}

/// DispatchReport
///
/// The accumulator built during one dispatch run. Invariant on every completed
/// run: `success.len() + failed.len() == total`. Never persisted; it lives
/// exactly as long as the response that carries it.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub total: usize,
    pub success: Vec<String>,
    pub failed: Vec<FailedRecipient>,
}

impl DispatchReport {
    pub fn new(total: usize) -> Self {
        DispatchReport {
            total,
            success: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// DispatchDetails
///
/// The per-recipient breakdown included in the dispatch response body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DispatchDetails {
    pub success: Vec<String>,
    pub failed: Vec<FailedRecipient>,
}

/// DispatchSummary
///
/// Aggregate counts plus the detailed per-recipient lists.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DispatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub details: DispatchDetails,
}

impl From<DispatchReport> for DispatchSummary {
    fn from(report: DispatchReport) -> Self {
        DispatchSummary {
            total: report.total,
            success: report.success.len(),
            failed: report.failed.len(),
            details: DispatchDetails {
                success: report.success,
                failed: report.failed,
            },
        }
    }
}

/// DispatchResponse
///
/// Output schema for POST /api/admin/notifications. `success` is true whenever
/// the batch itself completed, even if individual recipients failed; batch
/// failures never produce this shape (they map to an error status instead).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DispatchResponse {
    pub success: bool,
    /// Correlation ID for this run, useful when matching logs to a response.
    pub job_id: Uuid,
    #[ts(type = "string")]
    pub dispatched_at: DateTime<Utc>,
    pub results: DispatchSummary,
}

impl DispatchResponse {
    pub fn completed(report: DispatchReport) -> Self {
        DispatchResponse {
            success: true,
            job_id: Uuid::new_v4(),
            dispatched_at: Utc::now(),
            results: DispatchSummary::from(report),
        }
    }
}
