use std::fmt;
use std::time::Duration;

use crate::backend::{BackendApi, BackendError};
use crate::config::AppConfig;
use crate::mailer::{MailTransport, OutboundEmail};
use crate::models::{DispatchReport, FailedRecipient, JobKind, NotificationRequest};
use crate::templates;

/// DispatchError
///
/// Batch-level failures only. Either nothing was sent because the job type is
/// unrecognized, or nothing was sent because the subscriber snapshot could not
/// be fetched. Per-recipient failures are never represented here — they live
/// inside the DispatchReport of a completed run.
#[derive(Debug)]
pub enum DispatchError {
    UnknownKind(String),
    SubscriberFetch(BackendError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownKind(kind) => write!(f, "unknown notification type '{}'", kind),
            DispatchError::SubscriberFetch(error) => {
                write!(f, "failed to fetch subscribers: {}", error)
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// DispatchPolicy
///
/// The timing knobs and link base the dispatcher needs, separated from the
/// full AppConfig so tests can run with zeroed delays.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    /// Fixed pause after each send attempt, success or failure. Rate-limiting
    /// toward the relay; not a correctness requirement.
    pub inter_send_delay: Duration,
    /// Upper bound on a single send. A timed-out send is recorded as that
    /// recipient's failure and the batch moves on.
    pub per_send_timeout: Duration,
    /// Public base URL used to build unsubscribe links.
    pub app_base_url: String,
}

impl From<&AppConfig> for DispatchPolicy {
    fn from(config: &AppConfig) -> Self {
        DispatchPolicy {
            inter_send_delay: config.mail_send_delay(),
            per_send_timeout: config.mail_send_timeout(),
            app_base_url: config.app_base_url.clone(),
        }
    }
}

/// dispatch
///
/// The bulk notification procedure. One invocation walks the current
/// active-subscriber snapshot **strictly sequentially**, folding per-recipient
/// outcomes into a DispatchReport. Sequential iteration is deliberate: it
/// bounds load on the mail relay and keeps result ordering deterministic.
///
/// Failure semantics:
/// - Unknown job type or a failed subscriber fetch aborts the whole batch
///   before any recipient is contacted.
/// - An empty snapshot is not an error — the transport is never invoked and a
///   zero-recipient report is returned.
/// - A rejected or timed-out send is recorded against that recipient and the
///   loop continues. Nothing mid-batch can abort it.
///
/// The dispatcher is read-only against the subscriber store and keeps no
/// memory of prior runs: re-running re-sends to every currently-active
/// subscriber.
pub async fn dispatch(
    backend: &dyn BackendApi,
    mailer: &dyn MailTransport,
    policy: &DispatchPolicy,
    job: &NotificationRequest,
) -> Result<DispatchReport, DispatchError> {
    let kind = JobKind::parse(&job.job_type)
        .ok_or_else(|| DispatchError::UnknownKind(job.job_type.clone()))?;

    let subscribers = backend
        .active_subscribers()
        .await
        .map_err(DispatchError::SubscriberFetch)?;

    let mut report = DispatchReport::new(subscribers.len());

    if subscribers.is_empty() {
        tracing::info!(?kind, "no active subscribers, nothing to dispatch");
        return Ok(report);
    }

    tracing::info!(?kind, recipients = subscribers.len(), "starting dispatch");

    for subscriber in &subscribers {
        let unsubscribe = templates::unsubscribe_url(&policy.app_base_url, &subscriber.token);
        let rendered = templates::render(kind, &job.data, &unsubscribe);

        let message = OutboundEmail {
            to: subscriber.email.clone(),
            subject: rendered.subject,
            html: rendered.html,
        };

        let outcome = match tokio::time::timeout(policy.per_send_timeout, mailer.send(&message))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(format!(
                "send timed out after {}s",
                policy.per_send_timeout.as_secs()
            )),
        };

        match outcome {
            Ok(()) => report.success.push(subscriber.email.clone()),
            Err(error) => {
                tracing::warn!(email = %subscriber.email, %error, "recipient send failed");
                report.failed.push(FailedRecipient {
                    email: subscriber.email.clone(),
                    error,
                });
            }
        }

        tokio::time::sleep(policy.inter_send_delay).await;
    }

    debug_assert_eq!(report.success.len() + report.failed.len(), report.total);

    tracing::info!(
        total = report.total,
        success = report.success.len(),
        failed = report.failed.len(),
        "dispatch complete"
    );

    Ok(report)
}
