use async_trait::async_trait;
use std::time::Duration;
use village_portal::{
    backend::{BackendError, MockBackendApi},
    dispatch::{DispatchError, DispatchPolicy, dispatch},
    mailer::{MailTransport, MockMailTransport, OutboundEmail},
    models::{NotificationContent, NotificationRequest, Subscriber},
};

// --- Test Utilities ---

/// Zeroed timing knobs so tests run instantly; the delay is policy, not logic.
fn test_policy() -> DispatchPolicy {
    DispatchPolicy {
        inter_send_delay: Duration::ZERO,
        per_send_timeout: Duration::from_secs(5),
        app_base_url: "https://portal.example.org".to_string(),
    }
}

fn subscribers(count: usize) -> Vec<Subscriber> {
    (1..=count)
        .map(|i| Subscriber {
            email: format!("resident{}@example.org", i),
            token: format!("unsub-{}", i),
        })
        .collect()
}

fn announcement() -> NotificationRequest {
    NotificationRequest {
        job_type: "announcement".to_string(),
        data: NotificationContent {
            title: "Road closure on Main Street".to_string(),
            body: "Resurfacing works from Monday.".to_string(),
            link: Some("https://portal.example.org/announcements/42".to_string()),
        },
    }
}

// --- Accounting Tests ---

#[tokio::test]
async fn test_accounting_invariant_holds_for_all_sizes() {
    for count in [0, 1, 3, 10] {
        let backend = MockBackendApi::with_subscribers(subscribers(count));
        let mailer = MockMailTransport::new();

        let report = dispatch(&backend, &mailer, &test_policy(), &announcement())
            .await
            .expect("batch must complete");

        assert_eq!(report.total, count);
        assert_eq!(
            report.success.len() + report.failed.len(),
            count,
            "accounting invariant violated for N={}",
            count
        );
    }
}

#[tokio::test]
async fn test_partial_failure_does_not_abort_batch() {
    let backend = MockBackendApi::with_subscribers(subscribers(3));
    let mailer = MockMailTransport::failing_for(&["resident2@example.org"]);

    let report = dispatch(&backend, &mailer, &test_policy(), &announcement())
        .await
        .expect("batch must complete despite the rejection");

    assert_eq!(report.total, 3);
    assert_eq!(
        report.success,
        vec!["resident1@example.org", "resident3@example.org"]
    );
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].email, "resident2@example.org");
    assert!(!report.failed[0].error.is_empty());

    // The third recipient was attempted even though the second failed.
    assert_eq!(mailer.attempt_count(), 3);
}

#[tokio::test]
async fn test_empty_subscriber_list_short_circuits() {
    let backend = MockBackendApi::with_subscribers(Vec::new());
    let mailer = MockMailTransport::new();

    let report = dispatch(&backend, &mailer, &test_policy(), &announcement())
        .await
        .expect("empty snapshot is a success, not an error");

    assert_eq!(report.total, 0);
    assert!(report.success.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(mailer.attempt_count(), 0, "transport must never be invoked");
}

// --- Batch Failure Tests ---

#[tokio::test]
async fn test_unknown_job_type_is_rejected_before_any_send() {
    let backend = MockBackendApi::with_subscribers(subscribers(3));
    let mailer = MockMailTransport::new();
    let job = NotificationRequest {
        job_type: "bogus".to_string(),
        data: NotificationContent::default(),
    };

    let result = dispatch(&backend, &mailer, &test_policy(), &job).await;

    assert!(matches!(result, Err(DispatchError::UnknownKind(kind)) if kind == "bogus"));
    assert_eq!(mailer.attempt_count(), 0, "transport must never be invoked");
}

#[tokio::test]
async fn test_subscriber_fetch_failure_aborts_batch() {
    let backend = MockBackendApi {
        subscriber_response: Err(BackendError::Status(503)),
        ..MockBackendApi::new()
    };
    let mailer = MockMailTransport::new();

    let result = dispatch(&backend, &mailer, &test_policy(), &announcement()).await;

    assert!(matches!(result, Err(DispatchError::SubscriberFetch(_))));
    assert_eq!(mailer.attempt_count(), 0, "nothing may be sent");
}

// --- Ordering & Rendering Tests ---

#[tokio::test]
async fn test_recipients_are_processed_in_snapshot_order() {
    let backend = MockBackendApi::with_subscribers(subscribers(4));
    let mailer = MockMailTransport::new();

    dispatch(&backend, &mailer, &test_policy(), &announcement())
        .await
        .unwrap();

    assert_eq!(
        mailer.attempted_addresses(),
        vec![
            "resident1@example.org",
            "resident2@example.org",
            "resident3@example.org",
            "resident4@example.org",
        ]
    );
}

#[tokio::test]
async fn test_each_recipient_gets_their_own_unsubscribe_link() {
    let backend = MockBackendApi::with_subscribers(subscribers(2));
    let mailer = MockMailTransport::new();

    dispatch(&backend, &mailer, &test_policy(), &announcement())
        .await
        .unwrap();

    let sent = mailer.sent_messages();
    assert_eq!(sent.len(), 2);
    assert!(
        sent[0]
            .html
            .contains("https://portal.example.org/unsubscribe?token=unsub-1")
    );
    assert!(
        sent[1]
            .html
            .contains("https://portal.example.org/unsubscribe?token=unsub-2")
    );
}

#[tokio::test]
async fn test_subject_reflects_job_kind() {
    let backend = MockBackendApi::with_subscribers(subscribers(1));
    let mailer = MockMailTransport::new();

    dispatch(&backend, &mailer, &test_policy(), &announcement())
        .await
        .unwrap();

    let news = NotificationRequest {
        job_type: "news".to_string(),
        data: NotificationContent {
            title: "New library hours".to_string(),
            body: "Open until 8pm on weekdays.".to_string(),
            link: None,
        },
    };
    dispatch(&backend, &mailer, &test_policy(), &news)
        .await
        .unwrap();

    let sent = mailer.sent_messages();
    assert_eq!(
        sent[0].subject,
        "[Village Announcement] Road closure on Main Street"
    );
    assert_eq!(sent[1].subject, "Village News: New library hours");
}

// --- Timeout Tests ---

/// A transport that never answers, for exercising the per-send timeout.
struct StalledTransport;

#[async_trait]
impl MailTransport for StalledTransport {
    async fn send(&self, _message: &OutboundEmail) -> Result<(), String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_stalled_send_is_recorded_as_recipient_failure() {
    let backend = MockBackendApi::with_subscribers(subscribers(2));
    let policy = DispatchPolicy {
        per_send_timeout: Duration::from_millis(20),
        ..test_policy()
    };

    let report = dispatch(&backend, &StalledTransport, &policy, &announcement())
        .await
        .expect("a hung transport must not hang the batch");

    // Both recipients time out individually; the batch still completes with
    // full accounting.
    assert_eq!(report.total, 2);
    assert!(report.success.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed[0].error.contains("timed out"));
}
