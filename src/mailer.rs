use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::{Arc, Mutex};

// 1. MailTransport Contract

/// OutboundEmail
///
/// One fully rendered message ready for the wire: recipient, subject, and HTML
/// body. The From address belongs to the transport, not the message — it is
/// fixed at construction time and stamped onto every send.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// MailTransport
///
/// Defines the abstract contract for the outbound mail capability. This trait
/// allows us to swap the concrete implementation—from the real SMTP relay
/// (SmtpMailer) in production to the in-memory Mock (MockMailTransport) during
/// testing—without affecting the dispatcher.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Delivers a single message. The error string is recorded verbatim in the
    /// dispatch ledger, so implementations should keep it human-readable.
    async fn send(&self, message: &OutboundEmail) -> Result<(), String>;
}

/// MailerState
///
/// The concrete type used to share the mail transport across the application state.
/// Constructed once at startup and threaded in explicitly — never a module-level
/// global.
pub type MailerState = Arc<dyn MailTransport>;

// 2. The Real Implementation (SMTP via lettre)

/// SmtpMailer
///
/// The concrete implementation over an async SMTP relay. Handles both the
/// TLS relay used in production and the plaintext local mail catcher used in
/// development (`secure = false`).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// new
    ///
    /// Constructs the SMTP transport from the configuration surface. Empty
    /// credentials skip authentication entirely, which is what the local mail
    /// catcher expects.
    pub fn new(
        host: &str,
        port: u16,
        secure: bool,
        user: &str,
        pass: &str,
        from: &str,
    ) -> Result<Self, String> {
        let from = from.parse::<Mailbox>().map_err(|e| e.to_string())?;

        let mut builder = if secure {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).map_err(|e| e.to_string())?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        builder = builder.port(port);

        if !user.is_empty() {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &OutboundEmail) -> Result<(), String> {
        let recipient = message.to.parse::<Mailbox>().map_err(|e| e.to_string())?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone())
            .map_err(|e| e.to_string())?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

// 3. The Mock Implementation (For Unit Tests)

/// MockMailTransport
///
/// A mock implementation of `MailTransport` used exclusively for testing the
/// dispatcher's accounting. It records every accepted message in order and can
/// be scripted to reject specific addresses, which is how the partial-failure
/// contract is pinned down without a relay.
pub struct MockMailTransport {
    /// Addresses whose sends are rejected with a simulated transport error.
    pub fail_addresses: Vec<String>,
    /// Every message that was accepted, in send order.
    pub sent: Mutex<Vec<OutboundEmail>>,
    /// Every send attempt (accepted or rejected), in order. Lets tests assert
    /// on sequencing and on "transport never invoked".
    pub attempts: Mutex<Vec<String>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self {
            fail_addresses: Vec::new(),
            sent: Mutex::new(Vec::new()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            fail_addresses: addresses.iter().map(|a| a.to_string()).collect(),
            ..Self::new()
        }
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn attempted_addresses(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockMailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, message: &OutboundEmail) -> Result<(), String> {
        self.attempts.lock().unwrap().push(message.to.clone());

        if self.fail_addresses.contains(&message.to) {
            return Err("Mock Transport Error: recipient rejected".to_string());
        }

        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
