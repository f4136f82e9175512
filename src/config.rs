use std::env;
use std::time::Duration;

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is designed to be
/// immutable once loaded, ensuring consistency across all threads and services
/// (Backend Client, Mail Transport, Access Gate). It is pulled into the application
/// state via FromRef, embodying the "immutable AppConfig" part of the Unified State Pattern.
#[derive(Clone)]
pub struct AppConfig {
    // Base URL of the backend API this gateway proxies to (role lookups,
    // subscriber snapshots, credential exchange).
    pub backend_base_url: String,
    // Public base URL of the portal itself. Used to build the unsubscribe
    // links embedded in outbound notification emails.
    pub app_base_url: String,
    // SMTP relay host for the outbound mail transport.
    pub smtp_host: String,
    // SMTP relay port (587 for STARTTLS/TLS relays, 1025 for the local dev catcher).
    pub smtp_port: u16,
    // Whether the SMTP connection negotiates TLS. Off for the local mail catcher.
    pub smtp_secure: bool,
    // SMTP credentials. Empty strings mean "no authentication" (local catcher).
    pub smtp_user: String,
    pub smtp_pass: String,
    // The From address stamped on every outbound notification.
    pub mail_from: String,
    // Runtime environment marker. Controls log format and cookie security flags.
    pub env: Env,
    // Upper bound on the gate's role-lookup call. Navigation must not stall on
    // a slow backend; past this the lookup counts as failed (fail closed).
    pub role_lookup_timeout_secs: u64,
    // Upper bound on a single mail send. A timed-out send is recorded as that
    // recipient's failure, never an abort of the whole batch.
    pub mail_send_timeout_secs: u64,
    // Fixed pause between consecutive sends. Rate-limiting policy toward the
    // relay, not a correctness requirement.
    pub mail_send_delay_ms: u64,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty logs, plaintext SMTP, insecure cookies) and production-grade behavior
/// (JSON logs, TLS relay, Secure cookies, mandatory secrets).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    /// This allows us to instantiate the configuration without needing to set environment
    /// variables for lightweight unit or integration testing state scaffolding.
    fn default() -> Self {
        Self {
            backend_base_url: "http://localhost:8000/api".to_string(),
            app_base_url: "http://localhost:3000".to_string(),
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_secure: false,
            smtp_user: String::new(),
            smtp_pass: String::new(),
            mail_from: "Village Portal <noreply@village.local>".to_string(),
            env: Env::Local,
            role_lookup_timeout_secs: 4,
            mail_send_timeout_secs: 10,
            mail_send_delay_ms: 150,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at startup.
    /// It reads all parameters from environment variables and implements the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics if a critical environment variable required for the current runtime
    /// environment (especially Production) is not found. This prevents the application
    /// from starting with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // Timing knobs share defaults across environments. They are policy,
        // not secrets, so a missing or unparsable value falls back silently.
        let role_lookup_timeout_secs = env_u64("ROLE_LOOKUP_TIMEOUT_SECS", 4);
        let mail_send_timeout_secs = env_u64("MAIL_SEND_TIMEOUT_SECS", 10);
        let mail_send_delay_ms = env_u64("MAIL_SEND_DELAY_MS", 150);

        match env {
            Env::Local => Self {
                env: Env::Local,
                // Local defaults assume the backend dev server and a local
                // mail catcher (MailHog/Mailpit style) on their usual ports.
                backend_base_url: env::var("BACKEND_API_URL")
                    .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
                app_base_url: env::var("APP_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
                smtp_port: env_u64("SMTP_PORT", 1025) as u16,
                smtp_secure: false,
                smtp_user: env::var("SMTP_USER").unwrap_or_default(),
                smtp_pass: env::var("SMTP_PASS").unwrap_or_default(),
                mail_from: env::var("MAIL_FROM")
                    .unwrap_or_else(|_| "Village Portal <noreply@village.local>".to_string()),
                role_lookup_timeout_secs,
                mail_send_timeout_secs,
                mail_send_delay_ms,
            },
            Env::Production => {
                // Production environment demands explicit setting of every
                // external endpoint and credential.
                Self {
                    env: Env::Production,
                    backend_base_url: env::var("BACKEND_API_URL")
                        .expect("FATAL: BACKEND_API_URL required in production"),
                    app_base_url: env::var("APP_BASE_URL")
                        .expect("FATAL: APP_BASE_URL required in production"),
                    smtp_host: env::var("SMTP_HOST")
                        .expect("FATAL: SMTP_HOST required in production"),
                    smtp_port: env_u64("SMTP_PORT", 587) as u16,
                    smtp_secure: env::var("SMTP_SECURE")
                        .map(|v| v != "false")
                        .unwrap_or(true),
                    smtp_user: env::var("SMTP_USER")
                        .expect("FATAL: SMTP_USER required in production"),
                    smtp_pass: env::var("SMTP_PASS")
                        .expect("FATAL: SMTP_PASS required in production"),
                    mail_from: env::var("MAIL_FROM")
                        .expect("FATAL: MAIL_FROM required in production"),
                    role_lookup_timeout_secs,
                    mail_send_timeout_secs,
                    mail_send_delay_ms,
                }
            }
        }
    }

    /// The bounded timeout applied to the gate's role-lookup call.
    pub fn role_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.role_lookup_timeout_secs)
    }

    /// The per-recipient send timeout used by the dispatcher.
    pub fn mail_send_timeout(&self) -> Duration {
        Duration::from_secs(self.mail_send_timeout_secs)
    }

    /// The fixed inter-send pause used by the dispatcher.
    pub fn mail_send_delay(&self) -> Duration {
        Duration::from_millis(self.mail_send_delay_ms)
    }
}

/// Reads an integer knob from the environment, falling back on the default for
/// missing or malformed values.
fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
