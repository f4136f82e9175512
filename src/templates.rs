use crate::models::{JobKind, NotificationContent};

/// RenderedEmail
///
/// A subject/body pair produced by one template for one recipient.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// unsubscribe_url
///
/// Builds the per-recipient unsubscribe link from the portal's public base URL
/// and the subscriber's personal token.
pub fn unsubscribe_url(app_base_url: &str, token: &str) -> String {
    format!(
        "{}/unsubscribe?token={}",
        app_base_url.trim_end_matches('/'),
        token
    )
}

/// render
///
/// Selects the template for the job kind and renders it with the recipient's
/// unsubscribe link embedded. Rendering is pure; nothing here touches the
/// network or the clock.
pub fn render(kind: JobKind, content: &NotificationContent, unsubscribe_url: &str) -> RenderedEmail {
    match kind {
        JobKind::Announcement => announcement_email(content, unsubscribe_url),
        JobKind::News => news_email(content, unsubscribe_url),
    }
}

fn announcement_email(content: &NotificationContent, unsubscribe_url: &str) -> RenderedEmail {
    RenderedEmail {
        subject: format!("[Village Announcement] {}", content.title),
        html: format!(
            r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #1a5632;">{title}</h2>
  <p style="font-size: 15px; line-height: 1.6;">{body}</p>
  {cta}
  {footer}
</div>"#,
            title = content.title,
            body = content.body,
            cta = call_to_action(content, "Read the full announcement"),
            footer = footer(unsubscribe_url),
        ),
    }
}

fn news_email(content: &NotificationContent, unsubscribe_url: &str) -> RenderedEmail {
    RenderedEmail {
        subject: format!("Village News: {}", content.title),
        html: format!(
            r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <p style="color: #888; font-size: 12px; text-transform: uppercase;">News Update</p>
  <h2 style="color: #1a3a56;">{title}</h2>
  <p style="font-size: 15px; line-height: 1.6;">{body}</p>
  {cta}
  {footer}
</div>"#,
            title = content.title,
            body = content.body,
            cta = call_to_action(content, "Read more on the portal"),
            footer = footer(unsubscribe_url),
        ),
    }
}

fn call_to_action(content: &NotificationContent, label: &str) -> String {
    match &content.link {
        Some(link) => format!(
            r#"<p><a href="{}" style="display: inline-block; padding: 10px 18px; background: #1a5632; color: #fff; text-decoration: none; border-radius: 4px;">{}</a></p>"#,
            link, label
        ),
        None => String::new(),
    }
}

fn footer(unsubscribe_url: &str) -> String {
    format!(
        r#"<hr style="border: none; border-top: 1px solid #ddd; margin: 24px 0;">
  <p style="color: #888; font-size: 12px;">You are receiving this because you subscribed to village notifications.
  <a href="{}">Unsubscribe</a></p>"#,
        unsubscribe_url
    )
}
