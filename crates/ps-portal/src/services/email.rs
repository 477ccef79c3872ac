//! Email dispatch collaborator. The portal validates address syntax and
//! hands the message off; deliverability is the dispatcher's problem.

use async_trait::async_trait;
use ps_common::error::{AppError, AppResult};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> AppResult<()>;
}

/// Minimal syntax check: one @, non-empty local part, dotted domain, no
/// whitespace. Deliverability is explicitly not checked here.
pub fn is_valid_address(addr: &str) -> bool {
    if addr.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = addr.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

/// POSTs messages as JSON to a configured endpoint.
pub struct WebhookMailer {
    url: String,
    client: reqwest::Client,
}

impl WebhookMailer {
    pub fn new(url: String, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl EmailDispatcher for WebhookMailer {
    async fn send(&self, email: OutboundEmail) -> AppResult<()> {
        let body = serde_json::json!({
            "recipient": email.recipient,
            "subject": email.subject,
            "body": email.body,
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::External(format!("email webhook unreachable: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::External(format!(
                "email webhook returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// In-memory dispatcher: records messages instead of sending them. Used in
/// tests and when no webhook endpoint is configured.
pub struct StubMailer {
    sent: Arc<RwLock<Vec<OutboundEmail>>>,
}

impl StubMailer {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.read().await.clone()
    }
}

impl Default for StubMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailDispatcher for StubMailer {
    async fn send(&self, email: OutboundEmail) -> AppResult<()> {
        self.sent.write().await.push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_address, EmailDispatcher, OutboundEmail, StubMailer};

    #[test]
    fn address_syntax_check() {
        assert!(is_valid_address("partner@skyline.example"));
        assert!(is_valid_address("a.b+tag@mail.co.in"));

        assert!(!is_valid_address("no-at-sign"));
        assert!(!is_valid_address("@skyline.example"));
        assert!(!is_valid_address("partner@nodot"));
        assert!(!is_valid_address("partner@.com"));
        assert!(!is_valid_address("two@@signs.example"));
        assert!(!is_valid_address("spaced out@mail.example"));
    }

    #[tokio::test]
    async fn stub_records_outbound_mail() {
        let mailer = StubMailer::new();
        mailer
            .send(OutboundEmail {
                recipient: "partner@skyline.example".to_string(),
                subject: "You're invited".to_string(),
                body: "Join here".to_string(),
            })
            .await
            .expect("send");

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "partner@skyline.example");
    }
}
