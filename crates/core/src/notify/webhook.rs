//! HTTP webhook delivery of homework events.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use tracing::info;
use uuid::Uuid;

use crate::config::WebhookConfig;
use crate::error::{HomeroomError, Result};

use super::{EventSink, HomeworkEvent};

type HmacSha256 = Hmac<Sha256>;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Body POSTed to a webhook endpoint.
#[derive(Debug, Serialize)]
pub struct WebhookEnvelope {
    pub event_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl WebhookEnvelope {
    pub fn new(event: &HomeworkEvent) -> Result<Self> {
        Ok(Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: event.name().to_string(),
            timestamp: event.timestamp(),
            data: event.payload()?,
        })
    }
}

/// Hex-encoded HMAC-SHA256 of `body`, sent as `X-Homeroom-Signature: sha256=<hex>`.
pub fn sign_payload(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| HomeroomError::Notify(format!("invalid signing key: {e}")))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sends each event as a single signed JSON POST. No retries.
pub struct WebhookSink {
    name: String,
    url: String,
    secret: Option<String>,
    client: Client,
}

impl WebhookSink {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .user_agent(concat!("homeroom-webhook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a sink with a custom reqwest client (for testing).
    pub fn with_client(config: &WebhookConfig, client: Client) -> Self {
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            secret: config.secret.clone().filter(|s| !s.is_empty()),
            client,
        }
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    async fn publish(&self, event: &HomeworkEvent) -> Result<()> {
        let envelope = WebhookEnvelope::new(event)?;
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| HomeroomError::Serialization(format!("webhook envelope: {e}")))?;

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-Homeroom-Event", event.name())
            .header("X-Homeroom-Event-Id", &envelope.event_id)
            .header("X-Homeroom-Timestamp", envelope.timestamp.to_rfc3339());

        if let Some(secret) = &self.secret {
            let signature = sign_payload(secret, &body)?;
            request = request.header("X-Homeroom-Signature", format!("sha256={signature}"));
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(HomeroomError::Notify(format!(
                "webhook {} returned {status}: {text}",
                self.name
            )));
        }

        info!(
            webhook = %self.name,
            event_id = %envelope.event_id,
            event = event.name(),
            assignment_id = %event.assignment_id(),
            "Webhook delivered"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::HomeworkAppeared;
    use crate::testing::{assignment, student};
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String, secret: Option<&str>) -> WebhookConfig {
        WebhookConfig {
            name: "family-hub".into(),
            url,
            secret: secret.map(str::to_string),
            enabled: true,
        }
    }

    fn event() -> HomeworkEvent {
        HomeworkEvent::Appeared(HomeworkAppeared::new(
            &student("s1", "Avery Lee"),
            &assignment("a1", "c1", "Lab report"),
            Utc::now(),
        ))
    }

    #[test]
    fn sign_payload_is_stable_hex() {
        let a = sign_payload("secret", b"body").unwrap();
        let b = sign_payload("secret", b"body").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, sign_payload("other", b"body").unwrap());
    }

    #[tokio::test]
    async fn posts_signed_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("X-Homeroom-Event", "canvas_homework_appeared"))
            .and(header_exists("X-Homeroom-Signature"))
            .and(body_partial_json(serde_json::json!({
                "event_type": "canvas_homework_appeared",
                "data": {"assignment_id": "a1", "student_id": "s1"}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = WebhookSink::new(&config(format!("{}/hook", server.uri()), Some("s3cret"))).unwrap();
        sink.publish(&event()).await.unwrap();
    }

    #[tokio::test]
    async fn unsigned_without_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let sink = WebhookSink::new(&config(format!("{}/hook", server.uri()), None)).unwrap();
        sink.publish(&event()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("X-Homeroom-Signature").is_none());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let sink = WebhookSink::new(&config(server.uri(), Some("s3cret"))).unwrap();
        let err = sink.publish(&event()).await.unwrap_err();
        assert!(matches!(err, HomeroomError::Notify(_)));
        assert!(err.to_string().contains("500"));
    }
}
