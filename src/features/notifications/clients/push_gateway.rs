use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::PushConfig;
use crate::core::error::{AppError, Result};

/// A push notification addressed to a single device token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

/// What a gateway did with an accepted message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDelivery {
    /// Handed to the push provider
    Delivered,
    /// Dropped on purpose, e.g. no provider configured
    Suppressed,
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<PushDelivery>;
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    notification: NotificationBody<'a>,
    data: &'a BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct NotificationBody<'a> {
    title: &'a str,
    body: &'a str,
}

/// Gateway reply; a 200 can still carry per-token failures
#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    #[serde(default)]
    failure: u32,
    #[serde(default)]
    results: Vec<SendResult>,
}

#[derive(Debug, Deserialize)]
struct SendResult {
    error: Option<String>,
}

/// HTTP client for an FCM-compatible push gateway
pub struct FcmPushGateway {
    http_client: reqwest::Client,
    gateway_url: String,
    server_key: String,
}

impl FcmPushGateway {
    pub fn new(config: &PushConfig, server_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build push HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            gateway_url: config.gateway_url.clone(),
            server_key,
        })
    }
}

#[async_trait]
impl PushGateway for FcmPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<PushDelivery> {
        let request_body = SendRequest {
            to: &message.token,
            notification: NotificationBody {
                title: &message.title,
                body: &message.body,
            },
            data: &message.data,
        };

        let response = self
            .http_client
            .post(&self.gateway_url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("key={}", self.server_key),
            )
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach push gateway: {}", e);
                AppError::ExternalServiceError(format!("Push gateway unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Push gateway returned {}: {}", status, body);
            return Err(AppError::ExternalServiceError(format!(
                "Push gateway returned {}",
                status
            )));
        }

        let reply = response.json::<SendResponse>().await.unwrap_or_default();
        if reply.failure > 0 {
            let reason = reply
                .results
                .iter()
                .find_map(|r| r.error.clone())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::error!("Push gateway rejected message: {}", reason);
            return Err(AppError::ExternalServiceError(format!(
                "Push delivery failed: {}",
                reason
            )));
        }

        tracing::debug!("Push notification accepted by gateway");
        Ok(PushDelivery::Delivered)
    }
}

/// Stand-in used when no gateway key is configured; logs what would be sent
pub struct LogOnlyPushGateway;

#[async_trait]
impl PushGateway for LogOnlyPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<PushDelivery> {
        tracing::info!(
            "Push gateway disabled, not sending '{}' (data: {:?})",
            message.title,
            message.data
        );
        Ok(PushDelivery::Suppressed)
    }
}
