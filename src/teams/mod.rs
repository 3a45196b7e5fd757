pub mod dto;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::{error, info};

use crate::error::AppError;

const WEBHOOK_HOST: &str = "webhook.office.com";

/// Delivers free-text notifications to a Microsoft Teams channel.
#[async_trait]
pub trait TeamsClient: Send + Sync {
    async fn send_message(&self, webhook_url: &str, message: &str) -> Result<(), AppError>;
}

/// Only Office 365 incoming-webhook URLs are relayed to.
pub fn is_teams_webhook(url: &str) -> bool {
    url.contains(WEBHOOK_HOST)
}

pub struct TeamsHttpClient {
    client: Client,
}

impl TeamsHttpClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TeamsClient for TeamsHttpClient {
    async fn send_message(&self, webhook_url: &str, message: &str) -> Result<(), AppError> {
        let sent_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let card = dto::MessageCard::notification(message, &sent_at);

        let response = self
            .client
            .post(webhook_url)
            .json(&card)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Teams webhook error {}: {}", status, body);
            return Err(AppError::Upstream(format!(
                "Teams webhook returned {}: {}",
                status, body
            )));
        }

        info!("message delivered to Teams");
        Ok(())
    }
}

/// Accepts every message without sending it anywhere.
pub struct NoopTeamsClient;

#[async_trait]
impl TeamsClient for NoopTeamsClient {
    async fn send_message(&self, _webhook_url: &str, _message: &str) -> Result<(), AppError> {
        Ok(())
    }
}
