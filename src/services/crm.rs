use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::common::ForwardError;
use crate::config::CrmConfig;
use crate::models::ValidatedLead;

pub const AUTH_HEADER: &str = "x-auth-token";

/// Body posted to the CRM webhook.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CrmPayload {
    pub offer: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub description: String,
    pub injured: Vec<String>,
    pub property_damage: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dryrun: Option<String>,
}

impl CrmPayload {
    pub fn build(lead: &ValidatedLead, offer: &str, dry_run: bool) -> Self {
        let draft = lead.draft();

        Self {
            offer: offer.to_string(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            description: draft.description(),
            injured: lead
                .injured_status()
                .map(|s| vec![s.as_str().to_string()])
                .unwrap_or_default(),
            property_damage: lead
                .property_damage()
                .map(|d| vec![d.as_str().to_string()])
                .unwrap_or_default(),
            dryrun: dry_run.then(|| "yes".to_string()),
        }
    }
}

/// Outbound delivery of completed leads.
#[async_trait]
pub trait CrmForwarder: Send + Sync {
    async fn forward(&self, payload: &CrmPayload) -> Result<(), ForwardError>;
}

/// Fields the webhook may answer with; anything else is ignored.
#[derive(Debug, Deserialize)]
struct CrmReply {
    success: Option<bool>,
    error: Option<serde_json::Value>,
}

/// Decides whether a 2xx body still reports a rejection.
pub fn reply_rejects(body: &str) -> bool {
    match serde_json::from_str::<CrmReply>(body) {
        Ok(reply) => {
            reply.success == Some(false)
                || reply.error.is_some_and(|e| !e.is_null())
        }
        // Plain-text or empty acknowledgements are accepted.
        Err(_) => false,
    }
}

pub struct WebhookCrmClient {
    client: reqwest::Client,
    url: Url,
    auth_token: String,
}

impl WebhookCrmClient {
    pub fn new(config: &CrmConfig) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.webhook_url.clone(),
            auth_token: config.auth_token.clone(),
        })
    }
}

#[async_trait]
impl CrmForwarder for WebhookCrmClient {
    async fn forward(&self, payload: &CrmPayload) -> Result<(), ForwardError> {
        let resp = self
            .client
            .post(self.url.clone())
            .header(AUTH_HEADER, &self.auth_token)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() || reply_rejects(&body) {
            return Err(ForwardError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        log::debug!("CRM accepted lead for {}", payload.email);
        Ok(())
    }
}
