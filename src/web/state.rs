use std::sync::Arc;

use crate::common::GeneralError;
use crate::config::{AppConfig, FunnelSettings};
use crate::db::LeadStore;
use crate::services::{
    CrmForwarder, GatewaySettings, HttpPixelFirer, LeadGateway, NoopPixelFirer,
    PixelFirer, ScriptedSummaryGenerator, SummaryGenerator, WebhookCrmClient,
};
use crate::web::security::RateLimiter;
use crate::web::session::StateSeal;

#[derive(Clone)]
pub struct AppState {
    pub gateway: LeadGateway,
    pub summaries: Arc<dyn SummaryGenerator>,
    pub rate_limiter: Arc<RateLimiter>,
    pub funnel: FunnelSettings,
    pub seal: Arc<StateSeal>,
}

impl AppState {
    /// Wires the gateway and its outbound clients from configuration.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn LeadStore>,
    ) -> Result<Self, GeneralError> {
        let crm: Option<Arc<dyn CrmForwarder>> = match &config.crm {
            Some(crm) => Some(Arc::new(WebhookCrmClient::new(crm)?)),
            None => None,
        };

        let settings = config
            .crm
            .as_ref()
            .map(GatewaySettings::from_crm)
            .unwrap_or_default();
        let pixels: Arc<dyn PixelFirer> = if config.pixels.is_empty() {
            Arc::new(NoopPixelFirer)
        } else {
            Arc::new(HttpPixelFirer::new(config.pixels.clone())?)
        };

        let seal = match &config.state_secret {
            Some(secret) => StateSeal::new(secret.as_bytes())?,
            None => {
                log::warn!(
                    "FUNNEL_STATE_SECRET is not set; funnel sessions will not survive a restart"
                );
                StateSeal::generate()?
            }
        };

        Ok(Self {
            gateway: LeadGateway::new(store, crm, pixels, settings),
            summaries: Arc::new(ScriptedSummaryGenerator),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            funnel: config.funnel,
            seal: Arc::new(seal),
        })
    }
}
