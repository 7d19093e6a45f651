//! Lead submission: the partial write, the completion write and the CRM
//! forward that follows it.
//!
//! The completion write is the commit point. Once it succeeds the lead is
//! captured, whatever happens to the forward afterwards.

use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::common::{GatewayError, LeadError};
use crate::config::CrmConfig;
use crate::db::LeadStore;
use crate::models::{
    validate_complete, Attribution, LeadColumns, LeadDraft, TrackingRecord,
};
use crate::services::crm::{CrmForwarder, CrmPayload};
use crate::services::pixels::{PixelEvent, PixelFirer};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GatewaySettings {
    pub offer: String,
    pub dry_run: bool,
    pub await_forward: bool,
}

impl GatewaySettings {
    pub fn from_crm(config: &CrmConfig) -> Self {
        Self {
            offer: config.offer.clone(),
            dry_run: config.dry_run,
            await_forward: config.await_forward,
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            offer: crate::config::DEFAULT_OFFER.to_string(),
            dry_run: false,
            await_forward: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PartialOutcome {
    pub record: TrackingRecord,
    /// False when an existing record was updated in place.
    pub created: bool,
}

/// Result of forwarding one completed record.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ForwardOutcome {
    Sent,
    /// The CRM took the lead but the `sent_to_crm` flag could not be set.
    SentNotMarked(String),
    AlreadySent,
    Failed(String),
}

impl ForwardOutcome {
    pub fn is_delivered(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Message shown next to a successful submission when the forward did
    /// not go through.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Failed(_) => Some(
                "Your information was saved. Our team will follow up shortly."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CompletedLead {
    pub record: TrackingRecord,
    /// Resolves once the CRM forward finished. Dropping it does not cancel
    /// the forward.
    pub forward: JoinHandle<ForwardOutcome>,
}

impl CompletedLead {
    /// Waits for the forward. A forward task that died counts as failed.
    pub async fn settle(self) -> (TrackingRecord, ForwardOutcome) {
        let outcome = match self.forward.await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("CRM forward task for lead {} failed: {}", self.record.id, e);
                ForwardOutcome::Failed(e.to_string())
            }
        };
        (self.record, outcome)
    }
}

#[derive(Clone)]
pub struct LeadGateway {
    store: Arc<dyn LeadStore>,
    crm: Option<Arc<dyn CrmForwarder>>,
    pixels: Arc<dyn PixelFirer>,
    settings: GatewaySettings,
}

impl LeadGateway {
    pub fn new(
        store: Arc<dyn LeadStore>,
        crm: Option<Arc<dyn CrmForwarder>>,
        pixels: Arc<dyn PixelFirer>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            store,
            crm,
            pixels,
            settings,
        }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    fn spawn_pixel(&self, event: PixelEvent, click_id: Option<String>) {
        let pixels = Arc::clone(&self.pixels);
        tokio::spawn(async move {
            pixels.fire(event, click_id).await;
        });
    }

    /// Fires the page-load pixels for a freshly captured session.
    pub fn track_load(&self, attribution: &Attribution) {
        self.spawn_pixel(PixelEvent::Load, attribution.click_id.clone());
    }

    /// Creates the session's record, or fills the one already created
    /// under `id`. Calling it repeatedly with the returned id keeps a
    /// single record per session.
    pub async fn record_partial(
        &self,
        id: Option<Uuid>,
        draft: &LeadDraft,
    ) -> Result<PartialOutcome, GatewayError> {
        let columns = LeadColumns::from(draft);

        let result = match id {
            Some(id) => self
                .store
                .update_partial(id, &columns)
                .await
                .map(|record| {
                    let created = record.id != id;
                    (record, created)
                }),
            None => self
                .store
                .create_partial(&columns)
                .await
                .map(|record| (record, true)),
        };

        let (record, created) = result.map_err(|e| {
            log::error!("Failed to save partial lead: {}", e);
            GatewayError::Persistence(e)
        })?;

        if created {
            self.spawn_pixel(PixelEvent::Partial, record.click_id.clone());
        }

        Ok(PartialOutcome { record, created })
    }

    /// Validates, persists and then forwards a finished lead.
    ///
    /// Nothing is written or sent when validation fails, the CRM is not
    /// configured or the record was already completed. A failed forward
    /// does not fail this call.
    pub async fn record_complete(
        &self,
        id: Option<Uuid>,
        draft: &LeadDraft,
    ) -> Result<CompletedLead, GatewayError> {
        let lead = validate_complete(draft).map_err(GatewayError::Validation)?;
        let crm = self.crm.clone().ok_or(GatewayError::MissingCrmConfig)?;

        let record = self
            .store
            .complete(id, &LeadColumns::from(lead.draft()))
            .await
            .map_err(|e| match e {
                LeadError::AlreadyCompleted(id) => {
                    log::warn!("Lead {} submitted again, ignoring", id);
                    GatewayError::AlreadyCompleted(id)
                }
                e => {
                    log::error!("Failed to save completed lead: {}", e);
                    GatewayError::Persistence(e)
                }
            })?;

        log::info!("Lead {} completed", record.id);
        self.spawn_pixel(PixelEvent::Complete, record.click_id.clone());

        let store = Arc::clone(&self.store);
        let settings = self.settings.clone();
        let to_forward = record.clone();
        let forward = tokio::spawn(async move {
            forward_record(store.as_ref(), crm.as_ref(), &settings, &to_forward)
                .await
        });

        Ok(CompletedLead { record, forward })
    }

    /// Forwards completed records the CRM never acknowledged, oldest first.
    pub async fn resend_unsent(
        &self,
        limit: i64,
    ) -> Result<Vec<(Uuid, ForwardOutcome)>, GatewayError> {
        let crm = self.crm.clone().ok_or(GatewayError::MissingCrmConfig)?;
        let records = self.store.list_unsent(limit).await?;

        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            let outcome = forward_record(
                self.store.as_ref(),
                crm.as_ref(),
                &self.settings,
                &record,
            )
            .await;
            outcomes.push((record.id, outcome));
        }

        Ok(outcomes)
    }
}

async fn forward_record(
    store: &dyn LeadStore,
    crm: &dyn CrmForwarder,
    settings: &GatewaySettings,
    record: &TrackingRecord,
) -> ForwardOutcome {
    if record.sent_to_crm {
        return ForwardOutcome::AlreadySent;
    }

    let lead = match validate_complete(&record.to_draft()) {
        Ok(lead) => lead,
        Err(issues) => {
            let reason = issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            log::warn!("Lead {} cannot be forwarded: {}", record.id, reason);
            return ForwardOutcome::Failed(reason);
        }
    };

    let payload = CrmPayload::build(&lead, &settings.offer, settings.dry_run);

    if let Err(e) = crm.forward(&payload).await {
        log::warn!("CRM forward for lead {} failed: {}", record.id, e);
        return ForwardOutcome::Failed(e.to_string());
    }

    match store.mark_sent_to_crm(record.id).await {
        Ok(_) => {
            log::info!("Lead {} forwarded to CRM", record.id);
            ForwardOutcome::Sent
        }
        Err(e) => {
            log::error!("Lead {} forwarded but not marked: {}", record.id, e);
            ForwardOutcome::SentNotMarked(e.to_string())
        }
    }
}
