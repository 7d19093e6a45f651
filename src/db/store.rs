use async_trait::async_trait;
use uuid::Uuid;

use crate::common::LeadError;
use crate::db::Database;
use crate::models::{LeadColumns, TrackingRecord};

/// Storage used by the submission gateway.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn create_partial(
        &self,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError>;

    async fn update_partial(
        &self,
        id: Uuid,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError>;

    async fn complete(
        &self,
        id: Option<Uuid>,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError>;

    async fn mark_sent_to_crm(
        &self,
        id: Uuid,
    ) -> Result<TrackingRecord, LeadError>;

    async fn list_unsent(
        &self,
        limit: i64,
    ) -> Result<Vec<TrackingRecord>, LeadError>;
}

#[async_trait]
impl LeadStore for Database {
    async fn create_partial(
        &self,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError> {
        self.create_partial_lead(data).await
    }

    async fn update_partial(
        &self,
        id: Uuid,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError> {
        self.update_partial_lead(id, data).await
    }

    async fn complete(
        &self,
        id: Option<Uuid>,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError> {
        self.complete_lead(id, data).await
    }

    async fn mark_sent_to_crm(
        &self,
        id: Uuid,
    ) -> Result<TrackingRecord, LeadError> {
        Database::mark_sent_to_crm(self, id).await
    }

    async fn list_unsent(
        &self,
        limit: i64,
    ) -> Result<Vec<TrackingRecord>, LeadError> {
        self.list_unsent_leads(limit).await
    }
}
