use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use std::time::Duration;

use crate::common::{GeneralError, LeadError};
use crate::db::leads;
use crate::log_err;
use crate::models::{LeadColumns, TrackingRecord};

/// Process-wide database handle. Built once in `main` and handed to the
/// request handlers; cloning shares the pool.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, GeneralError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_lead(
        &self,
        id: Uuid,
    ) -> Result<TrackingRecord, LeadError> {
        leads::get_lead(&self.pool, id)
            .await?
            .ok_or(LeadError::NotFound(id))
    }

    pub async fn create_partial_lead(
        &self,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError> {
        match leads::insert_lead(&self.pool, data, false).await {
            Ok(record) => Ok(record),
            Err(e) => {
                log_err!(self.pool, data);
                Err(e.into())
            }
        }
    }

    /// Upserts the session's open record. A completed record is returned
    /// unchanged; an unknown id is replaced by a fresh record.
    pub async fn update_partial_lead(
        &self,
        id: Uuid,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError> {
        if let Some(record) =
            leads::update_partial_lead(&self.pool, id, data).await?
        {
            return Ok(record);
        }

        match self.get_lead(id).await {
            Ok(record) => Ok(record),
            Err(LeadError::NotFound(_)) => {
                log::info!("Partial lead {} not found, creating a new one", id);
                self.create_partial_lead(data).await
            }
            Err(e) => Err(e),
        }
    }

    /// Completes the open record with `id`, or inserts a new completed
    /// record when no record has that id. A record that is already
    /// completed is refused.
    pub async fn complete_lead(
        &self,
        id: Option<Uuid>,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError> {
        if let Some(id) = id {
            if let Some(record) =
                leads::complete_existing_lead(&self.pool, id, data).await?
            {
                return Ok(record);
            }
            match self.get_lead(id).await {
                Ok(_) => return Err(LeadError::AlreadyCompleted(id)),
                Err(LeadError::NotFound(_)) => {
                    log::info!("Lead {} not found on completion, inserting", id)
                }
                Err(e) => return Err(e),
            }
        }

        match leads::insert_lead(&self.pool, data, true).await {
            Ok(record) => Ok(record),
            Err(e) => {
                log_err!(self.pool, data);
                Err(e.into())
            }
        }
    }

    pub async fn mark_sent_to_crm(
        &self,
        id: Uuid,
    ) -> Result<TrackingRecord, LeadError> {
        leads::mark_sent_to_crm(&self.pool, id)
            .await?
            .ok_or(LeadError::NotFound(id))
    }

    pub async fn list_unsent_leads(
        &self,
        limit: i64,
    ) -> Result<Vec<TrackingRecord>, LeadError> {
        Ok(leads::list_unsent_leads(&self.pool, limit.max(0)).await?)
    }
}
