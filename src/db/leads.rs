use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{LeadColumns, TrackingRecord};

pub async fn get_lead(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<TrackingRecord>, sqlx::Error> {
    sqlx::query_as::<_, TrackingRecord>(
        r#"
        SELECT *
        FROM tracking_records
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_lead(
    pool: &PgPool,
    data: &LeadColumns,
    is_completed: bool,
) -> Result<TrackingRecord, sqlx::Error> {
    sqlx::query_as::<_, TrackingRecord>(
        r#"
        INSERT INTO tracking_records (
            owner_type, property_damage, injured_status,
            first_name, last_name, email, phone, tcpa_consent, summary,
            utm_source, utm_campaign, utm_medium, click_id, referrer,
            campaign_id, adset_id, creative_id,
            is_completed, completed_at
        )
        VALUES (
            $1, $2, $3,
            $4, $5, $6, $7, $8, $9,
            $10, $11, $12, $13, $14,
            $15, $16, $17,
            $18, CASE WHEN $18 THEN now() ELSE NULL END
        )
        RETURNING *
        "#,
    )
    .bind(data.owner_type)
    .bind(data.property_damage)
    .bind(data.injured_status)
    .bind(data.first_name.as_deref())
    .bind(data.last_name.as_deref())
    .bind(data.email.as_deref())
    .bind(data.phone.as_deref())
    .bind(data.tcpa_consent)
    .bind(data.summary.as_deref())
    .bind(data.attribution.utm_source.as_deref())
    .bind(data.attribution.utm_campaign.as_deref())
    .bind(data.attribution.utm_medium.as_deref())
    .bind(data.attribution.click_id.as_deref())
    .bind(data.attribution.referrer.as_deref())
    .bind(data.attribution.campaign_id.as_deref())
    .bind(data.attribution.adset_id.as_deref())
    .bind(data.attribution.creative_id.as_deref())
    .bind(is_completed)
    .fetch_one(pool)
    .await
}

/// Fills an open (not yet completed) record. Answer columns take the new
/// value when one is given; attribution columns are only written while
/// still NULL. Returns `None` when no open record has this id.
pub async fn update_partial_lead(
    pool: &PgPool,
    id: Uuid,
    data: &LeadColumns,
) -> Result<Option<TrackingRecord>, sqlx::Error> {
    sqlx::query_as::<_, TrackingRecord>(
        r#"
        UPDATE tracking_records
        SET
            owner_type = COALESCE($1, owner_type),
            property_damage = COALESCE($2, property_damage),
            injured_status = COALESCE($3, injured_status),
            first_name = COALESCE($4, first_name),
            last_name = COALESCE($5, last_name),
            email = COALESCE($6, email),
            phone = COALESCE($7, phone),
            tcpa_consent = $8,
            summary = COALESCE($9, summary),
            utm_source = COALESCE(utm_source, $10),
            utm_campaign = COALESCE(utm_campaign, $11),
            utm_medium = COALESCE(utm_medium, $12),
            click_id = COALESCE(click_id, $13),
            referrer = COALESCE(referrer, $14),
            campaign_id = COALESCE(campaign_id, $15),
            adset_id = COALESCE(adset_id, $16),
            creative_id = COALESCE(creative_id, $17),
            edited_at = now()
        WHERE id = $18 AND is_completed = FALSE
        RETURNING *
        "#,
    )
    .bind(data.owner_type)
    .bind(data.property_damage)
    .bind(data.injured_status)
    .bind(data.first_name.as_deref())
    .bind(data.last_name.as_deref())
    .bind(data.email.as_deref())
    .bind(data.phone.as_deref())
    .bind(data.tcpa_consent)
    .bind(data.summary.as_deref())
    .bind(data.attribution.utm_source.as_deref())
    .bind(data.attribution.utm_campaign.as_deref())
    .bind(data.attribution.utm_medium.as_deref())
    .bind(data.attribution.click_id.as_deref())
    .bind(data.attribution.referrer.as_deref())
    .bind(data.attribution.campaign_id.as_deref())
    .bind(data.attribution.adset_id.as_deref())
    .bind(data.attribution.creative_id.as_deref())
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Marks an open record completed with the final answers. Returns `None`
/// when no open record has this id; completed records are never rewritten.
pub async fn complete_existing_lead(
    pool: &PgPool,
    id: Uuid,
    data: &LeadColumns,
) -> Result<Option<TrackingRecord>, sqlx::Error> {
    sqlx::query_as::<_, TrackingRecord>(
        r#"
        UPDATE tracking_records
        SET
            owner_type = COALESCE($1, owner_type),
            property_damage = COALESCE($2, property_damage),
            injured_status = COALESCE($3, injured_status),
            first_name = $4,
            last_name = $5,
            email = $6,
            phone = $7,
            tcpa_consent = $8,
            summary = COALESCE($9, summary),
            utm_source = COALESCE(utm_source, $10),
            utm_campaign = COALESCE(utm_campaign, $11),
            utm_medium = COALESCE(utm_medium, $12),
            click_id = COALESCE(click_id, $13),
            referrer = COALESCE(referrer, $14),
            campaign_id = COALESCE(campaign_id, $15),
            adset_id = COALESCE(adset_id, $16),
            creative_id = COALESCE(creative_id, $17),
            is_completed = TRUE,
            completed_at = COALESCE(completed_at, now()),
            edited_at = now()
        WHERE id = $18 AND is_completed = FALSE
        RETURNING *
        "#,
    )
    .bind(data.owner_type)
    .bind(data.property_damage)
    .bind(data.injured_status)
    .bind(data.first_name.as_deref())
    .bind(data.last_name.as_deref())
    .bind(data.email.as_deref())
    .bind(data.phone.as_deref())
    .bind(data.tcpa_consent)
    .bind(data.summary.as_deref())
    .bind(data.attribution.utm_source.as_deref())
    .bind(data.attribution.utm_campaign.as_deref())
    .bind(data.attribution.utm_medium.as_deref())
    .bind(data.attribution.click_id.as_deref())
    .bind(data.attribution.referrer.as_deref())
    .bind(data.attribution.campaign_id.as_deref())
    .bind(data.attribution.adset_id.as_deref())
    .bind(data.attribution.creative_id.as_deref())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn mark_sent_to_crm(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<TrackingRecord>, sqlx::Error> {
    sqlx::query_as::<_, TrackingRecord>(
        r#"
        UPDATE tracking_records
        SET sent_to_crm = TRUE, edited_at = now()
        WHERE id = $1 AND is_completed = TRUE
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_unsent_leads(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<TrackingRecord>, sqlx::Error> {
    sqlx::query_as::<_, TrackingRecord>(
        r#"
        SELECT *
        FROM tracking_records
        WHERE is_completed = TRUE AND sent_to_crm = FALSE
        ORDER BY completed_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
