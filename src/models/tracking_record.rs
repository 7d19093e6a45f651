use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{
    normalize_phone, Attribution, InjuredStatus, LeadDraft, OwnerType,
    PropertyDamage,
};

/// Persisted form of a [`LeadDraft`].
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecord {
    pub id: Uuid,
    pub owner_type: Option<OwnerType>,
    pub property_damage: Option<PropertyDamage>,
    pub injured_status: Option<InjuredStatus>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tcpa_consent: bool,
    pub summary: Option<String>,
    pub utm_source: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_medium: Option<String>,
    pub click_id: Option<String>,
    pub referrer: Option<String>,
    pub campaign_id: Option<String>,
    pub adset_id: Option<String>,
    pub creative_id: Option<String>,
    pub is_completed: bool,
    pub sent_to_crm: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TrackingRecord {
    pub fn attribution(&self) -> Attribution {
        Attribution {
            utm_source: self.utm_source.clone(),
            utm_campaign: self.utm_campaign.clone(),
            utm_medium: self.utm_medium.clone(),
            click_id: self.click_id.clone(),
            referrer: self.referrer.clone(),
            campaign_id: self.campaign_id.clone(),
            adset_id: self.adset_id.clone(),
            creative_id: self.creative_id.clone(),
        }
    }

    /// Rebuilds the draft a record was written from.
    pub fn to_draft(&self) -> LeadDraft {
        LeadDraft {
            owner_type: self.owner_type,
            property_damage: self.property_damage,
            injured_status: self.injured_status,
            first_name: self.first_name.clone().unwrap_or_default(),
            last_name: self.last_name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            phone: self.phone.clone().unwrap_or_default(),
            tcpa_consent: self.tcpa_consent,
            summary: self.summary.clone(),
            attribution: self.attribution(),
        }
    }
}

/// Column values for a write. Empty strings are stored as NULL so a partial
/// write never blanks a column that a later write fills; the phone is
/// reduced to its digits.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeadColumns {
    pub owner_type: Option<OwnerType>,
    pub property_damage: Option<PropertyDamage>,
    pub injured_status: Option<InjuredStatus>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tcpa_consent: bool,
    pub summary: Option<String>,
    pub attribution: Attribution,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl From<&LeadDraft> for LeadColumns {
    fn from(draft: &LeadDraft) -> Self {
        Self {
            owner_type: draft.owner_type,
            property_damage: draft.property_damage,
            injured_status: draft.injured_status,
            first_name: non_empty(&draft.first_name),
            last_name: non_empty(&draft.last_name),
            email: non_empty(&draft.email),
            phone: non_empty(&normalize_phone(&draft.phone)),
            tcpa_consent: draft.tcpa_consent,
            summary: draft.summary.as_deref().and_then(non_empty),
            attribution: draft.attribution.clone(),
        }
    }
}
