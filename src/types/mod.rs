use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Attribution, FieldIssue, LeadDraft, TrackingRecord};

/// Body accepted by the partial and completion endpoints. Every field is
/// optional at this layer; the completion schema runs later.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRequest {
    pub id: Option<Uuid>,
    pub owner_type: Option<String>,
    pub property_damage: Option<String>,
    pub injured_status: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tcpa_consent: Option<bool>,
    pub summary: Option<String>,
    #[serde(alias = "utm_source")]
    pub utm_source: Option<String>,
    #[serde(alias = "utm_campaign")]
    pub utm_campaign: Option<String>,
    #[serde(alias = "utm_medium")]
    pub utm_medium: Option<String>,
    #[serde(alias = "clickid")]
    pub click_id: Option<String>,
    pub gclid: Option<String>,
    pub fbclid: Option<String>,
    pub referrer: Option<String>,
    #[serde(alias = "campaign_id")]
    pub campaign_id: Option<String>,
    #[serde(alias = "adset_id")]
    pub adset_id: Option<String>,
    #[serde(alias = "creative_id")]
    pub creative_id: Option<String>,
}

fn parse_choice<T>(
    field: &str,
    value: Option<String>,
    issues: &mut Vec<FieldIssue>,
) -> Option<T>
where
    T: std::str::FromStr<Err = String>,
{
    let value = value.filter(|v| !v.trim().is_empty())?;
    match value.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            issues.push(FieldIssue::new(field, e));
            None
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LeadRequest {
    /// Converts the loose request body into a typed draft, or lists the
    /// fields whose values are not recognized.
    pub fn into_draft(self) -> Result<(Option<Uuid>, LeadDraft), Vec<FieldIssue>> {
        let mut issues = Vec::new();

        let owner_type = parse_choice("ownerType", self.owner_type, &mut issues);
        let property_damage =
            parse_choice("propertyDamage", self.property_damage, &mut issues);
        let injured_status =
            parse_choice("injuredStatus", self.injured_status, &mut issues);

        if !issues.is_empty() {
            return Err(issues);
        }

        // Same precedence as query-string capture.
        let click_id = clean(self.click_id)
            .or_else(|| clean(self.gclid))
            .or_else(|| clean(self.fbclid));

        let draft = LeadDraft {
            owner_type,
            property_damage,
            injured_status,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            tcpa_consent: self.tcpa_consent.unwrap_or(true),
            summary: clean(self.summary),
            attribution: Attribution {
                utm_source: clean(self.utm_source),
                utm_campaign: clean(self.utm_campaign),
                utm_medium: clean(self.utm_medium),
                click_id,
                referrer: clean(self.referrer),
                campaign_id: clean(self.campaign_id),
                adset_id: clean(self.adset_id),
                creative_id: clean(self.creative_id),
            },
        };

        Ok((self.id, draft))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PartialLeadResponse {
    pub success: bool,
    pub id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompleteLeadResponse {
    pub success: bool,
    pub data: TrackingRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Failure body for anything the visitor cannot fix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Failure body for schema violations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub success: bool,
    pub issues: Vec<FieldIssue>,
}

impl ValidationResponse {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self {
            success: false,
            issues,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}
