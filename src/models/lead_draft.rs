use serde::{Deserialize, Serialize};

use crate::models::{Attribution, InjuredStatus, OwnerType, PropertyDamage};

/// Number of digits a normalized phone number must have.
pub const PHONE_DIGITS: usize = 10;

/// Answers accumulated across one visitor's funnel session.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    pub owner_type: Option<OwnerType>,
    pub property_damage: Option<PropertyDamage>,
    pub injured_status: Option<InjuredStatus>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_tcpa_consent")]
    pub tcpa_consent: bool,
    pub summary: Option<String>,
    #[serde(default)]
    pub attribution: Attribution,
}

fn default_tcpa_consent() -> bool {
    true
}

impl Default for LeadDraft {
    fn default() -> Self {
        Self {
            owner_type: None,
            property_damage: None,
            injured_status: None,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            tcpa_consent: true,
            summary: None,
            attribution: Attribution::default(),
        }
    }
}

impl LeadDraft {
    pub fn with_attribution(attribution: Attribution) -> Self {
        Self {
            attribution,
            ..Self::default()
        }
    }

    /// True once the draft holds anything worth a partial record.
    pub fn has_content(&self) -> bool {
        self.owner_type.is_some()
            || self.property_damage.is_some()
            || self.injured_status.is_some()
            || !self.first_name.trim().is_empty()
            || !self.last_name.trim().is_empty()
            || !self.email.trim().is_empty()
            || !self.phone.is_empty()
            || !self.attribution.is_empty()
    }

    /// CRM description: the generated summary when present, otherwise the
    /// tracking parameters.
    pub fn description(&self) -> String {
        match self.summary.as_deref().map(str::trim) {
            Some(summary) if !summary.is_empty() => summary.to_string(),
            _ => self.attribution.describe(),
        }
    }
}

/// Strips every non-digit and keeps at most ten digits.
///
/// `"(555) 123-4567 ext"` becomes `"5551234567"`.
pub fn normalize_phone(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(PHONE_DIGITS)
        .collect()
}

/// Display form `(555) 123-4567` for a partially typed number.
pub fn format_phone(input: &str) -> String {
    let digits = normalize_phone(input);
    let (area, rest) = digits.split_at(digits.len().min(3));
    let (prefix, line) = rest.split_at(rest.len().min(3));

    let mut out = String::new();
    if !area.is_empty() {
        out.push('(');
        out.push_str(area);
        if area.len() == 3 {
            out.push_str(") ");
        }
    }
    out.push_str(prefix);
    if prefix.len() == 3 && !line.is_empty() {
        out.push('-');
    }
    out.push_str(line);
    out
}
