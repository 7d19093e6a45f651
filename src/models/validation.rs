use serde::{Deserialize, Serialize};

use crate::models::{
    normalize_phone, InjuredStatus, LeadDraft, OwnerType, PropertyDamage,
    PHONE_DIGITS,
};

/// One field-level problem reported back to the visitor.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A draft that passed the completion schema. Only constructible through
/// [`validate_complete`], so holding one proves the checks ran.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ValidatedLead {
    draft: LeadDraft,
}

impl ValidatedLead {
    pub fn draft(&self) -> &LeadDraft {
        &self.draft
    }

    pub fn into_draft(self) -> LeadDraft {
        self.draft
    }

    pub fn owner_type(&self) -> Option<OwnerType> {
        self.draft.owner_type
    }

    pub fn property_damage(&self) -> Option<PropertyDamage> {
        self.draft.property_damage
    }

    pub fn injured_status(&self) -> Option<InjuredStatus> {
        self.draft.injured_status
    }
}

/// Basic email shape: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> bool {
    let email = email.trim();

    if email.is_empty() || email.len() > 254 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }

    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

pub fn validate_name(first_name: &str, last_name: &str) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    if first_name.trim().is_empty() {
        issues.push(FieldIssue::new("firstName", "First name is required"));
    }
    if last_name.trim().is_empty() {
        issues.push(FieldIssue::new("lastName", "Last name is required"));
    }
    issues
}

pub fn validate_contact(email: &str, phone: &str) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    if email.trim().is_empty() {
        issues.push(FieldIssue::new("email", "Email is required"));
    } else if !validate_email(email) {
        issues.push(FieldIssue::new("email", "Enter a valid email address"));
    }

    let digits = normalize_phone(phone);
    if digits.is_empty() {
        issues.push(FieldIssue::new("phone", "Phone number is required"));
    } else if digits.len() != PHONE_DIGITS {
        issues.push(FieldIssue::new(
            "phone",
            format!("Phone number must have {} digits", PHONE_DIGITS),
        ));
    }
    issues
}

/// Completion schema. Trims names and email, normalizes the phone, and
/// either returns the cleaned draft or every field issue found.
pub fn validate_complete(
    draft: &LeadDraft,
) -> Result<ValidatedLead, Vec<FieldIssue>> {
    let mut issues = validate_name(&draft.first_name, &draft.last_name);
    issues.extend(validate_contact(&draft.email, &draft.phone));

    if !issues.is_empty() {
        return Err(issues);
    }

    let mut clean = draft.clone();
    clean.first_name = draft.first_name.trim().to_string();
    clean.last_name = draft.last_name.trim().to_string();
    clean.email = draft.email.trim().to_string();
    clean.phone = normalize_phone(&draft.phone);

    Ok(ValidatedLead { draft: clean })
}
