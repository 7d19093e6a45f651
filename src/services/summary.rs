use async_trait::async_trait;
use serde::Serialize;

use crate::common::SummaryError;
use crate::models::{InjuredStatus, LeadDraft};

/// Generated description of a visitor's situation.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Summary {
    text: String,
}

impl Summary {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Word-sized fragments, in order, for progressive display.
    pub fn fragments(&self) -> impl Iterator<Item = &str> + '_ {
        self.text.split_whitespace()
    }
}

/// Produces the summary shown on the funnel's summary step.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(&self, draft: &LeadDraft) -> Result<Summary, SummaryError>;
}

/// Local, deterministic summary built from the visitor's answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptedSummaryGenerator;

impl ScriptedSummaryGenerator {
    pub fn compose(draft: &LeadDraft) -> Result<Summary, SummaryError> {
        if draft.owner_type.is_none()
            && draft.property_damage.is_none()
            && draft.injured_status.is_none()
        {
            return Err(SummaryError::Incomplete);
        }

        let first_name = match draft.first_name.trim() {
            "" => "friend",
            name => name,
        };
        let owner = draft
            .owner_type
            .map(|o| o.describe())
            .unwrap_or("property owner");
        let damage = draft
            .property_damage
            .map(|d| d.describe())
            .unwrap_or("fire damage");
        let injuries = match draft.injured_status {
            Some(InjuredStatus::Injured) => " and injuries",
            _ => "",
        };

        let text = format!(
            "Great job {first_name} for taking the first step. \
             Our claims assistant has begun evaluating your fire claim as a \
             {owner} facing significant {damage}{injuries}. \
             To deliver a precise estimate tailored to your situation, we \
             need a few more details. Please share your contact information \
             so we can complete your evaluation and help you pursue the \
             compensation available to you. Thank you, {first_name}!"
        );

        Ok(Summary::new(text))
    }
}

#[async_trait]
impl SummaryGenerator for ScriptedSummaryGenerator {
    async fn generate(&self, draft: &LeadDraft) -> Result<Summary, SummaryError> {
        Self::compose(draft)
    }
}
