use askama::Template;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::funnel::{FunnelController, FunnelStep, StepKind, SummaryGate};
use crate::models::{
    format_phone, FieldIssue, InjuredStatus, OwnerType, PropertyDamage,
};
use crate::web::session::StateSeal;

pub struct ChoiceView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

pub struct WordView {
    pub text: String,
    pub delay_ms: u128,
}

/// Everything the funnel templates need for one render, precomputed from
/// the controller.
pub struct FunnelView {
    /// Serialized controller, posted back by every form.
    pub state: String,
    pub step_number: usize,
    pub step_total: usize,
    pub percent: usize,
    pub question: &'static str,
    /// One of `select`, `name`, `summary`, `contact`, `done`.
    pub mode: &'static str,
    pub field: &'static str,
    pub choices: Vec<ChoiceView>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub tcpa_consent: bool,
    pub summary_words: Vec<WordView>,
    pub generating: bool,
    pub summary_ready: bool,
    pub wait_ms: u64,
    pub can_go_back: bool,
    pub error: String,
    pub issues: Vec<FieldIssue>,
    pub warning: String,
}

impl FunnelView {
    pub fn build(
        funnel: &FunnelController,
        seal: &StateSeal,
        now: DateTime<Utc>,
        word_interval: Duration,
    ) -> Self {
        let draft = funnel.draft();
        let step = funnel.step();
        let (step_number, step_total) = funnel.progress();

        let (field, choices) = match step {
            FunnelStep::OwnerType => (
                "ownerType",
                OwnerType::ALL
                    .iter()
                    .map(|o| ChoiceView {
                        value: o.as_str(),
                        label: o.as_str(),
                        selected: draft.owner_type == Some(*o),
                    })
                    .collect(),
            ),
            FunnelStep::PropertyDamage => (
                "propertyDamage",
                PropertyDamage::ALL
                    .iter()
                    .map(|d| ChoiceView {
                        value: d.as_str(),
                        label: d.label(),
                        selected: draft.property_damage == Some(*d),
                    })
                    .collect(),
            ),
            FunnelStep::InjuredStatus => (
                "injuredStatus",
                InjuredStatus::ALL
                    .iter()
                    .map(|i| ChoiceView {
                        value: i.as_str(),
                        label: i.label(),
                        selected: draft.injured_status == Some(*i),
                    })
                    .collect(),
            ),
            _ => ("", Vec::new()),
        };

        let mode = if funnel.is_submitted() {
            "done"
        } else {
            match step.kind() {
                StepKind::Selection => "select",
                StepKind::FreeText => "name",
                StepKind::Summary => "summary",
                StepKind::Submit => "contact",
            }
        };

        let interval_ms = word_interval.as_millis();
        let summary_words = draft
            .summary
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .enumerate()
            .map(|(i, w)| WordView {
                text: w.to_string(),
                delay_ms: interval_ms.saturating_mul(i as u128),
            })
            .collect();

        let (generating, summary_ready, wait_ms) = match funnel.summary_gate(now) {
            SummaryGate::Generating => (true, false, 0),
            SummaryGate::Waiting { remaining } => (
                false,
                false,
                u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            ),
            SummaryGate::Ready => (false, true, 0),
        };

        Self {
            state: seal.seal(funnel).unwrap_or_else(|e| {
                log::error!("Failed to seal funnel state: {}", e);
                String::new()
            }),
            step_number,
            step_total,
            percent: step_number * 100 / step_total.max(1),
            question: step.question(),
            mode,
            field,
            choices,
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            email: draft.email.clone(),
            phone: format_phone(&draft.phone),
            tcpa_consent: draft.tcpa_consent,
            summary_words,
            generating,
            summary_ready,
            wait_ms,
            can_go_back: step != FunnelStep::OwnerType && !funnel.is_submitted(),
            error: String::new(),
            issues: Vec::new(),
            warning: String::new(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    pub fn with_issues(mut self, issues: Vec<FieldIssue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning.unwrap_or_default();
        self
    }
}

/// Full page: landing render or a non-htmx form post.
#[derive(Template)]
#[template(path = "funnel/page.html")]
pub struct FunnelPageTemplate {
    pub view: FunnelView,
}

/// The `#funnel` fragment swapped in by htmx.
#[derive(Template)]
#[template(path = "funnel/step.html")]
pub struct FunnelStepTemplate {
    pub view: FunnelView,
}
