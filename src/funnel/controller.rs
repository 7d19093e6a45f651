use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::time::Duration;

use crate::common::StepError;
use crate::funnel::{FunnelStep, Selection, STEP_COUNT};
use crate::models::{
    normalize_phone, validate_complete, validate_contact, validate_name,
    Attribution, FieldIssue, LeadDraft, ValidatedLead,
};

/// Where the summary step's forward control stands.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SummaryGate {
    /// No summary has been attached yet.
    Generating,
    /// Summary is shown; the proceed control unlocks after `remaining`.
    Waiting { remaining: Duration },
    Ready,
}

/// Contact details typed on the final step.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub email: String,
    pub phone: String,
    pub tcpa_consent: bool,
}

/// Linear state machine driving one funnel session.
///
/// Owns the session's [`LeadDraft`]. Every operation either applies fully
/// or returns a [`StepError`] and leaves the controller untouched.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelController {
    step: FunnelStep,
    draft: LeadDraft,
    lead_id: Option<Uuid>,
    proceed_at: Option<DateTime<Utc>>,
    submitted: bool,
}

impl FunnelController {
    pub fn new(attribution: Attribution) -> Self {
        Self {
            step: FunnelStep::default(),
            draft: LeadDraft::with_attribution(attribution),
            lead_id: None,
            proceed_at: None,
            submitted: false,
        }
    }

    pub fn step(&self) -> FunnelStep {
        self.step
    }

    pub fn draft(&self) -> &LeadDraft {
        &self.draft
    }

    pub fn lead_id(&self) -> Option<Uuid> {
        self.lead_id
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// 1-based position and total, for the progress bar.
    pub fn progress(&self) -> (usize, usize) {
        (self.step.index() + 1, STEP_COUNT)
    }

    /// Keeps the identifier returned by the partial write for the
    /// completion call.
    pub fn remember_lead_id(&mut self, id: Uuid) {
        self.lead_id = Some(id);
    }

    /// Checks that every step before the current one has its answer.
    /// Used on state coming back from the client.
    pub fn is_consistent(&self) -> bool {
        FunnelStep::ALL
            .iter()
            .take_while(|s| **s < self.step)
            .all(|s| self.owned_fields_set(*s))
    }

    fn owned_fields_set(&self, step: FunnelStep) -> bool {
        match step {
            FunnelStep::OwnerType => self.draft.owner_type.is_some(),
            FunnelStep::PropertyDamage => self.draft.property_damage.is_some(),
            FunnelStep::InjuredStatus => self.draft.injured_status.is_some(),
            FunnelStep::Name => {
                validate_name(&self.draft.first_name, &self.draft.last_name)
                    .is_empty()
            }
            FunnelStep::Summary => self.draft.summary.is_some(),
            FunnelStep::Contact => {
                validate_contact(&self.draft.email, &self.draft.phone)
                    .is_empty()
            }
        }
    }

    fn ensure_open(&self) -> Result<(), StepError> {
        if self.submitted {
            return Err(StepError::Submitted);
        }
        Ok(())
    }

    fn requirement_issues(&self, now: DateTime<Utc>) -> Result<(), StepError> {
        let missing = |field: &str, message: &str| -> Result<(), StepError> {
            Err(StepError::Validation(vec![FieldIssue::new(field, message)]))
        };

        match self.step {
            FunnelStep::OwnerType if self.draft.owner_type.is_none() => {
                missing("ownerType", "Please choose an option")
            }
            FunnelStep::PropertyDamage
                if self.draft.property_damage.is_none() =>
            {
                missing("propertyDamage", "Please choose an option")
            }
            FunnelStep::InjuredStatus
                if self.draft.injured_status.is_none() =>
            {
                missing("injuredStatus", "Please choose an option")
            }
            FunnelStep::Name => {
                let issues = validate_name(
                    &self.draft.first_name,
                    &self.draft.last_name,
                );
                if issues.is_empty() {
                    Ok(())
                } else {
                    Err(StepError::Validation(issues))
                }
            }
            FunnelStep::Summary => match self.summary_gate(now) {
                SummaryGate::Ready => Ok(()),
                _ => Err(StepError::SummaryPending),
            },
            FunnelStep::Contact => {
                let issues =
                    validate_contact(&self.draft.email, &self.draft.phone);
                if issues.is_empty() {
                    Ok(())
                } else {
                    Err(StepError::Validation(issues))
                }
            }
            _ => Ok(()),
        }
    }

    /// Moves forward one step when the current step is satisfied.
    pub fn advance(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<FunnelStep, StepError> {
        self.ensure_open()?;
        self.requirement_issues(now)?;

        let next = self.step.next();
        if next == FunnelStep::Summary && self.step != FunnelStep::Summary {
            // Entering the summary step always waits for a fresh summary.
            self.proceed_at = None;
        }
        self.step = next;
        Ok(self.step)
    }

    /// Moves back one step. Entered answers are kept.
    pub fn retreat(&mut self) -> Result<FunnelStep, StepError> {
        self.ensure_open()?;
        self.step = self.step.prev();
        Ok(self.step)
    }

    /// Records a selection and advances in one step.
    pub fn select(
        &mut self,
        selection: Selection,
    ) -> Result<FunnelStep, StepError> {
        self.ensure_open()?;
        if selection.step() != self.step {
            return Err(StepError::WrongStep);
        }

        match selection {
            Selection::Owner(v) => self.draft.owner_type = Some(v),
            Selection::Damage(v) => self.draft.property_damage = Some(v),
            Selection::Injury(v) => self.draft.injured_status = Some(v),
        }

        // The owning field is now set, so the transition cannot be refused.
        self.step = self.step.next();
        Ok(self.step)
    }

    /// Validates and stores both names, then advances.
    pub fn submit_name(
        &mut self,
        first_name: &str,
        last_name: &str,
    ) -> Result<FunnelStep, StepError> {
        self.ensure_open()?;
        if self.step != FunnelStep::Name {
            return Err(StepError::WrongStep);
        }

        let issues = validate_name(first_name, last_name);
        if !issues.is_empty() {
            return Err(StepError::Validation(issues));
        }

        self.draft.first_name = first_name.trim().to_string();
        self.draft.last_name = last_name.trim().to_string();
        self.step = self.step.next();
        self.proceed_at = None;
        Ok(self.step)
    }

    /// Stores a finished summary and starts the display timer.
    pub fn attach_summary(
        &mut self,
        summary: String,
        now: DateTime<Utc>,
        min_display: Duration,
    ) -> Result<(), StepError> {
        self.ensure_open()?;
        if self.step != FunnelStep::Summary {
            return Err(StepError::WrongStep);
        }

        let delay = chrono::Duration::milliseconds(
            i64::try_from(min_display.as_millis()).unwrap_or(i64::MAX / 2),
        );
        self.draft.summary = Some(summary);
        self.proceed_at =
            Some(now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC));
        Ok(())
    }

    pub fn summary_gate(&self, now: DateTime<Utc>) -> SummaryGate {
        match self.proceed_at {
            None => SummaryGate::Generating,
            Some(_) if self.draft.summary.is_none() => SummaryGate::Generating,
            Some(at) if now >= at => SummaryGate::Ready,
            Some(at) => SummaryGate::Waiting {
                remaining: (at - now).to_std().unwrap_or_default(),
            },
        }
    }

    /// Validates the contact step and the whole draft for submission.
    /// On success the contact fields are stored (phone normalized) and the
    /// validated lead is handed back for the gateway.
    pub fn prepare_submission(
        &mut self,
        contact: &ContactInput,
    ) -> Result<ValidatedLead, StepError> {
        self.ensure_open()?;
        if self.step != FunnelStep::Contact {
            return Err(StepError::WrongStep);
        }

        let issues = validate_contact(&contact.email, &contact.phone);
        if !issues.is_empty() {
            return Err(StepError::Validation(issues));
        }

        let mut candidate = self.draft.clone();
        candidate.email = contact.email.trim().to_string();
        candidate.phone = normalize_phone(&contact.phone);
        candidate.tcpa_consent = contact.tcpa_consent;

        let validated =
            validate_complete(&candidate).map_err(StepError::Validation)?;
        self.draft = candidate;
        Ok(validated)
    }

    /// Terminal transition after the completion write succeeded.
    pub fn mark_submitted(&mut self, lead_id: Uuid) -> Result<(), StepError> {
        self.ensure_open()?;
        if self.step != FunnelStep::Contact {
            return Err(StepError::WrongStep);
        }
        self.lead_id = Some(lead_id);
        self.submitted = true;
        Ok(())
    }
}
