use serde::{Deserialize, Serialize};

use crate::models::{InjuredStatus, OwnerType, PropertyDamage, FieldIssue};

/// Number of steps in the funnel.
pub const STEP_COUNT: usize = 6;

#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStep {
    #[default]
    OwnerType,
    PropertyDamage,
    InjuredStatus,
    Name,
    Summary,
    Contact,
}

/// What kind of interaction a step expects.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StepKind {
    /// Pick one option; picking advances.
    Selection,
    /// Required text fields, advanced explicitly after validation.
    FreeText,
    /// Shows the generated summary, gated by a display timer.
    Summary,
    /// Final step; submits instead of advancing.
    Submit,
}

impl FunnelStep {
    pub const ALL: [Self; STEP_COUNT] = [
        Self::OwnerType,
        Self::PropertyDamage,
        Self::InjuredStatus,
        Self::Name,
        Self::Summary,
        Self::Contact,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Next step, saturating at the last one.
    pub fn next(self) -> Self {
        Self::from_index((self.index() + 1).min(STEP_COUNT - 1)).unwrap_or(self)
    }

    /// Previous step, saturating at the first one.
    pub fn prev(self) -> Self {
        Self::from_index(self.index().saturating_sub(1)).unwrap_or(self)
    }

    pub fn is_last(self) -> bool {
        self.index() == STEP_COUNT - 1
    }

    pub fn kind(self) -> StepKind {
        match self {
            Self::OwnerType | Self::PropertyDamage | Self::InjuredStatus => {
                StepKind::Selection
            }
            Self::Name => StepKind::FreeText,
            Self::Summary => StepKind::Summary,
            Self::Contact => StepKind::Submit,
        }
    }

    pub fn question(self) -> &'static str {
        match self {
            Self::OwnerType => "What best describes you?",
            Self::PropertyDamage => "What kind of damage?",
            Self::InjuredStatus => "Were you injured?",
            Self::Name => "Enter your name",
            Self::Summary => "Your claim evaluation",
            Self::Contact => "How can we contact you?",
        }
    }
}

/// An answer to one of the selection steps.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Selection {
    Owner(OwnerType),
    Damage(PropertyDamage),
    Injury(InjuredStatus),
}

impl Selection {
    /// Step that owns the field this selection sets.
    pub fn step(&self) -> FunnelStep {
        match self {
            Self::Owner(_) => FunnelStep::OwnerType,
            Self::Damage(_) => FunnelStep::PropertyDamage,
            Self::Injury(_) => FunnelStep::InjuredStatus,
        }
    }

    /// Parses a `(field, value)` pair as posted by the selection buttons.
    pub fn parse(field: &str, value: &str) -> Result<Self, FieldIssue> {
        match field {
            "ownerType" => value
                .parse()
                .map(Self::Owner)
                .map_err(|e: String| FieldIssue::new(field, e)),
            "propertyDamage" => value
                .parse()
                .map(Self::Damage)
                .map_err(|e: String| FieldIssue::new(field, e)),
            "injuredStatus" => value
                .parse()
                .map(Self::Injury)
                .map_err(|e: String| FieldIssue::new(field, e)),
            other => Err(FieldIssue::new(other, "unknown selection field")),
        }
    }
}
