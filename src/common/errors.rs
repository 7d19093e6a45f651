use thiserror::Error;
use uuid::Uuid;

use crate::models::FieldIssue;

#[derive(Error, Debug)]
pub enum GeneralError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CRM client error: {0}")]
    Crm(#[from] ForwardError),

    #[error("Pixel client error: {0}")]
    Pixel(#[from] PixelError),

    #[error("Funnel session error: {0}")]
    Session(#[from] SessionError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be at least {min} characters long")]
    TooShort { key: &'static str, min: usize },
}

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("Lead {0} not found")]
    NotFound(Uuid),

    #[error("Lead {0} is already completed")]
    AlreadyCompleted(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Funnel transition refusals. All of them leave the funnel where it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("Please correct the highlighted fields")]
    Validation(Vec<FieldIssue>),

    #[error("This answer belongs to a different step")]
    WrongStep,

    #[error("Your summary is still being prepared")]
    SummaryPending,

    #[error("This form has already been submitted")]
    Submitted,
}

impl StepError {
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::Validation(issues) => issues,
            _ => &[],
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Lead failed validation")]
    Validation(Vec<FieldIssue>),

    #[error("CRM webhook URL and auth token must be configured")]
    MissingCrmConfig,

    #[error("Lead {0} was already submitted")]
    AlreadyCompleted(Uuid),

    #[error("Persistence error: {0}")]
    Persistence(#[from] LeadError),
}

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("CRM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("CRM rejected the lead with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum PixelError {
    #[error("Pixel request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Not enough answers to summarize")]
    Incomplete,

    #[error("Summary provider failed: {0}")]
    Provider(String),
}

/// Reasons a funnel state posted back by the page is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Funnel state key is invalid")]
    InvalidKey,

    #[error("Funnel state could not be encoded: {0}")]
    Encode(String),

    #[error("Funnel state is malformed")]
    Malformed,

    #[error("Funnel state signature does not match")]
    BadSignature,

    #[error("Funnel state skips a step")]
    Inconsistent,
}
