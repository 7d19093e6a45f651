pub mod crm;
pub mod gateway;
pub mod pixels;
pub mod summary;

pub use crm::{CrmForwarder, CrmPayload, WebhookCrmClient};
pub use gateway::{
    CompletedLead, ForwardOutcome, GatewaySettings, LeadGateway, PartialOutcome,
};
pub use pixels::{HttpPixelFirer, NoopPixelFirer, PixelEvent, PixelFirer};
pub use summary::{ScriptedSummaryGenerator, Summary, SummaryGenerator};
