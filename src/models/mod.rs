pub use attribution::*;
pub use injured_status::*;
pub use lead_draft::*;
pub use owner_type::*;
pub use property_damage::*;
pub use tracking_record::*;
pub use validation::*;

mod attribution;
mod injured_status;
mod lead_draft;
mod owner_type;
mod property_damage;
mod tracking_record;
mod validation;
