use serde::Deserialize;

use crate::funnel::ContactInput;

/// Every funnel form carries the serialized session in `state`.
#[derive(Deserialize)]
pub struct StateForm {
    pub state: String,
}

#[derive(Deserialize)]
pub struct SelectForm {
    pub state: String,
    pub field: String,
    pub value: String,
}

#[derive(Deserialize)]
pub struct NameForm {
    pub state: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Deserialize)]
pub struct ContactForm {
    pub state: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Checkbox: present (any value) when ticked.
    pub tcpa_consent: Option<String>,
}

impl ContactForm {
    pub fn contact(&self) -> ContactInput {
        ContactInput {
            email: self.email.clone(),
            phone: self.phone.clone(),
            tcpa_consent: self.tcpa_consent.is_some(),
        }
    }
}
