use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "text")]
pub enum OwnerType {
    Homeowner,
    Renter,
    #[serde(rename = "Business Owner", alias = "BusinessOwner")]
    #[sqlx(rename = "Business Owner")]
    BusinessOwner,
    #[serde(rename = "Multifamily Owner", alias = "MultifamilyOwner")]
    #[sqlx(rename = "Multifamily Owner")]
    MultifamilyOwner,
}

impl OwnerType {
    pub const ALL: [Self; 4] = [
        Self::Homeowner,
        Self::Renter,
        Self::BusinessOwner,
        Self::MultifamilyOwner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homeowner => "Homeowner",
            Self::Renter => "Renter",
            Self::BusinessOwner => "Business Owner",
            Self::MultifamilyOwner => "Multifamily Owner",
        }
    }

    /// Wording used inside generated summaries.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Homeowner => "homeowner",
            Self::Renter => "renter",
            Self::BusinessOwner => "business owner",
            Self::MultifamilyOwner => "multifamily property owner",
        }
    }
}

impl std::fmt::Display for OwnerType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OwnerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "homeowner" => Ok(Self::Homeowner),
            "renter" => Ok(Self::Renter),
            "businessowner" => Ok(Self::BusinessOwner),
            "multifamilyowner" => Ok(Self::MultifamilyOwner),
            _ => Err(format!("invalid owner type: {}", s)),
        }
    }
}
