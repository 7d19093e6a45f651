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
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InjuredStatus {
    Injured,
    NotInjured,
}

impl InjuredStatus {
    pub const ALL: [Self; 2] = [Self::Injured, Self::NotInjured];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Injured => "injured",
            Self::NotInjured => "not_injured",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Injured => "Yes",
            Self::NotInjured => "No",
        }
    }
}

impl std::fmt::Display for InjuredStatus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InjuredStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "injured" => Ok(Self::Injured),
            "not_injured" => Ok(Self::NotInjured),
            _ => Err(format!("invalid injured status: {}", s)),
        }
    }
}
