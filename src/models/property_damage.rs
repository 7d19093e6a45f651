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
pub enum PropertyDamage {
    #[serde(rename = "property_destroyed", alias = "destroyed")]
    #[sqlx(rename = "property_destroyed")]
    Destroyed,
    #[serde(rename = "partial_damaged", alias = "partial")]
    #[sqlx(rename = "partial_damaged")]
    Partial,
    #[serde(rename = "smoke_damage", alias = "smoke")]
    #[sqlx(rename = "smoke_damage")]
    Smoke,
    #[serde(rename = "evac_only")]
    #[sqlx(rename = "evac_only")]
    EvacOnly,
}

impl PropertyDamage {
    pub const ALL: [Self; 4] =
        [Self::Destroyed, Self::Partial, Self::Smoke, Self::EvacOnly];

    /// Value sent to the CRM and stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Destroyed => "property_destroyed",
            Self::Partial => "partial_damaged",
            Self::Smoke => "smoke_damage",
            Self::EvacOnly => "evac_only",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Destroyed => "Lost Home",
            Self::Partial => "Partial Damage",
            Self::Smoke => "Smoke Damage",
            Self::EvacOnly => "Evacuation Only",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Destroyed => "property loss",
            Self::Partial => "partial damage",
            Self::Smoke => "smoke damage",
            Self::EvacOnly => "evacuation losses",
        }
    }
}

impl std::fmt::Display for PropertyDamage {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PropertyDamage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "property_destroyed" | "destroyed" => Ok(Self::Destroyed),
            "partial_damaged" | "partial" => Ok(Self::Partial),
            "smoke_damage" | "smoke" => Ok(Self::Smoke),
            "evac_only" => Ok(Self::EvacOnly),
            _ => Err(format!("invalid property damage: {}", s)),
        }
    }
}
