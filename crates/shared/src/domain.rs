use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(EventId);
id_newtype!(ActivityId);
id_newtype!(UniqueActivityId);
id_newtype!(ThemeId);
id_newtype!(ActivityTypeId);
id_newtype!(InstitutionId);
id_newtype!(TargetAudienceId);
id_newtype!(ResponsiblePartyId);

/// How attendees take part in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "presencial")]
    InPerson,
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "hibrido")]
    Hybrid,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::InPerson, Modality::Online, Modality::Hybrid];

    pub fn as_str(self) -> &'static str {
        match self {
            Modality::InPerson => "presencial",
            Modality::Online => "online",
            Modality::Hybrid => "hibrido",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Modality::InPerson => "Presencial",
            Modality::Online => "Online",
            Modality::Hybrid => "Híbrido",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown modality '{0}', expected presencial, online or hibrido")]
pub struct UnknownModality(pub String);

impl FromStr for Modality {
    type Err = UnknownModality;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "presencial" | "in-person" | "in_person" => Ok(Modality::InPerson),
            "online" => Ok(Modality::Online),
            "hibrido" | "híbrido" | "hybrid" => Ok(Modality::Hybrid),
            other => Err(UnknownModality(other.to_string())),
        }
    }
}

/// Which child collection an event uses. Never persisted; derived from the
/// collections themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMode {
    MultiActivity,
    UniqueActivity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_numbers() {
        assert_eq!(serde_json::to_string(&EventId(7)).expect("json"), "7");
        let id: ThemeId = serde_json::from_str("12").expect("json");
        assert_eq!(id, ThemeId(12));
    }

    #[test]
    fn modality_uses_portuguese_wire_names() {
        assert_eq!(
            serde_json::to_string(&Modality::Hybrid).expect("json"),
            "\"hibrido\""
        );
        assert_eq!("Presencial".parse::<Modality>(), Ok(Modality::InPerson));
        assert_eq!("híbrido".parse::<Modality>(), Ok(Modality::Hybrid));
        assert_eq!(
            "remote".parse::<Modality>().map_err(|err| err.to_string()),
            Err("unknown modality 'remote', expected presencial, online or hibrido".to_string())
        );
    }
}
