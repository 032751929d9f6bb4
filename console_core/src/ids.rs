//! Canonical identifier types.
//!
//! The backend is inconsistent about ids: some endpoints send `42`, others
//! `"42"`, and navigation state carries whatever the originating screen had.
//! Every id is converted once, at deserialization time, into an `i64`
//! newtype so the rest of the crate compares ids with plain `==`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(i64),
    Text(String),
}

fn parse_raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match RawId::deserialize(deserializer)? {
        RawId::Num(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid id {s:?}"))),
    }
}

macro_rules! entity_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map($name)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                $name(v)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_i64(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                parse_raw(deserializer).map($name)
            }
        }
    )+};
}

entity_id!(
    MiqaatId,
    JamiaatId,
    JamaatId,
    TeamId,
    LocationId,
    VenueId,
    DutyId,
    RoleId,
    InchargeId,
);

/// ITS identifier of a member. Always eight ASCII digits.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItsId(String);

impl ItsId {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit())).then(|| ItsId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItsId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match RawId::deserialize(deserializer)? {
            RawId::Num(n) => format!("{n:08}"),
            RawId::Text(s) => s,
        };
        ItsId::parse(&text).ok_or_else(|| serde::de::Error::custom(format!("invalid ITS id {text:?}")))
    }
}

/// Locally unique id of a staged, not yet persisted, duty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TempId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        let a: TeamId = serde_json::from_str("17").unwrap();
        let b: TeamId = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<TeamId>("\"seventeen\"").is_err());
    }

    #[test]
    fn ids_serialize_as_numbers() {
        assert_eq!(serde_json::to_string(&MiqaatId(9)).unwrap(), "9");
    }

    #[test]
    fn its_id_requires_eight_digits() {
        assert!(ItsId::parse("30301234").is_some());
        assert!(ItsId::parse("3030123").is_none());
        assert!(ItsId::parse("3030123a").is_none());
        let from_num: ItsId = serde_json::from_str("30301234").unwrap();
        assert_eq!(from_num.as_str(), "30301234");
    }
}
