use std::fmt;
use std::str::FromStr;

use miot::Mode;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SetIsEnabled(bool),
    SetHumidity(u8),
    SetMode(Mode),
    SetSwitch { key: SwitchKey, is_enabled: bool },
}

/// Sub-entity key: `g{g}s{s}` for a relay switch, a named flag, or a
/// spec service name.
#[derive(Clone, Debug, PartialEq)]
pub enum SwitchKey {
    Relay { group: u8, switch: u8 },
    G2Enable,
    CodeEnable,
    Service(String),
}

fn parse_key(s: &str) -> SwitchKey {
    match s {
        "g2_enable" => return SwitchKey::G2Enable,
        "code_enable" => return SwitchKey::CodeEnable,
        _ => (),
    }

    if let Some((group, switch)) = s.strip_prefix('g').and_then(|rest| rest.split_once('s')) {
        if let (Ok(group), Ok(switch)) = (group.parse(), switch.parse()) {
            return SwitchKey::Relay { group, switch };
        }
    }

    SwitchKey::Service(s.to_string())
}

impl fmt::Display for SwitchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchKey::Relay { group, switch } => write!(f, "g{group}s{switch}"),
            SwitchKey::G2Enable => write!(f, "g2_enable"),
            SwitchKey::CodeEnable => write!(f, "code_enable"),
            SwitchKey::Service(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for SwitchKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_key(s))
    }
}

impl Serialize for SwitchKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SwitchKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = SwitchKey;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    f,
                    "a switch key like g1s3, g2_enable, code_enable or a service name"
                )
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<SwitchKey, E> {
                Ok(parse_key(value))
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}
