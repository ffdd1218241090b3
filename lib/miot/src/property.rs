use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Address of a property inside a Miot instance: service id + property id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PropertyId {
    pub siid: u8,
    pub piid: u8,
}

impl PropertyId {
    pub const fn new(siid: u8, piid: u8) -> Self {
        Self { siid, piid }
    }
}

/// One entry of a `get_properties` / `set_properties` params array.
/// `did` carries the property name, so replies can be matched without
/// keeping the request around.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyParam {
    pub did: String,
    pub siid: u8,
    pub piid: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PropertyParam {
    pub fn get(name: &str, id: PropertyId) -> Self {
        Self {
            did: name.to_string(),
            siid: id.siid,
            piid: id.piid,
            value: None,
        }
    }

    pub fn set(name: &str, id: PropertyId, value: Value) -> Self {
        Self {
            did: name.to_string(),
            siid: id.siid,
            piid: id.piid,
            value: Some(value),
        }
    }
}

/// One entry of a `get_properties` / `set_properties` reply.
#[derive(Clone, Debug, Deserialize)]
pub struct PropertyResult {
    pub did: String,
    #[serde(default)]
    pub siid: u8,
    #[serde(default)]
    pub piid: u8,
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub value: Option<Value>,
}

impl PropertyResult {
    /// Zero code means the device accepted the entry.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Every entry accepted, and there is at least one.
pub(crate) fn all_accepted(results: &[PropertyResult]) -> bool {
    !results.is_empty() && results.iter().all(PropertyResult::is_ok)
}

pub(crate) fn truthy(value: &Value) -> bool {
    value.as_bool().unwrap_or(value.as_i64().unwrap_or(0) != 0)
}

pub(crate) fn int(value: &Value) -> i64 {
    value.as_i64().unwrap_or_default()
}

/// Ordered name → address table of one device model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, PropertyId)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_static(entries: &[(&str, PropertyId)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(name, id)| ((*name).to_string(), *id))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: &str, id: PropertyId) {
        if let Some(entry) = self.entries.iter_mut().find(|(known, _)| known == name) {
            entry.1 = id;
        } else {
            self.entries.push((name.to_string(), id));
        }
    }

    pub fn extend(&mut self, other: Mapping) {
        for (name, id) in other.entries {
            self.insert(&name, id);
        }
    }

    pub fn property(&self, name: &str) -> Option<PropertyId> {
        self.entries
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, id)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PropertyId)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read params for every mapped property, in table order.
    pub fn get_params(&self) -> Vec<PropertyParam> {
        self.iter()
            .map(|(name, id)| PropertyParam::get(name, id))
            .collect()
    }
}
