use std::collections::BTreeMap;

use miot::{DehumidifierStatus, DeviceClass, MiotSwitch, RelayStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Dehumidifier(DehumidifierStatus),
    Relay(RelayState),
    Switches(Vec<SwitchState>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayState {
    pub is_enabled: bool,
    pub switches: Vec<SubSwitchState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g2_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_enable: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubSwitchState {
    pub key: String,
    pub name: String,
    pub index: u8,
    pub is_enabled: bool,
}

impl RelayState {
    pub fn new(status: &RelayStatus, advanced: bool) -> RelayState {
        RelayState {
            is_enabled: status.is_enabled(),
            switches: status
                .switches()
                .into_iter()
                .map(|sub| SubSwitchState {
                    key: sub.key(),
                    name: sub.name,
                    index: sub.index,
                    is_enabled: sub.is_enabled,
                })
                .collect(),
            g2_enable: if advanced { status.g2_enable } else { None },
            code_enable: if advanced { status.code_enable } else { None },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwitchState {
    pub key: String,
    pub name: String,
    pub device_class: DeviceClass,
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, Value>,
}

impl SwitchState {
    /// `None` until the switch has been read at least once.
    pub fn new<E>(switch: &MiotSwitch<E>) -> Option<SwitchState> {
        Some(SwitchState {
            key: switch.key().to_string(),
            name: switch.name().to_string(),
            device_class: switch.device_class(),
            is_enabled: switch.is_enabled()?,
            attrs: switch.attrs().clone(),
        })
    }
}
