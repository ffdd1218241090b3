use crate::property::PropertyParam;

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Commands of both protocol generations. Miot devices speak
/// `get_properties`/`set_properties` with siid/piid addressing, older
/// firmwares speak `get_prop` and per-model raw methods.
#[derive(Debug, PartialEq)]
pub enum Command {
    GetProperties(Vec<PropertyParam>),
    SetProperty(PropertyParam),
    GetProps(&'static [&'static str]),
    PowerAll(bool),
    PowerOn(u8),
    PowerOff(u8),
    SetG2Enable(bool),
    SetCodeEnable(bool),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetProperties(_) => "get_properties",
            Command::SetProperty(_) => "set_properties",
            Command::GetProps(_) => "get_prop",
            Command::PowerAll(_) => "power_all",
            Command::PowerOn(_) => "power_on",
            Command::PowerOff(_) => "power_off",
            Command::SetG2Enable(_) => "set_g2enable",
            // the only camelCase method in the relay firmware
            Command::SetCodeEnable(_) => "set_codeEnable",
        }
    }
}

impl Serialize for Command {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Command::GetProperties(params) => {
                let mut seq = serializer.serialize_seq(Some(params.len()))?;

                for param in params.iter() {
                    seq.serialize_element(param)?;
                }

                seq.end()
            }
            Command::SetProperty(param) => {
                let mut seq = serializer.serialize_seq(Some(1))?;

                seq.serialize_element(param)?;

                seq.end()
            }
            Command::GetProps(properties) => {
                let mut seq = serializer.serialize_seq(Some(properties.len()))?;

                for property in properties.iter() {
                    seq.serialize_element(property)?;
                }

                seq.end()
            }
            Command::PowerAll(is_enabled)
            | Command::SetG2Enable(is_enabled)
            | Command::SetCodeEnable(is_enabled) => {
                let mut seq = serializer.serialize_seq(Some(1))?;

                seq.serialize_element(&(*is_enabled as u8))?;

                seq.end()
            }
            Command::PowerOn(index) | Command::PowerOff(index) => {
                let mut seq = serializer.serialize_seq(Some(1))?;

                seq.serialize_element(index)?;

                seq.end()
            }
        }
    }
}
