use crate::device::CommandExecutorTrait;
use crate::{Command, Result};

use log::debug;
use serde_json::Value;

/// Legacy property list, in the order the device reports them.
const PROPS: &[&str] = &[
    "relay_names_g1",
    "relay_status_g1",
    "relay_names_g2",
    "relay_status_g2",
    "g2Enable",
    "codeEnable",
];

/// One status word per group, so 16 switches at most.
const SWITCHES_PER_GROUP: usize = 16;

#[derive(Clone, Debug, Default, PartialEq)]
struct Group {
    names: Vec<String>,
    status: u16,
}

impl Group {
    fn new(names: &str, status: u16) -> Group {
        let names = if names.is_empty() {
            Vec::new()
        } else {
            names
                .split('-')
                .take(SWITCHES_PER_GROUP)
                .map(String::from)
                .collect()
        };

        Group { names, status }
    }
}

/// Decoded sub-switch: bit `switch - 1` of its group's status word.
#[derive(Clone, Debug, PartialEq)]
pub struct SubSwitch {
    /// 1-based group number, first half of the `g{g}s{s}` key.
    pub group: u8,
    /// 1-based position inside the group, second half of the key.
    pub switch: u8,
    /// Global position across groups, the `power_on`/`power_off` argument.
    pub index: u8,
    pub name: String,
    pub is_enabled: bool,
}

impl SubSwitch {
    pub fn key(&self) -> String {
        format!("g{}s{}", self.group, self.switch)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelayStatus {
    groups: [Group; 2],
    pub g2_enable: Option<bool>,
    pub code_enable: Option<bool>,
}

impl RelayStatus {
    fn from_values(values: &[Value]) -> RelayStatus {
        RelayStatus {
            groups: [
                Group::new(str_at(values, 0), word_at(values, 1)),
                Group::new(str_at(values, 2), word_at(values, 3)),
            ],
            g2_enable: flag_at(values, 4),
            code_enable: flag_at(values, 5),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.groups.iter().any(|group| group.status != 0)
    }

    pub fn switches(&self) -> Vec<SubSwitch> {
        let mut switches = Vec::new();
        let mut index = 0u8;

        for (g, group) in self.groups.iter().enumerate() {
            for (s, name) in group.names.iter().enumerate() {
                switches.push(SubSwitch {
                    group: g as u8 + 1,
                    switch: s as u8 + 1,
                    index,
                    name: name.clone(),
                    is_enabled: group.status & (1 << s) != 0,
                });

                index += 1;
            }
        }

        switches
    }

    fn set_all(&mut self, is_enabled: bool) {
        let status = if is_enabled { u16::MAX } else { 0 };

        for group in &mut self.groups {
            group.status = status;
        }
    }

    fn set_index(&mut self, index: u8, is_enabled: bool) {
        let mut index = index as usize;

        for group in &mut self.groups {
            if index < group.names.len() {
                if is_enabled {
                    group.status |= 1 << index;
                } else {
                    group.status &= !(1 << index);
                }

                return;
            }

            index -= group.names.len();
        }
    }
}

fn str_at(values: &[Value], index: usize) -> &str {
    values.get(index).and_then(Value::as_str).unwrap_or_default()
}

fn word_at(values: &[Value], index: usize) -> u16 {
    match values.get(index) {
        // only the low 16 bits carry switch state
        Some(Value::Number(number)) => (number.as_u64().unwrap_or_default() & 0xFFFF) as u16,
        Some(Value::String(string)) => string.parse().unwrap_or_default(),
        _ => 0,
    }
}

fn flag_at(values: &[Value], index: usize) -> Option<bool> {
    match values.get(index) {
        Some(Value::Bool(flag)) => Some(*flag),
        Some(Value::Number(number)) => Some(number.as_i64().unwrap_or_default() != 0),
        _ => None,
    }
}

/// Some firmwares reply `[0]`, others `["ok"]`.
fn is_legacy_success(result: &Value) -> bool {
    match result.as_array().and_then(|items| items.first()) {
        Some(Value::Number(number)) => number.as_i64() == Some(0),
        Some(Value::String(string)) => string == "ok",
        _ => false,
    }
}

pub struct RelayBank<E> {
    executor: E,
    status: Option<RelayStatus>,
}

impl<E> RelayBank<E> {
    pub fn status(&self) -> Option<&RelayStatus> {
        self.status.as_ref()
    }
}

impl<E: CommandExecutorTrait + Send> RelayBank<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            status: None,
        }
    }

    pub async fn update(&mut self) -> Result<&RelayStatus> {
        let result = self.executor.execute_command(Command::GetProps(PROPS)).await?;
        let values: Vec<Value> = serde_json::from_value(result)?;

        let status = RelayStatus::from_values(&values);
        debug!("relay status: {status:?}");

        Ok(&*self.status.insert(status))
    }

    pub async fn power_all(&mut self, is_enabled: bool) -> Result<bool> {
        let accepted = self.send(Command::PowerAll(is_enabled)).await?;

        if accepted {
            if let Some(status) = &mut self.status {
                status.set_all(is_enabled);
            }
        }

        Ok(accepted)
    }

    pub async fn set_switch(&mut self, index: u8, is_enabled: bool) -> Result<bool> {
        let command = if is_enabled {
            Command::PowerOn(index)
        } else {
            Command::PowerOff(index)
        };

        let accepted = self.send(command).await?;

        if accepted {
            if let Some(status) = &mut self.status {
                status.set_index(index, is_enabled);
            }
        }

        Ok(accepted)
    }

    pub async fn set_g2_enable(&mut self, is_enabled: bool) -> Result<bool> {
        let accepted = self.send(Command::SetG2Enable(is_enabled)).await?;

        if accepted {
            if let Some(status) = &mut self.status {
                status.g2_enable = Some(is_enabled);
            }
        }

        Ok(accepted)
    }

    pub async fn set_code_enable(&mut self, is_enabled: bool) -> Result<bool> {
        let accepted = self.send(Command::SetCodeEnable(is_enabled)).await?;

        if accepted {
            if let Some(status) = &mut self.status {
                status.code_enable = Some(is_enabled);
            }
        }

        Ok(accepted)
    }

    async fn send(&mut self, command: Command) -> Result<bool> {
        let result = self.executor.execute_command(command).await?;

        Ok(is_legacy_success(&result))
    }
}
