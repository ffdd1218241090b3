use crate::device::CommandExecutorTrait;
use crate::property::{self, Mapping, PropertyId, PropertyResult};
use crate::{Command, PropertyParam, Result};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const MIN_HUMIDITY: u8 = 30;
pub const MAX_HUMIDITY: u8 = 70;

/// The device rounds the target to one of these anyway.
const TARGET_HUMIDITY_STEPS: [u8; 5] = [30, 40, 50, 60, 70];

/// nwt.derh.312en property table.
const MAPPING: &[(&str, PropertyId)] = &[
    ("power", PropertyId::new(2, 1)),
    ("fault", PropertyId::new(2, 2)),
    ("mode", PropertyId::new(2, 3)),
    ("target_humidity", PropertyId::new(2, 5)),
    ("fan_level", PropertyId::new(2, 7)),
    ("relative_humidity", PropertyId::new(3, 1)),
    ("temperature", PropertyId::new(3, 7)),
    ("alarm", PropertyId::new(4, 1)),
    ("indicator_light", PropertyId::new(5, 1)),
    ("physical_controls_locked", PropertyId::new(6, 1)),
    ("coil_temp", PropertyId::new(7, 1)),
    ("compressor_status", PropertyId::new(7, 2)),
    ("water_tank_status", PropertyId::new(7, 3)),
    ("defrost_status", PropertyId::new(7, 4)),
    ("timer_service", PropertyId::new(8, 1)),
    ("timer_setting", PropertyId::new(8, 2)),
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Off,
    TargetHumid,
    DryCloth,
}

impl Mode {
    pub fn device_value(&self) -> i64 {
        match self {
            Mode::Off => -1,
            Mode::TargetHumid => 0,
            Mode::DryCloth => 1,
        }
    }

    fn from_device_value(value: i64) -> Mode {
        match value {
            0 => Mode::TargetHumid,
            1 => Mode::DryCloth,
            _ => Mode::Off,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub is_enabled: bool,
    pub mode: Mode,
    pub target_humidity: u8,
    pub fan_level: u8,
    pub relative_humidity: u8,
    pub temperature: i16,
    pub fault: u8,
    pub alarm: bool,
    pub indicator_light: bool,
    pub physical_controls_locked: bool,
    pub coil_temp: i16,
    pub compressor_status: bool,
    pub water_tank_status: bool,
    pub defrost_status: bool,
    pub timer_service: u8,
    pub timer_setting: u8,
}

impl Status {
    fn from_results(results: &[PropertyResult]) -> Status {
        let mut status = Status::default();

        for result in results {
            if !result.is_ok() {
                continue;
            }

            let Some(value) = &result.value else {
                continue;
            };

            match result.did.as_str() {
                "power" => status.is_enabled = property::truthy(value),
                "fault" => status.fault = property::int(value) as u8,
                "mode" => status.mode = Mode::from_device_value(property::int(value)),
                "target_humidity" => status.target_humidity = property::int(value) as u8,
                "fan_level" => status.fan_level = property::int(value) as u8,
                "relative_humidity" => status.relative_humidity = property::int(value) as u8,
                "temperature" => status.temperature = property::int(value) as i16,
                "alarm" => status.alarm = property::truthy(value),
                "indicator_light" => status.indicator_light = property::truthy(value),
                "physical_controls_locked" => {
                    status.physical_controls_locked = property::truthy(value)
                }
                "coil_temp" => status.coil_temp = property::int(value) as i16,
                "compressor_status" => status.compressor_status = property::truthy(value),
                "water_tank_status" => status.water_tank_status = property::truthy(value),
                "defrost_status" => status.defrost_status = property::truthy(value),
                "timer_service" => status.timer_service = property::int(value) as u8,
                "timer_setting" => status.timer_setting = property::int(value) as u8,
                _ => (),
            }
        }

        status
    }
}

/// Smallest step above the requested value; 70 caps the range.
fn snap_target(humidity: u8) -> u8 {
    for step in TARGET_HUMIDITY_STEPS {
        if humidity < step {
            return step;
        }
    }

    MAX_HUMIDITY
}

pub struct Dehumidifier<E> {
    executor: E,
    mapping: Mapping,
    status: Option<Status>,
}

impl<E> Dehumidifier<E> {
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }
}

impl<E: CommandExecutorTrait + Send> Dehumidifier<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            mapping: Mapping::from_static(MAPPING),
            status: None,
        }
    }

    pub async fn update(&mut self) -> Result<&Status> {
        let result = self
            .executor
            .execute_command(Command::GetProperties(self.mapping.get_params()))
            .await?;
        let results: Vec<PropertyResult> = serde_json::from_value(result)?;

        let status = Status::from_results(&results);
        debug!("dehumidifier status: {status:?}");

        Ok(&*self.status.insert(status))
    }

    pub async fn set_enabled(&mut self, is_enabled: bool) -> Result<bool> {
        let accepted = self.set_property("power", json!(is_enabled)).await?;

        if accepted {
            if let Some(status) = &mut self.status {
                status.is_enabled = is_enabled;
            }
        }

        Ok(accepted)
    }

    pub async fn set_target_humidity(&mut self, humidity: u8) -> Result<bool> {
        let target = snap_target(humidity);
        let accepted = self.set_property("target_humidity", json!(target)).await?;

        if accepted {
            if let Some(status) = &mut self.status {
                status.target_humidity = target;
            }
        }

        Ok(accepted)
    }

    pub async fn set_mode(&mut self, mode: Mode) -> Result<bool> {
        if let Mode::Off = mode {
            return self.set_enabled(false).await;
        }

        let accepted = self
            .set_property("mode", json!(mode.device_value()))
            .await?;

        if accepted {
            if let Some(status) = &mut self.status {
                status.mode = mode;
            }
        }

        Ok(accepted)
    }

    async fn set_property(&mut self, name: &str, value: Value) -> Result<bool> {
        let id = match self.mapping.property(name) {
            Some(id) => id,
            None => return Ok(false),
        };

        let result = self
            .executor
            .execute_command(Command::SetProperty(PropertyParam::set(name, id, value)))
            .await?;
        let results: Vec<PropertyResult> = serde_json::from_value(result)?;

        Ok(property::all_accepted(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::device::MockCommandExecutorTrait;
    use crate::PropertyId;

    use mockall::predicate::eq;
    use serde_json::json;

    #[test]
    fn test_snap_target() {
        assert_eq!(snap_target(0), 30);
        assert_eq!(snap_target(25), 30);
        assert_eq!(snap_target(30), 40);
        assert_eq!(snap_target(35), 40);
        assert_eq!(snap_target(50), 60);
        assert_eq!(snap_target(69), 70);
        assert_eq!(snap_target(70), 70);
        assert_eq!(snap_target(100), 70);
    }

    #[tokio::test]
    async fn test_update() {
        let mut executor = MockCommandExecutorTrait::new();
        executor
            .expect_execute_command()
            .returning(|_| {
                Ok(json!([
                    {"did": "power", "siid": 2, "piid": 1, "code": 0, "value": true},
                    {"did": "mode", "siid": 2, "piid": 3, "code": 0, "value": 1},
                    {"did": "target_humidity", "siid": 2, "piid": 5, "code": 0, "value": 50},
                    {"did": "relative_humidity", "siid": 3, "piid": 1, "code": 0, "value": 62},
                    {"did": "temperature", "siid": 3, "piid": 7, "code": 0, "value": 24},
                    {"did": "water_tank_status", "siid": 7, "piid": 3, "code": 0, "value": 1},
                    {"did": "fan_level", "siid": 2, "piid": 7, "code": -4004},
                ]))
            })
            .once();

        let mut dehumidifier = Dehumidifier::new(executor);
        let status = dehumidifier.update().await.unwrap();

        assert!(status.is_enabled);
        assert_eq!(status.mode, Mode::DryCloth);
        assert_eq!(status.target_humidity, 50);
        assert_eq!(status.relative_humidity, 62);
        assert_eq!(status.temperature, 24);
        assert!(status.water_tank_status);

        // failed entry keeps the default
        assert_eq!(status.fan_level, 0);
    }

    #[tokio::test]
    async fn test_set_target_humidity() {
        let mut executor = MockCommandExecutorTrait::new();
        executor
            .expect_execute_command()
            .with(eq(Command::SetProperty(PropertyParam::set(
                "target_humidity",
                PropertyId::new(2, 5),
                json!(40),
            ))))
            .returning(|_| {
                Ok(json!([{"did": "target_humidity", "siid": 2, "piid": 5, "code": 0}]))
            })
            .once();

        let mut dehumidifier = Dehumidifier::new(executor);
        dehumidifier.status = Some(Status::default());

        let accepted = dehumidifier.set_target_humidity(35).await.unwrap();

        assert!(accepted);
        assert_eq!(dehumidifier.status().unwrap().target_humidity, 40);
    }

    #[tokio::test]
    async fn test_set_target_humidity_refused() {
        let mut executor = MockCommandExecutorTrait::new();
        executor
            .expect_execute_command()
            .returning(|_| {
                Ok(json!([{"did": "target_humidity", "siid": 2, "piid": 5, "code": -1}]))
            })
            .once();

        let mut dehumidifier = Dehumidifier::new(executor);
        dehumidifier.status = Some(Status {
            target_humidity: 50,
            ..Status::default()
        });

        let accepted = dehumidifier.set_target_humidity(35).await.unwrap();

        assert!(!accepted);
        assert_eq!(dehumidifier.status().unwrap().target_humidity, 50);
    }

    #[tokio::test]
    async fn test_set_mode_off_cuts_power() {
        let mut executor = MockCommandExecutorTrait::new();
        executor
            .expect_execute_command()
            .with(eq(Command::SetProperty(PropertyParam::set(
                "power",
                PropertyId::new(2, 1),
                json!(false),
            ))))
            .returning(|_| Ok(json!([{"did": "power", "siid": 2, "piid": 1, "code": 0}])))
            .once();

        let mut dehumidifier = Dehumidifier::new(executor);
        dehumidifier.status = Some(Status {
            is_enabled: true,
            ..Status::default()
        });

        let accepted = dehumidifier.set_mode(Mode::Off).await.unwrap();

        assert!(accepted);
        assert!(!dehumidifier.status().unwrap().is_enabled);
    }

    #[tokio::test]
    async fn test_set_mode() {
        let mut executor = MockCommandExecutorTrait::new();
        executor
            .expect_execute_command()
            .with(eq(Command::SetProperty(PropertyParam::set(
                "mode",
                PropertyId::new(2, 3),
                json!(0),
            ))))
            .returning(|_| Ok(json!([{"did": "mode", "siid": 2, "piid": 3, "code": 0}])))
            .once();

        let mut dehumidifier = Dehumidifier::new(executor);
        let accepted = dehumidifier.set_mode(Mode::TargetHumid).await.unwrap();

        assert!(accepted);
    }
}
