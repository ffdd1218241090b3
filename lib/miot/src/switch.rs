use crate::device::CommandExecutorTrait;
use crate::property::{self, Mapping, PropertyId, PropertyResult};
use crate::spec::{Service, Spec};
use crate::{Command, PropertyParam, Result};

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Service names that become switch entities.
pub const SWITCH_SERVICES: &[&str] = &["switch", "outlet", "relay"];

/// Auxiliary services read alongside every switch.
const AUXILIARY_SERVICES: &[&str] = &["indicator_light", "switch_control"];

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Switch,
    Outlet,
}

/// Switch entity built from one spec service with an `on` property.
pub struct MiotSwitch<E> {
    executor: E,
    key: String,
    name: String,
    device_class: DeviceClass,
    on: PropertyId,
    mapping: Mapping,
    is_enabled: Option<bool>,
    attrs: BTreeMap<String, Value>,
}

impl<E> MiotSwitch<E> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    pub fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    pub fn attrs(&self) -> &BTreeMap<String, Value> {
        &self.attrs
    }
}

impl<E: CommandExecutorTrait + Send> MiotSwitch<E> {
    /// `None` when the service has no writable `on` property to drive.
    pub fn from_service(executor: E, model: &str, spec: &Spec, service: &Service) -> Option<Self> {
        let on = service.property("on").filter(|on| on.is_writable())?;
        let on = PropertyId::new(service.iid, on.iid);

        let mut mapping = spec.services_mapping(AUXILIARY_SERVICES);
        mapping.extend(service.mapping());

        let device_class = if format!("{} {}", model, spec.urn).contains("outlet") {
            DeviceClass::Outlet
        } else {
            DeviceClass::Switch
        };

        let key = service.name();
        let name = if service.description.is_empty() {
            key.clone()
        } else {
            service.description.clone()
        };

        Some(Self {
            executor,
            key,
            name,
            device_class,
            on,
            mapping,
            is_enabled: None,
            attrs: BTreeMap::new(),
        })
    }

    pub async fn update(&mut self) -> Result<bool> {
        let result = self
            .executor
            .execute_command(Command::GetProperties(self.mapping.get_params()))
            .await?;
        let results: Vec<PropertyResult> = serde_json::from_value(result)?;

        for result in results {
            if !result.is_ok() {
                continue;
            }

            let Some(value) = result.value else {
                continue;
            };

            if result.did == "on" {
                self.is_enabled = Some(property::truthy(&value));
            }

            self.attrs.insert(result.did, value);
        }

        debug!("switch {} attrs: {:?}", self.key, self.attrs);

        Ok(self.is_enabled.unwrap_or_default())
    }

    pub async fn set_enabled(&mut self, is_enabled: bool) -> Result<bool> {
        let result = self
            .executor
            .execute_command(Command::SetProperty(PropertyParam::set(
                "on",
                self.on,
                json!(is_enabled),
            )))
            .await?;
        let results: Vec<PropertyResult> = serde_json::from_value(result)?;

        let accepted = property::all_accepted(&results);

        if accepted {
            self.is_enabled = Some(is_enabled);
            self.attrs.insert("on".to_string(), json!(is_enabled));
        }

        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::device::MockCommandExecutorTrait;

    use mockall::predicate::eq;
    use serde_json::json;

    fn plug_spec() -> Spec {
        serde_json::from_value(json!({
            "type": "urn:miot-spec-v2:device:outlet:0000A002:chuangmi-212a01:1",
            "services": [
                {
                    "iid": 2,
                    "type": "urn:miot-spec-v2:service:switch:00007804:chuangmi-212a01:1",
                    "description": "Switch",
                    "properties": [
                        {
                            "iid": 1,
                            "type": "urn:miot-spec-v2:property:on:00000006:chuangmi-212a01:1",
                            "format": "bool",
                            "access": ["read", "write", "notify"]
                        },
                        {
                            "iid": 2,
                            "type": "urn:miot-spec-v2:property:temperature:00000020:chuangmi-212a01:1",
                            "format": "float",
                            "access": ["read", "notify"]
                        }
                    ]
                },
                {
                    "iid": 3,
                    "type": "urn:miot-spec-v2:service:indicator-light:00007803:chuangmi-212a01:1",
                    "properties": [
                        {
                            "iid": 1,
                            "type": "urn:miot-spec-v2:property:on:00000006:chuangmi-212a01:1",
                            "format": "bool",
                            "access": ["read", "write"]
                        }
                    ]
                },
                {
                    "iid": 4,
                    "type": "urn:miot-spec-v2:service:battery:00007805:chuangmi-212a01:1",
                    "properties": []
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_service() {
        let spec = plug_spec();
        let services = spec.services(SWITCH_SERVICES);
        assert_eq!(services.len(), 1);

        let switch =
            MiotSwitch::from_service(MockCommandExecutorTrait::new(), "chuangmi.plug.212a01", &spec, services[0])
                .unwrap();

        assert_eq!(switch.key(), "switch");
        assert_eq!(switch.name(), "Switch");
        assert_eq!(switch.device_class(), DeviceClass::Outlet);
        assert_eq!(switch.on, PropertyId::new(2, 1));
        assert_eq!(switch.is_enabled(), None);

        // own properties plus the indicator light
        assert_eq!(switch.mapping.property("on"), Some(PropertyId::new(2, 1)));
        assert_eq!(
            switch.mapping.property("temperature"),
            Some(PropertyId::new(2, 2))
        );
        assert_eq!(
            switch.mapping.property("indicator_light_on"),
            Some(PropertyId::new(3, 1))
        );
    }

    #[test]
    fn test_from_service_read_only_on() {
        use crate::spec::Access;

        let mut spec = plug_spec();
        spec.services[0].properties[0].access = vec![Access::Read, Access::Notify];

        assert!(MiotSwitch::from_service(
            MockCommandExecutorTrait::new(),
            "chuangmi.plug.212a01",
            &spec,
            &spec.services[0]
        )
        .is_none());
    }

    #[test]
    fn test_from_service_without_on() {
        let spec = plug_spec();
        let battery = spec
            .services
            .iter()
            .find(|service| service.name() == "battery")
            .unwrap();

        assert!(MiotSwitch::from_service(
            MockCommandExecutorTrait::new(),
            "chuangmi.plug.212a01",
            &spec,
            battery
        )
        .is_none());
    }

    #[test]
    fn test_device_class_from_model() {
        let mut spec = plug_spec();
        spec.urn = "urn:miot-spec-v2:device:switch:0000A003:some-sw1:1".to_string();

        let services = spec.services(SWITCH_SERVICES);

        let switch =
            MiotSwitch::from_service(MockCommandExecutorTrait::new(), "some.switch.sw1", &spec, services[0])
                .unwrap();
        assert_eq!(switch.device_class(), DeviceClass::Switch);

        let switch =
            MiotSwitch::from_service(MockCommandExecutorTrait::new(), "some.outlet.sw1", &spec, services[0])
                .unwrap();
        assert_eq!(switch.device_class(), DeviceClass::Outlet);
    }

    #[tokio::test]
    async fn test_update() {
        let mut executor = MockCommandExecutorTrait::new();
        executor
            .expect_execute_command()
            .returning(|_| {
                Ok(json!([
                    {"did": "indicator_light_on", "siid": 3, "piid": 1, "code": 0, "value": false},
                    {"did": "on", "siid": 2, "piid": 1, "code": 0, "value": true},
                    {"did": "temperature", "siid": 2, "piid": 2, "code": -4004},
                ]))
            })
            .once();

        let spec = plug_spec();
        let services = spec.services(SWITCH_SERVICES);
        let mut switch =
            MiotSwitch::from_service(executor, "chuangmi.plug.212a01", &spec, services[0]).unwrap();

        let is_enabled = switch.update().await.unwrap();

        assert!(is_enabled);
        assert_eq!(switch.is_enabled(), Some(true));
        assert_eq!(switch.attrs().get("on"), Some(&json!(true)));
        assert_eq!(switch.attrs().get("indicator_light_on"), Some(&json!(false)));
        assert_eq!(switch.attrs().get("temperature"), None);
    }

    #[tokio::test]
    async fn test_set_enabled() {
        let mut executor = MockCommandExecutorTrait::new();
        executor
            .expect_execute_command()
            .with(eq(Command::SetProperty(PropertyParam::set(
                "on",
                PropertyId::new(2, 1),
                json!(true),
            ))))
            .returning(|_| Ok(json!([{"did": "on", "siid": 2, "piid": 1, "code": 0}])))
            .once();

        let spec = plug_spec();
        let services = spec.services(SWITCH_SERVICES);
        let mut switch =
            MiotSwitch::from_service(executor, "chuangmi.plug.212a01", &spec, services[0]).unwrap();

        let accepted = switch.set_enabled(true).await.unwrap();

        assert!(accepted);
        assert_eq!(switch.is_enabled(), Some(true));
        assert_eq!(switch.attrs().get("on"), Some(&json!(true)));
    }
}
