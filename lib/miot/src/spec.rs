use crate::property::{Mapping, PropertyId};
use crate::Result;

use chipp_http::HttpClient;
use log::debug;
use serde::Deserialize;

/// Instance description from the public spec registry. Loaded once at
/// setup to decide which entities a model provides.
#[derive(Debug, Deserialize)]
pub struct Spec {
    #[serde(rename = "type")]
    pub urn: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
    pub iid: u8,
    #[serde(rename = "type")]
    pub urn: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Deserialize)]
pub struct Property {
    pub iid: u8,
    #[serde(rename = "type")]
    pub urn: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub access: Vec<Access>,
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Write,
    Notify,
}

impl Spec {
    pub async fn for_type(urn: &str) -> Result<Spec> {
        let client = HttpClient::new("https://miot-spec.org").unwrap();

        let request = client.new_request_with_url(format!(
            "https://miot-spec.org/miot-spec-v2/instance?type={urn}"
        ))?;

        let spec: Spec = client
            .perform_request(request, chipp_http::json::parse_json)
            .await?;

        debug!("loaded spec for {urn}: {} services", spec.services.len());

        Ok(spec)
    }

    pub fn name(&self) -> String {
        urn_name(&self.urn)
    }

    pub fn services(&self, names: &[&str]) -> Vec<&Service> {
        self.services
            .iter()
            .filter(|service| names.contains(&service.name().as_str()))
            .collect()
    }

    /// Mapping over every property of the named services, keyed
    /// `{service}_{property}` so merged tables stay unambiguous.
    pub fn services_mapping(&self, names: &[&str]) -> Mapping {
        let mut mapping = Mapping::new();

        for service in self.services(names) {
            let service_name = service.name();

            for property in &service.properties {
                mapping.insert(
                    &format!("{}_{}", service_name, property.name()),
                    PropertyId::new(service.iid, property.iid),
                );
            }
        }

        mapping
    }
}

impl Service {
    pub fn name(&self) -> String {
        urn_name(&self.urn)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.name() == name)
    }

    /// Mapping over the service's own properties, keyed by bare name.
    pub fn mapping(&self) -> Mapping {
        let mut mapping = Mapping::new();

        for property in &self.properties {
            mapping.insert(
                &property.name(),
                PropertyId::new(self.iid, property.iid),
            );
        }

        mapping
    }
}

impl Property {
    pub fn name(&self) -> String {
        urn_name(&self.urn)
    }

    pub fn is_writable(&self) -> bool {
        self.access.contains(&Access::Write)
    }
}

/// Fourth URN segment, dashes normalized to underscores:
/// `urn:miot-spec-v2:service:indicator-light:00007803:...` → `indicator_light`.
fn urn_name(urn: &str) -> String {
    urn.split(':').nth(3).unwrap_or_default().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn outlet_spec() -> Spec {
        serde_json::from_value(json!({
            "type": "urn:miot-spec-v2:device:outlet:0000A002:chuangmi-212a01:1",
            "description": "Smart Plug",
            "services": [
                {
                    "iid": 2,
                    "type": "urn:miot-spec-v2:service:switch:00007804:chuangmi-212a01:1",
                    "description": "Switch",
                    "properties": [
                        {
                            "iid": 1,
                            "type": "urn:miot-spec-v2:property:on:00000006:chuangmi-212a01:1",
                            "description": "Switch Status",
                            "format": "bool",
                            "access": ["read", "write", "notify"]
                        },
                        {
                            "iid": 2,
                            "type": "urn:miot-spec-v2:property:temperature:00000020:chuangmi-212a01:1",
                            "description": "Temperature",
                            "format": "float",
                            "access": ["read", "notify"]
                        }
                    ]
                },
                {
                    "iid": 3,
                    "type": "urn:miot-spec-v2:service:indicator-light:00007803:chuangmi-212a01:1",
                    "description": "Indicator Light",
                    "properties": [
                        {
                            "iid": 1,
                            "type": "urn:miot-spec-v2:property:on:00000006:chuangmi-212a01:1",
                            "description": "Indicator Light",
                            "format": "bool",
                            "access": ["read", "write"]
                        }
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_urn_names() {
        let spec = outlet_spec();

        assert_eq!(spec.name(), "outlet");

        let names: Vec<_> = spec.services.iter().map(Service::name).collect();
        assert_eq!(names, ["switch", "indicator_light"]);
    }

    #[test]
    fn test_service_filter() {
        let spec = outlet_spec();

        let services = spec.services(&["switch", "outlet", "relay"]);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].iid, 2);

        assert!(spec.services(&["fan"]).is_empty());
    }

    #[test]
    fn test_service_mapping() {
        let spec = outlet_spec();
        let service = &spec.services[0];

        let on = service.property("on").unwrap();
        assert!(on.is_writable());
        assert!(service.property("mode").is_none());

        let mapping = service.mapping();
        assert_eq!(mapping.property("on"), Some(PropertyId::new(2, 1)));
        assert_eq!(mapping.property("temperature"), Some(PropertyId::new(2, 2)));
    }

    #[test]
    fn test_services_mapping() {
        let spec = outlet_spec();

        let mapping = spec.services_mapping(&["indicator_light"]);
        assert_eq!(mapping.len(), 1);
        assert_eq!(
            mapping.property("indicator_light_on"),
            Some(PropertyId::new(3, 1))
        );
    }
}
