mod response;
pub use response::{DeviceError, Response};

use crate::{Command, Error, Result};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::StreamExt;
use log::{debug, error};
use paho_mqtt as mqtt;
use serde_json::{json, Value};
use tokio::sync::{oneshot, Mutex};
use tokio::time;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

type PendingRequests = Arc<Mutex<HashMap<u16, oneshot::Sender<Response>>>>;

/// Client for one appliance behind the miio MQTT bridge.
///
/// Requests go to `miio/<device-id>/request` as `{"id", "method", "params"}`,
/// replies arrive on `miio/<device-id>/response` and are correlated back by
/// the request id.
#[derive(Clone)]
pub struct Device {
    mqtt: mqtt::AsyncClient,
    device_id: String,
    last_id: Arc<AtomicU16>,
    pending: PendingRequests,
}

impl Device {
    pub async fn connect(address: String, device_id: String) -> Result<Device> {
        let mut client = mqtt::AsyncClient::new(address)?;

        let conn_opts = mqtt::ConnectOptionsBuilder::new_v3()
            .keep_alive_interval(Duration::from_secs(30))
            .clean_session(true)
            .finalize();

        let mut stream = client.get_stream(None);
        client.connect(conn_opts).await?;

        client.subscribe(format!("miio/{device_id}/response"), mqtt::QOS_1);

        let pending: PendingRequests = Arc::new(Mutex::new(HashMap::new()));

        let reader = client.clone();
        let responses = pending.clone();

        tokio::spawn(async move {
            while let Some(msg_opt) = stream.next().await {
                if let Some(msg) = msg_opt {
                    match serde_json::from_slice::<Response>(msg.payload()) {
                        Ok(response) => {
                            let mut responses = responses.lock().await;
                            if let Some(tx) = responses.remove(&response.id()) {
                                let _ = tx.send(response);
                            }
                        }
                        Err(err) => error!("invalid response from the miio bridge: {err}"),
                    }
                } else {
                    error!("lost connection to the miio bridge, reconnecting");
                    while let Err(err) = reader.reconnect().await {
                        error!("error reconnecting to the miio bridge: {err}");
                        time::sleep(Duration::from_millis(1000)).await;
                    }
                }
            }
        });

        Ok(Device {
            mqtt: client,
            device_id,
            last_id: Arc::new(AtomicU16::new(0)),
            pending,
        })
    }

    pub async fn send(&self, command: Command) -> Result<Value> {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        let method = command.name();

        let payload = json!({
            "id": id,
            "method": method,
            "params": command,
        });

        debug!("sending {method} to {}: {payload}", self.device_id);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let message = mqtt::MessageBuilder::new()
            .topic(format!("miio/{}/request", self.device_id))
            .payload(serde_json::to_vec(&payload)?)
            .qos(mqtt::QOS_1)
            .finalize();

        if let Err(err) = self.mqtt.publish(message).await {
            self.pending.lock().await.remove(&id);
            return Err(err.into());
        }

        let response = match time::timeout(RESPONSE_TIMEOUT, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(Error::StreamClosed),
            Err(err) => {
                self.pending.lock().await.remove(&id);
                return Err(err.into());
            }
        };

        match response {
            Response::Ok { id: _, result } => {
                debug!("got response from {}: {result}", self.device_id);
                Ok(result)
            }
            Response::Err { id: _, error } => {
                error!("device error from {}: {error}", self.device_id);
                Err(Error::DeviceResponse(error.code))
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandExecutorTrait {
    async fn execute_command(&mut self, command: Command) -> Result<Value>;
}

pub struct CommandExecutor {
    device: Device,
}

impl CommandExecutor {
    pub fn new(device: Device) -> Self {
        Self { device }
    }
}

#[async_trait]
impl CommandExecutorTrait for CommandExecutor {
    async fn execute_command(&mut self, command: Command) -> Result<Value> {
        self.device.send(command).await
    }
}

#[cfg(feature = "stub")]
pub struct StubCommandExecutor;

#[cfg(feature = "stub")]
#[async_trait]
impl CommandExecutorTrait for StubCommandExecutor {
    async fn execute_command(&mut self, command: Command) -> Result<Value> {
        log::info!("stub command: {}", command.name());
        log::info!("stub command: {:?}", command);

        match command {
            Command::GetProperties(params) => {
                let results: Vec<Value> = params
                    .iter()
                    .map(|param| {
                        json!({
                            "did": param.did,
                            "siid": param.siid,
                            "piid": param.piid,
                            "code": 0,
                            "value": 0,
                        })
                    })
                    .collect();

                Ok(Value::Array(results))
            }
            Command::SetProperty(param) => Ok(json!([{
                "did": param.did,
                "siid": param.siid,
                "piid": param.piid,
                "code": 0,
            }])),
            Command::GetProps(properties) => {
                Ok(Value::Array(properties.iter().map(|_| json!(0)).collect()))
            }
            Command::PowerAll(_)
            | Command::PowerOn(_)
            | Command::PowerOff(_)
            | Command::SetG2Enable(_)
            | Command::SetCodeEnable(_) => Ok(json!([0])),
        }
    }
}
