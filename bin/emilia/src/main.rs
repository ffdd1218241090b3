use emilia::{perform_action, Config, Entity, Result, State, Storage, Topic};
use miot::Device;

use std::process;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::StreamExt;
use log::{error, info};
use paho_mqtt as mqtt;
use tokio::sync::Mutex;
use tokio::task;
use tokio::time::{self, interval};

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let device_id = std::env::var("DEVICE_ID").expect("set ENV variable DEVICE_ID");
    let device_model = std::env::var("DEVICE_MODEL").expect("set ENV variable DEVICE_MODEL");

    if let Ok(device_name) = std::env::var("DEVICE_NAME") {
        info!("starting gateway for {device_name} ({device_model})");
    }

    let config = Config {
        model: device_model,
        miot_type: std::env::var("MIOT_TYPE").ok(),
        advanced: std::env::var("ADVANCED_MODE").is_ok(),
    };

    let mqtt_address = std::env::var("MQTT_ADDRESS").expect("set ENV variable MQTT_ADDRESS");

    let device = Device::connect(mqtt_address.clone(), device_id.clone()).await?;
    let mut entity = Entity::setup(config, device).await?;

    match entity.update().await {
        Ok(_) => info!("initial state: {:?}", entity.state()),
        Err(err) => error!("unable to read initial state: {err}"),
    }

    let entity = Arc::from(Mutex::from(entity));
    let storage = Arc::from(Mutex::from(Storage::new()));

    let mqtt_client = connect_mqtt(mqtt_address).await?;
    info!("connected mqtt");

    let (action_handle, state_handle) = tokio::try_join!(
        task::spawn(subscribe_actions(
            mqtt_client.clone(),
            device_id.clone(),
            entity.clone(),
            storage.clone()
        )),
        task::spawn(subscribe_state(mqtt_client, device_id, entity, storage))
    )?;

    action_handle?;
    state_handle?;

    Ok(())
}

async fn connect_mqtt(address: String) -> Result<mqtt::AsyncClient> {
    let client = mqtt::AsyncClient::new(address).unwrap_or_else(|err| {
        error!("Error creating the client: {}", err);
        process::exit(1);
    });

    let conn_opts = mqtt::ConnectOptionsBuilder::new_v3()
        .keep_alive_interval(Duration::from_secs(30))
        .clean_session(false)
        .finalize();

    client.connect(conn_opts).await?;

    Ok(client)
}

async fn subscribe_actions(
    mut mqtt: mqtt::AsyncClient,
    device_id: String,
    entity: Arc<Mutex<Entity>>,
    storage: Arc<Mutex<Storage>>,
) -> Result<()> {
    let mut stream = mqtt.get_stream(None);

    let topic = Topic::ActionRequest(device_id.clone());
    mqtt.subscribe_many(&[topic.to_string()], &[mqtt::QOS_1]);

    info!("Subscribed to topic: {topic}");

    while let Some(msg_opt) = stream.next().await {
        if let Some(msg) = msg_opt {
            let entity = &mut entity.lock().await;

            match perform_action(msg.payload(), entity).await {
                Ok(_) => {
                    // push the refreshed state right away instead of
                    // waiting for the next poll tick
                    if let Some(state) = entity.state() {
                        let mut storage = storage.lock().await;
                        publish_state(&mqtt, &device_id, &state, &mut storage).await?;
                    }
                }
                Err(err) => error!("Error performing action: {}", err),
            }
        } else {
            error!("Lost MQTT connection. Attempting reconnect.");
            while let Err(err) = mqtt.reconnect().await {
                error!("Error MQTT reconnecting: {}", err);
                time::sleep(Duration::from_millis(1000)).await;
            }
        }
    }

    Ok(())
}

async fn subscribe_state(
    mqtt: mqtt::AsyncClient,
    device_id: String,
    entity: Arc<Mutex<Entity>>,
    storage: Arc<Mutex<Storage>>,
) -> Result<()> {
    let mut timer = interval(Duration::from_secs(10));

    loop {
        timer.tick().await;
        let mut entity = entity.lock().await;

        if let Err(err) = entity.update().await {
            error!("Error updating state: {}", err);
            continue;
        }

        if let Some(state) = entity.state() {
            let mut storage = storage.lock().await;
            publish_state(&mqtt, &device_id, &state, &mut storage).await?;
        }
    }
}

async fn publish_state(
    mqtt: &mqtt::AsyncClient,
    device_id: &str,
    state: &State,
    storage: &mut Storage,
) -> Result<()> {
    if storage.apply_state(state) {
        info!("publishing state: {:?}", state);

        let topic = Topic::State(device_id.to_string());
        let payload = serde_json::to_vec(state)?;

        let message = mqtt::MessageBuilder::new()
            .topic(topic.to_string())
            .payload(payload)
            .finalize();

        mqtt.publish(message).await?;
    }

    Ok(())
}
