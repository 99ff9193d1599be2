//! An edge node fronting a checkweigher.
//!
//! Broker options are read from the JSON file passed as the first argument, e.g.
//!
//! ```json
//! { "broker_addr": "localhost", "port": 1883, "client_id": "line-1", "keep_alive": 30 }
//! ```
//!
//! The node publishes a weighing result every second and accepts `Tare` and `Target Weight`
//! device commands.
use async_trait::async_trait;
use log::{info, warn, LevelFilter};
use spb::{
    client::rumqtt,
    node::{Command, CommandHandler, EdgeNodeBuilder, NodeHandle, RetryPolicy, SimpleDevice},
    types::Value,
};
use std::{collections::BTreeMap, time::Duration};

const DEVICE_ID: &str = "checkweigher";

struct CheckweigherCommands {
    device: SimpleDevice,
}

#[async_trait]
impl CommandHandler for CheckweigherCommands {
    async fn on_reboot(&self, _node: &NodeHandle) {
        warn!("Reboot requested - not supported by this demo");
    }

    async fn on_device_command(&self, node: &NodeHandle, device_id: &str, command: Command) {
        match (command.name.as_str(), command.value) {
            ("Tare", Value::Boolean(true)) => {
                info!("Taring {device_id}");
                self.device.set("Tare Offset", self.device_weight());
            }
            ("Target Weight", Value::Double(target)) => {
                self.device.set("Target Weight", target);
            }
            (name, value) => {
                warn!("Unsupported command {name}={value:?}");
                return;
            }
        }
        _ = node
            .publish_device_values(device_id, ["Tare Offset", "Target Weight"])
            .await;
    }
}

impl CheckweigherCommands {
    fn device_weight(&self) -> f64 {
        match spb::node::MetricSource::metric_value(&self.device, "Gross Weight") {
            Some(Value::Double(weight)) => weight,
            _ => 0.0,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    let opts: rumqtt::MqttOptions = match std::env::args().nth(1) {
        Some(path) => {
            let config = std::fs::read_to_string(path).expect("unable to read config file");
            serde_json::from_str(&config).expect("invalid config file")
        }
        None => rumqtt::MqttOptions::new("line-1", "localhost", 1883),
    };
    let (eventloop, client) = rumqtt::EventLoop::new(opts, 0);

    let device = SimpleDevice::new(DEVICE_ID)
        .with_value("Gross Weight", 0.0)
        .with_value("Tare Offset", 0.0)
        .with_value("Target Weight", 500.0)
        .with_value("Rejects", 0_u64);

    let mut node_metrics = BTreeMap::new();
    node_metrics.insert("Properties/Line".to_string(), Value::from("Packing 1"));

    let (node, handle) = EdgeNodeBuilder::new(eventloop, client)
        .with_group_id("Plant")
        .with_node_id("Line-1")
        .with_node_metrics(node_metrics)
        .with_command_handler(CheckweigherCommands {
            device: device.clone(),
        })
        .with_retry_policy(RetryPolicy {
            interval: Duration::from_secs(5),
            max_attempts: None,
        })
        .with_rebirth_cooldown(Duration::from_secs(5))
        .build()
        .unwrap();

    let publisher = handle.clone();
    tokio::spawn(async move {
        let mut rejects = 0_u64;
        let mut reading = 0_u32;
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if publisher.device_state(DEVICE_ID).await != Some(spb::node::LifecycleState::Online) {
                _ = publisher.attach_device(device.clone()).await;
                continue;
            }

            reading = reading.wrapping_add(1);
            let weight = 495.0 + f64::from(reading % 11);
            let mut values = vec![("Gross Weight", Value::Double(weight))];
            if weight < 500.0 {
                rejects += 1;
                values.push(("Rejects", Value::UInt64(rejects)));
            }
            for (name, value) in &values {
                device.set(*name, value.clone());
            }
            if let Err(e) = publisher.publish_device_data(DEVICE_ID, values).await {
                warn!("Unable to publish weighing result: {e}");
            }
        }
    });

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            println!("Failed to register CTRL-C handler: {e}");
            return;
        }
        handle.stop().await;
    });

    if let Err(e) = node.run().await {
        println!("Edge node exited with error: {e}");
    }
}
