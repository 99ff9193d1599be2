use spb::{
    client::rumqtt,
    node::{EdgeNodeBuilder, SimpleDevice},
};
use std::time::Duration;

use tokio::time;

use log::LevelFilter;

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .init();

    let opts = rumqtt::MqttOptions::new("node", "localhost", 1883);
    let (eventloop, client) = rumqtt::EventLoop::new(opts, 0);

    let (node, handle) = EdgeNodeBuilder::new(eventloop, client)
        .with_group_id("foo")
        .with_node_id("bar")
        .build()
        .unwrap();

    let dev1 = SimpleDevice::new("dev1").with_value("Device Counter", 0_i32);

    let publisher = handle.clone();
    tokio::spawn(async move {
        let mut node_counter = 0_u64;
        let mut dev_counter = 0_i32;
        loop {
            time::sleep(Duration::from_secs(1)).await;

            /* attach once the node is online so the device is birthed */
            if publisher.device_state("dev1").await != Some(spb::node::LifecycleState::Online) {
                _ = publisher.attach_device(dev1.clone()).await;
                continue;
            }

            node_counter = node_counter.wrapping_add(1);
            dev_counter = dev_counter.wrapping_sub(1);
            dev1.set("Device Counter", dev_counter);
            _ = publisher
                .publish_node_data([("Node Counter", node_counter)])
                .await;
            _ = publisher
                .publish_device_values("dev1", ["Device Counter"])
                .await;
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
