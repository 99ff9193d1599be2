//! A [Sparkplug B](https://sparkplug.eclipse.org/) edge node framework.
//!
//! `spb` re-exports the crates that make up the framework:
//!
//! - [node]: the edge node session engine, see [node::EdgeNodeBuilder]
//! - [types]: payload types, topic namespace and metric encoding
//! - [client]: the transport traits and the MQTT implementation
//!
//! # Example
//!
//! ```no_run
//! use spb::{client::rumqtt, node::EdgeNodeBuilder};
//!
//! # async fn run() {
//! let opts = rumqtt::MqttOptions::new("node", "localhost", 1883);
//! let (eventloop, client) = rumqtt::EventLoop::new(opts, 0);
//! let (node, handle) = EdgeNodeBuilder::new(eventloop, client)
//!     .with_group_id("foo")
//!     .with_node_id("bar")
//!     .build()
//!     .unwrap();
//!
//! tokio::spawn(async move {
//!     _ = tokio::signal::ctrl_c().await;
//!     handle.stop().await;
//! });
//! node.run().await.unwrap();
//! # }
//! ```

pub use spb_node as node;
pub use spb_types as types;

pub mod client {
    pub use spb_client::*;

    #[cfg(feature = "rumqtt-client")]
    pub use spb_client_rumqtt as rumqtt;
}
