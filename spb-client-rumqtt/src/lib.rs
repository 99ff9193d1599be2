//! Part of [spb](https://crates.io/crates/spb), a [Sparkplug B](https://sparkplug.eclipse.org/) edge node library.
//!
//! An MQTT v5 implementation of the [spb_client] transport traits using [rumqttc].

mod client;
mod options;

pub use client::{Client, EventLoop};
pub use options::{ConnectionProperties, Credentials, MqttOptions};
