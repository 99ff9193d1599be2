//! Part of [spb](https://crates.io/crates/spb), a [Sparkplug B](https://sparkplug.eclipse.org/) edge node library.
//!
//! This crate implements the session side of a Sparkplug B edge node: birth and death
//! certificates, `seq`/`bdSeq` sequencing, device sessions and command handling.
//!
//! See [EdgeNodeBuilder] on how to create an [EdgeNode].

mod builder;
mod command;
mod config;
mod device;
mod error;
mod lifecycle;
mod message;
mod node;
mod sequence;

pub use builder::EdgeNodeBuilder;
pub use command::{Command, CommandHandler, NoCommandHandler};
pub use config::RetryPolicy;
pub use device::{Device, DynDevice, DynMetricSource, MetricSource, SimpleDevice};
pub use error::{DeviceError, PublishError, StartError, StateError};
pub use lifecycle::LifecycleState;
pub use node::{EdgeNode, NodeHandle};
