//! Part of [spb](https://crates.io/crates/spb), a [Sparkplug B](https://sparkplug.eclipse.org/) edge node library.
//!
//! This library defines the transport traits and types an edge node session is driven through.
//!
//! # Feature Flags
//!
//! - `channel-client`: Enables the channel based [EventLoop] and [Client] implementation. Disabled by default.
//!

mod traits;
mod types;

pub use traits::{Client, DynClient, DynEventLoop, EventLoop};
pub use types::*;

/// A basic [EventLoop] and [Client] implementation based on channels
///
/// Useful for writing tests where it is not appropriate to be running a real MQTT client and broker setup
#[cfg(any(feature = "channel-client", doc))]
pub mod channel;
