use async_trait::async_trait;
use spb_types::{
    payload::Payload,
    topic::{DeviceTopic, NodeTopic, TopicFilter},
};

use crate::{ClientError, Event, LastWill};

/// The publishing half of a transport.
///
/// Implementations derive the QoS and retain flag of a publish from the typed topic.
#[async_trait]
pub trait Client {
    /// Disconnects the client.
    ///
    /// Messages already accepted by the client should still be delivered while the
    /// [EventLoop] is polled to completion.
    async fn disconnect(&self) -> Result<(), ClientError>;

    /// Publishes a message to a node-specific topic.
    ///
    /// This method will yield to the async runtime until the message is accepted by the client
    async fn publish_node_message(&self, topic: NodeTopic, payload: Payload)
        -> Result<(), ClientError>;

    /// Publishes a message to a device-specific topic.
    ///
    /// This method will yield to the async runtime until the message is accepted by the client
    async fn publish_device_message(
        &self,
        topic: DeviceTopic,
        payload: Payload,
    ) -> Result<(), ClientError>;

    /// Attempts to publish a message to a node-specific topic without waiting.
    ///
    /// Fails instead of yielding if the client cannot accept the message right away.
    async fn try_publish_node_message(
        &self,
        topic: NodeTopic,
        payload: Payload,
    ) -> Result<(), ClientError>;

    /// Attempts to publish a message to a device-specific topic without waiting.
    ///
    /// Fails instead of yielding if the client cannot accept the message right away.
    async fn try_publish_device_message(
        &self,
        topic: DeviceTopic,
        payload: Payload,
    ) -> Result<(), ClientError>;

    /// Subscribes to a single topic.
    ///
    /// This is a convenience method that calls `subscribe_many` with a single topic.
    async fn subscribe(&self, topic: TopicFilter) -> Result<(), ClientError> {
        self.subscribe_many(vec![topic]).await
    }

    /// Subscribes to multiple topics in a single operation.
    async fn subscribe_many(&self, topics: Vec<TopicFilter>) -> Result<(), ClientError>;
}

pub type DynClient = dyn Client + Send + Sync;

/// The connection driving half of a transport.
#[async_trait]
pub trait EventLoop {
    /// Establish a connection to the broker, registering `will` as the last will.
    ///
    /// Returns once the broker has accepted or refused the connection.
    async fn connect(&mut self, will: LastWill) -> Result<(), ClientError>;

    /// Wait for the next event on an established connection.
    async fn poll(&mut self) -> Event;
}

pub type DynEventLoop = dyn EventLoop + Send;
