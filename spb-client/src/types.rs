use spb_types::{
    payload::Payload,
    topic::{NodeMessage, NodeTopic, QoS},
};
use thiserror::Error;

/// Errors reported by a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("The client is disconnected")]
    Disconnected,
    #[error("Request could not be queued: {0}")]
    Request(String),
}

/// An enum that represents the different types of events an [EventLoop](crate::EventLoop) implementation can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The connection was lost or closed
    Offline,
    /// A publish was received on a subscribed topic
    Message { topic: String, payload: Vec<u8> },
}

/// Structure representing the last will of a Node
#[derive(Debug, Clone, PartialEq)]
pub struct LastWill {
    pub topic: String,
    pub retain: bool,
    pub qos: QoS,
    pub payload: Vec<u8>,
}

impl LastWill {
    pub fn new_node(group: &str, node_id: &str, payload: Payload) -> Self {
        let topic = NodeTopic::new(group, NodeMessage::NDeath, node_id);
        let (qos, retain) = topic.get_publish_quality_retain();
        Self {
            retain,
            qos,
            payload: payload.into(),
            topic: topic.topic,
        }
    }
}
