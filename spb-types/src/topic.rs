use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::constants::{
    DBIRTH, DCMD, DDATA, DDEATH, NBIRTH, NCMD, NDATA, NDEATH, SINGLE_LEVEL_WILDCARD, SPBV01,
};

/// Errors produced when deriving or parsing a Sparkplug topic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicError {
    #[error("Unknown message kind: {0}")]
    UnknownKind(String),
    #[error("{0} topics require a device id")]
    MissingDeviceId(MessageKind),
    #[error("{0} topics do not take a device id")]
    UnexpectedDeviceId(MessageKind),
    #[error("The topic was invalid")]
    InvalidSparkplugTopic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceMessage {
    DBirth,
    DDeath,
    DData,
    DCmd,
}

impl DeviceMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceMessage::DBirth => DBIRTH,
            DeviceMessage::DDeath => DDEATH,
            DeviceMessage::DData => DDATA,
            DeviceMessage::DCmd => DCMD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeMessage {
    NBirth,
    NDeath,
    NData,
    NCmd,
}

impl NodeMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeMessage::NBirth => NBIRTH,
            NodeMessage::NDeath => NDEATH,
            NodeMessage::NData => NDATA,
            NodeMessage::NCmd => NCMD,
        }
    }
}

/// Every Sparkplug message kind an edge node publishes or receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    NBirth,
    NDeath,
    NData,
    NCmd,
    DBirth,
    DDeath,
    DData,
    DCmd,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::NBirth => NBIRTH,
            MessageKind::NDeath => NDEATH,
            MessageKind::NData => NDATA,
            MessageKind::NCmd => NCMD,
            MessageKind::DBirth => DBIRTH,
            MessageKind::DDeath => DDEATH,
            MessageKind::DData => DDATA,
            MessageKind::DCmd => DCMD,
        }
    }

    /// Returns true for the kinds whose topic ends with a device id segment.
    pub fn is_device_scoped(&self) -> bool {
        matches!(
            self,
            MessageKind::DBirth | MessageKind::DDeath | MessageKind::DData | MessageKind::DCmd
        )
    }

    pub fn is_command(&self) -> bool {
        matches!(self, MessageKind::NCmd | MessageKind::DCmd)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            NBIRTH => MessageKind::NBirth,
            NDEATH => MessageKind::NDeath,
            NDATA => MessageKind::NData,
            NCMD => MessageKind::NCmd,
            DBIRTH => MessageKind::DBirth,
            DDEATH => MessageKind::DDeath,
            DDATA => MessageKind::DData,
            DCMD => MessageKind::DCmd,
            other => return Err(TopicError::UnknownKind(other.to_string())),
        };
        Ok(kind)
    }
}

impl From<NodeMessage> for MessageKind {
    fn from(value: NodeMessage) -> Self {
        match value {
            NodeMessage::NBirth => MessageKind::NBirth,
            NodeMessage::NDeath => MessageKind::NDeath,
            NodeMessage::NData => MessageKind::NData,
            NodeMessage::NCmd => MessageKind::NCmd,
        }
    }
}

impl From<DeviceMessage> for MessageKind {
    fn from(value: DeviceMessage) -> Self {
        match value {
            DeviceMessage::DBirth => MessageKind::DBirth,
            DeviceMessage::DDeath => MessageKind::DDeath,
            DeviceMessage::DData => MessageKind::DData,
            DeviceMessage::DCmd => MessageKind::DCmd,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeTopic {
    pub topic: String,
    pub message_type: NodeMessage,
}

impl NodeTopic {
    pub fn new(group_id: &str, message_type: NodeMessage, node_id: &str) -> Self {
        Self {
            topic: node_topic(group_id, &message_type, node_id),
            message_type,
        }
    }

    /// Get the [QoS] and retain settings that messages on this topic should be published with
    pub fn get_publish_quality_retain(&self) -> (QoS, bool) {
        match self.message_type {
            NodeMessage::NBirth => (QoS::AtMostOnce, true),
            NodeMessage::NDeath => (QoS::AtLeastOnce, true),
            NodeMessage::NData => (QoS::AtMostOnce, false),
            NodeMessage::NCmd => (QoS::AtMostOnce, false),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceTopic {
    pub topic: String,
    pub message_type: DeviceMessage,
}

impl DeviceTopic {
    pub fn new(group_id: &str, message_type: DeviceMessage, node_id: &str, device_id: &str) -> Self {
        Self {
            topic: device_topic(group_id, &message_type, node_id, device_id),
            message_type,
        }
    }

    /// Get the [QoS] and retain settings that messages on this topic should be published with
    pub fn get_publish_quality_retain(&self) -> (QoS, bool) {
        match self.message_type {
            DeviceMessage::DBirth => (QoS::AtLeastOnce, false),
            DeviceMessage::DData => (QoS::AtMostOnce, false),
            DeviceMessage::DCmd => (QoS::AtMostOnce, false),
            DeviceMessage::DDeath => (QoS::AtLeastOnce, false),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopicFilter {
    pub topic: String,
    pub qos: QoS,
}

impl TopicFilter {
    pub fn new<S: Into<String>>(topic: S) -> Self {
        Self::new_with_qos(topic, QoS::AtMostOnce)
    }

    pub fn new_with_qos<S: Into<String>>(topic: S, qos: QoS) -> Self {
        Self {
            topic: topic.into(),
            qos,
        }
    }
}

pub fn node_topic_raw(group_id: &str, message_type: &str, node_id: &str) -> String {
    format!("{}/{}/{}/{}", SPBV01, group_id, message_type, node_id)
}

pub fn device_topic_raw(
    group_id: &str,
    message_type: &str,
    node_id: &str,
    device_id: &str,
) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        SPBV01, group_id, message_type, node_id, device_id
    )
}

pub fn node_topic(group_id: &str, message_type: &NodeMessage, node_id: &str) -> String {
    node_topic_raw(group_id, message_type.as_str(), node_id)
}

pub fn device_topic(
    group_id: &str,
    message_type: &DeviceMessage,
    node_id: &str,
    device_id: &str,
) -> String {
    device_topic_raw(group_id, message_type.as_str(), node_id, device_id)
}

/// Derive the topic for a message kind.
///
/// `device_id` must be provided for device scoped kinds and must be omitted for node scoped
/// kinds. An empty device id is treated as not provided.
pub fn topic(
    group_id: &str,
    node_id: &str,
    device_id: Option<&str>,
    kind: MessageKind,
) -> Result<String, TopicError> {
    let device_id = device_id.filter(|id| !id.is_empty());
    match (kind.is_device_scoped(), device_id) {
        (true, Some(device_id)) => Ok(device_topic_raw(
            group_id,
            kind.as_str(),
            node_id,
            device_id,
        )),
        (true, None) => Err(TopicError::MissingDeviceId(kind)),
        (false, None) => Ok(node_topic_raw(group_id, kind.as_str(), node_id)),
        (false, Some(_)) => Err(TopicError::UnexpectedDeviceId(kind)),
    }
}

/// The topic an edge node subscribes to for commands addressed to any of its devices.
pub fn device_command_filter(group_id: &str, node_id: &str) -> String {
    device_topic_raw(group_id, DCMD, node_id, SINGLE_LEVEL_WILDCARD)
}

/// A parsed Sparkplug topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparkplugTopic {
    pub group_id: String,
    pub kind: MessageKind,
    pub node_id: String,
    pub device_id: Option<String>,
}

fn next_part<'a>(iter: &mut impl Iterator<Item = &'a str>) -> Result<String, TopicError> {
    match iter.next() {
        Some(part) if !part.is_empty() => Ok(part.to_string()),
        _ => Err(TopicError::InvalidSparkplugTopic),
    }
}

impl FromStr for SparkplugTopic {
    type Err = TopicError;

    fn from_str(topic: &str) -> Result<Self, Self::Err> {
        let mut iter = topic.split('/');

        if iter.next() != Some(SPBV01) {
            return Err(TopicError::InvalidSparkplugTopic);
        }

        let group_id = next_part(&mut iter)?;
        let kind: MessageKind = next_part(&mut iter)?.parse()?;
        let node_id = next_part(&mut iter)?;
        let device_id = if kind.is_device_scoped() {
            Some(next_part(&mut iter)?)
        } else {
            None
        };

        if iter.next().is_some() {
            return Err(TopicError::InvalidSparkplugTopic);
        }

        Ok(Self {
            group_id,
            kind,
            node_id,
            device_id,
        })
    }
}
