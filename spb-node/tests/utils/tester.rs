use std::time::Duration;

use async_trait::async_trait;
use spb_client::{
    channel::{ChannelBroker, ChannelEventLoop, OutboundMessage},
    Event,
};
use spb_node::{Command, CommandHandler, EdgeNode, EdgeNodeBuilder, NodeHandle, StartError};
use spb_types::{
    constants::{BDSEQ, NODE_CONTROL_REBIRTH, NODE_CONTROL_REBOOT},
    encode_with_timestamp,
    payload::{metric, DataType, Message, Payload},
    topic::{DeviceMessage, DeviceTopic, NodeMessage, NodeTopic, QoS, TopicFilter},
    Value,
};
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};

pub const GROUP_ID: &str = "foo";
pub const NODE_ID: &str = "bar";

pub fn builder() -> (EdgeNodeBuilder, ChannelBroker) {
    let (eventloop, client, broker) = ChannelEventLoop::new();
    let builder = EdgeNodeBuilder::new(eventloop, client)
        .with_group_id(GROUP_ID)
        .with_node_id(NODE_ID)
        .with_disconnect_grace(Duration::from_millis(200));
    (builder, broker)
}

pub fn spawn_node(node: EdgeNode) -> JoinHandle<Result<(), StartError>> {
    tokio::spawn(async move { node.run().await })
}

/// Build a node with default settings, start it and wait for it to be born.
pub async fn online_node() -> (NodeHandle, ChannelBroker, JoinHandle<Result<(), StartError>>) {
    let (builder, mut broker) = builder();
    let (node, handle) = builder.build().unwrap();
    let task = spawn_node(node);
    test_node_online(&mut broker, 0, 0).await;
    (handle, broker, task)
}

pub async fn recv(broker: &mut ChannelBroker) -> OutboundMessage {
    timeout(Duration::from_secs(1), broker.rx_outbound.recv())
        .await
        .unwrap()
        .unwrap()
}

pub async fn assert_no_message(broker: &mut ChannelBroker) {
    if let Ok(message) = timeout(Duration::from_millis(100), broker.rx_outbound.recv()).await {
        panic!("unexpected message {message:?}")
    }
}

pub async fn expect_node_message(broker: &mut ChannelBroker, expected: NodeMessage) -> Payload {
    match recv(broker).await {
        OutboundMessage::NodeMessage { topic, payload } => {
            assert_eq!(topic, NodeTopic::new(GROUP_ID, expected, NODE_ID));
            payload
        }
        message => panic!("expected {expected:?} got {message:?}"),
    }
}

pub async fn expect_device_message(
    broker: &mut ChannelBroker,
    expected: DeviceMessage,
    device_id: &str,
) -> Payload {
    match recv(broker).await {
        OutboundMessage::DeviceMessage { topic, payload } => {
            assert_eq!(
                topic,
                DeviceTopic::new(GROUP_ID, expected, NODE_ID, device_id)
            );
            payload
        }
        message => panic!("expected {expected:?} got {message:?}"),
    }
}

pub fn bdseq_of(payload: &Payload) -> i64 {
    match payload.metric(BDSEQ).and_then(|m| m.value.clone()) {
        Some(metric::Value::LongValue(v)) => v as i64,
        other => panic!("invalid bdSeq metric {other:?}"),
    }
}

pub fn verify_nbirth_payload(payload: &Payload, expected_bdseq: i64, expected_seq: u64) {
    assert_eq!(payload.seq, Some(expected_seq));
    assert_ne!(payload.timestamp, None);

    for metric in &payload.metrics {
        assert_ne!(metric.datatype, None);
        assert!(metric.name.is_some(), "Metric name is required in birth payload");
        if metric.value.is_some() {
            assert_eq!(metric.is_null, None)
        }
    }

    for name in [NODE_CONTROL_REBIRTH, NODE_CONTROL_REBOOT] {
        let control = payload.metric(name).unwrap();
        assert_eq!(control.alias, None);
        assert_eq!(control.datatype, Some(DataType::Boolean as u32));
        assert_eq!(control.value, Some(metric::Value::BooleanValue(false)));
    }

    let bdseq = payload.metric(BDSEQ).unwrap();
    assert_eq!(bdseq.datatype, Some(DataType::Int64 as u32));
    assert_eq!(bdseq_of(payload), expected_bdseq);
}

pub async fn test_node_online(broker: &mut ChannelBroker, expected_bdseq: i64, expected_seq: u64) {
    let filters = match recv(broker).await {
        OutboundMessage::Subscribe(filters) => filters,
        message => panic!("got {message:?}"),
    };
    let expected_filters = vec![
        TopicFilter::new_with_qos(
            NodeTopic::new(GROUP_ID, NodeMessage::NCmd, NODE_ID).topic,
            QoS::AtLeastOnce,
        ),
        TopicFilter::new_with_qos(
            DeviceTopic::new(GROUP_ID, DeviceMessage::DCmd, NODE_ID, "+").topic,
            QoS::AtLeastOnce,
        ),
    ];
    assert_eq!(filters, expected_filters);

    let payload = expect_node_message(broker, NodeMessage::NBirth).await;
    verify_nbirth_payload(&payload, expected_bdseq, expected_seq);
}

pub fn command_payload(metrics: Vec<(&str, Value)>) -> Vec<u8> {
    Payload {
        timestamp: Some(0),
        metrics: metrics
            .into_iter()
            .map(|(name, value)| encode_with_timestamp(name, value, 0).unwrap())
            .collect(),
        seq: None,
        uuid: None,
        body: None,
    }
    .encode_to_vec()
}

pub fn send_node_command(broker: &ChannelBroker, metrics: Vec<(&str, Value)>) {
    broker
        .tx_event
        .send(Event::Message {
            topic: NodeTopic::new(GROUP_ID, NodeMessage::NCmd, NODE_ID).topic,
            payload: command_payload(metrics),
        })
        .unwrap();
}

pub fn send_device_command(broker: &ChannelBroker, device_id: &str, metrics: Vec<(&str, Value)>) {
    broker
        .tx_event
        .send(Event::Message {
            topic: DeviceTopic::new(GROUP_ID, DeviceMessage::DCmd, NODE_ID, device_id).topic,
            payload: command_payload(metrics),
        })
        .unwrap();
}

pub async fn test_graceful_shutdown(
    broker: &mut ChannelBroker,
    handle: &NodeHandle,
    expected_bdseq: i64,
    expected_seq: u64,
) {
    handle.stop().await;
    let payload = expect_node_message(broker, NodeMessage::NDeath).await;
    assert_eq!(payload.seq, Some(expected_seq));
    assert_eq!(payload.metrics.len(), 1);
    assert_eq!(bdseq_of(&payload), expected_bdseq);

    assert_eq!(recv(broker).await, OutboundMessage::Disconnect);
}

#[derive(Debug, PartialEq)]
pub enum Handled {
    Reboot,
    Node(Command),
    Device(String, Command),
}

/// Forwards every handler invocation over a channel
pub struct RecordingHandler {
    tx: mpsc::UnboundedSender<Handled>,
}

impl RecordingHandler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Handled>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    async fn on_reboot(&self, _node: &NodeHandle) {
        _ = self.tx.send(Handled::Reboot);
    }

    async fn on_node_command(&self, _node: &NodeHandle, command: Command) {
        _ = self.tx.send(Handled::Node(command));
    }

    async fn on_device_command(&self, _node: &NodeHandle, device_id: &str, command: Command) {
        _ = self.tx.send(Handled::Device(device_id.to_string(), command));
    }
}

pub async fn recv_handled(rx: &mut mpsc::UnboundedReceiver<Handled>) -> Handled {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap()
}
