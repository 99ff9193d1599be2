use std::time::Duration;

use async_trait::async_trait;
use spb_client::{channel::OutboundMessage, Client, ClientError, Event, EventLoop, LastWill};
use spb_types::{
    payload::Payload,
    topic::{DeviceTopic, NodeMessage, NodeTopic, TopicFilter},
};
use tokio::{
    select,
    sync::{mpsc, watch},
    time::timeout,
};

use super::tester::{GROUP_ID, NODE_ID};

/// A transport with a fixed size request queue that is only drained while the event loop is
/// polled and the broker lets it through, like an MQTT client whose socket stopped writing.
///
/// Draining a [OutboundMessage::Disconnect] ends the connection with an [Event::Offline].
pub fn bounded_transport(capacity: usize) -> (BoundedEventLoop, BoundedClient, BoundedBroker) {
    let (tx_request, rx_request) = mpsc::channel(capacity);
    let (tx_event, rx_event) = mpsc::unbounded_channel();
    let (tx_outbound, rx_outbound) = mpsc::unbounded_channel();
    let (drain, drain_rx) = watch::channel(true);
    (
        BoundedEventLoop {
            rx_request,
            rx_event,
            tx_outbound,
            drain: drain_rx,
        },
        BoundedClient { tx: tx_request },
        BoundedBroker {
            rx_outbound,
            tx_event,
            drain,
        },
    )
}

#[derive(Clone)]
pub struct BoundedClient {
    tx: mpsc::Sender<OutboundMessage>,
}

impl BoundedClient {
    async fn send(&self, message: OutboundMessage) -> Result<(), ClientError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| ClientError::Disconnected)
    }

    fn try_send(&self, message: OutboundMessage) -> Result<(), ClientError> {
        self.tx
            .try_send(message)
            .map_err(|e| ClientError::Request(e.to_string()))
    }
}

#[async_trait]
impl Client for BoundedClient {
    async fn disconnect(&self) -> Result<(), ClientError> {
        self.send(OutboundMessage::Disconnect).await
    }

    async fn publish_node_message(
        &self,
        topic: NodeTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        self.send(OutboundMessage::NodeMessage { topic, payload })
            .await
    }

    async fn publish_device_message(
        &self,
        topic: DeviceTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        self.send(OutboundMessage::DeviceMessage { topic, payload })
            .await
    }

    async fn try_publish_node_message(
        &self,
        topic: NodeTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        self.try_send(OutboundMessage::NodeMessage { topic, payload })
    }

    async fn try_publish_device_message(
        &self,
        topic: DeviceTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        self.try_send(OutboundMessage::DeviceMessage { topic, payload })
    }

    async fn subscribe_many(&self, topics: Vec<TopicFilter>) -> Result<(), ClientError> {
        self.send(OutboundMessage::Subscribe(topics)).await
    }
}

pub struct BoundedEventLoop {
    rx_request: mpsc::Receiver<OutboundMessage>,
    rx_event: mpsc::UnboundedReceiver<Event>,
    tx_outbound: mpsc::UnboundedSender<OutboundMessage>,
    drain: watch::Receiver<bool>,
}

async fn wait_for_drain(drain: &mut watch::Receiver<bool>, value: bool) {
    if drain.wait_for(|drain| *drain == value).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn next_request(
    drain: &mut watch::Receiver<bool>,
    rx: &mut mpsc::Receiver<OutboundMessage>,
) -> OutboundMessage {
    loop {
        wait_for_drain(drain, true).await;
        select! {
            biased;
            _ = wait_for_drain(drain, false) => continue,
            message = rx.recv() => match message {
                Some(message) => return message,
                None => return std::future::pending().await,
            },
        }
    }
}

#[async_trait]
impl EventLoop for BoundedEventLoop {
    async fn connect(&mut self, _will: LastWill) -> Result<(), ClientError> {
        Ok(())
    }

    async fn poll(&mut self) -> Event {
        loop {
            select! {
                biased;
                event = self.rx_event.recv() => match event {
                    Some(event) => return event,
                    None => return std::future::pending().await,
                },
                request = next_request(&mut self.drain, &mut self.rx_request) => {
                    let disconnect = request == OutboundMessage::Disconnect;
                    _ = self.tx_outbound.send(request);
                    if disconnect {
                        return Event::Offline;
                    }
                }
            }
        }
    }
}

pub struct BoundedBroker {
    pub rx_outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    pub tx_event: mpsc::UnboundedSender<Event>,
    drain: watch::Sender<bool>,
}

impl BoundedBroker {
    /// Stop taking requests off the client queue.
    pub fn stall(&self) {
        self.drain.send_replace(false);
    }

    pub fn resume(&self) {
        self.drain.send_replace(true);
    }

    pub async fn recv(&mut self) -> OutboundMessage {
        timeout(Duration::from_secs(1), self.rx_outbound.recv())
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn expect_subscribe(&mut self) {
        match self.recv().await {
            OutboundMessage::Subscribe(_) => (),
            message => panic!("expected subscribe got {message:?}"),
        }
    }

    pub async fn expect_node_message(&mut self, expected: NodeMessage) -> Payload {
        match self.recv().await {
            OutboundMessage::NodeMessage { topic, payload } => {
                assert_eq!(topic, NodeTopic::new(GROUP_ID, expected, NODE_ID));
                payload
            }
            message => panic!("expected {expected:?} got {message:?}"),
        }
    }
}
