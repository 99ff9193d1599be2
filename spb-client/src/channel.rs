use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use crate::{ClientError, Event, LastWill};
use async_trait::async_trait;
use spb_types::{
    payload::Payload,
    topic::{DeviceTopic, NodeTopic, TopicFilter},
};
use tokio::sync::mpsc;

/// A [Client](crate::Client) implementation that uses channels for message passing.
///
/// Disconnecting the client also produces an [Event::Offline] on the paired [ChannelEventLoop],
/// mirroring a transport that reports the closed connection.
///
/// # Examples
///
/// See [ChannelEventLoop]
#[derive(Clone)]
pub struct ChannelClient {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    tx_event: mpsc::UnboundedSender<Event>,
    publish_failures: Arc<AtomicUsize>,
}

impl ChannelClient {
    fn send(&self, message: OutboundMessage) -> Result<(), ClientError> {
        self.tx
            .send(message)
            .map_err(|_| ClientError::Disconnected)
    }

    fn publish(&self, message: OutboundMessage) -> Result<(), ClientError> {
        let failed = self
            .publish_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ClientError::Request("publish rejected".into()));
        }
        self.send(message)
    }
}

#[async_trait]
impl crate::Client for ChannelClient {
    async fn disconnect(&self) -> Result<(), ClientError> {
        self.send(OutboundMessage::Disconnect)?;
        self.tx_event
            .send(Event::Offline)
            .map_err(|_| ClientError::Disconnected)
    }

    async fn publish_node_message(
        &self,
        topic: NodeTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        self.publish(OutboundMessage::NodeMessage { topic, payload })
    }

    async fn publish_device_message(
        &self,
        topic: DeviceTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        self.publish(OutboundMessage::DeviceMessage { topic, payload })
    }

    async fn try_publish_node_message(
        &self,
        topic: NodeTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        self.publish(OutboundMessage::NodeMessage { topic, payload })
    }

    async fn try_publish_device_message(
        &self,
        topic: DeviceTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        self.publish(OutboundMessage::DeviceMessage { topic, payload })
    }

    async fn subscribe_many(&self, topics: Vec<TopicFilter>) -> Result<(), ClientError> {
        self.send(OutboundMessage::Subscribe(topics))
    }
}

/// An Enum representing different messages and requests a [ChannelClient] can send to the [ChannelBroker]
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundMessage {
    Disconnect,
    NodeMessage {
        topic: NodeTopic,
        payload: Payload,
    },
    DeviceMessage {
        topic: DeviceTopic,
        payload: Payload,
    },
    Subscribe(Vec<TopicFilter>),
}

#[derive(Default)]
struct ConnectState {
    last_will: Option<LastWill>,
    scripted: VecDeque<Result<(), ClientError>>,
}

/// A "broker" that manages the communication between a [ChannelClient] and an [ChannelEventLoop].
///
/// Used to send events to the eventloop, script the outcome of connection attempts and inspect
/// messages/requests produced by the client
///
/// # Examples
///
/// ```no_run
/// use spb_client::{Event, channel::ChannelEventLoop};
/// use tokio::runtime::Runtime;
///
/// let rt = Runtime::new().unwrap();
/// rt.block_on(async {
///     let (mut eventloop, client, mut broker) = ChannelEventLoop::new();
///
///     //create a node that uses the EventLoop and client
///
///     //Simulate the connection dropping
///     broker.tx_event.send(Event::Offline).unwrap();
///
///     //Receive a message or request from the Client
///     let message = broker.rx_outbound.recv().await.unwrap();
/// });
/// ```
pub struct ChannelBroker {
    pub rx_outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    pub tx_event: mpsc::UnboundedSender<Event>,
    connect: Arc<Mutex<ConnectState>>,
    attempts: Arc<AtomicUsize>,
    publish_failures: Arc<AtomicUsize>,
}

impl ChannelBroker {
    /// Retrieves the last will registered by the most recent connection attempt, if any.
    pub fn last_will(&self) -> Option<LastWill> {
        self.connect.lock().unwrap().last_will.clone()
    }

    /// Make the next `count` connection attempts fail.
    pub fn fail_next_connects(&self, count: usize) {
        let mut state = self.connect.lock().unwrap();
        for _ in 0..count {
            state
                .scripted
                .push_back(Err(ClientError::Connect("connection refused".into())));
        }
    }

    /// Make the client reject the next `count` publishes.
    pub fn fail_next_publishes(&self, count: usize) {
        self.publish_failures.fetch_add(count, Ordering::SeqCst);
    }

    /// The number of connection attempts made so far.
    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// An [EventLoop](crate::EventLoop) implementation that uses channels
///
/// Connection attempts succeed unless failures were scripted with
/// [ChannelBroker::fail_next_connects].
///
/// # Examples
///
/// See [ChannelBroker]
pub struct ChannelEventLoop {
    rx: mpsc::UnboundedReceiver<Event>,
    connect: Arc<Mutex<ConnectState>>,
    attempts: Arc<AtomicUsize>,
}

impl ChannelEventLoop {
    /// Creates a new event loop along with the corresponding client and broker.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, ChannelClient, ChannelBroker) {
        let (tx_event, rx_event) = mpsc::unbounded_channel();
        let (tx_outbound, rx_outbound) = mpsc::unbounded_channel();
        let connect = Arc::new(Mutex::new(ConnectState::default()));
        let attempts = Arc::new(AtomicUsize::new(0));
        let publish_failures = Arc::new(AtomicUsize::new(0));
        let el = Self {
            rx: rx_event,
            connect: connect.clone(),
            attempts: attempts.clone(),
        };
        (
            el,
            ChannelClient {
                tx: tx_outbound,
                tx_event: tx_event.clone(),
                publish_failures: publish_failures.clone(),
            },
            ChannelBroker {
                rx_outbound,
                tx_event,
                connect,
                attempts,
                publish_failures,
            },
        )
    }
}

#[async_trait]
impl crate::EventLoop for ChannelEventLoop {
    async fn connect(&mut self, will: LastWill) -> Result<(), ClientError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.connect.lock().unwrap();
        state.last_will = Some(will);
        state.scripted.pop_front().unwrap_or(Ok(()))
    }

    async fn poll(&mut self) -> Event {
        match self.rx.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}
