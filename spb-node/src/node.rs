use std::{
    collections::BTreeMap,
    sync::{Arc, MutexGuard},
    time::Instant,
};

use log::{debug, error, info, warn};
use spb_client::{ClientError, DynClient, DynEventLoop, Event, LastWill};
use spb_types::{
    constants::{NODE_CONTROL_REBIRTH, NODE_CONTROL_REBOOT},
    payload::{Message, Payload},
    topic::{
        device_command_filter, DeviceMessage, DeviceTopic, NodeMessage, NodeTopic, QoS,
        SparkplugTopic, TopicFilter,
    },
    utils::validate_name,
    Value,
};
use tokio::{
    select,
    sync::{mpsc, Mutex},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

use crate::{
    command::DynCommandHandler,
    config::NodeConfig,
    device::{DeviceSession, DynDevice, DynMetricSource},
    lifecycle::{LifecycleState, NodeLifecycle},
    message::{self, MessageMetrics},
    sequence::SequenceAuthority,
    Command, Device, DeviceError, EdgeNodeBuilder, PublishError, StartError, StateError,
};

struct Session {
    sequence: SequenceAuthority,
    lifecycle: NodeLifecycle,
    devices: BTreeMap<String, DeviceSession>,
    last_rebirth: Option<Instant>,
    connection: u64,
}

/// A `seq` taken for a message of a specific connection.
#[derive(Debug, Clone, Copy)]
struct SeqTicket {
    seq: u8,
    connection: u64,
}

impl Session {
    fn new() -> Self {
        Self {
            sequence: SequenceAuthority::new(),
            lifecycle: NodeLifecycle::new(),
            devices: BTreeMap::new(),
            last_rebirth: None,
            connection: 0,
        }
    }

    fn take_seq(&mut self) -> SeqTicket {
        SeqTicket {
            seq: self.sequence.next_seq(),
            connection: self.connection,
        }
    }

    fn release_seq(&mut self, ticket: SeqTicket) {
        if ticket.connection == self.connection {
            self.sequence.release_seq(ticket.seq);
        }
    }
}

pub(crate) struct NodeState {
    group_id: String,
    node_id: String,
    client: Arc<DynClient>,
    /* Never held across an await */
    session: std::sync::Mutex<Session>,
    /* Held from taking a seq until the client accepted the message so emission order matches seq order */
    publish_gate: Mutex<()>,
    node_metrics: Option<Arc<DynMetricSource>>,
    command_handler: Arc<DynCommandHandler>,
    config: NodeConfig,
    cancel: CancellationToken,
}

impl NodeState {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap()
    }

    fn node_topic(&self, message: NodeMessage) -> NodeTopic {
        NodeTopic::new(&self.group_id, message, &self.node_id)
    }

    fn device_topic(&self, message: DeviceMessage, device_id: &str) -> DeviceTopic {
        DeviceTopic::new(&self.group_id, message, &self.node_id, device_id)
    }

    fn create_last_will(&self, bdseq: u8) -> LastWill {
        LastWill::new_node(
            &self.group_id,
            &self.node_id,
            message::node_death(bdseq).into_payload(None),
        )
    }

    fn sub_topics(&self) -> Vec<TopicFilter> {
        vec![
            TopicFilter::new_with_qos(
                self.node_topic(NodeMessage::NCmd).topic,
                QoS::AtLeastOnce,
            ),
            TopicFilter::new_with_qos(
                device_command_filter(&self.group_id, &self.node_id),
                QoS::AtLeastOnce,
            ),
        ]
    }

    fn begin_connect(&self) -> Result<LastWill, StateError> {
        let mut session = self.session();
        session.lifecycle.begin_connect()?;
        session.connection = session.connection.wrapping_add(1);
        Ok(self.create_last_will(session.sequence.upcoming_bdseq()))
    }

    async fn on_connected(&self) -> Result<(), StartError> {
        let _gate = self.publish_gate.lock().await;
        let bdseq = {
            let mut session = self.session();
            session.lifecycle.connected()?;
            session.sequence.advance_bdseq()
        };
        info!("Edge node online. node={} bdseq={bdseq}", self.node_id);

        self.client.subscribe_many(self.sub_topics()).await?;
        self.publish_node_birth().await?;
        Ok(())
    }

    fn on_connection_lost(&self) {
        let mut session = self.session();
        if session.lifecycle.disconnected() {
            info!("Edge node offline. node={}", self.node_id);
        }
        for device in session.devices.values_mut() {
            device.lifecycle.set_offline();
        }
    }

    /// Publish a node message that holds `ticket`, handing the seq back if the client rejects it.
    ///
    /// Must be called with the publish gate held.
    async fn publish_node(
        &self,
        message: NodeMessage,
        payload: Payload,
        ticket: SeqTicket,
    ) -> Result<(), ClientError> {
        let result = self
            .client
            .publish_node_message(self.node_topic(message), payload)
            .await;
        if result.is_err() {
            self.session().release_seq(ticket);
        }
        result
    }

    /// Device counterpart of [Self::publish_node].
    async fn publish_device(
        &self,
        message: DeviceMessage,
        device_id: &str,
        payload: Payload,
        ticket: SeqTicket,
    ) -> Result<(), ClientError> {
        let result = self
            .client
            .publish_device_message(self.device_topic(message, device_id), payload)
            .await;
        if result.is_err() {
            self.session().release_seq(ticket);
        }
        result
    }

    /// Must be called with the publish gate held.
    async fn publish_node_birth(&self) -> Result<(), ClientError> {
        let values = match &self.node_metrics {
            Some(metrics) => metrics.metric_values(),
            None => BTreeMap::new(),
        };
        let (bdseq, ticket) = {
            let mut session = self.session();
            if self.config.reset_seq_on_birth {
                session.sequence.reset_seq();
            }
            (session.sequence.current_bdseq(), session.take_seq())
        };
        let payload = message::node_birth(bdseq, values).into_payload(Some(ticket.seq));

        match self.publish_node(NodeMessage::NBirth, payload, ticket).await {
            Ok(_) => {
                let mut session = self.session();
                if session.connection == ticket.connection {
                    session.lifecycle.mark_birthed();
                }
                debug!("Published NBIRTH. node={} bdseq={bdseq}", self.node_id);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Publishing node birth message failed. node={} error={e}",
                    self.node_id
                );
                Err(e)
            }
        }
    }

    /// Publish a DBIRTH for an attached device and mark it online.
    ///
    /// Skipped if the device was detached or its node lost its birth in the meantime.
    /// Must be called with the publish gate held.
    async fn publish_device_birth(
        &self,
        device_id: &str,
        device: Arc<DynDevice>,
    ) -> Result<(), ClientError> {
        let metrics = MessageMetrics::encode(device.metric_values());
        let ticket = {
            let mut session = self.session();
            let session = &mut *session;
            let permitted = match session.devices.get(device_id) {
                Some(attached) => attached
                    .lifecycle
                    .permits(device_id, DeviceMessage::DBirth, &session.lifecycle)
                    .is_ok(),
                None => false,
            };
            if !permitted {
                debug!(
                    "Skipping DBIRTH, device no longer eligible. node={} device={device_id}",
                    self.node_id
                );
                return Ok(());
            }
            session.take_seq()
        };
        let payload = metrics.into_payload(Some(ticket.seq));
        self.publish_device(DeviceMessage::DBirth, device_id, payload, ticket)
            .await?;

        let mut session = self.session();
        if session.connection == ticket.connection {
            if let Some(attached) = session.devices.get_mut(device_id) {
                attached.lifecycle.set_online();
            }
        }
        debug!(
            "Published DBIRTH. node={} device={device_id}",
            self.node_id
        );
        Ok(())
    }

    /// Must be called with the publish gate held.
    async fn rebirth(&self) -> Result<(), PublishError> {
        {
            let mut session = self.session();
            session.lifecycle.permits(NodeMessage::NData)?;
            if self.config.advance_bdseq_on_rebirth {
                session.sequence.advance_bdseq();
            }
        }
        info!("Rebirthing node. node={}", self.node_id);
        self.publish_node_birth().await?;

        let online: Vec<(String, Arc<DynDevice>)> = {
            let mut session = self.session();
            session.last_rebirth = Some(Instant::now());
            session
                .devices
                .iter()
                .filter(|(_, device)| device.lifecycle.is_online())
                .map(|(id, device)| (id.clone(), device.device.clone()))
                .collect()
        };
        for (device_id, device) in online {
            self.publish_device_birth(&device_id, device).await?;
        }
        Ok(())
    }
}

/// A handle for interacting with the Edge Node.
///
/// `NodeHandle` provides an interface for interacting with an edge node,
/// including device management, node lifecycle operations, and metric publishing.
#[derive(Clone)]
pub struct NodeHandle {
    state: Arc<NodeState>,
}

impl NodeHandle {
    pub fn group_id(&self) -> &str {
        &self.state.group_id
    }

    pub fn node_id(&self) -> &str {
        &self.state.node_id
    }

    /// Stop all operations, sending a death certificate and disconnect from the broker.
    ///
    /// An in-flight publish is waited on for at most the disconnect grace period, the death
    /// certificate is only sent if the client can accept it without waiting.
    ///
    /// This will cancel [EdgeNode::run()]
    pub async fn stop(&self) {
        let grace = self.state.config.disconnect_grace;
        let gate = timeout(grace, self.state.publish_gate.lock()).await.ok();

        let death = {
            let mut session = self.state.session();
            let death = if session.lifecycle.permits(NodeMessage::NDeath).is_ok() {
                info!("Edge node stopping. node={}", self.state.node_id);
                let bdseq = session.sequence.current_bdseq();
                Some(message::node_death(bdseq).into_payload(Some(session.sequence.next_seq())))
            } else {
                None
            };
            session.lifecycle.disconnected();
            for device in session.devices.values_mut() {
                device.lifecycle.set_offline();
            }
            death
        };

        if let Some(payload) = death {
            if let Err(e) = self
                .state
                .client
                .try_publish_node_message(self.state.node_topic(NodeMessage::NDeath), payload)
                .await
            {
                debug!("Unable to publish node death certificate on exit: {e}");
            }
        }
        drop(gate);

        self.state.cancel.cancel();
        match timeout(grace, self.state.client.disconnect()).await {
            Ok(Ok(())) => (),
            Ok(Err(e)) => debug!("Disconnect failed: {e}"),
            Err(_) => debug!("Disconnect was not accepted within the disconnect grace period"),
        }
    }

    /// Manually trigger a rebirth of the node and every online device.
    pub async fn rebirth(&self) -> Result<(), PublishError> {
        let _gate = self.state.publish_gate.lock().await;
        self.state.rebirth().await
    }

    /// The current lifecycle state of the node.
    pub async fn state(&self) -> LifecycleState {
        self.state.session().lifecycle.state()
    }

    /// The current lifecycle state of an attached device.
    pub async fn device_state(&self, device_id: &str) -> Option<LifecycleState> {
        self.state
            .session()
            .devices
            .get(device_id)
            .map(|device| device.lifecycle.state())
    }

    /// Attach a device to the node.
    ///
    /// If the node is online and birthed a DBIRTH is published immediately, otherwise the device is
    /// registered offline and is birthed when it is attached again after the node came online.
    /// Attaching a device with the id of an already attached device replaces it.
    pub async fn attach_device<D: Device + Send + Sync + 'static>(
        &self,
        device: D,
    ) -> Result<(), DeviceError> {
        let device_id = device.device_id().to_string();
        validate_name(&device_id).map_err(DeviceError::InvalidName)?;
        let device: Arc<DynDevice> = Arc::new(device);

        let _gate = self.state.publish_gate.lock().await;
        let birthed = {
            let mut session = self.state.session();
            session
                .devices
                .insert(device_id.clone(), DeviceSession::new(device.clone()));
            session.lifecycle.is_birthed()
        };

        if !birthed {
            debug!(
                "Node not birthed, device registered offline. node={} device={device_id}",
                self.state.node_id
            );
            return Ok(());
        }
        self.state.publish_device_birth(&device_id, device).await?;
        Ok(())
    }

    /// Detach a device from the node, publishing a DDEATH if the device was online.
    pub async fn detach_device(&self, device_id: &str) -> Result<(), DeviceError> {
        let _gate = self.state.publish_gate.lock().await;
        let ticket = {
            let mut session = self.state.session();
            let session = &mut *session;
            let device = session
                .devices
                .remove(device_id)
                .ok_or_else(|| DeviceError::UnknownDevice(device_id.to_string()))?;
            match device
                .lifecycle
                .permits(device_id, DeviceMessage::DDeath, &session.lifecycle)
            {
                Ok(()) => Some(session.take_seq()),
                Err(_) => None,
            }
        };

        if let Some(ticket) = ticket {
            let payload = message::device_death().into_payload(Some(ticket.seq));
            self.state
                .publish_device(DeviceMessage::DDeath, device_id, payload, ticket)
                .await?;
        }
        Ok(())
    }

    /// Publish an NDATA message.
    ///
    /// Values that cannot be encoded are dropped. Fails with [PublishError::NoMetrics] if
    /// nothing is left to publish.
    pub async fn publish_node_data<I, S, V>(&self, metrics: I) -> Result<(), PublishError>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let metrics = encode_values(metrics)?;
        let _gate = self.state.publish_gate.lock().await;
        let ticket = {
            let mut session = self.state.session();
            session.lifecycle.permits(NodeMessage::NData)?;
            session.take_seq()
        };
        let payload = metrics.into_payload(Some(ticket.seq));
        self.state
            .publish_node(NodeMessage::NData, payload, ticket)
            .await?;
        Ok(())
    }

    /// Publish a DDATA message for an attached device.
    ///
    /// Values that cannot be encoded are dropped. Fails with [PublishError::NoMetrics] if
    /// nothing is left to publish.
    pub async fn publish_device_data<I, S, V>(
        &self,
        device_id: &str,
        metrics: I,
    ) -> Result<(), PublishError>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let metrics = encode_values(metrics)?;
        self.publish_device_metrics(device_id, metrics).await
    }

    /// Publish the current values of the named metrics of an attached device as DDATA.
    ///
    /// Names the device has no value for are skipped.
    pub async fn publish_device_values<I, S>(
        &self,
        device_id: &str,
        names: I,
    ) -> Result<(), PublishError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let device = self
            .state
            .session()
            .devices
            .get(device_id)
            .map(|attached| attached.device.clone())
            .ok_or_else(|| PublishError::UnknownDevice(device_id.to_string()))?;

        let mut values = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            match device.metric_value(name) {
                Some(value) => {
                    values.insert(name.to_string(), value);
                }
                None => debug!("Device {device_id} has no value for metric {name} - skipping"),
            }
        }

        let metrics = MessageMetrics::encode(values);
        if metrics.is_empty() {
            return Err(PublishError::NoMetrics);
        }
        self.publish_device_metrics(device_id, metrics).await
    }

    async fn publish_device_metrics(
        &self,
        device_id: &str,
        metrics: MessageMetrics,
    ) -> Result<(), PublishError> {
        let _gate = self.state.publish_gate.lock().await;
        let ticket = {
            let mut session = self.state.session();
            let session = &mut *session;
            let device = session
                .devices
                .get(device_id)
                .ok_or_else(|| PublishError::UnknownDevice(device_id.to_string()))?;
            device
                .lifecycle
                .permits(device_id, DeviceMessage::DData, &session.lifecycle)?;
            session.take_seq()
        };
        let payload = metrics.into_payload(Some(ticket.seq));
        self.state
            .publish_device(DeviceMessage::DData, device_id, payload, ticket)
            .await?;
        Ok(())
    }

    /// Handle a message received on one of the node's command subscriptions.
    ///
    /// Messages for other nodes, non command messages and payloads that fail to decode are
    /// logged and discarded.
    pub async fn on_inbound_command(&self, topic: &str, payload: &[u8]) {
        let parsed: SparkplugTopic = match topic.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Ignoring message on invalid topic {topic}: {e}");
                return;
            }
        };

        if !parsed.kind.is_command()
            || parsed.group_id != self.state.group_id
            || parsed.node_id != self.state.node_id
        {
            debug!("Ignoring message on topic {topic}");
            return;
        }

        let payload = match Payload::decode(payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Received invalid CMD payload - ignoring request. topic={topic} error={e}");
                return;
            }
        };

        match parsed.device_id {
            None => self.on_node_command(payload).await,
            Some(device_id) => self.on_device_command(&device_id, payload).await,
        }
    }

    async fn on_node_command(&self, payload: Payload) {
        let mut rebirth = false;
        let mut reboot = false;
        let mut commands = Vec::new();

        for metric in payload.metrics {
            let name = match &metric.name {
                Some(name) => name.clone(),
                None => {
                    warn!("Received CMD metric without a name - ignoring");
                    continue;
                }
            };
            let value = Value::try_from_metric(&metric);
            match name.as_str() {
                NODE_CONTROL_REBIRTH => match value {
                    Ok(Value::Boolean(true)) => rebirth = true,
                    _ => warn!("Received invalid CMD Rebirth metric - ignoring request"),
                },
                NODE_CONTROL_REBOOT => match value {
                    Ok(Value::Boolean(true)) => reboot = true,
                    _ => warn!("Received invalid CMD Reboot metric - ignoring request"),
                },
                _ => match value {
                    Ok(value) => commands.push(Command { name, value }),
                    Err(e) => warn!("Received invalid CMD metric {name} - ignoring. error={e}"),
                },
            }
        }

        if rebirth {
            self.command_rebirth().await;
        }

        if reboot {
            info!("Received Reboot command. node={}", self.state.node_id);
            self.state.command_handler.on_reboot(self).await;
        }

        for command in commands {
            info!(
                "Received unknown command '{}'. node={}",
                command.name, self.state.node_id
            );
            self.state.command_handler.on_node_command(self, command).await;
        }
    }

    async fn command_rebirth(&self) {
        let _gate = self.state.publish_gate.lock().await;
        let last_rebirth = self.state.session().last_rebirth;
        if let Some(last) = last_rebirth {
            if last.elapsed() < self.state.config.rebirth_cooldown {
                info!("Got Rebirth CMD but cooldown time not expired. Ignoring");
                return;
            }
        }
        info!("Got Rebirth CMD - Rebirthing Node");
        if let Err(e) = self.state.rebirth().await {
            warn!("Rebirth failed. node={} error={e}", self.state.node_id);
        }
    }

    async fn on_device_command(&self, device_id: &str, payload: Payload) {
        let attached = self.state.session().devices.contains_key(device_id);
        if !attached {
            warn!("Received DCMD for unknown device {device_id} - ignoring");
            return;
        }

        for metric in payload.metrics {
            let name = match metric.name.clone() {
                Some(name) => name,
                None => {
                    warn!("Received DCMD metric without a name - ignoring");
                    continue;
                }
            };
            match Value::try_from_metric(&metric) {
                Ok(value) => {
                    self.state
                        .command_handler
                        .on_device_command(self, device_id, Command { name, value })
                        .await
                }
                Err(e) => warn!("Received invalid DCMD metric {name} - ignoring. error={e}"),
            }
        }
    }
}

fn encode_values<I, S, V>(metrics: I) -> Result<MessageMetrics, PublishError>
where
    I: IntoIterator<Item = (S, V)>,
    S: Into<String>,
    V: Into<Value>,
{
    let values: BTreeMap<String, Value> = metrics
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect();
    let metrics = MessageMetrics::encode(values);
    if metrics.is_empty() {
        return Err(PublishError::NoMetrics);
    }
    Ok(metrics)
}

async fn command_worker(handle: NodeHandle, mut rx: mpsc::UnboundedReceiver<InboundCommand>) {
    while let Some((topic, payload)) = rx.recv().await {
        handle.on_inbound_command(&topic, &payload).await;
    }
}

type InboundCommand = (String, Vec<u8>);

/// Structure that represents a Sparkplug Edge Node instance.
///
/// See [EdgeNodeBuilder] on how to create an [EdgeNode] instance.
pub struct EdgeNode {
    eventloop: Box<DynEventLoop>,
    state: Arc<NodeState>,
    commands: mpsc::UnboundedSender<InboundCommand>,
    command_rx: Option<mpsc::UnboundedReceiver<InboundCommand>>,
}

impl EdgeNode {
    pub(crate) fn new_from_builder(
        builder: EdgeNodeBuilder,
    ) -> Result<(Self, NodeHandle), String> {
        let group_id = builder
            .group_id
            .ok_or("group id must be provided".to_string())?;
        let node_id = builder
            .node_id
            .ok_or("node id must be provided".to_string())?;
        validate_name(&group_id)?;
        validate_name(&node_id)?;

        let (eventloop, client) = builder.eventloop_client;

        let state = Arc::new(NodeState {
            group_id,
            node_id,
            client,
            session: std::sync::Mutex::new(Session::new()),
            publish_gate: Mutex::new(()),
            node_metrics: builder.node_metrics,
            command_handler: builder.command_handler,
            config: builder.config,
            cancel: CancellationToken::new(),
        });

        let handle = NodeHandle {
            state: state.clone(),
        };
        let (commands, command_rx) = mpsc::unbounded_channel();
        Ok((
            Self {
                eventloop,
                state,
                commands,
                command_rx: Some(command_rx),
            },
            handle,
        ))
    }

    fn create_node_handle(&self) -> NodeHandle {
        NodeHandle {
            state: self.state.clone(),
        }
    }

    fn dispatch(&self, event: Event) -> Result<(), ClientError> {
        match event {
            Event::Offline => Err(ClientError::Disconnected),
            Event::Message { topic, payload } => {
                _ = self.commands.send((topic, payload));
                Ok(())
            }
        }
    }

    async fn connect(&mut self) -> Result<(), StartError> {
        let will = self.state.begin_connect()?;
        let connected = select! {
            _ = self.state.cancel.cancelled() => return Err(StartError::Cancelled),
            connected = self.eventloop.connect(will) => connected,
        };
        connected?;

        /* keep the transport polled while the birth is handed to the client */
        let state = self.state.clone();
        let birth = state.on_connected();
        tokio::pin!(birth);
        loop {
            select! {
                biased;
                _ = self.state.cancel.cancelled() => return Err(StartError::Cancelled),
                result = &mut birth => return result,
                event = self.eventloop.poll() => self.dispatch(event)?,
            }
        }
    }

    /// Connect to the broker and birth the node.
    ///
    /// Failed attempts are retried according to the configured [RetryPolicy](crate::RetryPolicy).
    /// Returns [StartError::Cancelled] if [NodeHandle::stop()] is called while connecting.
    pub async fn start(&mut self) -> Result<(), StartError> {
        let retry = self.state.config.retry.clone();
        let mut attempts = 0;
        loop {
            if self.state.cancel.is_cancelled() {
                return Err(StartError::Cancelled);
            }
            attempts += 1;
            let result = self.connect().await;
            if self.state.cancel.is_cancelled() {
                self.state.on_connection_lost();
                return Err(StartError::Cancelled);
            }
            let error = match result {
                Ok(()) => return Ok(()),
                Err(StartError::Transport(e)) => e,
                Err(e) => return Err(e),
            };
            self.state.on_connection_lost();
            warn!(
                "Edge node connection attempt {attempts} failed. node={} error={error}",
                self.state.node_id
            );

            if let Some(max_attempts) = retry.max_attempts {
                if attempts >= max_attempts {
                    return Err(StartError::RetriesExhausted {
                        attempts,
                        source: error,
                    });
                }
            }

            select! {
                _ = self.state.cancel.cancelled() => return Err(StartError::Cancelled),
                _ = tokio::time::sleep(retry.interval) => (),
            }
        }
    }

    async fn poll_until_offline(&mut self) {
        while self.eventloop.poll().await != Event::Offline {}
    }

    async fn run_session(&mut self) -> Result<(), StartError> {
        self.start().await?;
        loop {
            select! {
                biased;
                _ = self.state.cancel.cancelled() => return Ok(()),
                event = self.eventloop.poll() => {
                    if self.dispatch(event).is_err() {
                        self.state.on_connection_lost();
                        self.start().await?;
                    }
                }
            }
        }
    }

    /// Run the Edge Node
    ///
    /// Connects, births the node and then processes inbound commands and reconnects until
    /// [NodeHandle::stop()] is called.
    pub async fn run(mut self) -> Result<(), StartError> {
        info!("Edge node running. node={}", self.state.node_id);

        if let Some(command_rx) = self.command_rx.take() {
            tokio::spawn(command_worker(self.create_node_handle(), command_rx));
        }

        let result = self.run_session().await;

        if self.state.cancel.is_cancelled()
            && timeout(self.state.config.disconnect_grace, self.poll_until_offline())
                .await
                .is_err()
        {
            debug!("Transport did not report offline within the disconnect grace period");
        }

        self.state.on_connection_lost();
        info!("Edge node stopped. node={}", self.state.node_id);
        match result {
            Err(StartError::Cancelled) => Ok(()),
            other => other,
        }
    }
}
