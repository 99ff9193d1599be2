use async_trait::async_trait;
use log::{debug, error, trace};
use rumqttc::{
    v5::{
        mqttbytes::{
            v5::{ConnectProperties, Filter, Packet},
            QoS,
        },
        AsyncClient as RuClient, EventLoop as RuEventLoop, MqttOptions as RuMqttOptions,
    },
    Outgoing,
};
use spb_client::{ClientError, Event, LastWill};
use spb_types::{
    payload::{Message, Payload},
    topic::{DeviceTopic, NodeTopic, TopicFilter},
};

use crate::MqttOptions;

fn qos_to_mqtt_qos(qos: spb_types::topic::QoS) -> QoS {
    match qos {
        spb_types::topic::QoS::AtMostOnce => QoS::AtMostOnce,
        spb_types::topic::QoS::AtLeastOnce => QoS::AtLeastOnce,
    }
}

fn topic_filter_to_mqtt_filter(topic_filter: TopicFilter) -> Filter {
    Filter::new(topic_filter.topic, qos_to_mqtt_qos(topic_filter.qos))
}

/// A [spb_client::Client] implementation using [rumqttc]
#[derive(Clone)]
pub struct Client {
    client: RuClient,
}

impl Client {
    async fn publish(
        &self,
        topic: String,
        qos: QoS,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), ClientError> {
        self.client
            .publish(topic, qos, retain, payload)
            .await
            .map_err(|e| ClientError::Request(e.to_string()))
    }

    fn try_publish(
        &self,
        topic: String,
        qos: QoS,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), ClientError> {
        self.client
            .try_publish(topic, qos, retain, payload)
            .map_err(|e| ClientError::Request(e.to_string()))
    }
}

#[async_trait]
impl spb_client::Client for Client {
    async fn disconnect(&self) -> Result<(), ClientError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))
    }

    async fn publish_node_message(
        &self,
        topic: NodeTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        let (qos, retain) = topic.get_publish_quality_retain();
        self.publish(
            topic.topic,
            qos_to_mqtt_qos(qos),
            retain,
            payload.encode_to_vec(),
        )
        .await
    }

    async fn publish_device_message(
        &self,
        topic: DeviceTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        let (qos, retain) = topic.get_publish_quality_retain();
        self.publish(
            topic.topic,
            qos_to_mqtt_qos(qos),
            retain,
            payload.encode_to_vec(),
        )
        .await
    }

    async fn try_publish_node_message(
        &self,
        topic: NodeTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        let (qos, retain) = topic.get_publish_quality_retain();
        self.try_publish(
            topic.topic,
            qos_to_mqtt_qos(qos),
            retain,
            payload.encode_to_vec(),
        )
    }

    async fn try_publish_device_message(
        &self,
        topic: DeviceTopic,
        payload: Payload,
    ) -> Result<(), ClientError> {
        let (qos, retain) = topic.get_publish_quality_retain();
        self.try_publish(
            topic.topic,
            qos_to_mqtt_qos(qos),
            retain,
            payload.encode_to_vec(),
        )
    }

    async fn subscribe_many(&self, topics: Vec<TopicFilter>) -> Result<(), ClientError> {
        let filters: Vec<Filter> = topics
            .into_iter()
            .map(topic_filter_to_mqtt_filter)
            .collect();
        self.client
            .subscribe_many(filters)
            .await
            .map_err(|e| ClientError::Request(e.to_string()))
    }
}

#[derive(Debug, PartialEq)]
enum ConnectionState {
    Disconnected,
    ManualDisconnected,
    Connected,
}

/// An [spb_client::EventLoop] implementation using [rumqttc]
pub struct EventLoop {
    state: ConnectionState,
    el: RuEventLoop,
}

impl EventLoop {
    /// Create a new `Eventloop`.
    ///
    /// `options` are the mqtt options to create the rumqtt client with. Some options will be overwritten to ensure Sparkplug compliance.
    ///
    /// `cap` specifies the capacity of the bounded async channel for the client handle.
    pub fn new(options: MqttOptions, cap: usize) -> (Self, Client) {
        Self::new_with_rumqtt_options(options.into(), cap)
    }

    /// Create a new `Eventloop` from a fully configured [rumqttc] options value.
    pub fn new_with_rumqtt_options(options: RuMqttOptions, cap: usize) -> (Self, Client) {
        let mut options = options;
        let mut connection_properties = match options.connect_properties() {
            Some(p) => p,
            None => ConnectProperties::new(),
        };
        /* Sparkplug requires session expiry interval to be 0 */
        connection_properties.session_expiry_interval = Some(0);

        options
            .set_clean_start(true)
            .set_connect_properties(connection_properties);

        let (client, eventloop) = RuClient::new(options, cap);
        (
            EventLoop {
                el: eventloop,
                state: ConnectionState::Disconnected,
            },
            Client { client },
        )
    }
}

#[async_trait]
impl spb_client::EventLoop for EventLoop {
    async fn connect(&mut self, will: LastWill) -> Result<(), ClientError> {
        let qos = qos_to_mqtt_qos(will.qos);
        let mqtt_will = rumqttc::v5::mqttbytes::v5::LastWill::new(
            will.topic,
            will.payload,
            qos,
            will.retain,
            None,
        );
        self.el.options.set_last_will(mqtt_will);
        self.state = ConnectionState::Disconnected;

        loop {
            match self.el.poll().await {
                Ok(rumqttc::v5::Event::Incoming(Packet::ConnAck(connack))) => {
                    debug!("Connected: {connack:?}");
                    self.state = ConnectionState::Connected;
                    return Ok(());
                }
                Ok(event) => trace!("{event:?}"),
                Err(e) => {
                    error!("Client error on connect attempt: {e}");
                    return Err(ClientError::Connect(e.to_string()));
                }
            }
        }
    }

    async fn poll(&mut self) -> Event {
        loop {
            match self.el.poll().await {
                Ok(event) => {
                    trace!("{event:?}");
                    match event {
                        rumqttc::v5::Event::Incoming(Packet::Publish(publish)) => {
                            return Event::Message {
                                topic: String::from_utf8_lossy(&publish.topic).into_owned(),
                                payload: publish.payload.to_vec(),
                            }
                        }
                        rumqttc::v5::Event::Incoming(Packet::Disconnect(_)) => {
                            self.state = ConnectionState::Disconnected;
                            return Event::Offline;
                        }
                        rumqttc::v5::Event::Outgoing(Outgoing::Disconnect) => {
                            self.state = ConnectionState::ManualDisconnected;
                            return Event::Offline;
                        }
                        _ => (),
                    }
                }
                Err(e) => {
                    if self.state == ConnectionState::Connected {
                        error!("Client error: {e}");
                    } else {
                        debug!("Client error after disconnect: {e}");
                    }
                    self.state = ConnectionState::Disconnected;
                    return Event::Offline;
                }
            }
        }
    }
}
