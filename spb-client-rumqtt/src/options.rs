use std::time::Duration;

use rumqttc::v5::mqttbytes::v5::ConnectProperties;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectionProperties {
    pub receive_maximum: Option<u16>,
    pub max_packet_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Broker connection options
///
/// Can be deserialized, e.g. from a JSON config file:
///
/// ```json
/// { "broker_addr": "localhost", "port": 1883, "client_id": "node-1" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MqttOptions {
    pub broker_addr: String,
    pub port: u16,
    pub client_id: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Keep alive interval in seconds
    #[serde(default)]
    pub keep_alive: Option<u64>,
    #[serde(default)]
    pub connect_properties: Option<ConnectionProperties>,
}

impl MqttOptions {
    pub fn new<S: Into<String>, S1: Into<String>>(client_id: S, addr: S1, port: u16) -> Self {
        Self {
            broker_addr: addr.into(),
            port,
            client_id: client_id.into(),
            credentials: None,
            keep_alive: None,
            connect_properties: None,
        }
    }

    pub fn with_credentials<S: Into<String>, S1: Into<String>>(
        mut self,
        username: S,
        password: S1,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = Some(keep_alive.as_secs());
        self
    }
}

impl From<MqttOptions> for rumqttc::v5::MqttOptions {
    fn from(value: MqttOptions) -> Self {
        let mut options = rumqttc::v5::MqttOptions::new(value.client_id, value.broker_addr, value.port);
        if let Some(credentials) = value.credentials {
            options.set_credentials(credentials.username, credentials.password);
        }
        if let Some(keep_alive) = value.keep_alive {
            options.set_keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(props) = value.connect_properties {
            let mut connect_properties = ConnectProperties::new();
            connect_properties.receive_maximum = props.receive_maximum;
            connect_properties.max_packet_size = props.max_packet_size;
            options.set_connect_properties(connect_properties);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal() {
        let options: MqttOptions = serde_json::from_str(
            r#"{ "broker_addr": "localhost", "port": 1883, "client_id": "node-1" }"#,
        )
        .unwrap();
        assert_eq!(options, MqttOptions::new("node-1", "localhost", 1883));
    }

    #[test]
    fn deserialize_full() {
        let options: MqttOptions = serde_json::from_str(
            r#"{
                "broker_addr": "broker",
                "port": 8883,
                "client_id": "node-1",
                "credentials": { "username": "u", "password": "p" },
                "keep_alive": 30,
                "connect_properties": { "receive_maximum": 10, "max_packet_size": null }
            }"#,
        )
        .unwrap();
        assert_eq!(
            options.credentials,
            Some(Credentials {
                username: "u".into(),
                password: "p".into()
            })
        );
        assert_eq!(options.keep_alive, Some(30));

        let rumqtt: rumqttc::v5::MqttOptions = options.into();
        assert_eq!(rumqtt.client_id(), "node-1");
        assert_eq!(rumqtt.broker_address(), ("broker".to_string(), 8883));
        assert_eq!(rumqtt.keep_alive(), Duration::from_secs(30));
    }
}
