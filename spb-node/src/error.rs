use spb_client::ClientError;
use thiserror::Error;

/// A message was requested that the current session state does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("The node is offline")]
    Offline,
    #[error("The node has not published its birth certificate")]
    UnBirthed,
    #[error("The node is already online")]
    AlreadyOnline,
    #[error("The node is not connecting")]
    NotConnecting,
    #[error("Device {0} is offline")]
    DeviceOffline(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    #[error("No metrics provided")]
    NoMetrics,
    #[error("State error: {0}")]
    State(#[from] StateError),
    #[error("Unknown device: {0}")]
    UnknownDevice(String),
    #[error("Transport error: {0}")]
    Transport(#[from] ClientError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Invalid device name: {0}")]
    InvalidName(String),
    #[error("Unknown device: {0}")]
    UnknownDevice(String),
    #[error("State error: {0}")]
    State(#[from] StateError),
    #[error("Transport error: {0}")]
    Transport(#[from] ClientError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StartError {
    #[error("The node was stopped")]
    Cancelled,
    #[error("Failed to connect after {attempts} attempts: {source}")]
    RetriesExhausted { attempts: u32, source: ClientError },
    #[error("State error: {0}")]
    State(#[from] StateError),
    #[error("Transport error: {0}")]
    Transport(#[from] ClientError),
}
