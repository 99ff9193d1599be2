use spb_types::topic::{DeviceMessage, NodeMessage};

use crate::StateError;

/// Connection state of a node or device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Offline,
    Connecting,
    Online,
}

/// Node half of the session state machine.
///
/// `birthed` tracks whether an NBIRTH has been published on the current connection.
#[derive(Debug)]
pub(crate) struct NodeLifecycle {
    state: LifecycleState,
    birthed: bool,
}

impl NodeLifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: LifecycleState::Offline,
            birthed: false,
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        self.state
    }

    pub(crate) fn is_birthed(&self) -> bool {
        self.state == LifecycleState::Online && self.birthed
    }

    pub(crate) fn begin_connect(&mut self) -> Result<(), StateError> {
        if self.state == LifecycleState::Online {
            return Err(StateError::AlreadyOnline);
        }
        self.state = LifecycleState::Connecting;
        self.birthed = false;
        Ok(())
    }

    pub(crate) fn connected(&mut self) -> Result<(), StateError> {
        if self.state != LifecycleState::Connecting {
            return Err(StateError::NotConnecting);
        }
        self.state = LifecycleState::Online;
        Ok(())
    }

    pub(crate) fn mark_birthed(&mut self) {
        self.birthed = true;
    }

    /// Move to `Offline`, returns true if the node was previously `Online`.
    pub(crate) fn disconnected(&mut self) -> bool {
        let was_online = self.state == LifecycleState::Online;
        self.state = LifecycleState::Offline;
        self.birthed = false;
        was_online
    }

    /// Check a node scoped message may be published.
    pub(crate) fn permits(&self, message: NodeMessage) -> Result<(), StateError> {
        if self.state != LifecycleState::Online {
            return Err(StateError::Offline);
        }
        match message {
            NodeMessage::NBirth => Ok(()),
            NodeMessage::NData | NodeMessage::NDeath | NodeMessage::NCmd => {
                if self.birthed {
                    Ok(())
                } else {
                    Err(StateError::UnBirthed)
                }
            }
        }
    }
}

/// Device half of the session state machine, always evaluated against the owning node.
#[derive(Debug)]
pub(crate) struct DeviceLifecycle {
    online: bool,
}

impl DeviceLifecycle {
    pub(crate) fn new() -> Self {
        Self { online: false }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        if self.online {
            LifecycleState::Online
        } else {
            LifecycleState::Offline
        }
    }

    pub(crate) fn is_online(&self) -> bool {
        self.online
    }

    pub(crate) fn set_online(&mut self) {
        self.online = true;
    }

    pub(crate) fn set_offline(&mut self) {
        self.online = false;
    }

    pub(crate) fn permits(
        &self,
        device_id: &str,
        message: DeviceMessage,
        node: &NodeLifecycle,
    ) -> Result<(), StateError> {
        node.permits(NodeMessage::NData)?;
        match message {
            DeviceMessage::DBirth => Ok(()),
            DeviceMessage::DData | DeviceMessage::DDeath | DeviceMessage::DCmd => {
                if self.online {
                    Ok(())
                } else {
                    Err(StateError::DeviceOffline(device_id.to_string()))
                }
            }
        }
    }
}
