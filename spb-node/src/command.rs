use async_trait::async_trait;
use spb_types::Value;

use crate::NodeHandle;

/// A command metric received on an NCMD or DCMD topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub value: Value,
}

/// Application hooks for inbound commands.
///
/// Rebirth requests are handled by the node itself. Handlers are not called while the session
/// is locked, so they may publish through the provided [NodeHandle].
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Called when a `Node Control/Reboot` command is received.
    async fn on_reboot(&self, _node: &NodeHandle) {}

    /// Called for every node command metric the node does not handle itself.
    async fn on_node_command(&self, _node: &NodeHandle, _command: Command) {}

    /// Called for every command metric addressed to an attached device.
    async fn on_device_command(&self, _node: &NodeHandle, _device_id: &str, _command: Command) {}
}

pub type DynCommandHandler = dyn CommandHandler;

/// A [CommandHandler] that ignores every command.
pub struct NoCommandHandler;

#[async_trait]
impl CommandHandler for NoCommandHandler {}
