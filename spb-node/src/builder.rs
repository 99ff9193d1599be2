use std::{sync::Arc, time::Duration};

use spb_client::{Client, DynClient, DynEventLoop, EventLoop};

use crate::{
    command::DynCommandHandler, config::NodeConfig, device::DynMetricSource, CommandHandler,
    EdgeNode, MetricSource, NoCommandHandler, NodeHandle, RetryPolicy,
};

/// A builder for creating and configuring [EdgeNode] instances.
pub struct EdgeNodeBuilder {
    pub(crate) group_id: Option<String>,
    pub(crate) node_id: Option<String>,
    pub(crate) eventloop_client: (Box<DynEventLoop>, Arc<DynClient>),
    pub(crate) node_metrics: Option<Arc<DynMetricSource>>,
    pub(crate) command_handler: Arc<DynCommandHandler>,
    pub(crate) config: NodeConfig,
}

impl EdgeNodeBuilder {
    /// Creates a new builder with the specified event loop and client.
    ///
    /// Initializes a builder with default values and a no-op command handler.
    pub fn new<E: EventLoop + Send + 'static, C: Client + Send + Sync + 'static>(
        eventloop: E,
        client: C,
    ) -> Self {
        Self {
            group_id: None,
            node_id: None,
            eventloop_client: (Box::new(eventloop), Arc::new(client)),
            node_metrics: None,
            command_handler: Arc::new(NoCommandHandler),
            config: NodeConfig::default(),
        }
    }

    /// Sets the group ID for the node.
    pub fn with_group_id<S: Into<String>>(mut self, group_id: S) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Sets the node ID for the node.
    ///
    /// The node ID uniquely identifies this node within its group.
    pub fn with_node_id<S: Into<String>>(mut self, node_id: S) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Sets a source of additional metrics included in every NBIRTH.
    pub fn with_node_metrics<M: MetricSource + Send + Sync + 'static>(mut self, metrics: M) -> Self {
        self.node_metrics = Some(Arc::new(metrics));
        self
    }

    /// Replaces the default no-op command handler.
    pub fn with_command_handler<H: CommandHandler + 'static>(mut self, handler: H) -> Self {
        self.command_handler = Arc::new(handler);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Sets the minimum time between two rebirths requested through the rebirth command.
    pub fn with_rebirth_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.rebirth_cooldown = cooldown;
        self
    }

    /// Restart `seq` at 0 for every NBIRTH. Disabled by default.
    pub fn reset_seq_on_birth(mut self, reset: bool) -> Self {
        self.config.reset_seq_on_birth = reset;
        self
    }

    /// Give every rebirth a new `bdSeq`. Enabled by default.
    ///
    /// The last will registered with the broker is only replaced on the next connect, so after a
    /// rebirth it still carries the previous `bdSeq`. A host application that matches the NDEATH
    /// `bdSeq` against the most recent NBIRTH will not recognise a will delivered before the node
    /// reconnects. Disable this to keep the will and the NBIRTH in agreement for the whole
    /// connection.
    pub fn advance_bdseq_on_rebirth(mut self, advance: bool) -> Self {
        self.config.advance_bdseq_on_rebirth = advance;
        self
    }

    /// How long [EdgeNode::run] keeps polling the transport after a stop so pending messages are flushed.
    pub fn with_disconnect_grace(mut self, grace: Duration) -> Self {
        self.config.disconnect_grace = grace;
        self
    }

    /// Builds the node with the configured settings.
    ///
    /// Returns an error if the group or node id is missing or invalid.
    pub fn build(self) -> Result<(EdgeNode, NodeHandle), String> {
        EdgeNode::new_from_builder(self)
    }
}
