use std::collections::BTreeMap;

use log::{debug, warn};
use spb_types::{
    constants::{BDSEQ, NODE_CONTROL_REBIRTH, NODE_CONTROL_REBOOT},
    encode_with_timestamp,
    payload::{Metric, Payload},
    utils::timestamp,
    Value,
};

/// The encoded metrics and timestamp of a message that is yet to be assigned a `seq`.
#[derive(Debug)]
pub(crate) struct MessageMetrics {
    timestamp: u64,
    metrics: Vec<Metric>,
}

impl MessageMetrics {
    /// Encode values into metrics ordered by name. Values without a wire representation are dropped.
    pub(crate) fn encode(values: BTreeMap<String, Value>) -> Self {
        let timestamp = timestamp();
        let metrics = values
            .into_iter()
            .filter_map(
                |(name, value)| match encode_with_timestamp(name, value, timestamp) {
                    Ok(metric) => Some(metric),
                    Err(e) => {
                        debug!("Dropping metric: {e}");
                        None
                    }
                },
            )
            .collect();
        Self { timestamp, metrics }
    }

    pub(crate) fn empty() -> Self {
        Self {
            timestamp: timestamp(),
            metrics: Vec::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub(crate) fn into_payload(self, seq: Option<u8>) -> Payload {
        Payload {
            timestamp: Some(self.timestamp),
            metrics: self.metrics,
            seq: seq.map(u64::from),
            uuid: None,
            body: None,
        }
    }
}

fn is_reserved(name: &str) -> bool {
    matches!(name, BDSEQ | NODE_CONTROL_REBIRTH | NODE_CONTROL_REBOOT)
}

/// NBIRTH metrics: `bdSeq`, the node control metrics and any additional node metrics.
pub(crate) fn node_birth(bdseq: u8, node_values: BTreeMap<String, Value>) -> MessageMetrics {
    let mut values: BTreeMap<String, Value> = node_values
        .into_iter()
        .filter(|(name, _)| {
            let reserved = is_reserved(name);
            if reserved {
                warn!("Node metric '{name}' uses a reserved birth metric name - skipping");
            }
            !reserved
        })
        .collect();
    values.insert(BDSEQ.to_string(), Value::Int64(bdseq as i64));
    values.insert(NODE_CONTROL_REBIRTH.to_string(), Value::Boolean(false));
    values.insert(NODE_CONTROL_REBOOT.to_string(), Value::Boolean(false));
    MessageMetrics::encode(values)
}

/// NDEATH metrics, used both for the last will and a voluntary death certificate.
pub(crate) fn node_death(bdseq: u8) -> MessageMetrics {
    let mut values = BTreeMap::new();
    values.insert(BDSEQ.to_string(), Value::Int64(bdseq as i64));
    MessageMetrics::encode(values)
}

pub(crate) fn device_death() -> MessageMetrics {
    MessageMetrics::empty()
}
