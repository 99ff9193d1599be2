use std::time::Duration;

use serde::{Deserialize, Deserializer};

fn duration_from_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

/// Controls how [EdgeNode::start](crate::EdgeNode::start) retries failed connection attempts.
///
/// Deserializes from e.g. `{ "interval": 2.5, "max_attempts": 3 }` where `interval` is in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Wait between attempts
    #[serde(deserialize_with = "duration_from_secs")]
    pub interval: Duration,
    /// Give up after this many attempts, retry forever if `None`
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeConfig {
    pub(crate) rebirth_cooldown: Duration,
    pub(crate) reset_seq_on_birth: bool,
    pub(crate) advance_bdseq_on_rebirth: bool,
    pub(crate) retry: RetryPolicy,
    pub(crate) disconnect_grace: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rebirth_cooldown: Duration::ZERO,
            reset_seq_on_birth: false,
            advance_bdseq_on_rebirth: true,
            retry: RetryPolicy::default(),
            disconnect_grace: Duration::from_secs(1),
        }
    }
}
