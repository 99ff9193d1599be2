use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use spb_types::Value;

use crate::lifecycle::DeviceLifecycle;

/// Supplies the current values of a set of named metrics.
pub trait MetricSource {
    /// All current metric values, used to build birth certificates.
    fn metric_values(&self) -> BTreeMap<String, Value>;

    /// The current value of a single metric.
    fn metric_value(&self, name: &str) -> Option<Value> {
        self.metric_values().remove(name)
    }
}

pub type DynMetricSource = dyn MetricSource + Send + Sync;

impl MetricSource for BTreeMap<String, Value> {
    fn metric_values(&self) -> BTreeMap<String, Value> {
        self.clone()
    }

    fn metric_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// A device attached to an edge node.
pub trait Device: MetricSource {
    fn device_id(&self) -> &str;
}

pub type DynDevice = dyn Device + Send + Sync;

/// A [Device] backed by a shared map of metric values.
///
/// Clones share the same values, so a clone can be attached to a node while the application keeps
/// updating values through another.
#[derive(Clone, Debug)]
pub struct SimpleDevice {
    id: String,
    values: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl SimpleDevice {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            values: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn with_value<S: Into<String>, V: Into<Value>>(self, name: S, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// Set a metric value, returning the previous value if there was one.
    pub fn set<S: Into<String>, V: Into<Value>>(&self, name: S, value: V) -> Option<Value> {
        self.values.lock().unwrap().insert(name.into(), value.into())
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.values.lock().unwrap().remove(name)
    }
}

impl MetricSource for SimpleDevice {
    fn metric_values(&self) -> BTreeMap<String, Value> {
        self.values.lock().unwrap().clone()
    }

    fn metric_value(&self, name: &str) -> Option<Value> {
        self.values.lock().unwrap().get(name).cloned()
    }
}

impl Device for SimpleDevice {
    fn device_id(&self) -> &str {
        &self.id
    }
}

pub(crate) struct DeviceSession {
    pub(crate) device: Arc<DynDevice>,
    pub(crate) lifecycle: DeviceLifecycle,
}

impl DeviceSession {
    pub(crate) fn new(device: Arc<DynDevice>) -> Self {
        Self {
            device,
            lifecycle: DeviceLifecycle::new(),
        }
    }
}
