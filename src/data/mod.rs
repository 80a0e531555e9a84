//! Metric instruments.

mod counter;
mod gauge;
mod histogram;
mod timing;

pub use self::counter::Counter;
pub use self::gauge::Gauge;
pub use self::histogram::Histogram;
pub use self::timing::Timing;

use std::sync::{Arc, Weak};

use dashmap::DashMap;

/// Removes an instrument from its owning map on delete.
///
/// Holds the map weakly so instruments never keep their node alive.
pub(crate) struct Remover<T> {
    map: Weak<DashMap<String, T>>,
    key: String,
}

impl<T> Remover<T> {
    pub(crate) fn new(map: &Arc<DashMap<String, T>>, key: String) -> Remover<T> {
        Remover { map: Arc::downgrade(map), key }
    }

    pub(crate) fn remove(&self) {
        if let Some(map) = self.map.upgrade() {
            map.remove(&self.key);
        }
    }
}

/// Returns the derived series names emitted for an aggregated sample.
///
/// The `_count` name is unitless; the suffix applies to everything else.
pub(crate) fn sample_names(name: &str, suffix: &str, percentiles: &[f64]) -> Vec<String> {
    let mut names = Vec::with_capacity(6 + percentiles.len());
    names.push(format!("{name}_count"));
    names.push(format!("{name}_sum{suffix}"));
    names.push(format!("{name}_mean{suffix}"));
    names.push(format!("{name}_stddev{suffix}"));
    names.push(format!("{name}_min{suffix}"));
    names.push(format!("{name}_max{suffix}"));

    for p in percentiles {
        names.push(percentile_name(name, *p, suffix));
    }

    names
}

/// Returns the series name for a percentile, rendered in its shortest
/// decimal form (`10p`, `99.5p`).
pub(crate) fn percentile_name(name: &str, p: f64, suffix: &str) -> String {
    format!("{name}_{p}p{suffix}")
}
