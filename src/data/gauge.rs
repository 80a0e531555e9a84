use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::Remover;
use crate::reporter::Reporter;
use crate::tags::Tag;

/// A gauge.
///
/// Gauges are level-valued: reads do not reset them, and every flush emits
/// the current value.  The value is a 64-bit float stored as its bit
/// pattern, so all updates are atomic; `add`/`sub` run a compare-and-swap
/// loop over the bits.
#[derive(Clone)]
pub struct Gauge {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    tags: Vec<Tag>,
    reporter: Arc<dyn Reporter>,
    remover: Remover<Gauge>,

    val: AtomicU64,
}

impl Gauge {
    pub(crate) fn new(
        name: String,
        tags: Vec<Tag>,
        reporter: Arc<dyn Reporter>,
        remover: Remover<Gauge>,
    ) -> Gauge {
        Gauge { inner: Arc::new(Inner { name, tags, reporter, remover, val: AtomicU64::new(0) }) }
    }

    /// Sets the gauge value.
    pub fn set(&self, v: f64) {
        self.inner.val.store(v.to_bits(), Ordering::Release);
    }

    /// Increments the gauge by 1.
    pub fn inc(&self) {
        self.add(1.0);
    }

    /// Decrements the gauge by 1.
    pub fn dec(&self) {
        self.add(-1.0);
    }

    /// Increases the gauge's value by the argument.
    pub fn add(&self, v: f64) {
        let _ = self.inner.val.fetch_update(Ordering::AcqRel, Ordering::Relaxed, |curr| {
            Some((f64::from_bits(curr) + v).to_bits())
        });
    }

    /// Subtracts the argument from the gauge's value.
    pub fn sub(&self, v: f64) {
        self.add(-v);
    }

    /// Removes the gauge from its statter.
    ///
    /// Notifies the reporter if it handles removal.
    pub fn delete(&self) {
        if let Some(rr) = self.inner.reporter.as_removable() {
            rr.remove_gauge(&self.inner.name, &self.inner.tags);
        }
        self.inner.remover.remove();
    }

    pub(crate) fn value(&self) -> f64 {
        f64::from_bits(self.inner.val.load(Ordering::Acquire))
    }

    pub(crate) fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn tags(&self) -> &[Tag] {
        &self.inner.tags
    }

    #[cfg(test)]
    pub(crate) fn same_instance(&self, other: &Gauge) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
