use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::Remover;
use crate::reporter::Reporter;
use crate::tags::Tag;

/// A counter.
///
/// Counters accumulate increments and drain on report: each flush emits the
/// total since the previous one.  Handles are cheap to clone and all clones
/// update the same underlying value.
#[derive(Clone)]
pub struct Counter {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    tags: Vec<Tag>,
    reporter: Arc<dyn Reporter>,
    remover: Remover<Counter>,

    val: AtomicI64,
}

impl Counter {
    pub(crate) fn new(
        name: String,
        tags: Vec<Tag>,
        reporter: Arc<dyn Reporter>,
        remover: Remover<Counter>,
    ) -> Counter {
        Counter { inner: Arc::new(Inner { name, tags, reporter, remover, val: AtomicI64::new(0) }) }
    }

    /// Increments the counter.
    pub fn inc(&self, v: i64) {
        self.inner.val.fetch_add(v, Ordering::Release);
    }

    /// Removes the counter from its statter.
    ///
    /// Notifies the reporter if it handles removal.
    pub fn delete(&self) {
        if let Some(rr) = self.inner.reporter.as_removable() {
            rr.remove_counter(&self.inner.name, &self.inner.tags);
        }
        self.inner.remover.remove();
    }

    /// Reads and zeroes the accumulated value.
    pub(crate) fn take(&self) -> i64 {
        self.inner.val.swap(0, Ordering::AcqRel)
    }

    pub(crate) fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn tags(&self) -> &[Tag] {
        &self.inner.tags
    }

    #[cfg(test)]
    pub(crate) fn same_instance(&self, other: &Counter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
