use std::mem;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{sample_names, Remover};
use crate::config::Config;
use crate::reporter::{Reporter, TimingSink};
use crate::stats::{Pool, PooledSample};
use crate::tags::Tag;

/// A timing.
///
/// Structurally a histogram of durations.  A timing-capable reporter
/// receives each duration unchanged and decides the unit itself; without
/// one, observations are aggregated in milliseconds and the flushed series
/// carry a `_ms` suffix (except the unitless `_count`).
#[derive(Clone)]
pub struct Timing {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    tags: Vec<Tag>,
    cfg: Arc<Config>,
    reporter: Arc<dyn Reporter>,
    remover: Remover<Timing>,

    mode: Mode,
}

enum Mode {
    Delegated(TimingSink),
    Aggregated { pool: Pool, sample: Mutex<PooledSample> },
}

impl Timing {
    pub(crate) fn delegated(
        name: String,
        tags: Vec<Tag>,
        sink: TimingSink,
        cfg: Arc<Config>,
        reporter: Arc<dyn Reporter>,
        remover: Remover<Timing>,
    ) -> Timing {
        Timing {
            inner: Arc::new(Inner { name, tags, cfg, reporter, remover, mode: Mode::Delegated(sink) }),
        }
    }

    pub(crate) fn aggregated(
        name: String,
        tags: Vec<Tag>,
        pool: Pool,
        cfg: Arc<Config>,
        reporter: Arc<dyn Reporter>,
        remover: Remover<Timing>,
    ) -> Timing {
        let sample = Mutex::new(pool.get());
        Timing {
            inner: Arc::new(Inner {
                name,
                tags,
                cfg,
                reporter,
                remover,
                mode: Mode::Aggregated { pool, sample },
            }),
        }
    }

    /// Observes a duration.
    pub fn observe(&self, d: Duration) {
        match &self.inner.mode {
            Mode::Delegated(sink) => sink(d),
            Mode::Aggregated { sample, .. } => sample.lock().add(d.as_secs_f64() * 1000.0),
        }
    }

    /// Removes the timing from its statter.
    ///
    /// A reporter with timing removal is notified directly.  A reporter with
    /// only counter/gauge removal is compensated by removing every derived
    /// series name the timing would have emitted.
    pub fn delete(&self) {
        let inner = &*self.inner;
        if let Some(rr) = inner.reporter.as_removable_timing() {
            rr.remove_timing(&inner.name, &inner.tags);
        } else if let Some(rr) = inner.reporter.as_removable() {
            for name in sample_names(&inner.name, "_ms", &inner.cfg.percentiles) {
                rr.remove_gauge(&name, &inner.tags);
            }
        }
        inner.remover.remove();
    }

    /// Swaps the live sample buffer for a fresh pooled one, returning the
    /// buffer holding the window's observations.
    ///
    /// Returns `None` in delegated mode.
    pub(crate) fn rotate(&self) -> Option<PooledSample> {
        match &self.inner.mode {
            Mode::Delegated(_) => None,
            Mode::Aggregated { pool, sample } => {
                let mut guard = sample.lock();
                Some(mem::replace(&mut *guard, pool.get()))
            }
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn tags(&self) -> &[Tag] {
        &self.inner.tags
    }

    #[cfg(test)]
    pub(crate) fn same_instance(&self, other: &Timing) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
