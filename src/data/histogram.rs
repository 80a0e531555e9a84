use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{sample_names, Remover};
use crate::config::Config;
use crate::reporter::{HistogramSink, Reporter};
use crate::stats::{Pool, PooledSample};
use crate::tags::Tag;

/// A histogram of dimensionless values.
///
/// A histogram runs in one of two modes, fixed when it is created.  If the
/// reporter handles histograms itself, every observation is forwarded to the
/// reporter's sink and nothing is emitted at flush time.  Otherwise
/// observations are aggregated into a pooled sample buffer under a short
/// lock, and each flush rotates the buffer and emits the derived series.
#[derive(Clone)]
pub struct Histogram {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    tags: Vec<Tag>,
    cfg: Arc<Config>,
    reporter: Arc<dyn Reporter>,
    remover: Remover<Histogram>,

    mode: Mode,
}

enum Mode {
    Delegated(HistogramSink),
    Aggregated { pool: Pool, sample: Mutex<PooledSample> },
}

impl Histogram {
    pub(crate) fn delegated(
        name: String,
        tags: Vec<Tag>,
        sink: HistogramSink,
        cfg: Arc<Config>,
        reporter: Arc<dyn Reporter>,
        remover: Remover<Histogram>,
    ) -> Histogram {
        Histogram {
            inner: Arc::new(Inner { name, tags, cfg, reporter, remover, mode: Mode::Delegated(sink) }),
        }
    }

    pub(crate) fn aggregated(
        name: String,
        tags: Vec<Tag>,
        pool: Pool,
        cfg: Arc<Config>,
        reporter: Arc<dyn Reporter>,
        remover: Remover<Histogram>,
    ) -> Histogram {
        let sample = Mutex::new(pool.get());
        Histogram {
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

    /// Observes a histogram value.
    pub fn observe(&self, v: f64) {
        match &self.inner.mode {
            Mode::Delegated(sink) => sink(v),
            Mode::Aggregated { sample, .. } => sample.lock().add(v),
        }
    }

    /// Removes the histogram from its statter.
    ///
    /// A reporter with histogram removal is notified directly.  A reporter
    /// with only counter/gauge removal is compensated by removing every
    /// derived series name the histogram would have emitted.
    pub fn delete(&self) {
        let inner = &*self.inner;
        if let Some(rr) = inner.reporter.as_removable_histogram() {
            rr.remove_histogram(&inner.name, &inner.tags);
        } else if let Some(rr) = inner.reporter.as_removable() {
            for name in sample_names(&inner.name, "", &inner.cfg.percentiles) {
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
    pub(crate) fn same_instance(&self, other: &Histogram) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
