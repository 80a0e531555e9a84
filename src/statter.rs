use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::builder::Builder;
use crate::config::Config;
use crate::data::{percentile_name, Counter, Gauge, Histogram, Remover, Timing};
use crate::key::Key;
use crate::registry::Registry;
use crate::reporter::{Capabilities, Reporter};
use crate::stats::{Pool, Sample};
use crate::tags::Tag;
use crate::CloseError;

/// A namespace within a metrics tree.
///
/// A statter holds a prefix and a base tag set, and interns one instrument
/// per `(name, tags)` under them.  [`Statter::with`] derives sub-statters
/// with extended prefixes and tags; all statters of a tree share a reporter
/// and a flush loop, owned by the root.
///
/// Handles are cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct Statter {
    node: Arc<Node>,
    registry: Arc<Registry>,
}

impl Statter {
    /// Creates a root statter flushing to the reporter on the given
    /// interval, with default configuration.
    pub fn new<R: Reporter>(reporter: R, interval: Duration) -> Statter {
        Builder::new(interval).build(reporter)
    }

    /// Creates a [`Builder`] flushing on the given interval.
    pub fn builder(interval: Duration) -> Builder {
        Builder::new(interval)
    }

    pub(crate) fn from_builder<R: Reporter>(builder: Builder, reporter: R) -> Statter {
        let reporter: Arc<dyn Reporter> = Arc::new(reporter);
        let caps = Capabilities::probe(reporter.as_ref());
        let cfg = Arc::new(builder.cfg);
        let pool = Pool::new(cfg.percentile_samples);

        let node = Arc::new(Node::new(cfg, reporter, caps, pool, builder.prefix, builder.tags));
        let registry = Arc::new(Registry::new(node.clone(), builder.interval));

        Statter { node, registry }
    }

    /// Returns a statter with the given prefix and tags appended.
    ///
    /// Sub-statters are interned by their merged prefix and tag set, so
    /// repeated calls with the same arguments return the same node, and
    /// `with("", &[])` returns the caller unchanged.
    pub fn with(&self, prefix: &str, tags: &[Tag]) -> Statter {
        Statter {
            node: self.registry.sub_statter(&self.node, prefix, tags),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Returns the stats reporter.
    ///
    /// Exposed for reporter-specific registration helpers; the reporter
    /// should not be driven directly.
    pub fn reporter(&self) -> Arc<dyn Reporter> {
        Arc::clone(&self.node.reporter)
    }

    /// Returns the full name with prefix for the given name.
    pub fn full_name(&self, name: &str) -> String {
        if self.node.prefix.is_empty() {
            return name.to_owned();
        }
        format!("{}{}{}", self.node.prefix, self.node.cfg.separator, name)
    }

    /// Determines if the counter exists.
    pub fn has_counter(&self, name: &str, tags: &[Tag]) -> bool {
        let key = Key::new(name, tags);
        self.node.counters.contains_key(key.as_str())
    }

    /// Returns a counter for the given name and tags.
    pub fn counter(&self, name: &str, tags: &[Tag]) -> Counter {
        let node = &self.node;

        let key = Key::new(name, tags);
        if let Some(counter) = node.counters.get(key.as_str()) {
            return counter.clone();
        }

        let (name, tags) = node.merge_descriptors(name, tags);
        let counter = Counter::new(
            name,
            tags,
            Arc::clone(&node.reporter),
            Remover::new(&node.counters, key.as_str().to_owned()),
        );
        node.counters.entry(key.into_owned()).or_insert(counter).clone()
    }

    /// Determines if the gauge exists.
    pub fn has_gauge(&self, name: &str, tags: &[Tag]) -> bool {
        let key = Key::new(name, tags);
        self.node.gauges.contains_key(key.as_str())
    }

    /// Returns a gauge for the given name and tags.
    pub fn gauge(&self, name: &str, tags: &[Tag]) -> Gauge {
        let node = &self.node;

        let key = Key::new(name, tags);
        if let Some(gauge) = node.gauges.get(key.as_str()) {
            return gauge.clone();
        }

        let (name, tags) = node.merge_descriptors(name, tags);
        let gauge = Gauge::new(
            name,
            tags,
            Arc::clone(&node.reporter),
            Remover::new(&node.gauges, key.as_str().to_owned()),
        );
        node.gauges.entry(key.into_owned()).or_insert(gauge).clone()
    }

    /// Determines if the histogram exists.
    pub fn has_histogram(&self, name: &str, tags: &[Tag]) -> bool {
        let key = Key::new(name, tags);
        self.node.histograms.contains_key(key.as_str())
    }

    /// Returns a histogram for the given name and tags.
    pub fn histogram(&self, name: &str, tags: &[Tag]) -> Histogram {
        let node = &self.node;

        let key = Key::new(name, tags);
        if let Some(histogram) = node.histograms.get(key.as_str()) {
            return histogram.clone();
        }

        let (name, tags) = node.merge_descriptors(name, tags);
        let remover = Remover::new(&node.histograms, key.as_str().to_owned());

        let sink = if node.caps.histogram {
            node.reporter.as_histogram().map(|hr| hr.histogram(&name, &tags))
        } else {
            None
        };
        let histogram = match sink {
            Some(sink) => Histogram::delegated(
                name,
                tags,
                sink,
                Arc::clone(&node.cfg),
                Arc::clone(&node.reporter),
                remover,
            ),
            None => Histogram::aggregated(
                name,
                tags,
                node.pool.clone(),
                Arc::clone(&node.cfg),
                Arc::clone(&node.reporter),
                remover,
            ),
        };
        node.histograms.entry(key.into_owned()).or_insert(histogram).clone()
    }

    /// Determines if the timing exists.
    pub fn has_timing(&self, name: &str, tags: &[Tag]) -> bool {
        let key = Key::new(name, tags);
        self.node.timings.contains_key(key.as_str())
    }

    /// Returns a timing for the given name and tags.
    pub fn timing(&self, name: &str, tags: &[Tag]) -> Timing {
        let node = &self.node;

        let key = Key::new(name, tags);
        if let Some(timing) = node.timings.get(key.as_str()) {
            return timing.clone();
        }

        let (name, tags) = node.merge_descriptors(name, tags);
        let remover = Remover::new(&node.timings, key.as_str().to_owned());

        let sink = if node.caps.timing {
            node.reporter.as_timing().map(|tr| tr.timing(&name, &tags))
        } else {
            None
        };
        let timing = match sink {
            Some(sink) => Timing::delegated(
                name,
                tags,
                sink,
                Arc::clone(&node.cfg),
                Arc::clone(&node.reporter),
                remover,
            ),
            None => Timing::aggregated(
                name,
                tags,
                node.pool.clone(),
                Arc::clone(&node.cfg),
                Arc::clone(&node.reporter),
                remover,
            ),
        };
        node.timings.entry(key.into_owned()).or_insert(timing).clone()
    }

    /// Closes the statter and its reporter.
    ///
    /// Only the root of a tree can be closed.  The flush loop is stopped,
    /// one final report runs so the last interval's data is not lost, and
    /// the reporter's close hook is invoked if it has one.
    pub fn close(&self) -> Result<(), CloseError> {
        self.registry.close(&self.node)?;

        if let Some(closable) = self.node.reporter.as_closable() {
            closable.close().map_err(CloseError::Reporter)?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn same_node(&self, other: &Statter) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

/// A node of the metrics tree: a prefix, a base tag set, and one concurrent
/// map per instrument kind.
pub(crate) struct Node {
    pub(crate) cfg: Arc<Config>,
    pub(crate) reporter: Arc<dyn Reporter>,
    pub(crate) caps: Capabilities,
    pub(crate) pool: Pool,

    pub(crate) prefix: String,
    pub(crate) tags: Vec<Tag>,

    counters: Arc<DashMap<String, Counter>>,
    gauges: Arc<DashMap<String, Gauge>>,
    histograms: Arc<DashMap<String, Histogram>>,
    timings: Arc<DashMap<String, Timing>>,
}

impl Node {
    pub(crate) fn new(
        cfg: Arc<Config>,
        reporter: Arc<dyn Reporter>,
        caps: Capabilities,
        pool: Pool,
        prefix: String,
        tags: Vec<Tag>,
    ) -> Node {
        Node {
            cfg,
            reporter,
            caps,
            pool,
            prefix,
            tags,
            counters: Arc::new(DashMap::new()),
            gauges: Arc::new(DashMap::new()),
            histograms: Arc::new(DashMap::new()),
            timings: Arc::new(DashMap::new()),
        }
    }

    /// Creates a node sharing this node's configuration, reporter, and
    /// sample pool, under the given merged prefix and tags.
    pub(crate) fn child(&self, prefix: String, tags: Vec<Tag>) -> Node {
        Node::new(
            Arc::clone(&self.cfg),
            Arc::clone(&self.reporter),
            self.caps,
            self.pool.clone(),
            prefix,
            tags,
        )
    }

    /// Returns the prefixed name and merged tag set for an instrument.
    ///
    /// Base tags come first, in the order the caller produced them.
    fn merge_descriptors(&self, name: &str, tags: &[Tag]) -> (String, Vec<Tag>) {
        let name = if self.prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{}{}{}", self.prefix, self.cfg.separator, name)
        };

        let mut merged = Vec::with_capacity(self.tags.len() + tags.len());
        merged.extend_from_slice(&self.tags);
        merged.extend_from_slice(tags);

        (name, merged)
    }

    /// Flushes every instrument on this node to the reporter.
    ///
    /// Counters drain and are elided when zero; gauges always emit;
    /// aggregated histograms and timings rotate their sample buffer and emit
    /// derived series when the window saw observations.
    pub(crate) fn report(&self) {
        for entry in self.counters.iter() {
            let counter = entry.value();
            let val = counter.take();
            if val == 0 {
                continue;
            }
            self.reporter.counter(counter.name(), val, counter.tags());
        }

        for entry in self.gauges.iter() {
            let gauge = entry.value();
            self.reporter.gauge(gauge.name(), gauge.value(), gauge.tags());
        }

        if !self.caps.histogram {
            for entry in self.histograms.iter() {
                let histogram = entry.value();
                if let Some(mut sample) = histogram.rotate() {
                    self.report_sample(histogram.name(), "", histogram.tags(), &mut sample);
                }
            }
        }

        if !self.caps.timing {
            for entry in self.timings.iter() {
                let timing = entry.value();
                if let Some(mut sample) = timing.rotate() {
                    self.report_sample(timing.name(), "_ms", timing.tags(), &mut sample);
                }
            }
        }
    }

    fn report_sample(&self, name: &str, suffix: &str, tags: &[Tag], sample: &mut Sample) {
        if sample.count() == 0 {
            return;
        }

        self.reporter.counter(&format!("{name}_count"), sample.count(), tags);
        self.reporter.gauge(&format!("{name}_sum{suffix}"), sample.sum(), tags);
        self.reporter.gauge(&format!("{name}_mean{suffix}"), sample.mean(), tags);
        self.reporter.gauge(&format!("{name}_stddev{suffix}"), sample.std_dev(), tags);
        self.reporter.gauge(&format!("{name}_min{suffix}"), sample.min(), tags);
        self.reporter.gauge(&format!("{name}_max{suffix}"), sample.max(), tags);

        let ps = &self.cfg.percentiles;
        let vs = sample.percentiles(ps);
        for (p, v) in ps.iter().zip(vs) {
            self.reporter.gauge(&percentile_name(name, *p, suffix), v, tags);
        }
    }
}
