use std::time::Duration;

use crate::config::Config;
use crate::reporter::Reporter;
use crate::statter::Statter;
use crate::tags::Tag;

/// Builder for a root [`Statter`].
///
/// The flush interval is required; everything else has a default.
#[derive(Debug, Clone)]
pub struct Builder {
    pub(crate) interval: Duration,
    pub(crate) prefix: String,
    pub(crate) tags: Vec<Tag>,
    pub(crate) cfg: Config,
}

impl Builder {
    /// Creates a new [`Builder`] flushing on the given interval.
    pub fn new(interval: Duration) -> Builder {
        Builder { interval, prefix: String::new(), tags: Vec::new(), cfg: Config::default() }
    }

    /// Sets the initial prefix on the root statter.
    ///
    /// Defaults to empty.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the initial tags on the root statter.
    pub fn tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Sets the separator joining prefixes and metric names.
    ///
    /// Defaults to `"."`.
    pub fn separator(mut self, sep: impl Into<String>) -> Self {
        self.cfg.separator = sep.into();
        self
    }

    /// Sets the number of samples retained to estimate percentiles.
    ///
    /// Defaults to 1000.
    pub fn percentile_samples(mut self, n: usize) -> Self {
        self.cfg.percentile_samples = n;
        self
    }

    /// Sets the percentiles reported for aggregated histograms and timings.
    ///
    /// Defaults to `[10, 90]`.
    pub fn percentiles(mut self, ps: impl Into<Vec<f64>>) -> Self {
        self.cfg.percentiles = ps.into();
        self
    }

    /// Builds the root [`Statter`] flushing to the given reporter.
    pub fn build<R: Reporter>(self, reporter: R) -> Statter {
        Statter::from_builder(self, reporter)
    }
}
