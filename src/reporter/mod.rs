//! Reporter capability traits and bundled reporters.
//!
//! A back-end only has to implement [`Reporter`]: accepting counter and
//! gauge values.  Everything else is an optional capability advertised
//! through the `as_*` accessors: direct histogram/timing observation,
//! instrument removal, and shutdown participation.  The accessors default to
//! `None`, so a minimal reporter implements two methods and is done.
//!
//! Tags are handed to reporters in the order the caller produced them (base
//! tags first, then call-site tags).  Reporters that need sorted or
//! de-duplicated labels do that themselves.

mod log;

pub use self::log::LogReporter;

use std::time::Duration;

use crate::tags::Tag;
use crate::BoxError;

/// An observation sink for a reporter-handled histogram.
pub type HistogramSink = Box<dyn Fn(f64) + Send + Sync>;

/// An observation sink for a reporter-handled timing.
pub type TimingSink = Box<dyn Fn(Duration) + Send + Sync>;

/// A stats reporter.
///
/// Implementations receive aggregated values on every flush of the statter
/// tree.  All methods are called from the flush thread; implementations must
/// be safe to share across threads but are never called re-entrantly for the
/// same tree.
pub trait Reporter: Send + Sync + 'static {
    /// Reports a counter value accumulated since the previous flush.
    fn counter(&self, name: &str, v: i64, tags: &[Tag]);

    /// Reports the current gauge value.
    fn gauge(&self, name: &str, v: f64, tags: &[Tag]);

    /// Returns the histogram capability, if the reporter handles raw
    /// histogram observations itself.
    fn as_histogram(&self) -> Option<&dyn HistogramReporter> {
        None
    }

    /// Returns the timing capability, if the reporter handles raw timing
    /// observations itself.
    fn as_timing(&self) -> Option<&dyn TimingReporter> {
        None
    }

    /// Returns the removal capability, if the reporter handles counter and
    /// gauge removal.
    fn as_removable(&self) -> Option<&dyn RemovableReporter> {
        None
    }

    /// Returns the histogram removal capability.
    fn as_removable_histogram(&self) -> Option<&dyn RemovableHistogramReporter> {
        None
    }

    /// Returns the timing removal capability.
    fn as_removable_timing(&self) -> Option<&dyn RemovableTimingReporter> {
        None
    }

    /// Returns the close capability, if the reporter needs to flush or
    /// release resources on shutdown.
    fn as_closable(&self) -> Option<&dyn ClosableReporter> {
        None
    }
}

/// A reporter that observes histogram values directly.
///
/// When present, histograms skip in-process aggregation entirely: every
/// `observe` call is forwarded to the sink returned here, and nothing is
/// emitted for the instrument at flush time.
pub trait HistogramReporter {
    /// Returns an observation sink for the named histogram.
    fn histogram(&self, name: &str, tags: &[Tag]) -> HistogramSink;
}

/// A reporter that observes timing durations directly.
///
/// The reporter decides the unit; durations are passed through unchanged.
pub trait TimingReporter {
    /// Returns an observation sink for the named timing.
    fn timing(&self, name: &str, tags: &[Tag]) -> TimingSink;
}

/// A reporter that handles counter and gauge removal.
pub trait RemovableReporter {
    /// Removes the named counter.
    fn remove_counter(&self, name: &str, tags: &[Tag]);

    /// Removes the named gauge.
    fn remove_gauge(&self, name: &str, tags: &[Tag]);
}

/// A reporter that handles histogram removal.
pub trait RemovableHistogramReporter {
    /// Removes the named histogram.
    fn remove_histogram(&self, name: &str, tags: &[Tag]);
}

/// A reporter that handles timing removal.
pub trait RemovableTimingReporter {
    /// Removes the named timing.
    fn remove_timing(&self, name: &str, tags: &[Tag]);
}

/// A reporter that participates in shutdown.
pub trait ClosableReporter {
    /// Closes the reporter, flushing buffered stats if applicable.
    fn close(&self) -> Result<(), BoxError>;
}

/// Capability flags probed from a reporter once, at tree construction.
///
/// A reporter whose capability accessors change their answers later cannot
/// be distinguished from one that always answered this way.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Capabilities {
    pub histogram: bool,
    pub timing: bool,
}

impl Capabilities {
    pub(crate) fn probe(reporter: &dyn Reporter) -> Capabilities {
        Capabilities {
            histogram: reporter.as_histogram().is_some(),
            timing: reporter.as_timing().is_some(),
        }
    }
}

/// A reporter that discards all stats.
///
/// Satisfies every observation capability, so histograms and timings never
/// buffer; useful as a default and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardReporter;

impl Reporter for DiscardReporter {
    fn counter(&self, _name: &str, _v: i64, _tags: &[Tag]) {}

    fn gauge(&self, _name: &str, _v: f64, _tags: &[Tag]) {}

    fn as_histogram(&self) -> Option<&dyn HistogramReporter> {
        Some(self)
    }

    fn as_timing(&self) -> Option<&dyn TimingReporter> {
        Some(self)
    }
}

impl HistogramReporter for DiscardReporter {
    fn histogram(&self, _name: &str, _tags: &[Tag]) -> HistogramSink {
        Box::new(|_| {})
    }
}

impl TimingReporter for DiscardReporter {
    fn timing(&self, _name: &str, _tags: &[Tag]) -> TimingSink {
        Box::new(|_| {})
    }
}
