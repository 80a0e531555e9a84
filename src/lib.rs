//! Fast, tagged, in-process metrics aggregation.
//!
//! `statter` collects counters, gauges, histograms, and timings under
//! hierarchical names and key/value tags, aggregates them in-process, and
//! periodically flushes them to a pluggable [`Reporter`].  The write path is
//! tuned for many concurrent producers: counter and gauge updates are plain
//! atomic operations, histogram and timing observations take a short
//! per-instrument lock, and instrument lookups are reads against a sharded
//! concurrent map.
//!
//! # Usage
//!
//! Create a root [`Statter`] with a reporter and a flush interval, then
//! resolve instruments from it.  Resolving the same name and tag set always
//! returns the same instrument, regardless of tag order.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use statter::{DiscardReporter, Statter, Tag};
//!
//! let stats = Statter::new(DiscardReporter, Duration::from_secs(10));
//!
//! stats.counter("requests", &[Tag::new("method", "GET")]).inc(1);
//! stats.gauge("queue_depth", &[]).set(42.0);
//! stats.timing("db_query", &[]).observe(Duration::from_millis(3));
//!
//! stats.close().expect("failed to close statter");
//! ```
//!
//! # Namespaces
//!
//! [`Statter::with`] returns a sub-statter carrying an extended prefix and
//! tag set.  Sub-statters are interned: the same prefix and tags always
//! yield the same node, and all nodes of a tree share one reporter and one
//! flush loop.
//!
//! ```rust
//! # use std::time::Duration;
//! # use statter::{DiscardReporter, Statter, Tag};
//! let stats = Statter::new(DiscardReporter, Duration::from_secs(10));
//!
//! let db = stats.with("svc", &[Tag::new("dc", "eu")]).with("db", &[]);
//! // Reported as "svc.db.errors" with tags [dc=eu, kind=timeout].
//! db.counter("errors", &[Tag::new("kind", "timeout")]).inc(1);
//! # stats.close().unwrap();
//! ```
//!
//! # Reporting
//!
//! A [`Reporter`] only has to accept counters and gauges.  Optional
//! capabilities let a back-end take over histogram/timing observation,
//! handle instrument removal, or participate in shutdown; see the
//! [`reporter`] module.  Histograms and timings without a capable reporter
//! are aggregated in-process and flushed as derived series: a `_count`
//! counter plus `_sum`, `_mean`, `_stddev`, `_min`, `_max`, and one gauge
//! per configured percentile (timings add a `_ms` suffix to everything but
//! `_count`).
//!
//! Counters drain on report: each flush emits the delta since the previous
//! one, and silent counters are elided.  Gauges are level-valued and
//! reported every flush.

#![deny(missing_docs)]

mod builder;
mod config;
mod data;
mod key;
mod registry;
pub mod reporter;
mod statter;
mod stats;
mod tags;

pub use self::builder::Builder;
pub use self::data::{Counter, Gauge, Histogram, Timing};
pub use self::reporter::{DiscardReporter, Reporter};
pub use self::statter::Statter;
pub use self::tags::{SharedString, Tag};

use thiserror::Error;

/// A type-erased error returned by reporter capabilities.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced when closing a statter.
#[derive(Debug, Error)]
pub enum CloseError {
    /// `close` was called on a statter other than the root of its tree.
    #[error("close cannot be called from a sub-statter")]
    NotRoot,

    /// The reporter's close hook failed after the final flush.
    #[error("failed to close reporter")]
    Reporter(#[source] BoxError),
}
