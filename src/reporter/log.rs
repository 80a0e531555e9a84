//! A reporter that renders stats as l2met lines through the `log` crate.

use std::sync::Arc;

use lockfree_object_pool::LinearObjectPool;
use log::Level;
use once_cell::sync::OnceCell;

use super::{ClosableReporter, Reporter};
use crate::tags::Tag;
use crate::BoxError;

fn line_pool() -> &'static Arc<LinearObjectPool<String>> {
    static POOL: OnceCell<Arc<LinearObjectPool<String>>> = OnceCell::new();
    POOL.get_or_init(|| {
        Arc::new(LinearObjectPool::new(|| String::with_capacity(512), String::clear))
    })
}

/// A reporter emitting l2met-style lines via the `log` crate.
///
/// Counters render as `count#name=v` and gauges as `sample#name=v`, followed
/// by the metric's tags as `key=value` pairs:
///
/// ```text
/// count#app.requests=42 method=GET
/// sample#app.queue_depth=17.5
/// ```
pub struct LogReporter {
    prefix: String,
    level: Level,
}

impl LogReporter {
    /// Creates a log reporter with the given name prefix.
    ///
    /// A non-empty prefix is joined to metric names with `.`.  Lines are
    /// emitted at `Info`.
    pub fn new(prefix: &str) -> LogReporter {
        let mut prefix = prefix.to_owned();
        if !prefix.is_empty() {
            prefix.push('.');
        }

        LogReporter { prefix, level: Level::Info }
    }

    /// Sets the level lines are emitted at.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    fn render(&self, measure: &str, name: &str, value: &str, tags: &[Tag]) {
        let mut line = line_pool().pull_owned();

        line.push_str(measure);
        line.push('#');
        line.push_str(&self.prefix);
        line.push_str(name);
        line.push('=');
        line.push_str(value);

        for tag in tags {
            line.push(' ');
            line.push_str(tag.key());
            line.push('=');
            line.push_str(tag.value());
        }

        log::log!(target: "statter", self.level, "{}", line.as_str());
    }
}

impl Reporter for LogReporter {
    fn counter(&self, name: &str, v: i64, tags: &[Tag]) {
        let mut buf = itoa::Buffer::new();
        self.render("count", name, buf.format(v), tags);
    }

    fn gauge(&self, name: &str, v: f64, tags: &[Tag]) {
        let mut buf = ryu::Buffer::new();
        self.render("sample", name, buf.format(v), tags);
    }

    fn as_closable(&self) -> Option<&dyn ClosableReporter> {
        Some(self)
    }
}

impl ClosableReporter for LogReporter {
    fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}
