use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;

use crate::key::Key;
use crate::statter::Node;
use crate::tags::Tag;
use crate::CloseError;

/// Owns the nodes of a statter tree and drives the periodic report loop.
///
/// Sub-nodes are interned by the canonical key over their merged prefix and
/// tags, under a single mutex.  That mutex also serialises reports relative
/// to sub-node creation; per-instrument contention is unaffected.
pub(crate) struct Registry {
    shared: Arc<Shared>,
    done: Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    root: Arc<Node>,
    statters: Mutex<HashMap<String, Arc<Node>>>,
}

impl Shared {
    fn report(&self) {
        let statters = self.statters.lock();
        for node in statters.values() {
            node.report();
        }
    }
}

impl Registry {
    /// Creates a registry rooted at the given node and spawns the report
    /// loop ticking on the given interval.
    ///
    /// The loop also exits when the registry is dropped, so an unclosed tree
    /// does not pin its thread forever.
    pub(crate) fn new(root: Arc<Node>, interval: Duration) -> Registry {
        let key = Key::new(&root.prefix, &root.tags);

        let mut statters = HashMap::new();
        statters.insert(key.into_owned(), Arc::clone(&root));

        let shared = Arc::new(Shared { root, statters: Mutex::new(statters) });

        let (done, done_rx) = bounded(1);
        let loop_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(ticker) -> _ => loop_shared.report(),
                    recv(done_rx) -> _ => return,
                }
            }
        });

        Registry { shared, done, handle: Mutex::new(Some(handle)) }
    }

    /// Returns the interned sub-node for the merged `(prefix, tags)`,
    /// creating it if this is the first resolution.
    pub(crate) fn sub_statter(&self, parent: &Arc<Node>, prefix: &str, tags: &[Tag]) -> Arc<Node> {
        let (name, tags) =
            merge_descriptors(&parent.prefix, &parent.cfg.separator, prefix, &parent.tags, tags);

        let key = Key::new(&name, &tags);

        let mut statters = self.shared.statters.lock();
        if let Some(node) = statters.get(key.as_str()) {
            return Arc::clone(node);
        }

        let node = Arc::new(parent.child(name, tags));
        statters.insert(key.into_owned(), Arc::clone(&node));

        node
    }

    /// Closes the registry if the caller is the root node, otherwise
    /// returns an error.
    ///
    /// Stops the report loop, waits for it to finish, and runs one final
    /// report so the last interval's data is not lost.
    pub(crate) fn close(&self, caller: &Arc<Node>) -> Result<(), CloseError> {
        if !Arc::ptr_eq(caller, &self.shared.root) {
            return Err(CloseError::NotRoot);
        }

        if let Some(handle) = self.handle.lock().take() {
            let _ = self.done.send(());
            let _ = handle.join();
        }

        self.shared.report();

        Ok(())
    }
}

/// Merges a parent prefix and base tags with a sub-statter's prefix and
/// tags.
fn merge_descriptors(
    prefix: &str,
    sep: &str,
    name: &str,
    base_tags: &[Tag],
    tags: &[Tag],
) -> (String, Vec<Tag>) {
    let name = if !prefix.is_empty() && !name.is_empty() {
        format!("{prefix}{sep}{name}")
    } else if name.is_empty() {
        prefix.to_owned()
    } else {
        name.to_owned()
    };

    let mut merged = Vec::with_capacity(base_tags.len() + tags.len());
    merged.extend_from_slice(base_tags);
    merged.extend_from_slice(tags);

    (name, merged)
}
