use std::sync::Arc;

use lockfree_object_pool::{LinearObjectPool, LinearOwnedReusable};
use once_cell::sync::OnceCell;

use crate::tags::Tag;

const KEY_SEP: char = ':';
const KEY_TAG_SEP: char = '=';

/// Scratch state reused across key constructions: the byte buffer the key is
/// composed into and the tag copy that gets sorted.
struct Scratch {
    buf: String,
    tags: Vec<Tag>,
}

fn scratch_pool() -> &'static Arc<LinearObjectPool<Scratch>> {
    static POOL: OnceCell<Arc<LinearObjectPool<Scratch>>> = OnceCell::new();
    POOL.get_or_init(|| {
        Arc::new(LinearObjectPool::new(
            || Scratch { buf: String::with_capacity(256), tags: Vec::new() },
            |scratch| {
                scratch.buf.clear();
                scratch.tags.clear();
            },
        ))
    })
}

/// A canonical interning key for a metric name and tag set.
///
/// The key is `name:k=v:k=v` with tags sorted by key, so any permutation of
/// the same tags produces the same key.  The composed bytes live in a pooled
/// scratch buffer: [`Key::as_str`] borrows them for map lookups, and
/// [`Key::into_owned`] produces the owned copy stored on insert.
pub(crate) struct Key {
    scratch: LinearOwnedReusable<Scratch>,
}

impl Key {
    pub(crate) fn new(name: &str, tags: &[Tag]) -> Key {
        let mut scratch = scratch_pool().pull_owned();
        let Scratch { buf, tags: sorted } = &mut *scratch;

        buf.push_str(name);

        // Short path for no tags.
        if !tags.is_empty() {
            sorted.extend_from_slice(tags);
            sort_tags(sorted);

            for tag in sorted.iter() {
                buf.push(KEY_SEP);
                buf.push_str(tag.key());
                buf.push(KEY_TAG_SEP);
                buf.push_str(tag.value());
            }
        }

        Key { scratch }
    }

    /// Returns the key as a borrowed string.
    ///
    /// The view is only valid while the `Key` is held; it must not be stored.
    pub(crate) fn as_str(&self) -> &str {
        &self.scratch.buf
    }

    /// Consumes the key, returning an owned string that is safe to store.
    pub(crate) fn into_owned(self) -> String {
        self.scratch.buf.clone()
    }
}

/// Sorts tags by key, ascending.
///
/// Insertion sort: tag sets are tiny, and stability keeps duplicate keys in
/// caller order so the later occurrence wins after the sort.
fn sort_tags(tags: &mut [Tag]) {
    for i in 1..tags.len() {
        let mut j = i;
        while j > 0 && tags[j].key() < tags[j - 1].key() {
            tags.swap(j, j - 1);
            j -= 1;
        }
    }
}
