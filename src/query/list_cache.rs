use std::num::NonZeroUsize;

use lru::LruCache;

use crate::query::inverted_list::InvertedList;

/*
 Bounded LRU cache of open cursors keyed by term, shared across the queries
 of one session. Cursors are checked out: a hit removes the entry and hands
 the caller exclusive ownership, and `put` checks it back in as the most
 recently used. Inserting into a full cache drops the least recently used
 cursor, which closes its file handle.
*/
pub struct InvertedListCache {
    cache: LruCache<String, InvertedList>,
    hits: u64,
    misses: u64,
}

impl InvertedListCache {
    pub fn new(capacity: usize) -> InvertedListCache {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        InvertedListCache {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Check a cursor out of the cache.
    pub fn get(&mut self, term: &str) -> Option<InvertedList> {
        match self.cache.pop(term) {
            Some(list) => {
                self.hits += 1;
                Some(list)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Check a cursor back in as most recently used, evicting the least
    /// recently used entry if the cache is full.
    pub fn put(&mut self, term: String, list: InvertedList) {
        self.cache.push(term, list);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.cache.contains(term)
    }

    pub fn stats(&self) -> String {
        format!(
            "Cache: {}/{} | Hits: {} | Misses: {}",
            self.cache.len(),
            self.cache.cap(),
            self.hits,
            self.misses
        )
    }
}
