//! Thread-safe LRU cache (component B).
//!
//! Nodes live in a flat arena (`Vec<Slot>`) addressed by integer handles, the
//! same free-list-over-a-flat-array idiom as a slab allocator: a node that is
//! evicted is pushed onto a free list and its index is reused by the next
//! `put`, instead of shuffling the backing `Vec`. Hash buckets and the
//! recency list are both expressed as handle chains through that same arena,
//! which is what gives `get`/`put`/`evict` their O(1) bound without unsafe
//! pointer aliasing.
//!
//! Everything here lives behind one `Mutex`; see `Cache::get` for how reads
//! outlive the lock via an `Arc`-shared payload (spec §5 option (ii)).

use std::sync::{Arc, Mutex};

const BUCKET_COUNT: usize = 1024;
const NIL: u32 = u32::MAX;

struct Node {
    key: String,
    payload: Arc<[u8]>,
    // recency list
    prev: u32,
    next: u32,
    // hash chain within its bucket
    hash_next: u32,
    occupied: bool,
}

struct Inner {
    capacity: u64,
    element_ceiling: u64,
    current_bytes: u64,
    buckets: Vec<u32>,
    arena: Vec<Node>,
    free_head: u32,
    head: u32, // most recently used
    tail: u32, // least recently used
}

pub struct Cache {
    inner: Mutex<Inner>,
}

/// A handle on a cache hit. The payload is reference-counted rather than
/// borrowed from behind the lock, so it stays valid after the mutex guard is
/// dropped even if the node is evicted moments later.
pub struct ReadHandle {
    payload: Arc<[u8]>,
}

impl ReadHandle {
    pub fn bytes(&self) -> &[u8] {
        &self.payload
    }
}

fn djb2(key: &str) -> usize {
    let mut h: u64 = 5381;
    for b in key.as_bytes() {
        h = h.wrapping_mul(33).wrapping_add(*b as u64);
    }
    (h as usize) % BUCKET_COUNT
}

impl Cache {
    pub fn new(capacity_bytes: u64, element_ceiling_bytes: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity: capacity_bytes,
                element_ceiling: element_ceiling_bytes,
                current_bytes: 0,
                buckets: vec![NIL; BUCKET_COUNT],
                arena: Vec::new(),
                free_head: NIL,
                head: NIL,
                tail: NIL,
            }),
        }
    }

    pub fn element_ceiling(&self) -> u64 {
        self.inner.lock().unwrap().element_ceiling
    }

    pub fn get(&self, key: &str) -> Option<ReadHandle> {
        let mut inner = self.inner.lock().unwrap();
        let idx = inner.find(key)?;
        inner.promote(idx);
        let payload = inner.arena[idx as usize].payload.clone();
        Some(ReadHandle { payload })
    }

    /// Inserts `bytes` under `key`, replacing any existing entry for the same
    /// key. A no-op (with a WARN-worthy condition the caller should log) if
    /// `bytes` exceeds the per-element ceiling.
    pub fn put(&self, key: &str, bytes: &[u8]) -> bool {
        let len = bytes.len() as u64;
        let mut inner = self.inner.lock().unwrap();
        if len > inner.element_ceiling {
            return false;
        }

        if let Some(existing) = inner.find(key) {
            inner.remove(existing);
        }

        while inner.current_bytes + len > inner.capacity && inner.tail != NIL {
            inner.evict_tail();
        }

        let idx = inner.alloc_node(key.to_string(), Arc::from(bytes));
        inner.attach_head(idx);
        inner.attach_bucket(idx);
        inner.current_bytes += len;
        true
    }

    #[cfg(test)]
    fn current_bytes(&self) -> u64 {
        self.inner.lock().unwrap().current_bytes
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        let mut n = 0;
        let mut cur = inner.head;
        while cur != NIL {
            n += 1;
            cur = inner.arena[cur as usize].next;
        }
        n
    }
}

impl Inner {
    fn find(&self, key: &str) -> Option<u32> {
        let bucket = djb2(key);
        let mut cur = self.buckets[bucket];
        while cur != NIL {
            let node = &self.arena[cur as usize];
            if node.occupied && node.key == key {
                return Some(cur);
            }
            cur = node.hash_next;
        }
        None
    }

    fn alloc_node(&mut self, key: String, payload: Arc<[u8]>) -> u32 {
        let node = Node {
            key,
            payload,
            prev: NIL,
            next: NIL,
            hash_next: NIL,
            occupied: true,
        };
        if self.free_head != NIL {
            let idx = self.free_head;
            let slot = &mut self.arena[idx as usize];
            self.free_head = slot.next;
            *slot = node;
            idx
        } else {
            self.arena.push(node);
            (self.arena.len() - 1) as u32
        }
    }

    fn attach_bucket(&mut self, idx: u32) {
        let bucket = djb2(&self.arena[idx as usize].key);
        self.arena[idx as usize].hash_next = self.buckets[bucket];
        self.buckets[bucket] = idx;
    }

    fn detach_bucket(&mut self, idx: u32) {
        let bucket = djb2(&self.arena[idx as usize].key);
        let mut cur = self.buckets[bucket];
        if cur == idx {
            self.buckets[bucket] = self.arena[idx as usize].hash_next;
            return;
        }
        while cur != NIL {
            let next = self.arena[cur as usize].hash_next;
            if next == idx {
                self.arena[cur as usize].hash_next = self.arena[idx as usize].hash_next;
                return;
            }
            cur = next;
        }
    }

    fn attach_head(&mut self, idx: u32) {
        self.arena[idx as usize].prev = NIL;
        self.arena[idx as usize].next = self.head;
        if self.head != NIL {
            self.arena[self.head as usize].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn detach(&mut self, idx: u32) {
        let (prev, next) = {
            let node = &self.arena[idx as usize];
            (node.prev, node.next)
        };
        if prev != NIL {
            self.arena[prev as usize].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.arena[next as usize].prev = prev;
        } else {
            self.tail = prev;
        }
    }

    fn promote(&mut self, idx: u32) {
        if self.head == idx {
            return;
        }
        self.detach(idx);
        self.attach_head(idx);
    }

    fn evict_tail(&mut self) {
        let idx = self.tail;
        if idx == NIL {
            return;
        }
        self.remove(idx);
    }

    /// Detaches `idx` from both the recency list and its hash bucket, frees
    /// its arena slot onto the free list, and accounts its bytes back out of
    /// `current_bytes`. Used for both LRU eviction and same-key replacement.
    fn remove(&mut self, idx: u32) {
        let size = self.arena[idx as usize].payload.len() as u64;
        self.detach(idx);
        self.detach_bucket(idx);
        self.current_bytes = self.current_bytes.saturating_sub(size);

        let node = &mut self.arena[idx as usize];
        node.occupied = false;
        node.key = String::new();
        node.payload = Arc::from(&[][..]);
        node.next = self.free_head;
        self.free_head = idx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_hit() {
        let cache = Cache::new(1024, 1024);
        assert!(cache.put("example.com/index", b"BODY"));
        let handle = cache.get("example.com/index").unwrap();
        assert_eq!(handle.bytes(), b"BODY");
    }

    #[test]
    fn get_miss_returns_none() {
        let cache = Cache::new(1024, 1024);
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn oversized_put_is_rejected() {
        let cache = Cache::new(100, 10);
        assert!(!cache.put("k", &[0u8; 11]));
        assert_eq!(cache.current_bytes(), 0);
    }

    #[test]
    fn exact_ceiling_put_is_accepted() {
        let cache = Cache::new(100, 10);
        assert!(cache.put("k", &[0u8; 10]));
        assert_eq!(cache.current_bytes(), 10);
    }

    #[test]
    fn eviction_keeps_capacity_invariant() {
        let cache = Cache::new(100, 100);
        assert!(cache.put("a", &[0u8; 60]));
        assert!(cache.put("b", &[0u8; 60]));
        assert!(cache.current_bytes() <= 100);
        assert_eq!(cache.current_bytes(), 60);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn promotion_protects_from_eviction() {
        let cache = Cache::new(30, 30);
        cache.put("a", &[0u8; 10]);
        cache.put("b", &[0u8; 10]);
        cache.put("c", &[0u8; 10]);
        assert!(cache.get("a").is_some()); // promotes a to head; b is now the tail

        cache.put("d", &[0u8; 10]); // forces exactly one eviction

        // b, the least recently used, is evicted before a
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
    }

    #[test]
    fn put_over_existing_key_replaces_without_leaking_bytes() {
        let cache = Cache::new(100, 100);
        cache.put("k", &[0u8; 40]);
        cache.put("k", &[1u8; 10]);
        assert_eq!(cache.current_bytes(), 10);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").unwrap().bytes(), &[1u8; 10]);
    }

    #[test]
    fn recency_list_length_matches_live_entries() {
        let cache = Cache::new(1000, 1000);
        for i in 0..5 {
            cache.put(&format!("k{i}"), &[0u8; 10]);
        }
        assert_eq!(cache.len(), 5);
    }
}
