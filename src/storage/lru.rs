//! Fixed-capacity LRU cache over a preallocated node pool
//!
//! A hash-bucketed map and a doubly linked MRU list share one set of nodes,
//! with unused nodes parked on a free list. Nothing allocates after
//! construction; the caller decides when to evict and how to flush the
//! evicted value.

use crate::core::types::IVec3;

/// Seeds for the component-wise coordinate hash
const HASH_SEED: [u32; 3] = [73_856_093, 19_349_663, 83_492_791];

const NIL: u32 = u32::MAX;

/// Handle to a pooled node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(u32);

struct Node<V> {
    key: IVec3,
    value: V,
    // MRU list
    prev: u32,
    next: u32,
    // bucket chain
    bucket: u32,
    down: u32,
}

/// LRU cache keyed by integer coordinates
pub struct LruCache<V> {
    nodes: Vec<Node<V>>,
    buckets: Vec<u32>,
    free: u32,
    front: u32,
    back: u32,
    len: usize,
}

impl<V: Default> LruCache<V> {
    /// Create a cache with `capacity` nodes and `buckets` hash buckets
    pub fn new(capacity: usize, buckets: usize) -> Self {
        assert!(capacity > 0 && buckets > 0);
        assert!(capacity < NIL as usize);
        let mut nodes = Vec::with_capacity(capacity);
        for i in 0..capacity {
            nodes.push(Node {
                key: IVec3::ZERO,
                value: V::default(),
                prev: NIL,
                // chain the free list through `next`
                next: if i + 1 < capacity { i as u32 + 1 } else { NIL },
                bucket: NIL,
                down: NIL,
            });
        }
        Self {
            nodes,
            buckets: vec![NIL; buckets],
            free: 0,
            front: NIL,
            back: NIL,
            len: 0,
        }
    }
}

impl<V> LruCache<V> {
    fn bucket_of(&self, key: IVec3) -> u32 {
        let h = (key.x as u32).wrapping_mul(HASH_SEED[0])
            ^ (key.y as u32).wrapping_mul(HASH_SEED[1])
            ^ (key.z as u32).wrapping_mul(HASH_SEED[2]);
        h % self.buckets.len() as u32
    }

    /// Look up `key`; a hit is moved to the most-recently-used position
    pub fn get(&mut self, key: IVec3) -> Option<NodeId> {
        let bucket = self.bucket_of(key);
        let mut i = self.buckets[bucket as usize];
        while i != NIL {
            if self.nodes[i as usize].key == key {
                self.unlink(i);
                self.link(i, bucket);
                return Some(NodeId(i));
            }
            i = self.nodes[i as usize].down;
        }
        None
    }

    /// Pop a node from the free list, if any remain
    pub fn take_free(&mut self) -> Option<NodeId> {
        if self.free == NIL {
            return None;
        }
        let i = self.free;
        self.free = self.nodes[i as usize].next;
        Some(NodeId(i))
    }

    /// Unlink and return the least-recently-used node
    ///
    /// The node keeps its key and value so the caller can flush it; hand it
    /// back with [`insert`](Self::insert) or [`release`](Self::release).
    pub fn evict_lru(&mut self) -> Option<NodeId> {
        if self.back == NIL {
            return None;
        }
        let i = self.back;
        self.unlink(i);
        self.len -= 1;
        Some(NodeId(i))
    }

    /// Link a node (from `take_free` or `evict_lru`) in under `key`, as MRU
    pub fn insert(&mut self, id: NodeId, key: IVec3) {
        self.nodes[id.0 as usize].key = key;
        let bucket = self.bucket_of(key);
        self.link(id.0, bucket);
        self.len += 1;
    }

    /// Return an unlinked node to the free list
    pub fn release(&mut self, id: NodeId) {
        self.nodes[id.0 as usize].next = self.free;
        self.free = id.0;
    }

    /// Number of linked-in nodes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn key(&self, id: NodeId) -> IVec3 {
        self.nodes[id.0 as usize].key
    }

    pub fn value(&self, id: NodeId) -> &V {
        &self.nodes[id.0 as usize].value
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.nodes[id.0 as usize].value
    }

    fn link(&mut self, i: u32, bucket: u32) {
        // bucket head
        let node = &mut self.nodes[i as usize];
        node.bucket = bucket;
        node.down = self.buckets[bucket as usize];
        self.buckets[bucket as usize] = i;
        // list front
        self.nodes[i as usize].prev = NIL;
        self.nodes[i as usize].next = self.front;
        if self.front != NIL {
            self.nodes[self.front as usize].prev = i;
        } else {
            self.back = i;
        }
        self.front = i;
    }

    fn unlink(&mut self, i: u32) {
        // bucket chain
        let bucket = self.nodes[i as usize].bucket;
        let mut cursor = self.buckets[bucket as usize];
        if cursor == i {
            self.buckets[bucket as usize] = self.nodes[i as usize].down;
        } else {
            while self.nodes[cursor as usize].down != i {
                cursor = self.nodes[cursor as usize].down;
                debug_assert_ne!(cursor, NIL, "node missing from its bucket chain");
            }
            self.nodes[cursor as usize].down = self.nodes[i as usize].down;
        }
        // MRU list
        let (prev, next) = (self.nodes[i as usize].prev, self.nodes[i as usize].next);
        if prev != NIL {
            self.nodes[prev as usize].next = next;
        } else {
            self.front = next;
        }
        if next != NIL {
            self.nodes[next as usize].prev = prev;
        } else {
            self.back = prev;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, buckets: usize, keys: &[IVec3]) -> LruCache<u32> {
        let mut cache = LruCache::new(capacity, buckets);
        for (v, &key) in keys.iter().enumerate() {
            let node = cache.take_free().expect("free node");
            *cache.value_mut(node) = v as u32;
            cache.insert(node, key);
        }
        cache
    }

    #[test]
    fn test_get_hit_and_miss() {
        let keys = [IVec3::new(1, 2, 3), IVec3::new(-4, 5, -6)];
        let mut cache = filled(4, 8, &keys);
        assert!(cache.get(keys[0]).is_some());
        assert!(cache.get(IVec3::new(9, 9, 9)).is_none());
    }

    #[test]
    fn test_free_list_exhaustion() {
        let mut cache: LruCache<u32> = LruCache::new(2, 4);
        assert!(cache.take_free().is_some());
        assert!(cache.take_free().is_some());
        assert!(cache.take_free().is_none());
    }

    #[test]
    fn test_eviction_order_is_lru() {
        let keys: Vec<IVec3> = (0..3).map(|i| IVec3::new(i, 0, 0)).collect();
        let mut cache = filled(3, 8, &keys);

        // Touch the oldest key so it is no longer the eviction candidate
        cache.get(keys[0]).unwrap();

        let evicted = cache.evict_lru().unwrap();
        assert_eq!(cache.key(evicted), keys[1]);
        cache.release(evicted);

        assert!(cache.get(keys[1]).is_none());
        assert!(cache.get(keys[0]).is_some());
        assert!(cache.get(keys[2]).is_some());
    }

    #[test]
    fn test_capacity_n_plus_one_distinct_keys() {
        // after inserting N+1 distinct keys into capacity N, exactly the
        // least recently touched key is absent
        let n = 4;
        let mut cache: LruCache<u32> = LruCache::new(n, 2 * n);
        for i in 0..=n as i32 {
            let key = IVec3::new(i, i, i);
            let node = match cache.take_free() {
                Some(node) => node,
                None => {
                    let node = cache.evict_lru().unwrap();
                    node
                }
            };
            cache.insert(node, key);
        }
        assert!(cache.get(IVec3::ZERO).is_none());
        for i in 1..=n as i32 {
            assert!(cache.get(IVec3::new(i, i, i)).is_some(), "key {i} missing");
        }
    }

    #[test]
    fn test_bucket_collision_chains() {
        // a single bucket forces every key onto one chain
        let keys: Vec<IVec3> = (0..4).map(|i| IVec3::new(i, -i, i * 7)).collect();
        let mut cache = filled(4, 1, &keys);
        for (v, &key) in keys.iter().enumerate() {
            let node = cache.get(key).expect("chained key");
            assert_eq!(*cache.value(node), v as u32);
        }
    }

    #[test]
    fn test_release_then_reuse() {
        let mut cache: LruCache<u32> = LruCache::new(1, 2);
        let node = cache.take_free().unwrap();
        cache.insert(node, IVec3::ZERO);

        let evicted = cache.evict_lru().unwrap();
        cache.release(evicted);
        assert!(cache.is_empty());

        let node = cache.take_free().expect("released node is reusable");
        cache.insert(node, IVec3::ONE);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(IVec3::ONE).is_some());
    }
}
