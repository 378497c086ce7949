/// Robin-hood linear probing with tombstones over a [`BucketStore`].
///
/// Hash function: the first 4 bytes of the key, read as a little-endian
/// `u32`, modulo `num_buckets`. Keys are assumed already well-distributed
/// (prefixes of cryptographic hashes); no further mixing is applied.
use crate::bucket::BucketStore;

#[inline]
fn hash_start(key: &[u8], num_buckets: u32) -> u32 {
    debug_assert!(key.len() >= 4);
    let h = u32::from_le_bytes([key[0], key[1], key[2], key[3]]);
    h % num_buckets
}

#[inline]
fn probe_distance(start: u32, current: u32, num_buckets: u32) -> u32 {
    (current + num_buckets - start) % num_buckets
}

#[inline]
fn ideal_index(store: &BucketStore, index: u32, num_buckets: u32) -> u32 {
    hash_start(store.key(index), num_buckets)
}

/// Result of a lookup: the live bucket's index, or nothing.
pub fn lookup(store: &mut BucketStore, key: &[u8]) -> Option<u32> {
    let num_buckets = store.num_buckets();
    let start = hash_start(key, num_buckets);
    let mut idx = start;
    let mut tombstone_idx: Option<u32> = None;

    for _ in 0..num_buckets {
        if store.is_empty_slot(idx) {
            return None;
        }
        if store.is_deleted(idx) {
            if tombstone_idx.is_none() {
                tombstone_idx = Some(idx);
            }
            idx = (idx + 1) % num_buckets;
            continue;
        }
        // LIVE bucket.
        if store.key(idx) == key {
            return Some(match tombstone_idx {
                Some(t) => {
                    let value = store.value(idx).to_vec();
                    let live_key = store.key(idx).to_vec();
                    store.write_entry(t, &live_key, &value);
                    store.mark_deleted(idx);
                    t
                }
                None => idx,
            });
        }

        // Robin-hood early exit: once our probe distance from `start`
        // exceeds the occupant's own probe distance from its ideal
        // index, the key cannot lie further down this chain.
        let occupant_dist = probe_distance(ideal_index(store, idx, num_buckets), idx, num_buckets);
        let our_dist = probe_distance(start, idx, num_buckets);
        if our_dist > occupant_dist {
            return None;
        }

        idx = (idx + 1) % num_buckets;
        if idx == start {
            return None;
        }
    }
    None
}

/// Insert a key known not to already be present, assuming the table has
/// at least one non-LIVE bucket to land in. Callers that don't already
/// know the key is new should go through [`crate::index::Index::set`],
/// which does the lookup, the resize-threshold check, and then calls
/// this.
pub fn insert_new(store: &mut BucketStore, key: &[u8], value: &[u8]) {
    let num_buckets = store.num_buckets();
    let start = hash_start(key, num_buckets);

    let mut carry_key = key.to_vec();
    let mut carry_value = value.to_vec();
    let mut carry_start = start;
    let mut idx = start;

    loop {
        if store.is_empty_slot(idx) || store.is_deleted(idx) {
            store.write_entry(idx, &carry_key, &carry_value);
            return;
        }

        let occupant_ideal = ideal_index(store, idx, num_buckets);
        let occupant_dist = probe_distance(occupant_ideal, idx, num_buckets);
        let carry_dist = probe_distance(carry_start, idx, num_buckets);

        if carry_dist > occupant_dist {
            let occ_key = store.key(idx).to_vec();
            let occ_value = store.value(idx).to_vec();
            store.write_entry(idx, &carry_key, &carry_value);
            carry_key = occ_key;
            carry_value = occ_value;
            carry_start = occupant_ideal;
        }

        idx = (idx + 1) % num_buckets;
    }
}

/// Delete `key`. Idempotent: returns `false` if the key was not present.
pub fn delete_from(store: &mut BucketStore, key: &[u8]) -> bool {
    match lookup(store, key) {
        Some(idx) => {
            store.mark_deleted(idx);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: u32) -> Vec<u8> {
        let mut k = vec![0u8; 32];
        k[0..4].copy_from_slice(&i.to_le_bytes());
        k
    }

    fn value(i: u32) -> Vec<u8> {
        let mut v = vec![0u8; 12];
        v[0..4].copy_from_slice(&i.to_le_bytes());
        v
    }

    #[test]
    fn insert_and_lookup_roundtrip() {
        let mut store = BucketStore::new(1031, 32, 12).unwrap();
        for i in 0..100 {
            insert_new(&mut store, &key(i), &value(i));
        }
        for i in 0..100 {
            let idx = lookup(&mut store, &key(i)).unwrap();
            assert_eq!(store.value(idx), value(i).as_slice());
        }
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = BucketStore::new(1031, 32, 12).unwrap();
        insert_new(&mut store, &key(1), &value(1));
        assert!(delete_from(&mut store, &key(1)));
        assert!(!delete_from(&mut store, &key(1)));
        assert!(lookup(&mut store, &key(1)).is_none());
    }

    #[test]
    fn tombstone_does_not_mask_later_key_with_same_start() {
        // Both keys hash to bucket 0 in a 1031-bucket table.
        let mut store = BucketStore::new(1031, 32, 12).unwrap();
        insert_new(&mut store, &key(0), &value(0));
        insert_new(&mut store, &key(1031), &value(1));
        assert!(delete_from(&mut store, &key(0)));
        let idx = lookup(&mut store, &key(1031)).unwrap();
        assert_eq!(store.value(idx), value(1).as_slice());
    }

    #[test]
    fn opportunistic_compaction_moves_into_tombstone() {
        let mut store = BucketStore::new(1031, 32, 12).unwrap();
        insert_new(&mut store, &key(0), &value(0));
        insert_new(&mut store, &key(1031), &value(1));
        // Delete the first, leaving a tombstone at index 0.
        delete_from(&mut store, &key(0));
        assert!(store.is_deleted(0));
        // Looking the second key up should compact it into slot 0.
        let idx = lookup(&mut store, &key(1031)).unwrap();
        assert_eq!(idx, 0);
        assert!(store.is_live(0));
        assert!(store.is_deleted(1));
    }
}
