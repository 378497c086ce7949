/// Eager, synchronous resizing: allocate a fresh [`BucketStore`] at the
/// next/previous Size Table entry and re-insert every LIVE entry from
/// the source table in physical index order. Tombstones are never
/// carried across a resize — the output table has none.
use crate::bucket::BucketStore;
use crate::error::Result;
use crate::probe;
use crate::size_table;

/// Grow `store` to the next Size Table entry above its current size.
/// On allocation failure, `store` is left completely untouched.
pub fn grow(store: &mut BucketStore) -> Result<()> {
    let new_size = size_table::grow(store.num_buckets());
    rebuild(store, new_size)
}

/// Shrink `store` to the previous Size Table entry below its current size.
/// On allocation failure, `store` is left completely untouched.
pub fn shrink(store: &mut BucketStore) -> Result<()> {
    let new_size = size_table::shrink(store.num_buckets());
    rebuild(store, new_size)
}

fn rebuild(store: &mut BucketStore, new_num_buckets: u32) -> Result<()> {
    let mut fresh = BucketStore::new(new_num_buckets, store.key_size(), store.value_size())?;

    for i in 0..store.num_buckets() {
        if store.is_live(i) {
            let key = store.key(i).to_vec();
            let value = store.value(i).to_vec();
            probe::insert_new(&mut fresh, &key, &value);
        }
    }

    *store = fresh;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{delete_from, insert_new, lookup};

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
    fn grow_preserves_all_live_entries() {
        crate::test_support::init_logging();
        let mut store = BucketStore::new(1031, 32, 12).unwrap();
        for i in 0..900 {
            insert_new(&mut store, &key(i), &value(i));
        }
        grow(&mut store).unwrap();
        assert_eq!(store.num_buckets(), 2053);
        for i in 0..900 {
            let idx = lookup(&mut store, &key(i)).unwrap();
            assert_eq!(store.value(idx), value(i).as_slice());
        }
    }

    #[test]
    fn shrink_drops_no_tombstones_and_keeps_live() {
        let mut store = BucketStore::new(2053, 32, 12).unwrap();
        for i in 0..300 {
            insert_new(&mut store, &key(i), &value(i));
        }
        for i in 0..50 {
            delete_from(&mut store, &key(i));
        }
        shrink(&mut store).unwrap();
        assert_eq!(store.num_buckets(), 1031);
        for i in 50..300 {
            assert!(lookup(&mut store, &key(i)).is_some());
        }
        for i in 0..50 {
            assert!(lookup(&mut store, &key(i)).is_none());
        }
        // No bucket in the rebuilt table should be a tombstone.
        for i in 0..store.num_buckets() {
            assert!(!store.is_deleted(i));
        }
    }
}
