/// Fixed-width key/value cells plus per-cell state, laid out AoS:
/// `[k0 v0 k1 v1 ...]`. This is the mandatory on-disk layout (spec.md
/// §4.2), so it is also the only in-memory layout this crate uses —
/// there is no separate SoA representation to keep in sync with it.
///
/// Bucket state is multiplexed into the first 4 little-endian bytes of
/// the value region: `EMPTY` and `DELETED` are reserved sentinels;
/// anything else means the bucket is LIVE and both the key and value
/// bytes are meaningful.
use crate::error::{HashIndexError, Result};

/// Never occupied since the table was sized at its current capacity.
pub const EMPTY: u32 = 0xFFFF_FFFF;
/// Tombstone: was occupied, now logically absent.
pub const DELETED: u32 = 0xFFFF_FFFE;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tag {
    Empty,
    Deleted,
    Live,
}

/// A contiguous region of `num_buckets * (key_size + value_size)` bytes.
#[derive(Clone)]
pub struct BucketStore {
    data: Vec<u8>,
    num_buckets: u32,
    key_size: u8,
    value_size: u8,
}

impl BucketStore {
    pub fn bucket_size(key_size: u8, value_size: u8) -> usize {
        key_size as usize + value_size as usize
    }

    /// Allocate a fresh store with every bucket EMPTY.
    pub fn new(num_buckets: u32, key_size: u8, value_size: u8) -> Result<Self> {
        let bucket_size = Self::bucket_size(key_size, value_size);
        let total = (num_buckets as usize)
            .checked_mul(bucket_size)
            .ok_or(HashIndexError::Alloc(num_buckets))?;
        let mut data = Vec::new();
        data.try_reserve_exact(total)
            .map_err(|_| HashIndexError::Alloc(num_buckets))?;
        data.resize(total, 0);

        let mut store = BucketStore {
            data,
            num_buckets,
            key_size,
            value_size,
        };
        for i in 0..num_buckets {
            store.set_tag(i, EMPTY);
        }
        Ok(store)
    }

    /// Build a store directly from raw bytes already in AoS layout
    /// (used by the persistence codec — the file's bucket region is
    /// read verbatim, tombstones and all).
    pub fn from_raw(data: Vec<u8>, num_buckets: u32, key_size: u8, value_size: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            num_buckets as usize * Self::bucket_size(key_size, value_size)
        );
        BucketStore {
            data,
            num_buckets,
            key_size,
            value_size,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    pub fn key_size(&self) -> u8 {
        self.key_size
    }

    pub fn value_size(&self) -> u8 {
        self.value_size
    }

    #[inline]
    fn offset(&self, index: u32) -> usize {
        debug_assert!(index < self.num_buckets);
        index as usize * Self::bucket_size(self.key_size, self.value_size)
    }

    #[inline]
    pub fn key(&self, index: u32) -> &[u8] {
        let off = self.offset(index);
        &self.data[off..off + self.key_size as usize]
    }

    #[inline]
    pub fn value(&self, index: u32) -> &[u8] {
        let off = self.offset(index) + self.key_size as usize;
        &self.data[off..off + self.value_size as usize]
    }

    #[inline]
    pub fn tag(&self, index: u32) -> Tag {
        let raw = self.raw_tag(index);
        match raw {
            EMPTY => Tag::Empty,
            DELETED => Tag::Deleted,
            _ => Tag::Live,
        }
    }

    #[inline]
    fn raw_tag(&self, index: u32) -> u32 {
        let off = self.offset(index) + self.key_size as usize;
        let bytes = &self.data[off..off + 4];
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    pub fn is_live(&self, index: u32) -> bool {
        self.tag(index) == Tag::Live
    }

    #[inline]
    pub fn is_empty_slot(&self, index: u32) -> bool {
        self.tag(index) == Tag::Empty
    }

    #[inline]
    pub fn is_deleted(&self, index: u32) -> bool {
        self.tag(index) == Tag::Deleted
    }

    #[inline]
    fn set_tag(&mut self, index: u32, raw: u32) {
        let off = self.offset(index) + self.key_size as usize;
        self.data[off..off + 4].copy_from_slice(&raw.to_le_bytes());
    }

    pub fn mark_empty(&mut self, index: u32) {
        self.set_tag(index, EMPTY);
    }

    pub fn mark_deleted(&mut self, index: u32) {
        self.set_tag(index, DELETED);
    }

    /// Write a LIVE entry's key and value bytes. Caller guarantees
    /// `value` does not begin with a reserved sentinel (checked once at
    /// the `Index` public API boundary, not here on every internal move).
    pub fn write_entry(&mut self, index: u32, key: &[u8], value: &[u8]) {
        debug_assert_eq!(key.len(), self.key_size as usize);
        debug_assert_eq!(value.len(), self.value_size as usize);
        let off = self.offset(index);
        let ks = self.key_size as usize;
        self.data[off..off + ks].copy_from_slice(key);
        self.data[off + ks..off + ks + value.len()].copy_from_slice(value);
    }

    /// Move one bucket's raw bytes (key + value + tag) into another.
    /// Used by opportunistic tombstone compaction and robin-hood
    /// displacement.
    pub fn copy_bucket(&mut self, from: u32, to: u32) {
        if from == to {
            return;
        }
        let bucket_size = Self::bucket_size(self.key_size, self.value_size);
        let from_off = self.offset(from);
        let to_off = self.offset(to);
        // SAFETY-free approach: copy through a small stack buffer since
        // `from`/`to` may alias the same backing Vec at different offsets.
        let mut tmp = [0u8; 256];
        let buf = &mut tmp[..bucket_size];
        buf.copy_from_slice(&self.data[from_off..from_off + bucket_size]);
        self.data[to_off..to_off + bucket_size].copy_from_slice(buf);
    }

    /// Value bytes' leading 4 bytes collide with a reserved sentinel.
    pub fn value_is_reserved(value: &[u8]) -> bool {
        if value.len() < 4 {
            return false;
        }
        let raw = u32::from_le_bytes([value[0], value[1], value[2], value[3]]);
        raw == EMPTY || raw == DELETED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_all_empty() {
        let store = BucketStore::new(8, 4, 4).unwrap();
        for i in 0..8 {
            assert!(store.is_empty_slot(i));
        }
    }

    #[test]
    fn write_and_read_entry() {
        let mut store = BucketStore::new(8, 4, 4).unwrap();
        store.write_entry(3, &[1, 2, 3, 4], &[9, 9, 9, 9]);
        assert!(store.is_live(3));
        assert_eq!(store.key(3), &[1, 2, 3, 4]);
        assert_eq!(store.value(3), &[9, 9, 9, 9]);
    }

    #[test]
    fn mark_deleted_then_empty() {
        let mut store = BucketStore::new(8, 4, 4).unwrap();
        store.write_entry(0, &[1, 0, 0, 0], &[5, 0, 0, 0]);
        store.mark_deleted(0);
        assert!(store.is_deleted(0));
        store.mark_empty(0);
        assert!(store.is_empty_slot(0));
    }

    #[test]
    fn copy_bucket_moves_bytes() {
        let mut store = BucketStore::new(8, 4, 4).unwrap();
        store.write_entry(0, &[1, 2, 3, 4], &[5, 6, 7, 8]);
        store.copy_bucket(0, 5);
        assert!(store.is_live(5));
        assert_eq!(store.key(5), &[1, 2, 3, 4]);
        assert_eq!(store.value(5), &[5, 6, 7, 8]);
    }

    #[test]
    fn reserved_sentinel_detection() {
        assert!(BucketStore::value_is_reserved(&EMPTY.to_le_bytes()));
        assert!(BucketStore::value_is_reserved(&DELETED.to_le_bytes()));
        assert!(!BucketStore::value_is_reserved(&[0, 0, 0, 0]));
    }
}
