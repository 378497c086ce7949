/// Public façade: a fixed-width-key/value hash index backed by a
/// [`BucketStore`], growing and shrinking itself against the Size Table
/// as entries come and go.
use std::path::Path;

use log::warn;

use crate::bucket::BucketStore;
use crate::error::{HashIndexError, Result};
use crate::iter::Iter;
use crate::persist::{self, Header};
use crate::probe;
use crate::resize;
use crate::size_table;

/// Construction parameters for a brand-new, empty index.
pub struct IndexParams {
    /// Minimum number of entries the table should accommodate without
    /// an immediate resize; rounded up to the next Size Table entry.
    pub capacity: u32,
    /// Key width in bytes. Must be in `1..=127`.
    pub key_size: u8,
    /// Value width in bytes. Must be in `4..=127` — the first four bytes
    /// double as the bucket's state tag, so a value narrower than that
    /// could never hold a live entry's tag unambiguously.
    pub value_size: u8,
}

pub struct Index {
    store: BucketStore,
    num_entries: u32,
    lower_limit: u32,
    upper_limit: u32,
}

impl Index {
    pub fn new(params: IndexParams) -> Result<Self> {
        if params.key_size == 0 || params.key_size > 127 {
            return Err(HashIndexError::InvalidKeySize(params.key_size));
        }
        if params.value_size < 4 || params.value_size > 127 {
            return Err(HashIndexError::InvalidValueSize(params.value_size));
        }
        let num_buckets = size_table::fit(params.capacity);
        let store = BucketStore::new(num_buckets, params.key_size, params.value_size)?;
        Ok(Index {
            store,
            num_entries: 0,
            lower_limit: size_table::lower_limit(num_buckets),
            upper_limit: size_table::upper_limit(num_buckets),
        })
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let (header, store) = persist::read(path.as_ref())?;
        let num_buckets = store.num_buckets();
        Ok(Index {
            store,
            num_entries: header.num_entries as u32,
            lower_limit: size_table::lower_limit(num_buckets),
            upper_limit: size_table::upper_limit(num_buckets),
        })
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let header = Header {
            num_entries: self.num_entries as i32,
            num_buckets: self.store.num_buckets() as i32,
            key_size: self.store.key_size() as i8,
            value_size: self.store.value_size() as i8,
        };
        persist::write(path.as_ref(), &header, &self.store)
    }

    fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.len() != self.store.key_size() as usize {
            return Err(HashIndexError::KeyLengthMismatch {
                expected: self.store.key_size(),
                actual: key.len(),
            });
        }
        Ok(())
    }

    fn check_value(&self, value: &[u8]) -> Result<()> {
        if value.len() != self.store.value_size() as usize {
            return Err(HashIndexError::ValueLengthMismatch {
                expected: self.store.value_size(),
                actual: value.len(),
            });
        }
        if BucketStore::value_is_reserved(value) {
            return Err(HashIndexError::ReservedSentinel);
        }
        Ok(())
    }

    pub fn get(&mut self, key: &[u8]) -> Result<Option<&[u8]>> {
        self.check_key(key)?;
        Ok(probe::lookup(&mut self.store, key).map(|idx| self.store.value(idx)))
    }

    /// Insert or overwrite `key` with `value`.
    ///
    /// Overwriting an existing key never touches `num_entries` or
    /// triggers a resize. Inserting a genuinely new key grows the table
    /// first if doing so would push `num_entries` past `upper_limit`,
    /// then performs the insertion. If that growth fails, `self` is left
    /// completely untouched and the failure is returned to the caller.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_key(key)?;
        self.check_value(value)?;

        if let Some(idx) = probe::lookup(&mut self.store, key) {
            self.store.write_entry(idx, key, value);
            return Ok(());
        }

        if self.num_entries + 1 > self.upper_limit {
            if let Err(e) = resize::grow(&mut self.store) {
                warn!(target: "hashindex", "grow failed, table left untouched: {e}");
                return Err(e);
            }
            self.lower_limit = size_table::lower_limit(self.store.num_buckets());
            self.upper_limit = size_table::upper_limit(self.store.num_buckets());
        }

        probe::insert_new(&mut self.store, key, value);
        self.num_entries += 1;
        Ok(())
    }

    /// Remove `key`. Idempotent: returns `Ok(false)` if the key was not
    /// present.
    ///
    /// A failing shrink is reported as an error even though the delete
    /// itself already took effect: the tombstone stays in place and
    /// `num_entries` stays decremented, so the table remains correct at
    /// its current (larger-than-ideal) capacity and a future delete may
    /// retry the shrink.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        if !probe::delete_from(&mut self.store, key) {
            return Ok(false);
        }
        self.num_entries -= 1;

        if self.num_entries < self.lower_limit {
            if let Err(e) = resize::shrink(&mut self.store) {
                warn!(target: "hashindex", "shrink failed, keeping current table size: {e}");
                return Err(e);
            }
            self.lower_limit = size_table::lower_limit(self.store.num_buckets());
            self.upper_limit = size_table::upper_limit(self.store.num_buckets());
        }
        Ok(true)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.store)
    }

    pub fn len(&self) -> usize {
        self.num_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    pub fn num_buckets(&self) -> u32 {
        self.store.num_buckets()
    }

    pub fn byte_size(&self) -> u64 {
        18 + self.store.as_bytes().len() as u64
    }

    pub fn key_size(&self) -> u8 {
        self.store.key_size()
    }

    pub fn value_size(&self) -> u8 {
        self.store.value_size()
    }
}
