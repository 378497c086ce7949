/// Binary on-disk format: an 18-byte packed little-endian header followed
/// by the raw AoS bucket array, written and read in one shot (no mmap,
/// no incremental flush).
///
/// ```text
/// offset  size  field
/// 0       8     magic b"BORG_IDX"
/// 8       4     num_entries: i32
/// 12      4     num_buckets: i32
/// 16      1     key_size: i8
/// 17      1     value_size: i8
/// 18      ..    bucket region, num_buckets * (key_size + value_size) bytes
/// ```
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::bucket::BucketStore;
use crate::error::{HashIndexError, Result};

const MAGIC: &[u8; 8] = b"BORG_IDX";
const HEADER_LEN: usize = 18;

pub struct Header {
    pub num_entries: i32,
    pub num_buckets: i32,
    pub key_size: i8,
    pub value_size: i8,
}

fn io_err(path: &Path, source: std::io::Error) -> HashIndexError {
    HashIndexError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a header and bucket store from `path`, validating magic and
/// overall file length against the header's own claims.
pub fn read(path: &Path) -> Result<(Header, BucketStore)> {
    let mut file = fs::File::open(path).map_err(|e| io_err(path, e))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(|e| io_err(path, e))?;

    if buf.len() < HEADER_LEN || &buf[0..8] != MAGIC {
        return Err(HashIndexError::BadMagic {
            path: path.to_path_buf(),
        });
    }

    let num_entries = i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    let num_buckets = i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);
    let key_size = buf[16] as i8;
    let value_size = buf[17] as i8;

    let bucket_size = BucketStore::bucket_size(key_size as u8, value_size as u8);
    let expected_len = HEADER_LEN as u64 + num_buckets as u64 * bucket_size as u64;
    let actual_len = buf.len() as u64;
    if expected_len != actual_len {
        return Err(HashIndexError::LengthMismatch {
            path: path.to_path_buf(),
            expected: expected_len,
            actual: actual_len,
        });
    }

    let data = buf[HEADER_LEN..].to_vec();
    let store = BucketStore::from_raw(data, num_buckets as u32, key_size as u8, value_size as u8);

    Ok((
        Header {
            num_entries,
            num_buckets,
            key_size,
            value_size,
        },
        store,
    ))
}

/// Write `header` and `store` to `path` as a single buffer, overwriting
/// any existing file.
pub fn write(path: &Path, header: &Header, store: &BucketStore) -> Result<()> {
    let mut buf = Vec::with_capacity(HEADER_LEN + store.as_bytes().len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&header.num_entries.to_le_bytes());
    buf.extend_from_slice(&header.num_buckets.to_le_bytes());
    buf.push(header.key_size as u8);
    buf.push(header.value_size as u8);
    buf.extend_from_slice(store.as_bytes());

    let mut file = fs::File::create(path).map_err(|e| io_err(path, e))?;
    file.write_all(&buf).map_err(|e| io_err(path, e))?;
    Ok(())
}
