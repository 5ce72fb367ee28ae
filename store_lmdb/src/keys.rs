//! Composite key layout and prefix scans.
//!
//! Owner ids and record ids are encoded big-endian so that LMDB's
//! lexicographic key order matches numeric order, which makes
//! "all records of an owner, oldest first" a single prefix range-scan.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};

use cvup_types::{DocumentType, OwnerId};

use crate::LmdbError;

/// `owner_be ++ id_be`
pub(crate) fn owner_index_key(owner: OwnerId, id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&owner.to_be_bytes());
    key[8..].copy_from_slice(&id.to_be_bytes());
    key
}

/// `owner_be ++ document_type_tag`
pub(crate) fn completed_key(owner: OwnerId, document_type: DocumentType) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[..8].copy_from_slice(&owner.to_be_bytes());
    key[8] = document_type.tag();
    key
}

/// Smallest key greater than every key starting with `prefix`, or `None`
/// when the prefix is all `0xFF` (scan to the end of the database).
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.last_mut() {
        if *last < u8::MAX {
            *last += 1;
            return Some(upper);
        }
        upper.pop();
    }
    None
}

/// Collect all `(key, value)` pairs whose key starts with `prefix`, in key order.
pub(crate) fn scan_prefix(
    db: &Database<Bytes, Bytes>,
    rtxn: &RoTxn<'_>,
    prefix: &[u8],
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LmdbError> {
    let upper = prefix_upper_bound(prefix);
    let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (
        Bound::Included(prefix),
        match upper.as_deref() {
            Some(u) => Bound::Excluded(u),
            None => Bound::Unbounded,
        },
    );
    let iter = db.range(rtxn, &bounds)?;
    let mut results = Vec::new();
    for entry in iter {
        let (key, val) = entry?;
        results.push((key.to_vec(), val.to_vec()));
    }
    Ok(results)
}

/// Values of [`scan_prefix`].
pub(crate) fn scan_prefix_values(
    db: &Database<Bytes, Bytes>,
    rtxn: &RoTxn<'_>,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>, LmdbError> {
    Ok(scan_prefix(db, rtxn, prefix)?
        .into_iter()
        .map(|(_, val)| val)
        .collect())
}

/// Reserve the next value of a monotonic counter stored in `meta_db`.
///
/// Counters start at 1. Must be called inside the write transaction that
/// also persists the record using the id.
pub(crate) fn allocate_id(
    meta_db: &Database<Bytes, Bytes>,
    wtxn: &mut RwTxn<'_>,
    counter_key: &[u8],
) -> Result<u64, LmdbError> {
    let next = match meta_db.get(wtxn, counter_key)? {
        Some(bytes) => {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                LmdbError::Corruption(format!(
                    "counter '{}' has unexpected byte length",
                    String::from_utf8_lossy(counter_key)
                ))
            })?;
            u64::from_le_bytes(arr)
        }
        None => 1,
    };
    meta_db.put(wtxn, counter_key, &(next + 1).to_le_bytes())?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_bound_increments_last_byte() {
        assert_eq!(prefix_upper_bound(&[0, 1, 2]), Some(vec![0, 1, 3]));
    }

    #[test]
    fn upper_bound_carries_over_max_bytes() {
        assert_eq!(prefix_upper_bound(&[0, 1, 0xFF]), Some(vec![0, 2]));
        assert_eq!(prefix_upper_bound(&[0xFF, 0xFF]), None);
    }

    #[test]
    fn owner_keys_sort_by_owner_then_id() {
        let a = owner_index_key(OwnerId::new(1), 300);
        let b = owner_index_key(OwnerId::new(2), 1);
        let c = owner_index_key(OwnerId::new(1), 2);
        assert!(c < a && a < b);
    }

    #[test]
    fn completed_keys_differ_per_type() {
        let owner = OwnerId::new(42);
        assert_ne!(
            completed_key(owner, DocumentType::Junior),
            completed_key(owner, DocumentType::Senior)
        );
    }
}
