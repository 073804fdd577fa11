//! Dictionary variant for variable-length byte strings.

use std::hash::BuildHasher;

use ahash::RandomState;
use hashbrown::HashMap;
use hashbrown::hash_map::RawEntryMut;
use lamina_bytes::buffer::AlignedByteVec;
use lamina_common::{Result, error::Error};
use lamina_sequence::{offsets::Offsets, values::Values};

use crate::value::{PhysicalType, Value, ValueKind};

/// Size of the little-endian `u32` length prefix of each record.
pub const LENGTH_SIZE: usize = 4;

/// Values materialised per block during a bounds scan.
const BOUNDS_BLOCK: usize = 64;

/// Interning dictionary over variable-length byte strings.
///
/// Values live in a flat buffer of `(length: u32 LE, bytes)` records,
/// appended in intern order; `offsets` records where each record's length
/// word begins. The reverse index is a raw-entry hash map keyed by code:
/// hash and equality resolve through the flat buffer at the stored offset,
/// so buffer growth never invalidates the map and the keys' lifetime is
/// exactly the value store's.
#[derive(Clone)]
pub struct BinaryDictionary {
    values: AlignedByteVec,
    offsets: Offsets,
    hasher: RandomState,
    index: Option<HashMap<i32, (), ()>>,
    column_index: i16,
}

impl BinaryDictionary {
    pub fn new(column: usize) -> BinaryDictionary {
        Self::with_capacity(column, 0)
    }

    pub fn with_capacity(column: usize, capacity: usize) -> BinaryDictionary {
        BinaryDictionary {
            values: AlignedByteVec::new(),
            offsets: Offsets::with_capacity(capacity),
            hasher: RandomState::new(),
            index: None,
            column_index: !(column as i16),
        }
    }

    /// Seeds the dictionary from an existing flat record buffer, pushing one
    /// offset per record. `num_values` serves as a capacity hint; the actual
    /// length is the number of well-formed records. The reverse index is not
    /// built.
    pub fn from_values(
        column: usize,
        num_values: usize,
        values: Values,
    ) -> Result<BinaryDictionary> {
        let values = values.into_inner();
        let mut offsets = Offsets::with_capacity(num_values);

        let mut i = 0;
        while i < values.len() {
            if i + LENGTH_SIZE > values.len() {
                return Err(Error::invalid_format("byte array dictionary buffer"));
            }
            let len = record_length(&values, i as u32);
            if i + LENGTH_SIZE + len > values.len() {
                return Err(Error::invalid_format("byte array dictionary buffer"));
            }
            offsets.push(i as u32);
            i += LENGTH_SIZE + len;
        }

        Ok(BinaryDictionary {
            values,
            offsets,
            hasher: RandomState::new(),
            index: None,
            column_index: !(column as i16),
        })
    }

    pub fn physical_type(&self) -> PhysicalType {
        PhysicalType::ByteArray
    }

    pub(crate) fn column_tag(&self) -> i16 {
        self.column_index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.item_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the byte string interned at `code`.
    ///
    /// The returned slice aliases the dictionary's flat buffer; it remains
    /// valid until the dictionary is mutated or reset.
    ///
    /// # Panics
    ///
    /// Panics if `code` is negative or not less than `len()`.
    #[inline]
    pub fn value_at(&self, code: i32) -> &[u8] {
        let code = super::primitive::checked_code(code);
        record_bytes(&self.values, self.offsets.offset_at(code))
    }

    /// The flat record buffer, in intern order.
    pub(crate) fn flat_bytes(&self) -> &[u8] {
        &self.values
    }

    pub(crate) fn make_value(&self, code: i32) -> Value<'_> {
        Value::with_column_tag(ValueKind::ByteArray(self.value_at(code)), self.column_index)
    }

    /// Interns each input byte string, writing its code to the corresponding
    /// slot of `codes`. Previously interned strings keep their original code.
    ///
    /// # Panics
    ///
    /// Panics if `codes` is shorter than `values`.
    pub fn insert_bytes(&mut self, codes: &mut [i32], values: &[&[u8]]) {
        self.insert_with(codes, values.len(), |i| values[i]);
    }

    pub(crate) fn insert_with<'v>(
        &mut self,
        codes: &mut [i32],
        count: usize,
        value_at: impl Fn(usize) -> &'v [u8],
    ) {
        assert!(
            codes.len() >= count,
            "dictionary insert with fewer codes than values"
        );
        self.ensure_index();

        let values = &mut self.values;
        let offsets = &mut self.offsets;
        let hasher = &self.hasher;
        let index = self.index.as_mut().expect("reverse index");

        for (i, code) in codes.iter_mut().enumerate().take(count) {
            let value = value_at(i);
            let hash = hasher.hash_one(value);

            let entry = index.raw_entry_mut().from_hash(hash, |&existing| {
                record_bytes(values, offsets.offset_at(existing as usize)) == value
            });

            *code = match entry {
                RawEntryMut::Occupied(entry) => *entry.into_key(),
                RawEntryMut::Vacant(entry) => {
                    let next = offsets.item_count() as i32;
                    let offset = values.len() as u32;
                    values.extend_from_slice(&(value.len() as u32).to_le_bytes());
                    values.extend_from_slice(value);
                    offsets.push(offset);
                    // The stored hash is recomputed from the bytes just
                    // written into the flat buffer, never the caller's.
                    *entry
                        .insert_with_hasher(hash, next, (), |&code| {
                            hasher.hash_one(record_bytes(
                                values,
                                offsets.offset_at(code as usize),
                            ))
                        })
                        .0
                }
            };
        }
    }

    fn ensure_index(&mut self) {
        if self.index.is_some() {
            return;
        }
        let mut index =
            HashMap::with_capacity_and_hasher(self.offsets.capacity(), ());
        let values = &self.values;
        let offsets = &self.offsets;
        let hasher = &self.hasher;

        for code in 0..offsets.item_count() {
            let bytes = record_bytes(values, offsets.offset_at(code));
            let hash = hasher.hash_one(bytes);
            match index.raw_entry_mut().from_hash(hash, |&existing| {
                record_bytes(values, offsets.offset_at(existing as usize)) == bytes
            }) {
                RawEntryMut::Occupied(mut entry) => {
                    // Duplicate record in a seeded buffer: the last one wins.
                    *entry.key_mut() = code as i32;
                }
                RawEntryMut::Vacant(entry) => {
                    entry.insert_with_hasher(hash, code as i32, (), |&c| {
                        hasher.hash_one(record_bytes(values, offsets.offset_at(c as usize)))
                    });
                }
            }
        }
        self.index = Some(index);
    }

    /// Materialises each code into the corresponding slot of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `codes`, or on an invalid code.
    pub fn lookup_bytes<'a>(&'a self, codes: &[i32], out: &mut [&'a [u8]]) {
        assert!(
            out.len() >= codes.len(),
            "dictionary lookup with more codes than output slots"
        );
        for (slot, &code) in out.iter_mut().zip(codes) {
            *slot = self.value_at(code);
        }
    }

    /// Returns (min, max) of the byte strings referenced by `codes` under
    /// lexicographic ordering, or `None` for empty input.
    ///
    /// Values are materialised in blocks to amortise the per-element call
    /// overhead of the scan.
    pub fn bounds_of(&self, codes: &[i32]) -> Option<(&[u8], &[u8])> {
        let (&first, rest) = codes.split_first()?;
        let mut min = self.value_at(first);
        let mut max = min;
        let mut block: [&[u8]; BOUNDS_BLOCK] = [&[]; BOUNDS_BLOCK];

        for chunk in rest.chunks(BOUNDS_BLOCK) {
            let block = &mut block[..chunk.len()];
            self.lookup_bytes(chunk, block);
            for &value in block.iter() {
                if value < min {
                    min = value;
                } else if value > max {
                    max = value;
                }
            }
        }
        Some((min, max))
    }

    /// Removes all values and drops the reverse index, keeping capacity.
    pub fn reset(&mut self) {
        self.values.clear();
        self.offsets.clear();
        self.index = None;
    }
}

#[inline]
fn record_length(values: &[u8], offset: u32) -> usize {
    let offset = offset as usize;
    let prefix: [u8; LENGTH_SIZE] = values[offset..offset + LENGTH_SIZE]
        .try_into()
        .expect("length prefix");
    u32::from_le_bytes(prefix) as usize
}

#[inline]
fn record_bytes(values: &[u8], offset: u32) -> &[u8] {
    let len = record_length(values, offset);
    let start = offset as usize + LENGTH_SIZE;
    &values[start..start + len]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(dict: &mut BinaryDictionary, values: &[&[u8]]) -> Vec<i32> {
        let mut codes = vec![0i32; values.len()];
        dict.insert_bytes(&mut codes, values);
        codes
    }

    #[test]
    fn test_insert_dedup_and_flat_format() {
        let mut dict = BinaryDictionary::new(0);
        let codes = insert(&mut dict, &[b"apple", b"banana", b"apple", b"cherry"]);
        assert_eq!(codes, [0, 1, 0, 2]);
        assert_eq!(dict.len(), 3);

        let mut expected = Vec::new();
        for v in [&b"apple"[..], b"banana", b"cherry"] {
            expected.extend_from_slice(&(v.len() as u32).to_le_bytes());
            expected.extend_from_slice(v);
        }
        assert_eq!(dict.flat_bytes(), expected.as_slice());
    }

    #[test]
    fn test_duplicates_across_sources_share_entry() {
        let mut dict = BinaryDictionary::new(0);
        let owned = b"apple".to_vec();
        let codes = insert(&mut dict, &[b"apple", owned.as_slice()]);
        assert_eq!(codes, [0, 0]);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_empty_value() {
        let mut dict = BinaryDictionary::new(0);
        let codes = insert(&mut dict, &[b"", b"x", b""]);
        assert_eq!(codes, [0, 1, 0]);
        assert_eq!(dict.value_at(0), b"");
    }

    #[test]
    fn test_seed_round_trip() {
        let mut dict = BinaryDictionary::new(0);
        insert(&mut dict, &[b"one", b"two", b"three"]);

        let mut store = Values::new();
        store.extend_from_byte_slice(dict.flat_bytes());
        let mut seeded = BinaryDictionary::from_values(0, 3, store).unwrap();
        assert_eq!(seeded.len(), 3);
        assert_eq!(seeded.value_at(0), b"one");
        assert_eq!(seeded.value_at(2), b"three");
        assert!(seeded.index.is_none());

        // Interning a known value after a seed reuses its code.
        let codes = insert(&mut seeded, &[b"two", b"four"]);
        assert_eq!(codes, [1, 3]);
    }

    #[test]
    fn test_seed_rejects_truncated_buffer() {
        let mut store = Values::new();
        store.extend_from_byte_slice(&(10u32).to_le_bytes());
        store.extend_from_byte_slice(b"abc");
        assert!(BinaryDictionary::from_values(0, 1, store).is_err());
    }

    #[test]
    fn test_bounds_block_scan() {
        let mut dict = BinaryDictionary::new(0);
        let strings: Vec<String> = (0..200).map(|i| format!("key-{i:04}")).collect();
        let views: Vec<&[u8]> = strings.iter().map(|s| s.as_bytes()).collect();
        let codes = insert(&mut dict, &views);

        let (min, max) = dict.bounds_of(&codes).unwrap();
        assert_eq!(min, b"key-0000");
        assert_eq!(max, b"key-0199");
        assert_eq!(dict.bounds_of(&[]), None);
    }

    #[test]
    fn test_reset_and_reuse() {
        let mut dict = BinaryDictionary::new(0);
        insert(&mut dict, &[b"a", b"b"]);
        dict.reset();
        assert_eq!(dict.len(), 0);
        let codes = insert(&mut dict, &[b"b"]);
        assert_eq!(codes, [0]);
    }
}
