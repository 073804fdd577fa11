//! Dictionary variant for fixed-length byte strings.

use std::hash::BuildHasher;

use ahash::RandomState;
use hashbrown::HashMap;
use hashbrown::hash_map::RawEntryMut;
use lamina_bytes::buffer::AlignedByteVec;
use lamina_common::{Result, verify_data};
use lamina_sequence::values::Values;

use crate::value::{PhysicalType, Value, ValueKind};

/// Values materialised per block during a bounds scan.
const BOUNDS_BLOCK: usize = 64;

/// Interning dictionary over byte strings of a fixed element size.
///
/// Storage is a flat buffer advancing `size` bytes per interned value; the
/// value at code `i` occupies `data[i * size..(i + 1) * size]`. The reverse
/// index follows the same code-keyed raw-entry scheme as the variable-length
/// variant.
#[derive(Clone)]
pub struct FixedBinaryDictionary {
    data: AlignedByteVec,
    size: usize,
    hasher: RandomState,
    index: Option<HashMap<i32, (), ()>>,
    column_index: i16,
}

impl FixedBinaryDictionary {
    pub fn new(column: usize, size: usize) -> FixedBinaryDictionary {
        Self::with_capacity(column, size, 0)
    }

    pub fn with_capacity(column: usize, size: usize, capacity: usize) -> FixedBinaryDictionary {
        assert!(size > 0, "fixed length byte array size must be positive");
        FixedBinaryDictionary {
            data: AlignedByteVec::with_capacity(capacity * size),
            size,
            hasher: RandomState::new(),
            index: None,
            column_index: !(column as i16),
        }
    }

    /// Seeds the dictionary with the first `num_values` elements of an
    /// existing store. The reverse index is not built.
    pub fn from_values(
        column: usize,
        size: usize,
        num_values: usize,
        values: Values,
    ) -> Result<FixedBinaryDictionary> {
        assert!(size > 0, "fixed length byte array size must be positive");
        let mut data = values.into_inner();
        verify_data!(num_values, data.len() >= num_values * size);
        data.truncate(num_values * size);
        Ok(FixedBinaryDictionary {
            data,
            size,
            hasher: RandomState::new(),
            index: None,
            column_index: !(column as i16),
        })
    }

    pub fn physical_type(&self) -> PhysicalType {
        PhysicalType::FixedLenByteArray(self.size)
    }

    pub(crate) fn column_tag(&self) -> i16 {
        self.column_index
    }

    /// Element size in bytes, fixed at construction.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the byte string interned at `code`.
    ///
    /// The returned slice aliases the dictionary's buffer; it remains valid
    /// until the dictionary is mutated or reset.
    ///
    /// # Panics
    ///
    /// Panics if `code` is negative or not less than `len()`.
    #[inline]
    pub fn value_at(&self, code: i32) -> &[u8] {
        let code = super::primitive::checked_code(code);
        element(&self.data, self.size, code)
    }

    pub(crate) fn flat_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn make_value(&self, code: i32) -> Value<'_> {
        Value::with_column_tag(
            ValueKind::FixedLenByteArray(self.value_at(code)),
            self.column_index,
        )
    }

    /// Interns each input byte string, writing its code to the corresponding
    /// slot of `codes`. Previously interned strings keep their original code.
    ///
    /// # Panics
    ///
    /// Panics if `codes` is shorter than `values`, or if an input's length
    /// differs from the dictionary's element size.
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

        let size = self.size;
        let data = &mut self.data;
        let hasher = &self.hasher;
        let index = self.index.as_mut().expect("reverse index");

        for (i, code) in codes.iter_mut().enumerate().take(count) {
            let value = value_at(i);
            assert!(
                value.len() == size,
                "fixed length byte array value of length {} inserted into dictionary of size {size}",
                value.len(),
            );
            let hash = hasher.hash_one(value);

            let entry = index.raw_entry_mut().from_hash(hash, |&existing| {
                element(data, size, existing as usize) == value
            });

            *code = match entry {
                RawEntryMut::Occupied(entry) => *entry.into_key(),
                RawEntryMut::Vacant(entry) => {
                    let next = (data.len() / size) as i32;
                    data.extend_from_slice(value);
                    *entry
                        .insert_with_hasher(hash, next, (), |&code| {
                            hasher.hash_one(element(data, size, code as usize))
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
            HashMap::with_capacity_and_hasher(self.data.capacity() / self.size, ());
        let data = &self.data;
        let size = self.size;
        let hasher = &self.hasher;

        for code in 0..self.data.len() / size {
            let bytes = element(data, size, code);
            let hash = hasher.hash_one(bytes);
            match index.raw_entry_mut().from_hash(hash, |&existing| {
                element(data, size, existing as usize) == bytes
            }) {
                RawEntryMut::Occupied(mut entry) => {
                    // Duplicate element in a seeded buffer: the last one wins.
                    *entry.key_mut() = code as i32;
                }
                RawEntryMut::Vacant(entry) => {
                    entry.insert_with_hasher(hash, code as i32, (), |&c| {
                        hasher.hash_one(element(data, size, c as usize))
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
        self.data.clear();
        self.index = None;
    }
}

#[inline]
fn element(data: &[u8], size: usize, code: usize) -> &[u8] {
    &data[code * size..(code + 1) * size]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(dict: &mut FixedBinaryDictionary, values: &[&[u8]]) -> Vec<i32> {
        let mut codes = vec![0i32; values.len()];
        dict.insert_bytes(&mut codes, values);
        codes
    }

    #[test]
    fn test_insert_dedup() {
        let mut dict = FixedBinaryDictionary::new(0, 4);
        let codes = insert(&mut dict, &[b"aaaa", b"bbbb", b"aaaa"]);
        assert_eq!(codes, [0, 1, 0]);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.value_at(1), b"bbbb");
        assert_eq!(dict.flat_bytes(), b"aaaabbbb");
    }

    #[test]
    #[should_panic(expected = "length 3 inserted into dictionary of size 4")]
    fn test_size_mismatch_panics() {
        let mut dict = FixedBinaryDictionary::new(0, 4);
        insert(&mut dict, &[b"abc"]);
    }

    #[test]
    fn test_seed_and_intern() {
        let mut store = Values::new();
        store.extend_from_byte_slice(b"aaaabbbbcccc");
        let mut dict = FixedBinaryDictionary::from_values(0, 4, 2, store).unwrap();
        assert_eq!(dict.len(), 2);

        let codes = insert(&mut dict, &[b"bbbb", b"dddd"]);
        assert_eq!(codes, [1, 2]);
    }

    #[test]
    fn test_seed_rejects_short_buffer() {
        let mut store = Values::new();
        store.extend_from_byte_slice(b"aaaabb");
        assert!(FixedBinaryDictionary::from_values(0, 4, 2, store).is_err());
    }

    #[test]
    fn test_bounds() {
        let mut dict = FixedBinaryDictionary::new(0, 2);
        let codes = insert(&mut dict, &[b"bb", b"aa", b"cc", b"bb"]);
        let (min, max) = dict.bounds_of(&codes).unwrap();
        assert_eq!(min, b"aa");
        assert_eq!(max, b"cc");
    }

    #[test]
    fn test_reset() {
        let mut dict = FixedBinaryDictionary::new(0, 3);
        insert(&mut dict, &[b"xyz"]);
        dict.reset();
        assert_eq!(dict.len(), 0);
        let codes = insert(&mut dict, &[b"abc"]);
        assert_eq!(codes, [0]);
    }
}
