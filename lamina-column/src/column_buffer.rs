//! Append-oriented builder producing dictionary-encoded pages.

use std::borrow::Cow;
use std::cmp::Ordering;

use lamina_common::{Result, error::Error};

use crate::dictionary::{Dictionary, DictionaryValue};
use crate::page::IndexedPage;
use crate::value::{PhysicalType, Value};

/// A row materialised out of column buffers.
pub type Row<'a> = Vec<Value<'a>>;

/// Probabilistic membership sketch attached by the writer layer.
pub trait BloomFilter {
    fn check(&self, value: &Value<'_>) -> bool;
}

/// Column buffer that interns written values into a parent dictionary and
/// accumulates their codes, producing an [`IndexedPage`] on demand.
///
/// The buffer owns its dictionary; pages and read-back values borrow it, so
/// the buffer cannot be written while any of them are live. Rows can be
/// reordered in place under the value ordering through [`is_less`] and
/// [`swap`], which only ever move codes.
///
/// [`is_less`]: IndexedColumnBuffer::is_less
/// [`swap`]: IndexedColumnBuffer::swap
#[derive(Clone)]
pub struct IndexedColumnBuffer {
    dict: Dictionary,
    codes: Vec<i32>,
}

impl IndexedColumnBuffer {
    /// Creates an empty buffer for the given physical type with room for
    /// `capacity` rows.
    pub fn new(physical_type: PhysicalType, column: usize, capacity: usize) -> IndexedColumnBuffer {
        IndexedColumnBuffer {
            dict: physical_type.new_dictionary(column),
            codes: Vec::with_capacity(capacity),
        }
    }

    /// Creates an empty buffer appending into an existing dictionary.
    pub fn with_dictionary(dict: Dictionary, capacity: usize) -> IndexedColumnBuffer {
        IndexedColumnBuffer {
            dict,
            codes: Vec::with_capacity(capacity),
        }
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.dict.physical_type()
    }

    /// Ordinal of the column this buffer builds.
    pub fn column(&self) -> i32 {
        self.dict.column()
    }

    /// Number of rows written.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Number of rows the code array can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.codes.capacity()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dict
    }

    /// Appends one code per input value, interning each value through the
    /// dictionary. Returns the number of values written.
    ///
    /// # Panics
    ///
    /// Panics if a value's kind does not match the buffer's physical type.
    pub fn write_values(&mut self, values: &[Value<'_>]) -> Result<usize> {
        let start = self.grow_tail(values.len());
        self.dict.insert(&mut self.codes[start..], values);
        Ok(values.len())
    }

    /// Typed bulk write for fixed-width values; the hot path when the
    /// caller's data is already a native array.
    pub fn write_slice<T: DictionaryValue>(&mut self, values: &[T]) -> Result<usize> {
        let start = self.grow_tail(values.len());
        match self.dict.insert_values(&mut self.codes[start..], values) {
            Ok(()) => Ok(values.len()),
            Err(err) => {
                self.codes.truncate(start);
                Err(err)
            }
        }
    }

    /// Typed bulk write for byte strings.
    pub fn write_bytes(&mut self, values: &[&[u8]]) -> Result<usize> {
        let start = self.grow_tail(values.len());
        match self.dict.insert_bytes(&mut self.codes[start..], values) {
            Ok(()) => Ok(values.len()),
            Err(err) => {
                self.codes.truncate(start);
                Err(err)
            }
        }
    }

    /// Typed bulk write for booleans.
    pub fn write_booleans(&mut self, values: &[bool]) -> Result<usize> {
        let start = self.grow_tail(values.len());
        match self.dict.insert_booleans(&mut self.codes[start..], values) {
            Ok(()) => Ok(values.len()),
            Err(err) => {
                self.codes.truncate(start);
                Err(err)
            }
        }
    }

    fn grow_tail(&mut self, count: usize) -> usize {
        let start = self.codes.len();
        self.codes.resize(start + count, 0);
        start
    }

    /// Materialises rows starting at `offset` into `out`, returning the
    /// number filled. A count smaller than `out.len()` means the last row
    /// was reached; the terminal end-of-sequence condition surfaces on the
    /// next call, once `offset` is at or past the end.
    pub fn read_values_at<'a>(&'a self, out: &mut [Value<'a>], offset: usize) -> Result<usize> {
        if offset >= self.codes.len() {
            return Err(Error::end_of_sequence());
        }
        let n = out.len().min(self.codes.len() - offset);
        let tag = self.dict.column_tag();
        for (slot, &code) in out[..n].iter_mut().zip(&self.codes[offset..offset + n]) {
            let mut value = self.dict.index(code);
            value.set_column_tag(tag);
            *slot = value;
        }
        Ok(n)
    }

    /// Appends the value of the row at `index` to `row`.
    ///
    /// An `index` at or past the end is the terminal end-of-sequence
    /// condition.
    pub fn read_row_at<'a>(&'a self, row: &mut Row<'a>, index: usize) -> Result<()> {
        if index >= self.codes.len() {
            return Err(Error::end_of_sequence());
        }
        let mut value = self.dict.index(self.codes[index]);
        value.set_column_tag(self.dict.column_tag());
        row.push(value);
        Ok(())
    }

    /// Orders rows `i` and `j` by their materialised values, not by their
    /// codes.
    pub fn is_less(&self, i: usize, j: usize) -> bool {
        let u = self.dict.index(self.codes[i]);
        let v = self.dict.index(self.codes[j]);
        self.dict.physical_type().compare(&u, &v) == Ordering::Less
    }

    /// Swaps rows `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.codes.swap(i, j);
    }

    /// Sorts the buffer in place under the value ordering.
    pub fn sort(&mut self) {
        let dict = &self.dict;
        let physical_type = dict.physical_type();
        self.codes
            .sort_by(|&a, &b| physical_type.compare(&dict.index(a), &dict.index(b)));
    }

    /// Returns the page of codes accumulated so far.
    pub fn page(&self) -> IndexedPage<'_> {
        IndexedPage::from_codes(&self.dict, self.column() as usize, Cow::Borrowed(&self.codes))
    }

    /// All pages of this buffer; always exactly one.
    pub fn pages(&self) -> std::iter::Once<IndexedPage<'_>> {
        std::iter::once(self.page())
    }

    /// One-page column index summary.
    pub fn column_index(&self) -> IndexedColumnIndex<'_> {
        IndexedColumnIndex { buffer: self }
    }

    /// One-page offset index summary.
    pub fn offset_index(&self) -> IndexedOffsetIndex<'_> {
        IndexedOffsetIndex { buffer: self }
    }

    /// Dictionary-encoded buffers never carry a bloom filter.
    pub fn bloom_filter(&self) -> Option<&dyn BloomFilter> {
        None
    }

    /// Clears the code array, leaving the dictionary untouched.
    pub fn reset(&mut self) {
        self.codes.clear();
    }
}

/// Single-page column index projection of an [`IndexedColumnBuffer`].
///
/// A pure view; min/max delegate to the page bounds and the orderedness
/// flags are decided by comparing them.
pub struct IndexedColumnIndex<'a> {
    buffer: &'a IndexedColumnBuffer,
}

impl<'a> IndexedColumnIndex<'a> {
    pub fn num_pages(&self) -> usize {
        1
    }

    pub fn null_count(&self, _page: usize) -> u64 {
        0
    }

    pub fn null_page(&self, _page: usize) -> bool {
        false
    }

    pub fn min_value(&self, _page: usize) -> Option<Value<'a>> {
        self.bounds().map(|(min, _)| min)
    }

    pub fn max_value(&self, _page: usize) -> Option<Value<'a>> {
        self.bounds().map(|(_, max)| max)
    }

    pub fn is_ascending(&self) -> bool {
        self.bounds_ordering() != Ordering::Greater
    }

    pub fn is_descending(&self) -> bool {
        self.bounds_ordering() == Ordering::Greater
    }

    fn bounds(&self) -> Option<(Value<'a>, Value<'a>)> {
        self.buffer.dict.bounds(&self.buffer.codes)
    }

    fn bounds_ordering(&self) -> Ordering {
        match self.bounds() {
            Some((min, max)) => self.buffer.physical_type().compare(&min, &max),
            None => Ordering::Equal,
        }
    }
}

/// Single-page offset index projection of an [`IndexedColumnBuffer`].
pub struct IndexedOffsetIndex<'a> {
    buffer: &'a IndexedColumnBuffer,
}

impl IndexedOffsetIndex<'_> {
    pub fn num_pages(&self) -> usize {
        1
    }

    pub fn offset(&self, _page: usize) -> u64 {
        0
    }

    pub fn compressed_page_size(&self, _page: usize) -> u64 {
        4 * self.buffer.codes.len() as u64
    }

    pub fn first_row_index(&self, _page: usize) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::BufferedPage;

    #[test]
    fn test_write_and_page_round_trip() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::Int32, 0, 0);
        buffer.write_slice(&[100i32, 200, 100]).unwrap();
        assert_eq!(buffer.len(), 3);

        let page = buffer.page();
        assert_eq!(bytemuck::cast_slice::<u8, i32>(page.data()), &[0, 1, 0]);

        let mut cursor = page.values();
        let mut out = [Value::default(); 3];
        assert_eq!(cursor.read_values(&mut out).unwrap(), 3);
        let read: Vec<i32> = out.iter().map(|v| v.as_i32()).collect();
        assert_eq!(read, [100, 200, 100]);
    }

    #[test]
    fn test_write_values_matches_typed_path() {
        let mut typed = IndexedColumnBuffer::new(PhysicalType::Uint32, 0, 0);
        typed.write_slice(&[5u32, 6, 5, 7]).unwrap();

        let mut boxed = IndexedColumnBuffer::new(PhysicalType::Uint32, 0, 0);
        let values: Vec<Value<'_>> = [5u32, 6, 5, 7].iter().map(|&v| Value::uint32(v)).collect();
        boxed.write_values(&values).unwrap();

        assert_eq!(typed.codes, boxed.codes);
    }

    #[test]
    fn test_type_mismatch_leaves_buffer_unchanged() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::Int32, 0, 0);
        buffer.write_slice(&[1i32]).unwrap();
        assert!(buffer.write_slice(&[1i64, 2]).is_err());
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.dictionary().len(), 1);
    }

    #[test]
    fn test_read_values_at() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::Int64, 3, 0);
        buffer.write_slice(&[10i64, 20, 30]).unwrap();

        let mut out = [Value::default(); 2];
        assert_eq!(buffer.read_values_at(&mut out, 1).unwrap(), 2);
        assert_eq!(out[0].as_i64(), 20);
        assert_eq!(out[1].as_i64(), 30);
        assert_eq!(out[0].column(), 3);

        // A short count means the last row was reached; the terminal
        // condition surfaces on the next call.
        assert_eq!(buffer.read_values_at(&mut out, 2).unwrap(), 1);
        assert!(
            buffer
                .read_values_at(&mut out, 3)
                .is_err_and(|e| e.is_end_of_sequence())
        );
    }

    #[test]
    fn test_read_row_at() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::ByteArray, 0, 0);
        buffer.write_bytes(&[b"left", b"right"]).unwrap();

        // Reading row by row until the terminal condition yields every row.
        let mut row = Row::new();
        let mut index = 0;
        loop {
            match buffer.read_row_at(&mut row, index) {
                Ok(()) => index += 1,
                Err(err) => {
                    assert!(err.is_end_of_sequence());
                    break;
                }
            }
        }
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].as_bytes(), b"left");
        assert_eq!(row[1].as_bytes(), b"right");
    }

    #[test]
    fn test_sort_by_materialised_values() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::ByteArray, 0, 0);
        buffer.write_bytes(&[b"c", b"a", b"b"]).unwrap();
        assert_eq!(buffer.codes, [0, 1, 2]);

        buffer.sort();
        assert_eq!(buffer.codes, [1, 2, 0]);

        let mut out = [Value::default(); 3];
        buffer.read_values_at(&mut out, 0).unwrap();
        let read: Vec<&[u8]> = out.iter().map(|v| v.as_bytes()).collect();
        assert_eq!(read, [&b"a"[..], b"b", b"c"]);
    }

    #[test]
    fn test_less_swap_sorting_contract() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::Int32, 0, 0);
        buffer.write_slice(&[3i32, 1, 2]).unwrap();

        // Selection sort through the public contract only.
        for i in 0..buffer.len() {
            for j in i + 1..buffer.len() {
                if buffer.is_less(j, i) {
                    buffer.swap(i, j);
                }
            }
        }
        let mut out = [Value::default(); 3];
        buffer.read_values_at(&mut out, 0).unwrap();
        let read: Vec<i32> = out.iter().map(|v| v.as_i32()).collect();
        assert_eq!(read, [1, 2, 3]);
    }

    #[test]
    fn test_reset_keeps_dictionary() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::Int32, 0, 0);
        buffer.write_slice(&[1i32, 2]).unwrap();
        buffer.reset();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.dictionary().len(), 2);

        // Codes assigned before the reset stay valid.
        buffer.write_slice(&[2i32]).unwrap();
        assert_eq!(buffer.codes, [1]);
    }

    #[test]
    fn test_clone_deep_copies_codes() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::Int32, 0, 0);
        buffer.write_slice(&[1i32, 2]).unwrap();
        let mut copy = buffer.clone();
        copy.write_slice(&[3i32]).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(copy.len(), 3);
    }

    #[test]
    fn test_projections() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::Int32, 0, 0);
        buffer.write_slice(&[1i32, 5, 3]).unwrap();

        let column_index = buffer.column_index();
        assert_eq!(column_index.num_pages(), 1);
        assert_eq!(column_index.null_count(0), 0);
        assert!(!column_index.null_page(0));
        assert_eq!(column_index.min_value(0).unwrap().as_i32(), 1);
        assert_eq!(column_index.max_value(0).unwrap().as_i32(), 5);
        assert!(column_index.is_ascending());
        assert!(!column_index.is_descending());

        let offset_index = buffer.offset_index();
        assert_eq!(offset_index.num_pages(), 1);
        assert_eq!(offset_index.offset(0), 0);
        assert_eq!(offset_index.compressed_page_size(0), 12);
        assert_eq!(offset_index.first_row_index(0), 0);

        assert!(buffer.bloom_filter().is_none());
    }

    #[test]
    fn test_empty_projections() {
        let buffer = IndexedColumnBuffer::new(PhysicalType::Int32, 0, 0);
        let column_index = buffer.column_index();
        assert!(column_index.min_value(0).is_none());
        assert!(column_index.is_ascending());
        assert!(!column_index.is_descending());
        assert_eq!(buffer.page().num_values(), 0);
    }
}
