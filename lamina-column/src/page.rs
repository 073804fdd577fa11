//! Page views over dictionaries and code arrays.

use std::borrow::Cow;
use std::ops::Range;

use lamina_common::{Result, error::Error};

use crate::dictionary::Dictionary;
use crate::value::{PhysicalType, Value};

/// Read-side surface shared by every buffered page shape.
///
/// Pages are in-memory views suitable for handing to the writer/compressor
/// layer. Level handling belongs to a higher layer: the pages of this core
/// carry no repetition or definition levels and no nulls.
pub trait BufferedPage {
    /// Physical type of the page's logical values.
    fn physical_type(&self) -> PhysicalType;

    /// Ordinal of the column this page belongs to.
    fn column(&self) -> i32;

    /// The dictionary the page's payload refers into, if any.
    fn dictionary(&self) -> Option<&Dictionary>;

    fn num_rows(&self) -> usize;

    fn num_values(&self) -> usize;

    fn num_nulls(&self) -> usize {
        0
    }

    /// Raw byte length of the page payload.
    fn size(&self) -> u64;

    fn repetition_levels(&self) -> &[u8] {
        &[]
    }

    fn definition_levels(&self) -> &[u8] {
        &[]
    }

    /// The page payload, suitable for the page's codec.
    fn data(&self) -> &[u8];

    /// (min, max) of the page's logical values, tagged with the page's
    /// column; `None` for an empty page.
    fn bounds(&self) -> Option<(Value<'_>, Value<'_>)>;
}

/// Page view over a dictionary's value store, as returned by
/// [`Dictionary::page`]. The payload aliases the dictionary's storage and
/// remains valid until the dictionary is mutated or reset.
pub struct DictionaryPage<'a> {
    dict: &'a Dictionary,
}

impl<'a> DictionaryPage<'a> {
    pub(crate) fn new(dict: &'a Dictionary) -> DictionaryPage<'a> {
        DictionaryPage { dict }
    }

    /// Returns a cursor streaming the interned values in code order.
    pub fn values(&self) -> DictionaryPageValues<'a> {
        DictionaryPageValues {
            dict: self.dict,
            code: 0,
        }
    }
}

/// Cursor over a dictionary page, yielding each interned value once.
pub struct DictionaryPageValues<'a> {
    dict: &'a Dictionary,
    code: i32,
}

impl<'a> DictionaryPageValues<'a> {
    /// Fills `out` with as many values as remain, returning the count.
    /// Returns the terminal end-of-sequence error once every entry has been
    /// read.
    pub fn read_values(&mut self, out: &mut [Value<'a>]) -> Result<usize> {
        let remaining = self.dict.len() - self.code as usize;
        if remaining == 0 {
            return Err(Error::end_of_sequence());
        }
        if out.is_empty() {
            return Ok(0);
        }
        let n = remaining.min(out.len());
        for (slot, code) in out[..n].iter_mut().zip(self.code..self.code + n as i32) {
            *slot = self.dict.index(code);
        }
        self.code += n as i32;
        Ok(n)
    }
}

impl BufferedPage for DictionaryPage<'_> {
    fn physical_type(&self) -> PhysicalType {
        self.dict.physical_type()
    }

    fn column(&self) -> i32 {
        self.dict.column()
    }

    fn dictionary(&self) -> Option<&Dictionary> {
        None
    }

    fn num_rows(&self) -> usize {
        self.dict.len()
    }

    fn num_values(&self) -> usize {
        self.dict.len()
    }

    fn size(&self) -> u64 {
        self.dict.store_bytes().len() as u64
    }

    fn data(&self) -> &[u8] {
        self.dict.store_bytes()
    }

    fn bounds(&self) -> Option<(Value<'_>, Value<'_>)> {
        let codes: Vec<i32> = (0..self.dict.len() as i32).collect();
        self.dict.bounds(&codes)
    }
}

impl Dictionary {
    /// Returns a page view over the dictionary's value store.
    ///
    /// The page shares the dictionary's storage; it borrows the dictionary,
    /// so interning or resetting while the page is live is a compile error.
    pub fn page(&self) -> DictionaryPage<'_> {
        DictionaryPage::new(self)
    }
}

/// A page whose payload is a dense array of `i32` codes referring into a
/// parent dictionary.
pub struct IndexedPage<'a> {
    dict: &'a Dictionary,
    codes: Cow<'a, [i32]>,
    column_index: i16,
}

impl<'a> IndexedPage<'a> {
    pub(crate) fn from_codes(
        dict: &'a Dictionary,
        column: usize,
        codes: Cow<'a, [i32]>,
    ) -> IndexedPage<'a> {
        IndexedPage {
            dict,
            codes,
            column_index: !(column as i16),
        }
    }

    /// Reconstructs a page from a wire buffer of little-endian codes.
    ///
    /// The integer codec may truncate trailing zeros, so `bytes` is allowed
    /// to be shorter than `4 * num_values`; the missing tail is zero-filled
    /// and those positions reference the first dictionary entry. A longer
    /// buffer is truncated to `num_values` codes.
    pub fn from_bytes(
        dict: &'a Dictionary,
        column: usize,
        num_values: usize,
        bytes: &[u8],
    ) -> IndexedPage<'a> {
        let size = 4 * num_values;
        let bytes = if bytes.len() > size { &bytes[..size] } else { bytes };

        let mut codes = vec![0i32; num_values];
        let mut chunks = bytes.chunks_exact(4);
        for (code, chunk) in codes.iter_mut().zip(&mut chunks) {
            *code = i32::from_le_bytes(chunk.try_into().expect("code word"));
        }
        let tail = chunks.remainder();
        if !tail.is_empty() {
            let mut word = [0u8; 4];
            word[..tail.len()].copy_from_slice(tail);
            codes[bytes.len() / 4] = i32::from_le_bytes(word);
        }

        IndexedPage {
            dict,
            codes: Cow::Owned(codes),
            column_index: !(column as i16),
        }
    }

    /// The code array backing this page.
    #[inline]
    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    /// Returns an aliasing window over a sub-range of the page.
    pub fn slice(&self, range: Range<usize>) -> IndexedPage<'_> {
        IndexedPage {
            dict: self.dict,
            codes: Cow::Borrowed(&self.codes[range]),
            column_index: self.column_index,
        }
    }

    /// Returns a cursor streaming the page's decoded values in blocks.
    pub fn values(&self) -> IndexedPageValues<'_> {
        IndexedPageValues {
            dict: self.dict,
            codes: &self.codes,
            offset: 0,
        }
    }

    pub(crate) fn dict(&self) -> &'a Dictionary {
        self.dict
    }
}

impl Clone for IndexedPage<'_> {
    /// Deep-copies the code array; the dictionary reference is shared.
    fn clone(&self) -> Self {
        IndexedPage {
            dict: self.dict,
            codes: Cow::Owned(self.codes.to_vec()),
            column_index: self.column_index,
        }
    }
}

impl BufferedPage for IndexedPage<'_> {
    fn physical_type(&self) -> PhysicalType {
        self.dict.physical_type()
    }

    fn column(&self) -> i32 {
        !(self.column_index as i32)
    }

    fn dictionary(&self) -> Option<&Dictionary> {
        Some(self.dict)
    }

    fn num_rows(&self) -> usize {
        self.codes.len()
    }

    fn num_values(&self) -> usize {
        self.codes.len()
    }

    fn size(&self) -> u64 {
        4 * self.codes.len() as u64
    }

    fn data(&self) -> &[u8] {
        bytemuck::cast_slice(&self.codes)
    }

    fn bounds(&self) -> Option<(Value<'_>, Value<'_>)> {
        self.dict.bounds(&self.codes).map(|(mut min, mut max)| {
            min.set_column_tag(self.column_index);
            max.set_column_tag(self.column_index);
            (min, max)
        })
    }
}

/// Cursor over an indexed page, materialising values in blocks through the
/// parent dictionary.
pub struct IndexedPageValues<'a> {
    dict: &'a Dictionary,
    codes: &'a [i32],
    offset: usize,
}

impl<'a> IndexedPageValues<'a> {
    /// Fills `out` with as many decoded values as remain, returning the
    /// count. Once every code has been consumed, returns the terminal
    /// end-of-sequence error.
    pub fn read_values(&mut self, out: &mut [Value<'a>]) -> Result<usize> {
        let remaining = self.codes.len() - self.offset;
        if remaining == 0 {
            return Err(Error::end_of_sequence());
        }
        if out.is_empty() {
            return Ok(0);
        }
        let n = remaining.min(out.len());
        self.dict
            .lookup(&self.codes[self.offset..self.offset + n], &mut out[..n]);
        self.offset += n;
        Ok(n)
    }
}
