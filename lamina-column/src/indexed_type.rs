//! Type adapters that make a column look dictionary-encoded from the
//! outside.

use std::cmp::Ordering;

use lamina_bytes::buffer::AlignedByteVec;
use lamina_common::Result;

use crate::column_buffer::IndexedColumnBuffer;
use crate::dictionary::Dictionary;
use crate::encoding::Encoding;
use crate::page::IndexedPage;
use crate::value::{PhysicalType, Value};

/// Derived column type whose object constructors produce dictionary-encoded
/// buffers and pages instead of plain ones. Everything else delegates to the
/// wrapped physical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedType {
    physical: PhysicalType,
}

impl IndexedType {
    pub(crate) fn new(physical: PhysicalType) -> IndexedType {
        IndexedType { physical }
    }

    /// The wrapped physical type.
    pub fn physical_type(&self) -> PhysicalType {
        self.physical
    }

    /// Fixed element size in bytes, or `None` for byte arrays.
    pub fn value_size(&self) -> Option<usize> {
        self.physical.value_size()
    }

    /// Compares two values under the wrapped type's ordering.
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        self.physical.compare(a, b)
    }

    /// Creates a dictionary-encoded column buffer for this type, backed by a
    /// fresh dictionary.
    pub fn new_column_buffer(&self, column: usize, capacity: usize) -> IndexedColumnBuffer {
        IndexedColumnBuffer::new(self.physical, column, capacity)
    }

    /// Reconstructs an indexed page over `dict` from a wire buffer of codes,
    /// applying the zero-padding rule for truncated buffers.
    pub fn new_page<'a>(
        &self,
        dict: &'a Dictionary,
        column: usize,
        num_values: usize,
        data: &[u8],
    ) -> IndexedPage<'a> {
        IndexedPage::from_bytes(dict, column, num_values, data)
    }
}

impl Dictionary {
    /// The derived type of this dictionary's column: construction through it
    /// yields dictionary-encoded buffers and pages.
    pub fn indexed_type(&self) -> IndexedType {
        IndexedType::new(self.physical_type())
    }
}

/// Type adapter of an indexed page.
///
/// An indexed page's on-wire payload is codes, not plain values, so its
/// `encode`/`decode` are routed to the codec's 32-bit integer variant.
#[derive(Debug, Clone, Copy)]
pub struct IndexedPageType {
    inner: IndexedType,
}

impl IndexedPageType {
    pub fn physical_type(&self) -> PhysicalType {
        self.inner.physical_type()
    }

    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        self.inner.compare(a, b)
    }

    /// Encodes a code payload with the codec's 32-bit integer variant.
    pub fn encode(
        &self,
        dst: &mut AlignedByteVec,
        src: &[u8],
        encoding: &dyn Encoding,
    ) -> Result<usize> {
        encoding.encode_int32(dst, src)
    }

    /// Decodes a code payload with the codec's 32-bit integer variant.
    pub fn decode(
        &self,
        dst: &mut AlignedByteVec,
        src: &[u8],
        encoding: &dyn Encoding,
    ) -> Result<usize> {
        encoding.decode_int32(dst, src)
    }
}

impl IndexedPage<'_> {
    /// The page's type adapter, with code-aware `encode`/`decode`.
    pub fn page_type(&self) -> IndexedPageType {
        IndexedPageType {
            inner: self.dict().indexed_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Plain;
    use crate::page::BufferedPage;

    #[test]
    fn test_indexed_type_constructors() {
        let mut dict = PhysicalType::Int32.new_dictionary(1);
        let mut codes = [0i32; 2];
        dict.insert_values(&mut codes, &[10, 20]).unwrap();

        let typ = dict.indexed_type();
        assert_eq!(typ.physical_type(), PhysicalType::Int32);
        assert_eq!(typ.value_size(), Some(4));

        let mut buffer = typ.new_column_buffer(1, 16);
        buffer.write_slice(&[7i32]).unwrap();
        assert_eq!(buffer.column(), 1);
        assert_eq!(buffer.physical_type(), PhysicalType::Int32);

        let page = typ.new_page(&dict, 1, 3, &[1, 0, 0, 0]);
        assert_eq!(page.codes(), &[1, 0, 0]);
    }

    #[test]
    fn test_page_type_reroutes_to_int32_codec() {
        let mut buffer = IndexedColumnBuffer::new(PhysicalType::ByteArray, 0, 0);
        buffer.write_bytes(&[b"x", b"y", b"x"]).unwrap();

        let page = buffer.page();
        let page_type = page.page_type();
        assert_eq!(page_type.physical_type(), PhysicalType::ByteArray);

        let plain = Plain::new();
        let mut encoded = AlignedByteVec::new();
        page_type.encode(&mut encoded, page.data(), &plain).unwrap();
        assert_eq!(encoded.len(), 12);

        let mut decoded = AlignedByteVec::new();
        page_type.decode(&mut decoded, &encoded, &plain).unwrap();
        assert_eq!(decoded.typed_data::<i32>(), page.codes());
    }
}
