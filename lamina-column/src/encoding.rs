//! Page payload codecs.

use lamina_bytes::buffer::AlignedByteVec;
use lamina_common::{Result, verify_arg};

/// Byte-oriented codec contract for page payloads.
///
/// An indexed page's wire payload is its code array, so its type adapter
/// routes `encode`/`decode` through the 32-bit integer entry points rather
/// than the plain-value ones. Cascading codec variants (run-length,
/// bit-packing) plug in behind this trait at the writer layer; the core
/// ships only [`Plain`].
pub trait Encoding {
    /// Encodes a payload of little-endian 32-bit integers into `dst`,
    /// replacing its content. Returns the encoded size in bytes.
    fn encode_int32(&self, dst: &mut AlignedByteVec, src: &[u8]) -> Result<usize>;

    /// Decodes a payload of little-endian 32-bit integers into `dst`,
    /// replacing its content. Returns the decoded size in bytes.
    fn decode_int32(&self, dst: &mut AlignedByteVec, src: &[u8]) -> Result<usize>;

    /// Encodes a plain value payload into `dst`, replacing its content.
    fn encode_plain(&self, dst: &mut AlignedByteVec, src: &[u8]) -> Result<usize>;

    /// Decodes a plain value payload into `dst`, replacing its content.
    fn decode_plain(&self, dst: &mut AlignedByteVec, src: &[u8]) -> Result<usize>;
}

/// Identity codec: payload bytes pass through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Plain;

impl Plain {
    pub fn new() -> Plain {
        Plain
    }

    fn transfer(dst: &mut AlignedByteVec, src: &[u8]) -> usize {
        dst.clear();
        dst.extend_from_slice(src);
        src.len()
    }
}

impl Encoding for Plain {
    fn encode_int32(&self, dst: &mut AlignedByteVec, src: &[u8]) -> Result<usize> {
        verify_arg!(src, src.len() % 4 == 0);
        Ok(Self::transfer(dst, src))
    }

    fn decode_int32(&self, dst: &mut AlignedByteVec, src: &[u8]) -> Result<usize> {
        verify_arg!(src, src.len() % 4 == 0);
        Ok(Self::transfer(dst, src))
    }

    fn encode_plain(&self, dst: &mut AlignedByteVec, src: &[u8]) -> Result<usize> {
        Ok(Self::transfer(dst, src))
    }

    fn decode_plain(&self, dst: &mut AlignedByteVec, src: &[u8]) -> Result<usize> {
        Ok(Self::transfer(dst, src))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_round_trip() {
        let plain = Plain::new();
        let src: Vec<u8> = (0..16).collect();

        let mut encoded = AlignedByteVec::new();
        assert_eq!(plain.encode_int32(&mut encoded, &src).unwrap(), 16);

        let mut decoded = AlignedByteVec::new();
        assert_eq!(plain.decode_int32(&mut decoded, &encoded).unwrap(), 16);
        assert_eq!(decoded.as_slice(), src.as_slice());
    }

    #[test]
    fn test_plain_rejects_ragged_int32_payload() {
        let plain = Plain::new();
        let mut dst = AlignedByteVec::new();
        assert!(plain.encode_int32(&mut dst, &[1, 2, 3]).is_err());
        assert!(plain.decode_int32(&mut dst, &[1, 2, 3, 4, 5]).is_err());
    }
}
