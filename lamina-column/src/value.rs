//! Physical column types and the tagged value union they produce.

use std::cmp::Ordering;
use std::hash::Hash;

/// Physical type of a column, as stored on disk.
///
/// Each physical type has a dedicated dictionary variant sharing a single
/// polymorphic contract; see [`crate::dictionary::Dictionary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    /// Legacy fixed 12-byte integer, three little-endian `u32` limbs.
    Int96,
    Float,
    Double,
    Uint32,
    Uint64,
    /// Variable-length byte string.
    ByteArray,
    /// Fixed-length byte string; the element size is known at construction.
    FixedLenByteArray(usize),
    /// 16-byte big-endian integer blob, compared on its numeric magnitude.
    Be128,
}

impl PhysicalType {
    /// Returns the fixed element size in bytes, or `None` for `ByteArray`.
    pub fn value_size(&self) -> Option<usize> {
        match self {
            PhysicalType::Boolean => Some(1),
            PhysicalType::Int32 | PhysicalType::Uint32 | PhysicalType::Float => Some(4),
            PhysicalType::Int64 | PhysicalType::Uint64 | PhysicalType::Double => Some(8),
            PhysicalType::Int96 => Some(12),
            PhysicalType::ByteArray => None,
            PhysicalType::FixedLenByteArray(size) => Some(*size),
            PhysicalType::Be128 => Some(16),
        }
    }

    /// Compares two values under this type's ordering.
    ///
    /// Null orders before any non-null value; two nulls compare equal. The
    /// floating point orderings are the raw comparator of the primitive
    /// (`NaN` is not specialised).
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        match (a.is_null(), b.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        match self {
            PhysicalType::Boolean => a.as_bool().cmp(&b.as_bool()),
            PhysicalType::Int32 => a.as_i32().cmp(&b.as_i32()),
            PhysicalType::Int64 => a.as_i64().cmp(&b.as_i64()),
            PhysicalType::Int96 => a.as_int96().cmp(&b.as_int96()),
            PhysicalType::Float => f32::compare(a.as_f32(), b.as_f32()),
            PhysicalType::Double => f64::compare(a.as_f64(), b.as_f64()),
            PhysicalType::Uint32 => a.as_u32().cmp(&b.as_u32()),
            PhysicalType::Uint64 => a.as_u64().cmp(&b.as_u64()),
            PhysicalType::ByteArray | PhysicalType::FixedLenByteArray(_) => {
                a.as_bytes().cmp(b.as_bytes())
            }
            PhysicalType::Be128 => a.as_be128().cmp(&b.as_be128()),
        }
    }
}

/// Legacy fixed 12-byte integer: three `u32` limbs, least significant first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct Int96(pub [u32; 3]);

impl Int96 {
    #[inline]
    pub fn from_limbs(limbs: [u32; 3]) -> Int96 {
        Int96(limbs)
    }
}

impl PartialOrd for Int96 {
    fn partial_cmp(&self, other: &Int96) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Int96 {
    /// Three-limb unsigned compare, most significant limb first.
    fn cmp(&self, other: &Int96) -> Ordering {
        self.0[2]
            .cmp(&other.0[2])
            .then_with(|| self.0[1].cmp(&other.0[1]))
            .then_with(|| self.0[0].cmp(&other.0[0]))
    }
}

/// 16-byte big-endian integer blob.
///
/// The derived lexicographic byte ordering is the numeric ordering of the
/// 128-bit magnitude, since the most significant byte is stored first.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
#[repr(transparent)]
pub struct Be128(pub [u8; 16]);

impl Be128 {
    #[inline]
    pub fn from_bytes(bytes: [u8; 16]) -> Be128 {
        Be128(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// Payload of a [`Value`].
///
/// Byte-array payloads borrow the storage of the dictionary or page that
/// produced them; they remain valid until that source is reset or mutated,
/// which the borrow checker enforces.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ValueKind<'a> {
    #[default]
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96(Int96),
    Float(f32),
    Double(f64),
    Uint32(u32),
    Uint64(u64),
    ByteArray(&'a [u8]),
    FixedLenByteArray(&'a [u8]),
    Be128(Be128),
}

/// A single column value: a typed payload plus the ordinal of the column it
/// belongs to.
///
/// The column ordinal is carried in complemented (bitwise-NOT) form; values
/// produced by dictionaries and indexed pages are tagged this way to mark
/// that they come from a dictionary-encoded source. The zero tag reads back
/// as column `-1`, meaning "unassigned".
#[derive(Debug, Clone, Copy, Default)]
pub struct Value<'a> {
    kind: ValueKind<'a>,
    column_index: i16,
}

impl PartialEq for Value<'_> {
    /// Payload equality; the column tag does not participate.
    fn eq(&self, other: &Value<'_>) -> bool {
        self.kind == other.kind
    }
}

impl<'a> Value<'a> {
    /// Creates an untagged value from a payload.
    #[inline]
    pub fn new(kind: ValueKind<'a>) -> Value<'a> {
        Value {
            kind,
            column_index: 0,
        }
    }

    /// Creates a value carrying an already-complemented column tag.
    #[inline]
    pub(crate) fn with_column_tag(kind: ValueKind<'a>, column_index: i16) -> Value<'a> {
        Value { kind, column_index }
    }

    #[inline]
    pub fn boolean(v: bool) -> Value<'static> {
        Value::new(ValueKind::Boolean(v))
    }

    #[inline]
    pub fn int32(v: i32) -> Value<'static> {
        Value::new(ValueKind::Int32(v))
    }

    #[inline]
    pub fn int64(v: i64) -> Value<'static> {
        Value::new(ValueKind::Int64(v))
    }

    #[inline]
    pub fn int96(v: Int96) -> Value<'static> {
        Value::new(ValueKind::Int96(v))
    }

    #[inline]
    pub fn float(v: f32) -> Value<'static> {
        Value::new(ValueKind::Float(v))
    }

    #[inline]
    pub fn double(v: f64) -> Value<'static> {
        Value::new(ValueKind::Double(v))
    }

    #[inline]
    pub fn uint32(v: u32) -> Value<'static> {
        Value::new(ValueKind::Uint32(v))
    }

    #[inline]
    pub fn uint64(v: u64) -> Value<'static> {
        Value::new(ValueKind::Uint64(v))
    }

    #[inline]
    pub fn byte_array(v: &[u8]) -> Value<'_> {
        Value::new(ValueKind::ByteArray(v))
    }

    #[inline]
    pub fn fixed_len_byte_array(v: &[u8]) -> Value<'_> {
        Value::new(ValueKind::FixedLenByteArray(v))
    }

    #[inline]
    pub fn be128(v: Be128) -> Value<'static> {
        Value::new(ValueKind::Be128(v))
    }

    #[inline]
    pub fn kind(&self) -> &ValueKind<'a> {
        &self.kind
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    /// The ordinal of the column this value belongs to, or `-1` when the
    /// value is not associated with any column.
    #[inline]
    pub fn column(&self) -> i32 {
        !(self.column_index as i32)
    }

    /// Re-tags the value with a complemented column ordinal.
    #[inline]
    pub(crate) fn set_column_tag(&mut self, column_index: i16) {
        self.column_index = column_index;
    }

    pub fn as_bool(&self) -> bool {
        match self.kind {
            ValueKind::Boolean(v) => v,
            _ => panic!("expected BOOLEAN value, got {:?}", self.kind),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self.kind {
            ValueKind::Int32(v) => v,
            _ => panic!("expected INT32 value, got {:?}", self.kind),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self.kind {
            ValueKind::Int64(v) => v,
            _ => panic!("expected INT64 value, got {:?}", self.kind),
        }
    }

    pub fn as_int96(&self) -> Int96 {
        match self.kind {
            ValueKind::Int96(v) => v,
            _ => panic!("expected INT96 value, got {:?}", self.kind),
        }
    }

    pub fn as_f32(&self) -> f32 {
        match self.kind {
            ValueKind::Float(v) => v,
            _ => panic!("expected FLOAT value, got {:?}", self.kind),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self.kind {
            ValueKind::Double(v) => v,
            _ => panic!("expected DOUBLE value, got {:?}", self.kind),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self.kind {
            ValueKind::Uint32(v) => v,
            _ => panic!("expected UINT32 value, got {:?}", self.kind),
        }
    }

    pub fn as_u64(&self) -> u64 {
        match self.kind {
            ValueKind::Uint64(v) => v,
            _ => panic!("expected UINT64 value, got {:?}", self.kind),
        }
    }

    /// Byte payload of a byte-array or fixed-length byte-array value.
    pub fn as_bytes(&self) -> &'a [u8] {
        match &self.kind {
            ValueKind::ByteArray(v) | ValueKind::FixedLenByteArray(v) => v,
            _ => panic!("expected byte array value, got {:?}", self.kind),
        }
    }

    pub fn as_be128(&self) -> Be128 {
        match self.kind {
            ValueKind::Be128(v) => v,
            _ => panic!("expected BE128 value, got {:?}", self.kind),
        }
    }
}

/// Fixed-width value types that can back a dictionary store directly.
///
/// This is the typed bulk contract the dictionaries expose instead of an
/// untyped pointer-and-stride descriptor: callers hand over plain slices of
/// the native type and the dictionary interns or materialises them without
/// per-row boxing into [`Value`].
pub trait NativeValue:
    Copy + Default + PartialEq + bytemuck::Pod + Send + Sync + 'static
{
    const PHYSICAL_TYPE: PhysicalType;

    /// Hashable identity of the value, used as the reverse-index key.
    type Key: Copy + Eq + Hash;

    fn key(self) -> Self::Key;

    fn compare(self, other: Self) -> Ordering;

    fn to_kind(self) -> ValueKind<'static>;

    /// Extracts the native payload from a value of the matching kind.
    ///
    /// # Panics
    ///
    /// Panics if the value's kind does not match `PHYSICAL_TYPE`.
    fn from_value(value: &Value<'_>) -> Self;
}

macro_rules! impl_native_value {
    ($T:ty, $physical:ident, $kind:ident, $accessor:ident) => {
        impl NativeValue for $T {
            const PHYSICAL_TYPE: PhysicalType = PhysicalType::$physical;

            type Key = $T;

            #[inline]
            fn key(self) -> $T {
                self
            }

            #[inline]
            fn compare(self, other: $T) -> Ordering {
                self.cmp(&other)
            }

            #[inline]
            fn to_kind(self) -> ValueKind<'static> {
                ValueKind::$kind(self)
            }

            #[inline]
            fn from_value(value: &Value<'_>) -> $T {
                value.$accessor()
            }
        }
    };
}

impl_native_value!(i32, Int32, Int32, as_i32);
impl_native_value!(i64, Int64, Int64, as_i64);
impl_native_value!(u32, Uint32, Uint32, as_u32);
impl_native_value!(u64, Uint64, Uint64, as_u64);
impl_native_value!(Int96, Int96, Int96, as_int96);
impl_native_value!(Be128, Be128, Be128, as_be128);

macro_rules! impl_native_float {
    ($T:ty, $Bits:ty, $physical:ident, $kind:ident, $accessor:ident) => {
        impl NativeValue for $T {
            const PHYSICAL_TYPE: PhysicalType = PhysicalType::$physical;

            /// Raw bit pattern; distinct NaN payloads intern separately.
            type Key = $Bits;

            #[inline]
            fn key(self) -> $Bits {
                self.to_bits()
            }

            #[inline]
            fn compare(self, other: $T) -> Ordering {
                self.partial_cmp(&other).unwrap_or(Ordering::Equal)
            }

            #[inline]
            fn to_kind(self) -> ValueKind<'static> {
                ValueKind::$kind(self)
            }

            #[inline]
            fn from_value(value: &Value<'_>) -> $T {
                value.$accessor()
            }
        }
    };
}

impl_native_float!(f32, u32, Float, Float, as_f32);
impl_native_float!(f64, u64, Double, Double, as_f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_tagging() {
        let mut v = Value::int32(7);
        assert_eq!(v.column(), -1);
        v.set_column_tag(!3i16);
        assert_eq!(v.column(), 3);
    }

    #[test]
    fn test_int96_ordering() {
        let small = Int96([u32::MAX, u32::MAX, 0]);
        let large = Int96([0, 0, 1]);
        assert!(small < large);
        assert_eq!(small.cmp(&small), Ordering::Equal);

        let mid_limb = Int96([0, 1, 0]);
        assert!(small > mid_limb);
    }

    #[test]
    fn test_be128_ordering() {
        let mut one = [0u8; 16];
        one[15] = 1;
        let mut two = [0u8; 16];
        two[15] = 2;
        let mut big = [0u8; 16];
        big[0] = 1;
        assert!(Be128(one) < Be128(two));
        assert!(Be128(two) < Be128(big));
    }

    #[test]
    fn test_float_compare() {
        assert_eq!(f32::compare(1.0, 2.0), Ordering::Less);
        assert_eq!(f64::compare(f64::NAN, 1.0), Ordering::Equal);
        assert_ne!(f32::key(1.0), f32::key(-1.0));
    }

    #[test]
    fn test_physical_compare_bytes() {
        let a = Value::byte_array(b"apple");
        let b = Value::byte_array(b"banana");
        assert_eq!(PhysicalType::ByteArray.compare(&a, &b), Ordering::Less);
        assert_eq!(
            PhysicalType::ByteArray.compare(&Value::default(), &a),
            Ordering::Less
        );
    }

    #[test]
    fn test_value_size() {
        assert_eq!(PhysicalType::Int96.value_size(), Some(12));
        assert_eq!(PhysicalType::ByteArray.value_size(), None);
        assert_eq!(PhysicalType::FixedLenByteArray(5).value_size(), Some(5));
        assert_eq!(PhysicalType::Be128.value_size(), Some(16));
    }
}
