//! Per-type value-interning dictionaries.
//!
//! A [`Dictionary`] maps distinct column values to dense `i32` codes and
//! back. Codes are stable until [`Dictionary::reset`] and are exactly
//! `[0, len)`. The polymorphic contract lives on the enum; each variant is
//! tightly monomorphic inside (a typed dense store plus a type-keyed lazy
//! reverse index).
//!
//! Dictionaries are created through [`PhysicalType`], either empty or seeded
//! from an existing value store, and mutated exclusively through the insert
//! operations. Mutation takes `&mut self`, so pages and values aliasing the
//! dictionary's storage make further interning a compile error for as long
//! as they are held.

pub mod binary;
pub mod boolean;
pub mod fixed;
pub mod primitive;

pub use binary::BinaryDictionary;
pub use boolean::BooleanDictionary;
pub use fixed::FixedBinaryDictionary;
pub use primitive::PrimitiveDictionary;

use lamina_common::{Result, error::Error};
use lamina_bytes::buffer::AlignedByteVec;
use lamina_sequence::values::Values;

use crate::value::{Be128, Int96, NativeValue, PhysicalType, Value, ValueKind};

/// Value-interning table for one column; maps value <-> dense `i32` code.
#[derive(Clone)]
pub enum Dictionary {
    Boolean(BooleanDictionary),
    Int32(PrimitiveDictionary<i32>),
    Int64(PrimitiveDictionary<i64>),
    Int96(PrimitiveDictionary<Int96>),
    Float(PrimitiveDictionary<f32>),
    Double(PrimitiveDictionary<f64>),
    Uint32(PrimitiveDictionary<u32>),
    Uint64(PrimitiveDictionary<u64>),
    ByteArray(BinaryDictionary),
    FixedLenByteArray(FixedBinaryDictionary),
    Be128(PrimitiveDictionary<Be128>),
}

macro_rules! dispatch {
    ($self:expr, $d:ident => $body:expr) => {
        match $self {
            Dictionary::Boolean($d) => $body,
            Dictionary::Int32($d) => $body,
            Dictionary::Int64($d) => $body,
            Dictionary::Int96($d) => $body,
            Dictionary::Float($d) => $body,
            Dictionary::Double($d) => $body,
            Dictionary::Uint32($d) => $body,
            Dictionary::Uint64($d) => $body,
            Dictionary::ByteArray($d) => $body,
            Dictionary::FixedLenByteArray($d) => $body,
            Dictionary::Be128($d) => $body,
        }
    };
}

impl Dictionary {
    /// The physical type this dictionary interns.
    pub fn physical_type(&self) -> PhysicalType {
        dispatch!(self, d => d.physical_type())
    }

    /// The ordinal of the column this dictionary belongs to.
    pub fn column(&self) -> i32 {
        !(self.column_tag() as i32)
    }

    pub(crate) fn column_tag(&self) -> i16 {
        dispatch!(self, d => d.column_tag())
    }

    /// Number of distinct values currently interned.
    pub fn len(&self) -> usize {
        dispatch!(self, d => d.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialises the value at `code`, tagged with this dictionary's
    /// column.
    ///
    /// # Panics
    ///
    /// Panics if `code` is negative or not less than `len()`.
    pub fn index(&self, code: i32) -> Value<'_> {
        dispatch!(self, d => d.make_value(code))
    }

    /// For each input value, writes to `codes[i]` the existing code when the
    /// value is already interned, or appends it and writes the new code.
    /// Identical values in the same or a later call receive the same code.
    ///
    /// # Panics
    ///
    /// Panics if `codes` is shorter than `values`, or if a value's kind does
    /// not match the dictionary's physical type.
    pub fn insert(&mut self, codes: &mut [i32], values: &[Value<'_>]) {
        let count = values.len();
        match self {
            Dictionary::Boolean(d) => d.insert_with(codes, count, |i| values[i].as_bool()),
            Dictionary::Int32(d) => d.insert_with(codes, count, |i| values[i].as_i32()),
            Dictionary::Int64(d) => d.insert_with(codes, count, |i| values[i].as_i64()),
            Dictionary::Int96(d) => d.insert_with(codes, count, |i| values[i].as_int96()),
            Dictionary::Float(d) => d.insert_with(codes, count, |i| values[i].as_f32()),
            Dictionary::Double(d) => d.insert_with(codes, count, |i| values[i].as_f64()),
            Dictionary::Uint32(d) => d.insert_with(codes, count, |i| values[i].as_u32()),
            Dictionary::Uint64(d) => d.insert_with(codes, count, |i| values[i].as_u64()),
            Dictionary::ByteArray(d) => d.insert_with(codes, count, |i| values[i].as_bytes()),
            Dictionary::FixedLenByteArray(d) => {
                d.insert_with(codes, count, |i| values[i].as_bytes())
            }
            Dictionary::Be128(d) => d.insert_with(codes, count, |i| values[i].as_be128()),
        }
    }

    /// Materialises each code into the corresponding slot of `out`, each
    /// value tagged with this dictionary's column.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `codes`, or on an invalid code.
    pub fn lookup<'a>(&'a self, codes: &[i32], out: &mut [Value<'a>]) {
        assert!(
            out.len() >= codes.len(),
            "dictionary lookup with more codes than output slots"
        );
        for (slot, &code) in out.iter_mut().zip(codes) {
            *slot = self.index(code);
        }
    }

    /// Returns (min, max) over the multiset of values referenced by `codes`
    /// under the type's ordering, or `None` for empty input. Both returned
    /// values are attained by some referenced value.
    pub fn bounds(&self, codes: &[i32]) -> Option<(Value<'_>, Value<'_>)> {
        let tag = self.column_tag();
        match self {
            Dictionary::Boolean(d) => d.bounds_of(codes).map(|(min, max)| {
                (
                    Value::with_column_tag(ValueKind::Boolean(min), tag),
                    Value::with_column_tag(ValueKind::Boolean(max), tag),
                )
            }),
            Dictionary::Int32(d) => primitive_bounds(d, codes, tag),
            Dictionary::Int64(d) => primitive_bounds(d, codes, tag),
            Dictionary::Int96(d) => primitive_bounds(d, codes, tag),
            Dictionary::Float(d) => primitive_bounds(d, codes, tag),
            Dictionary::Double(d) => primitive_bounds(d, codes, tag),
            Dictionary::Uint32(d) => primitive_bounds(d, codes, tag),
            Dictionary::Uint64(d) => primitive_bounds(d, codes, tag),
            Dictionary::ByteArray(d) => d.bounds_of(codes).map(|(min, max)| {
                (
                    Value::with_column_tag(ValueKind::ByteArray(min), tag),
                    Value::with_column_tag(ValueKind::ByteArray(max), tag),
                )
            }),
            Dictionary::FixedLenByteArray(d) => d.bounds_of(codes).map(|(min, max)| {
                (
                    Value::with_column_tag(ValueKind::FixedLenByteArray(min), tag),
                    Value::with_column_tag(ValueKind::FixedLenByteArray(max), tag),
                )
            }),
            Dictionary::Be128(d) => primitive_bounds(d, codes, tag),
        }
    }

    /// Empties the dictionary without releasing storage capacity.
    ///
    /// All codes, pages and aliased slices previously issued become invalid;
    /// the borrow checker prevents any from being live across this call.
    pub fn reset(&mut self) {
        dispatch!(self, d => d.reset())
    }

    /// Raw bytes of the value store, as exposed by the dictionary's page.
    pub(crate) fn store_bytes(&self) -> &[u8] {
        match self {
            Dictionary::Boolean(d) => d.store().as_bytes(),
            Dictionary::Int32(d) => d.store().as_bytes(),
            Dictionary::Int64(d) => d.store().as_bytes(),
            Dictionary::Int96(d) => d.store().as_bytes(),
            Dictionary::Float(d) => d.store().as_bytes(),
            Dictionary::Double(d) => d.store().as_bytes(),
            Dictionary::Uint32(d) => d.store().as_bytes(),
            Dictionary::Uint64(d) => d.store().as_bytes(),
            Dictionary::ByteArray(d) => d.flat_bytes(),
            Dictionary::FixedLenByteArray(d) => d.flat_bytes(),
            Dictionary::Be128(d) => d.store().as_bytes(),
        }
    }

    /// Typed bulk intern for fixed-width values; the hot write path that
    /// avoids per-row boxing into [`Value`].
    pub fn insert_values<T: DictionaryValue>(
        &mut self,
        codes: &mut [i32],
        values: &[T],
    ) -> Result<()> {
        match T::from_dictionary_mut(self) {
            Some(d) => {
                d.insert_values(codes, values);
                Ok(())
            }
            None => Err(self.type_mismatch(T::PHYSICAL_TYPE)),
        }
    }

    /// Typed bulk lookup for fixed-width values.
    pub fn lookup_values<T: DictionaryValue>(&self, codes: &[i32], out: &mut [T]) -> Result<()> {
        match T::from_dictionary(self) {
            Some(d) => {
                d.lookup_values(codes, out);
                Ok(())
            }
            None => Err(self.type_mismatch(T::PHYSICAL_TYPE)),
        }
    }

    /// Typed bulk intern for byte strings (variable or fixed length).
    pub fn insert_bytes(&mut self, codes: &mut [i32], values: &[&[u8]]) -> Result<()> {
        match self {
            Dictionary::ByteArray(d) => {
                d.insert_bytes(codes, values);
                Ok(())
            }
            Dictionary::FixedLenByteArray(d) => {
                d.insert_bytes(codes, values);
                Ok(())
            }
            _ => Err(self.type_mismatch(PhysicalType::ByteArray)),
        }
    }

    /// Typed bulk lookup for byte strings (variable or fixed length).
    pub fn lookup_bytes<'a>(&'a self, codes: &[i32], out: &mut [&'a [u8]]) -> Result<()> {
        match self {
            Dictionary::ByteArray(d) => {
                d.lookup_bytes(codes, out);
                Ok(())
            }
            Dictionary::FixedLenByteArray(d) => {
                d.lookup_bytes(codes, out);
                Ok(())
            }
            _ => Err(self.type_mismatch(PhysicalType::ByteArray)),
        }
    }

    /// Typed bulk intern for booleans.
    pub fn insert_booleans(&mut self, codes: &mut [i32], values: &[bool]) -> Result<()> {
        match self {
            Dictionary::Boolean(d) => {
                d.insert_booleans(codes, values);
                Ok(())
            }
            _ => Err(self.type_mismatch(PhysicalType::Boolean)),
        }
    }

    /// Typed bulk lookup for booleans.
    pub fn lookup_booleans(&self, codes: &[i32], out: &mut [bool]) -> Result<()> {
        match self {
            Dictionary::Boolean(d) => {
                d.lookup_booleans(codes, out);
                Ok(())
            }
            _ => Err(self.type_mismatch(PhysicalType::Boolean)),
        }
    }

    fn type_mismatch(&self, requested: PhysicalType) -> Error {
        Error::invalid_arg(
            "values",
            format!(
                "cannot use {:?} values with a {:?} dictionary",
                requested,
                self.physical_type()
            ),
        )
    }
}

fn primitive_bounds<'a, T: NativeValue>(
    dict: &'a PrimitiveDictionary<T>,
    codes: &[i32],
    tag: i16,
) -> Option<(Value<'a>, Value<'a>)> {
    dict.bounds_of(codes).map(|(min, max)| {
        (
            Value::with_column_tag(min.to_kind(), tag),
            Value::with_column_tag(max.to_kind(), tag),
        )
    })
}

/// Fixed-width native types with a dedicated dictionary variant; routes the
/// typed bulk surface of [`Dictionary`] to the matching monomorphic store.
pub trait DictionaryValue: NativeValue {
    fn from_dictionary(dict: &Dictionary) -> Option<&PrimitiveDictionary<Self>>;
    fn from_dictionary_mut(dict: &mut Dictionary) -> Option<&mut PrimitiveDictionary<Self>>;
}

macro_rules! impl_dictionary_value {
    ($T:ty, $variant:ident) => {
        impl DictionaryValue for $T {
            fn from_dictionary(dict: &Dictionary) -> Option<&PrimitiveDictionary<$T>> {
                match dict {
                    Dictionary::$variant(d) => Some(d),
                    _ => None,
                }
            }

            fn from_dictionary_mut(
                dict: &mut Dictionary,
            ) -> Option<&mut PrimitiveDictionary<$T>> {
                match dict {
                    Dictionary::$variant(d) => Some(d),
                    _ => None,
                }
            }
        }
    };
}

impl_dictionary_value!(i32, Int32);
impl_dictionary_value!(i64, Int64);
impl_dictionary_value!(Int96, Int96);
impl_dictionary_value!(f32, Float);
impl_dictionary_value!(f64, Double);
impl_dictionary_value!(u32, Uint32);
impl_dictionary_value!(u64, Uint64);
impl_dictionary_value!(Be128, Be128);

impl PhysicalType {
    /// Creates an empty dictionary for this type.
    pub fn new_dictionary(&self, column: usize) -> Dictionary {
        self.new_dictionary_with_capacity(column, 0)
    }

    /// Creates an empty dictionary with room for `capacity` distinct values.
    pub fn new_dictionary_with_capacity(&self, column: usize, capacity: usize) -> Dictionary {
        match *self {
            PhysicalType::Boolean => Dictionary::Boolean(BooleanDictionary::new(column)),
            PhysicalType::Int32 => {
                Dictionary::Int32(PrimitiveDictionary::with_capacity(column, capacity))
            }
            PhysicalType::Int64 => {
                Dictionary::Int64(PrimitiveDictionary::with_capacity(column, capacity))
            }
            PhysicalType::Int96 => {
                Dictionary::Int96(PrimitiveDictionary::with_capacity(column, capacity))
            }
            PhysicalType::Float => {
                Dictionary::Float(PrimitiveDictionary::with_capacity(column, capacity))
            }
            PhysicalType::Double => {
                Dictionary::Double(PrimitiveDictionary::with_capacity(column, capacity))
            }
            PhysicalType::Uint32 => {
                Dictionary::Uint32(PrimitiveDictionary::with_capacity(column, capacity))
            }
            PhysicalType::Uint64 => {
                Dictionary::Uint64(PrimitiveDictionary::with_capacity(column, capacity))
            }
            PhysicalType::ByteArray => {
                Dictionary::ByteArray(BinaryDictionary::with_capacity(column, capacity))
            }
            PhysicalType::FixedLenByteArray(size) => Dictionary::FixedLenByteArray(
                FixedBinaryDictionary::with_capacity(column, size, capacity),
            ),
            PhysicalType::Be128 => {
                Dictionary::Be128(PrimitiveDictionary::with_capacity(column, capacity))
            }
        }
    }

    /// Creates a dictionary seeded from an existing value store, adopting
    /// the storage without copying. The reverse index is not built; a
    /// seeded dictionary that is only looked up never pays for one.
    pub fn new_dictionary_from_values(
        &self,
        column: usize,
        num_values: usize,
        values: Values,
    ) -> Result<Dictionary> {
        Ok(match *self {
            PhysicalType::Boolean => {
                Dictionary::Boolean(BooleanDictionary::from_values(column, num_values, values)?)
            }
            PhysicalType::Int32 => {
                Dictionary::Int32(PrimitiveDictionary::from_values(column, num_values, values)?)
            }
            PhysicalType::Int64 => {
                Dictionary::Int64(PrimitiveDictionary::from_values(column, num_values, values)?)
            }
            PhysicalType::Int96 => {
                Dictionary::Int96(PrimitiveDictionary::from_values(column, num_values, values)?)
            }
            PhysicalType::Float => {
                Dictionary::Float(PrimitiveDictionary::from_values(column, num_values, values)?)
            }
            PhysicalType::Double => {
                Dictionary::Double(PrimitiveDictionary::from_values(column, num_values, values)?)
            }
            PhysicalType::Uint32 => {
                Dictionary::Uint32(PrimitiveDictionary::from_values(column, num_values, values)?)
            }
            PhysicalType::Uint64 => {
                Dictionary::Uint64(PrimitiveDictionary::from_values(column, num_values, values)?)
            }
            PhysicalType::ByteArray => {
                Dictionary::ByteArray(BinaryDictionary::from_values(column, num_values, values)?)
            }
            PhysicalType::FixedLenByteArray(size) => Dictionary::FixedLenByteArray(
                FixedBinaryDictionary::from_values(column, size, num_values, values)?,
            ),
            PhysicalType::Be128 => {
                Dictionary::Be128(PrimitiveDictionary::from_values(column, num_values, values)?)
            }
        })
    }

    /// Creates a dictionary seeded from a raw byte buffer, typically the
    /// payload of a dictionary page read from storage. The bytes are copied
    /// into aligned storage.
    pub fn new_dictionary_from_bytes(
        &self,
        column: usize,
        num_values: usize,
        bytes: &[u8],
    ) -> Result<Dictionary> {
        let values = Values::from_vec(AlignedByteVec::copy_from_slice(bytes));
        self.new_dictionary_from_values(column, num_values, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polymorphic_insert_lookup() {
        let mut dict = PhysicalType::Int32.new_dictionary(2);
        let mut codes = [0i32; 5];
        dict.insert(
            &mut codes,
            &[
                Value::int32(10),
                Value::int32(20),
                Value::int32(10),
                Value::int32(30),
                Value::int32(20),
            ],
        );
        assert_eq!(codes, [0, 1, 0, 2, 1]);
        assert_eq!(dict.len(), 3);

        let mut out = [Value::default(); 5];
        dict.lookup(&codes, &mut out);
        let read: Vec<i32> = out.iter().map(|v| v.as_i32()).collect();
        assert_eq!(read, [10, 20, 10, 30, 20]);
        assert_eq!(out[0].column(), 2);
    }

    #[test]
    fn test_bounds_tagging() {
        let mut dict = PhysicalType::ByteArray.new_dictionary(1);
        let mut codes = [0i32; 3];
        dict.insert(
            &mut codes,
            &[
                Value::byte_array(b"banana"),
                Value::byte_array(b"apple"),
                Value::byte_array(b"cherry"),
            ],
        );
        let (min, max) = dict.bounds(&codes).unwrap();
        assert_eq!(min.as_bytes(), b"apple");
        assert_eq!(max.as_bytes(), b"cherry");
        assert_eq!(min.column(), 1);
        assert_eq!(dict.bounds(&[]), None);

        let mut out: [&[u8]; 3] = [&[]; 3];
        dict.lookup_bytes(&codes, &mut out).unwrap();
        assert_eq!(out, [&b"banana"[..], b"apple", b"cherry"]);
    }

    #[test]
    fn test_typed_surface_type_mismatch() {
        let mut dict = PhysicalType::Int64.new_dictionary(0);
        let mut codes = [0i32; 1];
        assert!(dict.insert_values(&mut codes, &[1i64]).is_ok());
        assert!(dict.insert_values(&mut codes, &[1i32]).is_err());
        assert!(dict.insert_bytes(&mut codes, &[b"x"]).is_err());
        assert!(dict.insert_booleans(&mut codes, &[true]).is_err());

        let mut out = [0i64; 1];
        assert!(dict.lookup_values(&codes, &mut out).is_ok());
        assert_eq!(out, [1]);
        assert!(dict.lookup_values(&codes, &mut [0i32; 1]).is_err());
        assert!(dict.lookup_bytes(&codes, &mut [&[] as &[u8]; 1]).is_err());
        assert!(dict.lookup_booleans(&codes, &mut [false; 1]).is_err());
    }

    #[test]
    fn test_typed_and_value_paths_agree() {
        let mut typed = PhysicalType::Double.new_dictionary(0);
        let mut boxed = PhysicalType::Double.new_dictionary(0);
        let raw = [1.5f64, 2.5, 1.5, 3.5];
        let values: Vec<Value<'_>> = raw.iter().map(|&v| Value::double(v)).collect();

        let mut codes_typed = [0i32; 4];
        typed.insert_values(&mut codes_typed, &raw).unwrap();
        let mut codes_boxed = [0i32; 4];
        boxed.insert(&mut codes_boxed, &values);
        assert_eq!(codes_typed, codes_boxed);

        let mut out = [0f64; 4];
        typed.lookup_values(&codes_typed, &mut out).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    #[should_panic(expected = "expected INT32 value")]
    fn test_kind_mismatch_panics() {
        let mut dict = PhysicalType::Int32.new_dictionary(0);
        let mut codes = [0i32; 1];
        dict.insert(&mut codes, &[Value::int64(1)]);
    }

    #[test]
    fn test_seed_from_bytes_round_trip() {
        let mut dict = PhysicalType::Uint64.new_dictionary(0);
        let mut codes = [0i32; 3];
        dict.insert_values(&mut codes, &[7u64, 8, 9]).unwrap();

        let seeded = PhysicalType::Uint64
            .new_dictionary_from_bytes(0, dict.len(), dict.store_bytes())
            .unwrap();
        assert_eq!(seeded.len(), 3);
        assert_eq!(seeded.index(2).as_u64(), 9);
    }
}
