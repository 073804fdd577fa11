//! Dictionary variant for fixed-width primitive values.

use ahash::AHashMap;
use lamina_common::{Result, verify_data};
use lamina_sequence::values::Values;

use crate::value::{NativeValue, PhysicalType, Value};

/// Interning dictionary over a dense store of fixed-width values.
///
/// The reverse index maps a value's hash key to its code. It stays absent
/// until the first insertion after construction or reset: dictionaries
/// materialised on a read path are typically only looked up, so the build
/// cost is paid only when needed. When built, it is populated by a single
/// scan of the value store and sized from the store's capacity.
#[derive(Clone)]
pub struct PrimitiveDictionary<T: NativeValue> {
    values: Values,
    index: Option<AHashMap<T::Key, i32>>,
    column_index: i16,
}

impl<T: NativeValue> PrimitiveDictionary<T> {
    pub fn new(column: usize) -> PrimitiveDictionary<T> {
        Self::with_capacity(column, 0)
    }

    pub fn with_capacity(column: usize, capacity: usize) -> PrimitiveDictionary<T> {
        PrimitiveDictionary {
            values: Values::with_capacity::<T>(capacity),
            index: None,
            column_index: !(column as i16),
        }
    }

    /// Seeds the dictionary with the first `num_values` elements of an
    /// existing store. The reverse index is not built.
    pub fn from_values(
        column: usize,
        num_values: usize,
        mut values: Values,
    ) -> Result<PrimitiveDictionary<T>> {
        verify_data!(num_values, values.len::<T>() >= num_values);
        values.truncate::<T>(num_values);
        Ok(PrimitiveDictionary {
            values,
            index: None,
            column_index: !(column as i16),
        })
    }

    pub fn physical_type(&self) -> PhysicalType {
        T::PHYSICAL_TYPE
    }

    pub(crate) fn column_tag(&self) -> i16 {
        self.column_index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len::<T>()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value interned at `code`.
    ///
    /// # Panics
    ///
    /// Panics if `code` is negative or not less than `len()`.
    #[inline]
    pub fn value_at(&self, code: i32) -> T {
        let code = checked_code(code);
        self.values.as_slice::<T>()[code]
    }

    /// The dense value store, in intern order.
    #[inline]
    pub fn values(&self) -> &[T] {
        self.values.as_slice()
    }

    pub(crate) fn store(&self) -> &Values {
        &self.values
    }

    pub(crate) fn make_value(&self, code: i32) -> Value<'static> {
        Value::with_column_tag(self.value_at(code).to_kind(), self.column_index)
    }

    /// Interns each input value, writing its code to the corresponding slot
    /// of `codes`. Previously interned values keep their original code.
    ///
    /// # Panics
    ///
    /// Panics if `codes` is shorter than `values`.
    pub fn insert_values(&mut self, codes: &mut [i32], values: &[T]) {
        self.insert_with(codes, values.len(), |i| values[i]);
    }

    pub(crate) fn insert_with(
        &mut self,
        codes: &mut [i32],
        count: usize,
        value_at: impl Fn(usize) -> T,
    ) {
        assert!(
            codes.len() >= count,
            "dictionary insert with fewer codes than values"
        );
        self.ensure_index();

        let values = &mut self.values;
        let index = self.index.as_mut().expect("reverse index");

        for (i, code) in codes.iter_mut().enumerate().take(count) {
            let value = value_at(i);
            *code = *index.entry(value.key()).or_insert_with(|| {
                let next = values.len::<T>() as i32;
                values.push(value);
                next
            });
        }
    }

    fn ensure_index(&mut self) {
        if self.index.is_some() {
            return;
        }
        let mut index = AHashMap::with_capacity(self.values.capacity::<T>());
        for (i, value) in self.values.as_slice::<T>().iter().enumerate() {
            index.insert(value.key(), i as i32);
        }
        self.index = Some(index);
    }

    /// Materialises each code into the corresponding slot of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `codes`, or on an invalid code.
    pub fn lookup_values(&self, codes: &[i32], out: &mut [T]) {
        assert!(
            out.len() >= codes.len(),
            "dictionary lookup with more codes than output slots"
        );
        for (slot, &code) in out.iter_mut().zip(codes) {
            *slot = self.value_at(code);
        }
    }

    /// Returns (min, max) of the values referenced by `codes` under the
    /// type's ordering, or `None` for empty input.
    pub fn bounds_of(&self, codes: &[i32]) -> Option<(T, T)> {
        use std::cmp::Ordering::Less;

        let (&first, rest) = codes.split_first()?;
        let mut min = self.value_at(first);
        let mut max = min;
        for &code in rest {
            let value = self.value_at(code);
            if value.compare(min) == Less {
                min = value;
            } else if max.compare(value) == Less {
                max = value;
            }
        }
        Some((min, max))
    }

    /// Removes all values and drops the reverse index, keeping capacity.
    pub fn reset(&mut self) {
        self.values.clear();
        self.index = None;
    }
}

#[inline]
pub(crate) fn checked_code(code: i32) -> usize {
    usize::try_from(code)
        .unwrap_or_else(|_| panic!("negative dictionary code {code}"))
}
