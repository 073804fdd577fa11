//! Dictionary variant for booleans.

use lamina_common::{Result, verify_data};
use lamina_sequence::values::Values;

use crate::value::{PhysicalType, Value, ValueKind};

/// Interning dictionary for booleans; degenerate with at most two entries.
///
/// There is no hash map. Two slots track the code of `false` and the code of
/// `true`, each `-1` until that polarity is first seen; the first inserted
/// boolean receives code 0 regardless of polarity. The value store holds one
/// byte (0 or 1) per interned entry.
#[derive(Clone)]
pub struct BooleanDictionary {
    values: Values,
    table: [i32; 2],
    column_index: i16,
}

impl BooleanDictionary {
    pub fn new(column: usize) -> BooleanDictionary {
        BooleanDictionary {
            values: Values::with_capacity::<u8>(2),
            table: [-1, -1],
            column_index: !(column as i16),
        }
    }

    /// Seeds the dictionary with the first `num_values` bytes of an existing
    /// store, recovering the two-slot table by scanning for the first byte
    /// of each polarity.
    pub fn from_values(
        column: usize,
        num_values: usize,
        mut values: Values,
    ) -> Result<BooleanDictionary> {
        verify_data!(num_values, values.len::<u8>() >= num_values);
        verify_data!(num_values, num_values <= 2);
        values.truncate::<u8>(num_values);

        let mut table = [-1i32, -1];
        for (i, &byte) in values.as_bytes().iter().enumerate() {
            let polarity = (byte != 0) as usize;
            if table[polarity] < 0 {
                table[polarity] = i as i32;
            }
        }

        Ok(BooleanDictionary {
            values,
            table,
            column_index: !(column as i16),
        })
    }

    pub fn physical_type(&self) -> PhysicalType {
        PhysicalType::Boolean
    }

    pub(crate) fn column_tag(&self) -> i16 {
        self.column_index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len::<u8>()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the boolean interned at `code`.
    ///
    /// # Panics
    ///
    /// Panics if `code` is negative or not less than `len()`.
    #[inline]
    pub fn value_at(&self, code: i32) -> bool {
        let code = super::primitive::checked_code(code);
        self.values.as_bytes()[code] != 0
    }

    pub(crate) fn store(&self) -> &Values {
        &self.values
    }

    pub(crate) fn make_value(&self, code: i32) -> Value<'static> {
        Value::with_column_tag(ValueKind::Boolean(self.value_at(code)), self.column_index)
    }

    /// Interns each input boolean, writing its code to the corresponding
    /// slot of `codes`.
    ///
    /// # Panics
    ///
    /// Panics if `codes` is shorter than `values`.
    pub fn insert_booleans(&mut self, codes: &mut [i32], values: &[bool]) {
        self.insert_with(codes, values.len(), |i| values[i]);
    }

    pub(crate) fn insert_with(
        &mut self,
        codes: &mut [i32],
        count: usize,
        value_at: impl Fn(usize) -> bool,
    ) {
        assert!(
            codes.len() >= count,
            "dictionary insert with fewer codes than values"
        );
        for (i, code) in codes.iter_mut().enumerate().take(count) {
            let polarity = value_at(i) as usize;
            if self.table[polarity] < 0 {
                self.table[polarity] = self.len() as i32;
                self.values.push(polarity as u8);
            }
            *code = self.table[polarity];
        }
    }

    /// Materialises each code into the corresponding slot of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `codes`, or on an invalid code.
    pub fn lookup_booleans(&self, codes: &[i32], out: &mut [bool]) {
        assert!(
            out.len() >= codes.len(),
            "dictionary lookup with more codes than output slots"
        );
        for (slot, &code) in out.iter_mut().zip(codes) {
            *slot = self.value_at(code);
        }
    }

    /// Returns (min, max) of the booleans referenced by `codes`, or `None`
    /// for empty input. The scan stops once both polarities are seen.
    pub fn bounds_of(&self, codes: &[i32]) -> Option<(bool, bool)> {
        if codes.is_empty() {
            return None;
        }
        let mut has_false = false;
        let mut has_true = false;
        for &code in codes {
            if self.value_at(code) {
                has_true = true;
            } else {
                has_false = true;
            }
            if has_false && has_true {
                break;
            }
        }
        Some((!has_false, has_true))
    }

    /// Removes all values and clears the two-slot table, keeping capacity.
    pub fn reset(&mut self) {
        self.values.clear();
        self.table = [-1, -1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_inserted_polarity_gets_code_zero() {
        let mut dict = BooleanDictionary::new(0);
        let mut codes = [0i32; 4];
        dict.insert_booleans(&mut codes, &[true, false, true, true]);
        assert_eq!(codes, [0, 1, 0, 0]);
        assert_eq!(dict.len(), 2);
        assert!(dict.value_at(0));
        assert!(!dict.value_at(1));
    }

    #[test]
    fn test_single_polarity() {
        let mut dict = BooleanDictionary::new(0);
        let mut codes = [0i32; 3];
        dict.insert_booleans(&mut codes, &[false, false, false]);
        assert_eq!(codes, [0, 0, 0]);
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.bounds_of(&codes), Some((false, false)));
    }

    #[test]
    fn test_bounds_both_polarities() {
        let mut dict = BooleanDictionary::new(0);
        let mut codes = [0i32; 4];
        dict.insert_booleans(&mut codes, &[true, false, true, true]);
        assert_eq!(dict.bounds_of(&codes), Some((false, true)));
        assert_eq!(dict.bounds_of(&[]), None);
        assert_eq!(dict.bounds_of(&codes[..1]), Some((true, true)));
    }

    #[test]
    fn test_seed_recovers_table() {
        let mut store = Values::new();
        store.extend_from_byte_slice(&[1, 0]);
        let mut dict = BooleanDictionary::from_values(0, 2, store).unwrap();
        assert_eq!(dict.len(), 2);

        let mut codes = [0i32; 2];
        dict.insert_booleans(&mut codes, &[false, true]);
        assert_eq!(codes, [1, 0]);
    }

    #[test]
    fn test_seed_rejects_oversized() {
        let mut store = Values::new();
        store.extend_from_byte_slice(&[0, 1, 1]);
        assert!(BooleanDictionary::from_values(0, 3, store).is_err());
    }

    #[test]
    fn test_reset() {
        let mut dict = BooleanDictionary::new(0);
        let mut codes = [0i32; 1];
        dict.insert_booleans(&mut codes, &[true]);
        dict.reset();
        assert_eq!(dict.len(), 0);
        dict.insert_booleans(&mut codes, &[false]);
        assert_eq!(codes, [0]);
    }
}
