//! A collection of values stored as bytes with alignment guarantees.

use lamina_bytes::buffer::AlignedByteVec;

/// A collection of values stored as bytes with alignment guarantees.
///
/// `Values` wraps an `AlignedByteVec` and provides element-counted access to
/// the byte representations of typed values. The element type is supplied at
/// each call site rather than carried by the container, which lets a single
/// storage type back every dictionary variant.
#[derive(Debug, Clone, Default)]
pub struct Values(AlignedByteVec);

impl Values {
    /// Creates a new, empty `Values` instance.
    pub fn new() -> Values {
        Values(AlignedByteVec::new())
    }

    /// Creates a new `Values` instance from an existing `AlignedByteVec`.
    pub fn from_vec(vec: AlignedByteVec) -> Values {
        Values(vec)
    }

    /// Creates a new `Values` instance with capacity for at least `capacity`
    /// elements of type `T`.
    pub fn with_capacity<T>(capacity: usize) -> Values {
        Values(AlignedByteVec::with_capacity(capacity * size_of::<T>()))
    }

    /// Creates a new `Values` instance with a specified byte capacity.
    pub fn with_byte_capacity(capacity: usize) -> Values {
        Values(AlignedByteVec::with_capacity(capacity))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of complete elements of type `T` stored.
    #[inline]
    pub fn len<T>(&self) -> usize {
        self.0.len() / size_of::<T>()
    }

    /// Returns the number of bytes in the container.
    #[inline]
    pub fn bytes_len(&self) -> usize {
        self.0.len()
    }

    /// Returns the number of elements of type `T` the container can hold
    /// without reallocating.
    #[inline]
    pub fn capacity<T>(&self) -> usize {
        self.0.capacity() / size_of::<T>()
    }

    /// Returns a reference to the underlying bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Interprets the underlying bytes as a slice of elements of type `T`.
    #[inline]
    pub fn as_slice<T>(&self) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        self.0.typed_data()
    }

    /// Interprets the underlying bytes as a mutable slice of elements of
    /// type `T`.
    #[inline]
    pub fn as_mut_slice<T>(&mut self) -> &mut [T]
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        self.0.typed_data_mut()
    }

    /// Appends a single element of type `T` to the end of the container.
    #[inline]
    pub fn push<T>(&mut self, value: T)
    where
        T: bytemuck::NoUninit,
    {
        self.0.push_typed(value);
    }

    /// Extends the container with the contents of a slice of elements of
    /// type `T`.
    #[inline]
    pub fn extend_from_slice<T>(&mut self, values: &[T])
    where
        T: bytemuck::NoUninit,
    {
        self.0.extend_from_typed_slice(values);
    }

    /// Extends the container with raw bytes.
    #[inline]
    pub fn extend_from_byte_slice(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    /// Truncates the container to `new_len` elements of type `T`.
    pub fn truncate<T>(&mut self, new_len: usize) {
        self.0.truncate(new_len * size_of::<T>());
    }

    /// Clears the container, removing all elements.
    ///
    /// This does not affect the allocated capacity.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Consumes the `Values` container and returns the underlying
    /// `AlignedByteVec`.
    pub fn into_inner(self) -> AlignedByteVec {
        self.0
    }
}
