//! # lamina-column
//!
//! Dictionary encoding core of the lamina columnar format.
//!
//! A [`dictionary::Dictionary`] maintains, per physical column type, a
//! compact table of distinct values plus the value <-> code mappings around
//! which statistics, page materialisation and read-side reconstruction are
//! organised. An [`column_buffer::IndexedColumnBuffer`] interns written
//! values and accumulates their codes; a [`page::IndexedPage`] is the
//! page-shaped view of such a code array, whose wire payload goes through
//! the 32-bit integer variant of an [`encoding::Encoding`] codec.
//!
//! ## Aliasing
//!
//! Dictionaries share storage with the pages and values they hand out.
//! Mutating a dictionary while any of those are live is a compile error:
//! every page, cursor and looked-up value borrows the dictionary, and the
//! insert operations take `&mut self`.

pub mod column_buffer;
pub mod dictionary;
pub mod encoding;
pub mod indexed_type;
pub mod page;
pub mod value;

pub use column_buffer::{
    BloomFilter, IndexedColumnBuffer, IndexedColumnIndex, IndexedOffsetIndex, Row,
};
pub use dictionary::{Dictionary, DictionaryValue};
pub use encoding::{Encoding, Plain};
pub use indexed_type::{IndexedPageType, IndexedType};
pub use page::{
    BufferedPage, DictionaryPage, DictionaryPageValues, IndexedPage, IndexedPageValues,
};
pub use value::{Be128, Int96, NativeValue, PhysicalType, Value, ValueKind};
