//! OPACK - Compact tag-prefixed binary serialization
//!
//! Every item starts with a one-byte tag. Small integers and short strings fit into the
//! tag itself; larger values carry an explicit length or are terminated. Decoding is
//! zero-copy: strings, data and containers are returned as views into the input.
//!
//! # Example
//!
//! ```rust
//! use opack::{DictionaryElement, Reader, Result, Writer};
//!
//! fn main() -> Result<()> {
//!     // Encoding
//!     let mut writer = Writer::new();
//!     writer.write_dictionary_begin()?;
//!     writer.write_string("the answer")?;
//!     writer.write_int(42)?;
//!     writer.write_terminator()?;
//!     let data = writer.into_bytes();
//!     assert_eq!(data[0], 0xEF);
//!
//!     // Decoding
//!     let mut elements = [DictionaryElement::keyed("the answer")];
//!     Reader::new(&data).read_string_dictionary(&mut elements)?;
//!     if let Some(mut value) = elements[0].value() {
//!         assert_eq!(value.read_int()?, 42);
//!     }
//!     Ok(())
//! }
//! ```

mod dictionary;
mod error;
mod number;
mod reader;
pub mod types;
mod writer;

pub use dictionary::DictionaryElement;
pub use error::{Error, ErrorKind, Result};
pub use number::{Number, NumberType};
pub use reader::Reader;
pub use types::{Date, ItemType, MAX_RECURSION_DEPTH};
pub use uuid::Uuid;
pub use writer::Writer;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Marshal encodes a value using a custom encoder function.
pub fn marshal<T, F>(value: &T, encoder: F) -> Result<Vec<u8>>
where
    T: ?Sized,
    F: FnOnce(&mut Writer<'static>, &T) -> Result<()>,
{
    let mut writer = Writer::new();
    encoder(&mut writer, value)?;
    Ok(writer.into_bytes())
}

/// Unmarshal decodes a value using a custom decoder function.
///
/// The decoded value may borrow from `data`.
pub fn unmarshal<'a, T, F>(data: &'a [u8], decoder: F) -> Result<T>
where
    F: FnOnce(&mut Reader<'a>) -> Result<T>,
{
    let mut reader = Reader::new(data);
    decoder(&mut reader)
}
