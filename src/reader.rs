//! OPACK decoder.

use std::borrow::Cow;

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::number::Number;
use crate::types::{
    Date, ItemType, MAX_COMPACT_LENGTH, MAX_RECURSION_DEPTH, TAG_ARRAY, TAG_ARRAY_0, TAG_DATA,
    TAG_DATA_0, TAG_DATA_U8, TAG_DATE, TAG_DICTIONARY, TAG_DICTIONARY_0, TAG_FALSE, TAG_FLOAT32,
    TAG_FLOAT64, TAG_INT16, TAG_INT32, TAG_INT64, TAG_INT8, TAG_INT_0, TAG_INT_38, TAG_INT_39,
    TAG_NEGATIVE_1, TAG_NULL, TAG_STRING, TAG_STRING_0, TAG_STRING_U8, TAG_TERMINATOR, TAG_TRUE,
    TAG_UUID,
};

/// Reader decodes OPACK items from a borrowed buffer.
///
/// Decoding never copies: strings, data and containers are returned as views into the
/// buffer. Arrays and dictionaries are returned as sub-readers spanning their contents.
/// After an error the reader must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reader<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            pos: 0,
        }
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes remaining.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Returns true if there is more data to read.
    pub fn has_more(&self) -> bool {
        self.pos < self.buffer.len()
    }

    /// Returns the bytes that have not been read yet.
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.buffer[self.pos..]
    }

    fn incomplete(&self, what: &'static str) -> Error {
        debug!(what, position = self.pos, "found incomplete item");
        Error::incomplete(what)
    }

    fn unexpected(&self, expected: ItemType, tag: u8) -> Error {
        debug!(%expected, tag, position = self.pos, "item has unexpected type");
        Error::unexpected_type(expected, tag)
    }

    /// Returns the tag of the next item without consuming it.
    fn peek_tag(&self) -> Result<u8> {
        match self.buffer.get(self.pos) {
            Some(&tag) => Ok(tag),
            None => Err(self.incomplete("tag")),
        }
    }

    /// Returns `len` bytes starting `offset` bytes after the current position.
    fn payload(&self, offset: usize, len: usize, what: &'static str) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if remaining < offset || remaining - offset < len {
            return Err(self.incomplete(what));
        }
        let start = self.pos + offset;
        Ok(&self.buffer[start..start + len])
    }

    /// Decodes the header of a compact or length-prefixed string or data item whose tag
    /// sits `offset` bytes after the current position.
    ///
    /// Returns the header length and the value length, or `None` if the tag is neither.
    fn sized_header(
        &self,
        offset: usize,
        tag: u8,
        compact_base: u8,
        prefixed_base: u8,
    ) -> Result<Option<(usize, usize)>> {
        if tag >= compact_base && usize::from(tag - compact_base) <= MAX_COMPACT_LENGTH {
            return Ok(Some((1, usize::from(tag - compact_base))));
        }
        if tag >= prefixed_base && tag - prefixed_base < 4 {
            let width = 1usize << (tag - prefixed_base);
            let bytes = self.payload(offset + 1, width, "length")?;
            let len = LittleEndian::read_uint(bytes, width);
            let len = usize::try_from(len).map_err(|_| {
                debug!(len, "item is too long");
                Error::TooLong
            })?;
            return Ok(Some((1 + width, len)));
        }
        Ok(None)
    }

    /// Fetches the type of the next item without consuming it.
    ///
    /// Returns `None` if the end of the buffer has been reached. A terminator or an unknown
    /// tag is an error.
    pub fn peek_next_type(&self) -> Result<Option<ItemType>> {
        let Some(&tag) = self.buffer.get(self.pos) else {
            return Ok(None);
        };
        match ItemType::from_tag(tag) {
            Some(item_type) => Ok(Some(item_type)),
            None if tag == TAG_TERMINATOR => {
                debug!(position = self.pos, "unexpected terminator item");
                Err(Error::UnexpectedTerminator)
            }
            None => {
                debug!(tag, position = self.pos, "unknown item type");
                Err(Error::UnknownTag(tag))
            }
        }
    }

    /// Fetches the next item of any type as a reader spanning its encoded bytes.
    pub fn read_next(&mut self) -> Result<Reader<'a>> {
        self.next_item(MAX_RECURSION_DEPTH)
    }

    /// Skips the next item of any type.
    pub fn skip_next(&mut self) -> Result<()> {
        self.next_item(MAX_RECURSION_DEPTH).map(|_| ())
    }

    fn next_item(&mut self, depth: usize) -> Result<Reader<'a>> {
        if depth == 0 {
            debug!("item contains too many levels of recursion");
            return Err(Error::RecursionLimit);
        }
        let Some(item_type) = self.peek_next_type()? else {
            debug!("end of data has been reached");
            return Err(Error::EndOfData);
        };

        let start = self.pos;
        match item_type {
            ItemType::Bool => self.read_bool().map(|_| ())?,
            ItemType::Null => self.read_null()?,
            ItemType::Uuid => self.read_uuid().map(|_| ())?,
            ItemType::Date => self.read_date().map(|_| ())?,
            ItemType::Number => self.read_number().map(|_| ())?,
            ItemType::String => self.skip_string()?,
            ItemType::Data => self.skip_data()?,
            ItemType::Array | ItemType::Dictionary => {
                self.container(item_type, depth - 1).map(|_| ())?
            }
        }
        Ok(Reader::new(&self.buffer[start..self.pos]))
    }

    /// Reads a boolean.
    pub fn read_bool(&mut self) -> Result<bool> {
        let value = match self.peek_tag()? {
            TAG_TRUE => true,
            TAG_FALSE => false,
            tag => return Err(self.unexpected(ItemType::Bool, tag)),
        };
        self.pos += 1;
        Ok(value)
    }

    /// Reads a null item.
    pub fn read_null(&mut self) -> Result<()> {
        match self.peek_tag()? {
            TAG_NULL => {
                self.pos += 1;
                Ok(())
            }
            tag => Err(self.unexpected(ItemType::Null, tag)),
        }
    }

    fn fixed_payload<const N: usize>(
        &self,
        expected_tag: u8,
        item_type: ItemType,
    ) -> Result<[u8; N]> {
        let tag = self.peek_tag()?;
        if tag != expected_tag {
            return Err(self.unexpected(item_type, tag));
        }
        let mut value = [0u8; N];
        value.copy_from_slice(self.payload(1, N, "value")?);
        Ok(value)
    }

    /// Reads a UUID.
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let bytes = self.fixed_payload::<16>(TAG_UUID, ItemType::Uuid)?;
        self.pos += 1 + bytes.len();
        Ok(Uuid::from_bytes(bytes))
    }

    /// Reads a UUID into the byte-reversed layout used by accessory identifiers.
    pub fn read_uuid_bytes(&mut self) -> Result<[u8; 16]> {
        let mut bytes = *self.read_uuid()?.as_bytes();
        bytes.reverse();
        Ok(bytes)
    }

    /// Reads a date.
    pub fn read_date(&mut self) -> Result<Date> {
        let bytes = self.fixed_payload::<8>(TAG_DATE, ItemType::Date)?;
        self.pos += 1 + bytes.len();
        Ok(Date::from_seconds(LittleEndian::read_f64(&bytes)))
    }

    /// Decodes the next number and its encoded length without consuming it.
    fn number_item(&self) -> Result<(Number, usize)> {
        let tag = self.peek_tag()?;
        let item = match tag {
            TAG_NEGATIVE_1 => (Number::Int(-1), 1),
            TAG_INT_0..=TAG_INT_38 => (Number::Int(i64::from(tag - TAG_INT_0)), 1),
            TAG_INT_39 => (Number::Int(39), 1),
            TAG_INT8 => {
                let bytes = self.payload(1, 1, "value")?;
                (Number::Int(i64::from(bytes[0] as i8)), 2)
            }
            TAG_INT16 => {
                let bytes = self.payload(1, 2, "value")?;
                (Number::Int(i64::from(LittleEndian::read_i16(bytes))), 3)
            }
            TAG_INT32 => {
                let bytes = self.payload(1, 4, "value")?;
                (Number::Int(i64::from(LittleEndian::read_i32(bytes))), 5)
            }
            TAG_INT64 => {
                let bytes = self.payload(1, 8, "value")?;
                (Number::Int(LittleEndian::read_i64(bytes)), 9)
            }
            TAG_FLOAT32 => {
                let bytes = self.payload(1, 4, "value")?;
                (Number::Float(f64::from(LittleEndian::read_f32(bytes))), 5)
            }
            TAG_FLOAT64 => {
                let bytes = self.payload(1, 8, "value")?;
                (Number::Float(LittleEndian::read_f64(bytes)), 9)
            }
            _ => return Err(self.unexpected(ItemType::Number, tag)),
        };
        Ok(item)
    }

    /// Reads a number in whichever representation it was encoded.
    pub fn read_number(&mut self) -> Result<Number> {
        let (number, len) = self.number_item()?;
        self.pos += len;
        Ok(number)
    }

    /// Reads an integer.
    ///
    /// Fails if the number is stored as a float that is not exactly an integer.
    pub fn read_int(&mut self) -> Result<i64> {
        let (number, len) = self.number_item()?;
        let Some(value) = number.exact_i64() else {
            debug!(?number, "number is not an integer value");
            return Err(Error::InexactNumber("an integer"));
        };
        self.pos += len;
        Ok(value)
    }

    /// Reads a floating point value. Integers are converted.
    pub fn read_float(&mut self) -> Result<f64> {
        let (number, len) = self.number_item()?;
        self.pos += len;
        Ok(number.to_f64().0)
    }

    /// Locates the next string without consuming it.
    ///
    /// Returns the raw string bytes and the encoded length of the item.
    fn string_item(&self) -> Result<(&'a [u8], usize)> {
        let tag = self.peek_tag()?;
        if tag == TAG_STRING {
            let rest = &self.buffer[self.pos + 1..];
            let Some(end) = rest.iter().position(|&b| b == 0) else {
                return Err(self.incomplete("value"));
            };
            return Ok((&rest[..end], end + 2));
        }
        match self.sized_header(0, tag, TAG_STRING_0, TAG_STRING_U8)? {
            Some((header, len)) => Ok((self.payload(header, len, "value")?, header + len)),
            None => Err(self.unexpected(ItemType::String, tag)),
        }
    }

    /// Reads a string.
    ///
    /// Strings containing NUL characters are rejected.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let (bytes, len) = self.string_item()?;
        if bytes.contains(&0) {
            debug!("strings with NUL characters are not supported");
            return Err(Error::EmbeddedNul);
        }
        let value = std::str::from_utf8(bytes).map_err(|_| {
            debug!("string is not valid UTF-8");
            Error::InvalidUtf8
        })?;
        self.pos += len;
        Ok(value)
    }

    /// Skips a string without validating its contents.
    pub fn skip_string(&mut self) -> Result<()> {
        let (_, len) = self.string_item()?;
        self.pos += len;
        Ok(())
    }

    /// Walks the next data item, passing each fragment to `on_fragment` in order.
    ///
    /// Implicit-length items may nest; nesting is tracked with a counter of open items.
    /// Returns the encoded length of the item.
    fn data_item(&self, mut on_fragment: impl FnMut(&'a [u8])) -> Result<usize> {
        let mut o = 0;
        let mut open = 0usize;
        loop {
            let tag = *self
                .buffer
                .get(self.pos + o)
                .ok_or_else(|| self.incomplete("tag"))?;
            match tag {
                TAG_DATA => {
                    open += 1;
                    o += 1;
                }
                TAG_TERMINATOR if open > 0 => {
                    open -= 1;
                    o += 1;
                }
                _ => match self.sized_header(o, tag, TAG_DATA_0, TAG_DATA_U8)? {
                    Some((header, len)) => {
                        on_fragment(self.payload(o + header, len, "value")?);
                        o += header + len;
                    }
                    None => return Err(self.unexpected(ItemType::Data, tag)),
                },
            }
            if open == 0 {
                return Ok(o);
            }
        }
    }

    /// Reads a data item.
    ///
    /// The value borrows from the buffer unless it was split across several fragments of
    /// an implicit-length item, in which case the fragments are concatenated.
    pub fn read_data(&mut self) -> Result<Cow<'a, [u8]>> {
        let mut value: Cow<'a, [u8]> = Cow::Borrowed(&[]);
        let len = self.data_item(|fragment| {
            if fragment.is_empty() {
                return;
            }
            if value.is_empty() {
                value = Cow::Borrowed(fragment);
            } else {
                value.to_mut().extend_from_slice(fragment);
            }
        })?;
        self.pos += len;
        Ok(value)
    }

    /// Skips a data item without assembling its fragments.
    pub fn skip_data(&mut self) -> Result<()> {
        let len = self.data_item(|_| {})?;
        self.pos += len;
        Ok(())
    }

    /// Reads an array or dictionary and returns a sub-reader over its items.
    ///
    /// Dictionary items alternate between keys and values.
    fn container(&mut self, item_type: ItemType, depth: usize) -> Result<Reader<'a>> {
        if depth == 0 {
            debug!("item contains too many levels of recursion");
            return Err(Error::RecursionLimit);
        }

        let (compact_base, implicit_tag, items_per_entry) = match item_type {
            ItemType::Array => (TAG_ARRAY_0, TAG_ARRAY, 1),
            _ => (TAG_DICTIONARY_0, TAG_DICTIONARY, 2),
        };
        let tag = self.peek_tag()?;
        let count = if tag == implicit_tag {
            None
        } else if (compact_base..implicit_tag).contains(&tag) {
            Some(usize::from(tag - compact_base))
        } else {
            return Err(self.unexpected(item_type, tag));
        };

        let body = &self.buffer[self.pos + 1..];
        let mut items = Reader::new(body);
        let mut entries = 0;
        let (end, consumed) = loop {
            if count == Some(entries) {
                break (items.pos, items.pos);
            }
            match body.get(items.pos) {
                None => return Err(items.incomplete("sub-tag")),
                Some(&TAG_TERMINATOR) => break (items.pos, items.pos + 1),
                Some(_) => {
                    for _ in 0..items_per_entry {
                        items.next_item(depth)?;
                    }
                    entries += 1;
                }
            }
        };

        self.pos += 1 + consumed;
        Ok(Reader::new(&body[..end]))
    }

    /// Reads an array and returns a sub-reader over its elements.
    pub fn read_array(&mut self) -> Result<Reader<'a>> {
        self.container(ItemType::Array, MAX_RECURSION_DEPTH)
    }

    /// Skips an array.
    pub fn skip_array(&mut self) -> Result<()> {
        self.read_array().map(|_| ())
    }

    /// Reads a dictionary and returns a sub-reader over its entries.
    ///
    /// Entries are read from the sub-reader by alternating between keys and values.
    pub fn read_dictionary(&mut self) -> Result<Reader<'a>> {
        self.container(ItemType::Dictionary, MAX_RECURSION_DEPTH)
    }

    /// Skips a dictionary.
    pub fn skip_dictionary(&mut self) -> Result<()> {
        self.read_dictionary().map(|_| ())
    }
}
