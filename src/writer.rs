//! OPACK encoder.

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::number::Number;
use crate::types::{
    Date, MAX_COMPACT_LENGTH, TAG_ARRAY, TAG_DATA_0, TAG_DATA_U16, TAG_DATA_U32, TAG_DATA_U64,
    TAG_DATA_U8, TAG_DATE, TAG_DICTIONARY, TAG_FALSE, TAG_FLOAT64, TAG_INT16, TAG_INT32,
    TAG_INT64, TAG_INT8, TAG_INT_0, TAG_INT_39, TAG_NEGATIVE_1, TAG_NULL, TAG_STRING,
    TAG_STRING_0, TAG_TERMINATOR, TAG_TRUE, TAG_UUID,
};

const INITIAL_CAPACITY: usize = 256;

/// Longest encoded header: a tag followed by 8 bytes.
const MAX_HEADER_LENGTH: usize = 9;

#[derive(Debug)]
enum Storage<'a> {
    Fixed { buffer: &'a mut [u8], len: usize },
    Growable(Vec<u8>),
}

/// Writer encodes OPACK items.
///
/// A writer either appends into a caller-supplied buffer of fixed size or into a
/// growable vector. Every append is all-or-nothing: when an item does not fit into a
/// fixed buffer, `OutOfResources` is returned and nothing is written.
///
/// The writer always picks the most compact encoding for scalars, but opens arrays and
/// dictionaries in their terminated form. Callers are responsible for pairing each
/// [`write_array_begin`](Self::write_array_begin) and
/// [`write_dictionary_begin`](Self::write_dictionary_begin) with a
/// [`write_terminator`](Self::write_terminator), and for alternating dictionary keys and
/// values.
#[derive(Debug)]
pub struct Writer<'a> {
    storage: Storage<'a>,
}

impl Writer<'static> {
    /// Creates a new growable writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates a new growable writer with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Storage::Growable(Vec::with_capacity(capacity)),
        }
    }
}

impl<'a> Writer<'a> {
    /// Creates a writer that encodes into `buffer` and never grows beyond it.
    pub fn fixed(buffer: &'a mut [u8]) -> Self {
        Self {
            storage: Storage::Fixed { buffer, len: 0 },
        }
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the size of the fixed buffer, or `None` for a growable writer.
    pub fn capacity(&self) -> Option<usize> {
        match &self.storage {
            Storage::Fixed { buffer, .. } => Some(buffer.len()),
            Storage::Growable(_) => None,
        }
    }

    /// Returns the encoded bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Fixed { buffer, len } => &buffer[..*len],
            Storage::Growable(buffer) => buffer,
        }
    }

    /// Consumes the writer and returns the encoded bytes.
    ///
    /// Bytes written into a fixed buffer are copied out.
    pub fn into_bytes(self) -> Vec<u8> {
        match self.storage {
            Storage::Fixed { buffer, len } => buffer[..len].to_vec(),
            Storage::Growable(buffer) => buffer,
        }
    }

    /// Resets the writer for reuse.
    pub fn reset(&mut self) {
        match &mut self.storage {
            Storage::Fixed { len, .. } => *len = 0,
            Storage::Growable(buffer) => buffer.clear(),
        }
    }

    /// Appends the concatenation of `parts`, or nothing if it does not fit.
    fn append(&mut self, parts: &[&[u8]]) -> Result<()> {
        let needed: usize = parts.iter().map(|part| part.len()).sum();
        match &mut self.storage {
            Storage::Fixed { buffer, len } => {
                let available = buffer.len() - *len;
                if needed > available {
                    debug!(needed, available, "not enough space in writer buffer");
                    return Err(Error::out_of_resources(needed, available));
                }
                let mut pos = *len;
                for part in parts {
                    buffer[pos..pos + part.len()].copy_from_slice(part);
                    pos += part.len();
                }
                *len = pos;
            }
            Storage::Growable(buffer) => {
                buffer.reserve(needed);
                for part in parts {
                    buffer.extend_from_slice(part);
                }
            }
        }
        trace!(needed, "appended item");
        Ok(())
    }

    /// Writes a boolean.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.append(&[&[if value { TAG_TRUE } else { TAG_FALSE }]])
    }

    /// Writes a null item.
    pub fn write_null(&mut self) -> Result<()> {
        self.append(&[&[TAG_NULL]])
    }

    /// Writes a UUID.
    pub fn write_uuid(&mut self, value: &Uuid) -> Result<()> {
        self.append(&[&[TAG_UUID], value.as_bytes()])
    }

    /// Writes a UUID given in the byte-reversed layout used by accessory identifiers.
    pub fn write_uuid_bytes(&mut self, value: &[u8; 16]) -> Result<()> {
        let mut bytes = *value;
        bytes.reverse();
        self.write_uuid(&Uuid::from_bytes(bytes))
    }

    /// Writes a date.
    pub fn write_date(&mut self, value: Date) -> Result<()> {
        let mut item = [0u8; MAX_HEADER_LENGTH];
        item[0] = TAG_DATE;
        LittleEndian::write_f64(&mut item[1..], value.seconds());
        self.append(&[&item])
    }

    /// Writes an integer using the smallest encoding that holds it.
    pub fn write_int(&mut self, value: i64) -> Result<()> {
        let mut item = [0u8; MAX_HEADER_LENGTH];
        let len = match value {
            -1 => {
                item[0] = TAG_NEGATIVE_1;
                1
            }
            0..=38 => {
                item[0] = TAG_INT_0 + value as u8;
                1
            }
            39 => {
                item[0] = TAG_INT_39;
                1
            }
            _ if i8::try_from(value).is_ok() => {
                item[0] = TAG_INT8;
                item[1] = value as i8 as u8;
                2
            }
            _ if i16::try_from(value).is_ok() => {
                item[0] = TAG_INT16;
                LittleEndian::write_i16(&mut item[1..3], value as i16);
                3
            }
            _ if i32::try_from(value).is_ok() => {
                item[0] = TAG_INT32;
                LittleEndian::write_i32(&mut item[1..5], value as i32);
                5
            }
            _ => {
                item[0] = TAG_INT64;
                LittleEndian::write_i64(&mut item[1..], value);
                9
            }
        };
        self.append(&[&item[..len]])
    }

    /// Writes a floating point value. Always uses the 8-byte form.
    pub fn write_float(&mut self, value: f64) -> Result<()> {
        let mut item = [0u8; MAX_HEADER_LENGTH];
        item[0] = TAG_FLOAT64;
        LittleEndian::write_f64(&mut item[1..], value);
        self.append(&[&item])
    }

    /// Writes a number in the representation it holds.
    pub fn write_number(&mut self, value: &Number) -> Result<()> {
        match *value {
            Number::Int(value) => self.write_int(value),
            Number::Float(value) => self.write_float(value),
        }
    }

    /// Writes a string.
    ///
    /// Short strings are stored with their length in the tag, longer ones NUL-terminated.
    /// Strings containing a NUL character are rejected and nothing is written.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        if bytes.contains(&0) {
            debug!("strings with NUL characters are not supported");
            return Err(Error::EmbeddedNul);
        }
        if bytes.len() <= MAX_COMPACT_LENGTH {
            self.append(&[&[TAG_STRING_0 + bytes.len() as u8], bytes])
        } else {
            self.append(&[&[TAG_STRING], bytes, &[0]])
        }
    }

    /// Writes a data item with the shortest length prefix that holds it.
    pub fn write_data(&mut self, value: &[u8]) -> Result<()> {
        let len = value.len();
        if len <= MAX_COMPACT_LENGTH {
            return self.append(&[&[TAG_DATA_0 + len as u8], value]);
        }

        let (tag, width) = if len <= usize::from(u8::MAX) {
            (TAG_DATA_U8, 1)
        } else if len <= usize::from(u16::MAX) {
            (TAG_DATA_U16, 2)
        } else if u32::try_from(len).is_ok() {
            (TAG_DATA_U32, 4)
        } else {
            (TAG_DATA_U64, 8)
        };
        let mut header = [0u8; MAX_HEADER_LENGTH];
        header[0] = tag;
        LittleEndian::write_uint(&mut header[1..], len as u64, width);
        self.append(&[&header[..1 + width], value])
    }

    /// Opens an array. Items follow until [`write_terminator`](Self::write_terminator).
    pub fn write_array_begin(&mut self) -> Result<()> {
        self.append(&[&[TAG_ARRAY]])
    }

    /// Opens a dictionary. Keys and values alternate until
    /// [`write_terminator`](Self::write_terminator).
    pub fn write_dictionary_begin(&mut self) -> Result<()> {
        self.append(&[&[TAG_DICTIONARY]])
    }

    /// Closes the innermost open array or dictionary.
    pub fn write_terminator(&mut self) -> Result<()> {
        self.append(&[&[TAG_TERMINATOR]])
    }
}

impl Default for Writer<'static> {
    fn default() -> Self {
        Self::new()
    }
}
