//! Wire format tags and item types.

use std::fmt;

/// Boolean true.
pub const TAG_TRUE: u8 = 0x01;
/// Boolean false.
pub const TAG_FALSE: u8 = 0x02;
/// Terminator for variable-item objects.
pub const TAG_TERMINATOR: u8 = 0x03;
/// Null object.
pub const TAG_NULL: u8 = 0x04;
/// `<16: UUID in transmission order>`.
pub const TAG_UUID: u8 = 0x05;
/// `<8: little endian f64 seconds since 2001-01-01 00:00:00>`.
pub const TAG_DATE: u8 = 0x06;
/// Integer -1.
pub const TAG_NEGATIVE_1: u8 = 0x07;
/// Integers 0-38 (value = tag - 0x08).
pub const TAG_INT_0: u8 = 0x08;
/// Integer 38, the last tag of the compact integer range.
pub const TAG_INT_38: u8 = 0x2E;
/// Integer 39.
pub const TAG_INT_39: u8 = 0x2F;
/// 8-bit signed integer.
pub const TAG_INT8: u8 = 0x30;
/// 16-bit little endian signed integer.
pub const TAG_INT16: u8 = 0x31;
/// 32-bit little endian signed integer.
pub const TAG_INT32: u8 = 0x32;
/// 64-bit little endian signed integer.
pub const TAG_INT64: u8 = 0x33;
/// Little endian f32.
pub const TAG_FLOAT32: u8 = 0x35;
/// Little endian f64.
pub const TAG_FLOAT64: u8 = 0x36;
/// 0-32 bytes of UTF-8 (length = tag - 0x40). Not NUL terminated.
pub const TAG_STRING_0: u8 = 0x40;
/// 32 bytes of UTF-8, the longest compact string.
pub const TAG_STRING_32: u8 = 0x60;
/// `<1: length> <n: UTF-8 bytes>`.
pub const TAG_STRING_U8: u8 = 0x61;
/// `<2: little endian length> <n: UTF-8 bytes>`.
pub const TAG_STRING_U16: u8 = 0x62;
/// `<4: little endian length> <n: UTF-8 bytes>`.
pub const TAG_STRING_U32: u8 = 0x63;
/// `<8: little endian length> <n: UTF-8 bytes>`.
pub const TAG_STRING_U64: u8 = 0x64;
/// `<n: UTF-8 bytes> <1: NUL>`.
pub const TAG_STRING: u8 = 0x6F;
/// 0-32 bytes of data (length = tag - 0x70).
pub const TAG_DATA_0: u8 = 0x70;
/// 32 bytes of data, the longest compact data item.
pub const TAG_DATA_32: u8 = 0x90;
/// `<1: length> <n: bytes>`.
pub const TAG_DATA_U8: u8 = 0x91;
/// `<2: little endian length> <n: bytes>`.
pub const TAG_DATA_U16: u8 = 0x92;
/// `<4: little endian length> <n: bytes>`.
pub const TAG_DATA_U32: u8 = 0x93;
/// `<8: little endian length> <n: bytes>`.
pub const TAG_DATA_U64: u8 = 0x94;
/// `[data object 1] ... [data object n] <1: terminator>`.
pub const TAG_DATA: u8 = 0x9F;
/// 0-14 items (count = tag - 0xD0).
pub const TAG_ARRAY_0: u8 = 0xD0;
/// 14 items, the largest compact array.
pub const TAG_ARRAY_14: u8 = 0xDE;
/// `[object 1] ... [object n] <1: terminator>`.
pub const TAG_ARRAY: u8 = 0xDF;
/// 0-14 entries (count = tag - 0xE0), alternating key and value.
pub const TAG_DICTIONARY_0: u8 = 0xE0;
/// 14 entries, the largest compact dictionary.
pub const TAG_DICTIONARY_14: u8 = 0xEE;
/// `[key 1][value 1] ... [key n][value n] <1: terminator>`.
pub const TAG_DICTIONARY: u8 = 0xEF;

/// Largest string or data length that fits into the tag byte.
pub const MAX_COMPACT_LENGTH: usize = (TAG_STRING_32 - TAG_STRING_0) as usize;

/// Maximum nesting of arrays and dictionaries accepted by the reader.
pub const MAX_RECURSION_DEPTH: usize = 20;

/// OPACK item types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Bool,
    Null,
    Uuid,
    Date,
    Number,
    String,
    Data,
    Array,
    Dictionary,
}

impl ItemType {
    /// Classifies a tag byte.
    ///
    /// Returns `None` for the terminator and for bytes that are not tags.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            TAG_TRUE | TAG_FALSE => Some(ItemType::Bool),
            TAG_NULL => Some(ItemType::Null),
            TAG_UUID => Some(ItemType::Uuid),
            TAG_DATE => Some(ItemType::Date),
            TAG_NEGATIVE_1..=TAG_INT64 | TAG_FLOAT32 | TAG_FLOAT64 => Some(ItemType::Number),
            TAG_STRING_0..=TAG_STRING_32
            | TAG_STRING_U8
            | TAG_STRING_U16
            | TAG_STRING_U32
            | TAG_STRING_U64
            | TAG_STRING => Some(ItemType::String),
            TAG_DATA_0..=TAG_DATA_32
            | TAG_DATA_U8
            | TAG_DATA_U16
            | TAG_DATA_U32
            | TAG_DATA_U64
            | TAG_DATA => Some(ItemType::Data),
            TAG_ARRAY_0..=TAG_ARRAY_14 | TAG_ARRAY => Some(ItemType::Array),
            TAG_DICTIONARY_0..=TAG_DICTIONARY_14 | TAG_DICTIONARY => Some(ItemType::Dictionary),
            _ => None,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemType::Bool => "boolean",
            ItemType::Null => "null",
            ItemType::Uuid => "UUID",
            ItemType::Date => "date",
            ItemType::Number => "number",
            ItemType::String => "string",
            ItemType::Data => "data",
            ItemType::Array => "array",
            ItemType::Dictionary => "dictionary",
        };
        f.write_str(name)
    }
}

/// Seconds between the Unix epoch and 2001-01-01 00:00:00 UTC.
pub const DATE_UNIX_OFFSET: f64 = 978_307_200.0;

/// Point in time, in seconds since 2001-01-01 00:00:00 UTC.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Date(f64);

impl Date {
    /// Creates a date from seconds since 2001-01-01 00:00:00 UTC.
    pub fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Creates a date from seconds since the Unix epoch.
    pub fn from_unix_seconds(seconds: f64) -> Self {
        Self(seconds - DATE_UNIX_OFFSET)
    }

    /// Returns seconds since 2001-01-01 00:00:00 UTC.
    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Returns seconds since the Unix epoch.
    pub fn unix_seconds(&self) -> f64 {
        self.0 + DATE_UNIX_OFFSET
    }
}

impl From<f64> for Date {
    fn from(seconds: f64) -> Self {
        Self(seconds)
    }
}

#[cfg(feature = "chrono")]
mod chrono_support {
    use chrono::{DateTime, Utc};

    use super::Date;

    impl Date {
        /// Converts to a UTC timestamp with nanosecond resolution.
        ///
        /// Returns `None` if the date is not finite or out of chrono's range.
        pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
            let unix = self.unix_seconds();
            if !unix.is_finite() {
                return None;
            }
            let secs = unix.floor();
            let nanos = ((unix - secs) * 1e9).round().min(999_999_999.0) as u32;
            if secs < i64::MIN as f64 || secs >= i64::MAX as f64 {
                return None;
            }
            DateTime::from_timestamp(secs as i64, nanos)
        }
    }

    impl From<DateTime<Utc>> for Date {
        fn from(value: DateTime<Utc>) -> Self {
            let unix = value.timestamp() as f64 + f64::from(value.timestamp_subsec_nanos()) / 1e9;
            Date::from_unix_seconds(unix)
        }
    }

}
