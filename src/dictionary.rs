//! Lookup of string-keyed dictionary entries.

use tracing::debug;

use crate::error::{Error, Result};
use crate::reader::Reader;

/// Slot for one entry of a string-keyed dictionary.
///
/// A keyed element receives the value stored under its key. A wildcard element receives
/// the first entry whose key no other element asked for, and reports that key afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryElement<'k> {
    key: Option<&'k str>,
    wildcard: bool,
    value: Option<Reader<'k>>,
}

impl<'k> DictionaryElement<'k> {
    /// Creates an element that matches `key`.
    pub fn keyed(key: &'k str) -> Self {
        Self {
            key: Some(key),
            wildcard: false,
            value: None,
        }
    }

    /// Creates an element that matches any otherwise unmatched key.
    pub fn wildcard() -> Self {
        Self {
            key: None,
            wildcard: true,
            value: None,
        }
    }

    /// Returns the key, or `None` for a wildcard that has not been matched.
    pub fn key(&self) -> Option<&'k str> {
        self.key
    }

    /// Returns a reader over the value, or `None` if the key was not present.
    pub fn value(&self) -> Option<Reader<'k>> {
        self.value
    }

    /// Returns true if a value was found.
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    fn reset(&mut self) {
        if self.wildcard {
            self.key = None;
        }
        self.value = None;
    }
}

impl<'a> Reader<'a> {
    /// Reads a dictionary with string keys, routing each entry to the matching element.
    ///
    /// Entries are matched by key first. Entries with no matching element go to unbound
    /// wildcard elements in order, and are skipped once none are left. Elements with no
    /// matching entry report no value.
    ///
    /// The dictionary must be the last item in the reader. Fails if a key is not a
    /// string, or if an entry repeats a key that already received a value.
    ///
    /// # Panics
    ///
    /// Panics if two keyed elements share the same key.
    pub fn read_string_dictionary<'k>(
        &mut self,
        elements: &mut [DictionaryElement<'k>],
    ) -> Result<()>
    where
        'a: 'k,
    {
        for (i, element) in elements.iter().enumerate() {
            if let (false, Some(key)) = (element.wildcard, element.key) {
                let duplicate = elements[..i]
                    .iter()
                    .any(|other| !other.wildcard && other.key == Some(key));
                assert!(!duplicate, "duplicate dictionary element key: {key}");
            }
        }
        elements.iter_mut().for_each(DictionaryElement::reset);

        let mut dictionary = self.read_dictionary()?;
        while dictionary.peek_next_type()?.is_some() {
            let key = dictionary.read_string()?;

            if let Some(element) = elements.iter_mut().find(|e| e.key == Some(key)) {
                if element.value.is_some() {
                    debug!(key, "dictionary contains duplicate key");
                    return Err(Error::DuplicateKey(key.to_owned()));
                }
                element.value = Some(dictionary.read_next()?);
            } else if let Some(element) = elements.iter_mut().find(|e| e.key.is_none()) {
                element.key = Some(key);
                element.value = Some(dictionary.read_next()?);
            } else {
                debug!(key, "ignoring dictionary entry");
                dictionary.skip_next()?;
            }
        }

        if self.peek_next_type()?.is_some() {
            debug!(remaining = self.remaining(), "dictionary has trailing data");
            return Err(Error::TrailingData);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemType;

    #[test]
    fn test_keyed_lookup() {
        let bytes = [0xE2, 0x41, b'a', 0x09, 0x41, b'b', 0x41, b'x'];
        let mut elements = [
            DictionaryElement::keyed("a"),
            DictionaryElement::keyed("b"),
            DictionaryElement::keyed("c"),
        ];
        Reader::new(&bytes).read_string_dictionary(&mut elements).unwrap();

        assert_eq!(elements[0].value().unwrap().read_int().unwrap(), 1);
        assert_eq!(elements[1].value().unwrap().read_string().unwrap(), "x");
        assert!(!elements[2].is_present());
        assert_eq!(elements[2].key(), Some("c"));
    }

    #[test]
    fn test_value_spans_single_item() {
        let bytes = [0xEF, 0x41, b'a', 0xD2, 0x08, 0x09, 0x03];
        let mut elements = [DictionaryElement::keyed("a")];
        Reader::new(&bytes).read_string_dictionary(&mut elements).unwrap();

        let value = elements[0].value().unwrap();
        assert_eq!(value.as_bytes(), &[0xD2, 0x08, 0x09]);
    }

    #[test]
    fn test_duplicate_key() {
        let bytes = [0xEF, 0x41, b'a', 0x09, 0x41, b'a', 0x0A, 0x03];
        let mut elements = [DictionaryElement::keyed("a")];
        let err = Reader::new(&bytes).read_string_dictionary(&mut elements).unwrap_err();
        assert_eq!(err, Error::DuplicateKey("a".to_string()));
        assert!(err.is_invalid_data());
    }

    #[test]
    fn test_duplicate_ignored_key() {
        let bytes = [0xEF, 0x41, b'z', 0x09, 0x41, b'z', 0x0A, 0x03];
        let mut elements = [DictionaryElement::keyed("a")];
        Reader::new(&bytes).read_string_dictionary(&mut elements).unwrap();
        assert!(!elements[0].is_present());
    }

    #[test]
    fn test_wildcard() {
        let bytes = [0xE2, 0x41, b'a', 0x41, b'x', 0x41, b'z', 0x41, b'q'];
        let mut elements = [DictionaryElement::keyed("a"), DictionaryElement::wildcard()];
        Reader::new(&bytes).read_string_dictionary(&mut elements).unwrap();

        assert_eq!(elements[0].value().unwrap().read_string().unwrap(), "x");
        assert_eq!(elements[1].key(), Some("z"));
        assert_eq!(elements[1].value().unwrap().read_string().unwrap(), "q");
    }

    #[test]
    fn test_wildcard_duplicate_key() {
        let bytes = [0xEF, 0x41, b'z', 0x09, 0x41, b'z', 0x0A, 0x03];
        let mut elements = [DictionaryElement::wildcard(), DictionaryElement::wildcard()];
        let err = Reader::new(&bytes).read_string_dictionary(&mut elements).unwrap_err();
        assert_eq!(err, Error::DuplicateKey("z".to_string()));
    }

    #[test]
    fn test_elements_are_reset() {
        let mut elements = [DictionaryElement::keyed("a"), DictionaryElement::wildcard()];
        let bytes = [0xE2, 0x41, b'a', 0x09, 0x41, b'z', 0x0A];
        Reader::new(&bytes).read_string_dictionary(&mut elements).unwrap();
        assert_eq!(elements[1].key(), Some("z"));

        Reader::new(&[0xE0]).read_string_dictionary(&mut elements).unwrap();
        assert!(!elements[0].is_present());
        assert_eq!(elements[0].key(), Some("a"));
        assert_eq!(elements[1], DictionaryElement::wildcard());
    }

    #[test]
    fn test_non_string_key() {
        let bytes = [0xE1, 0x08, 0x09];
        let mut elements = [DictionaryElement::wildcard()];
        let err = Reader::new(&bytes).read_string_dictionary(&mut elements).unwrap_err();
        assert_eq!(err, Error::unexpected_type(ItemType::String, 0x08));
    }

    #[test]
    fn test_not_a_dictionary() {
        let mut elements = [DictionaryElement::keyed("a")];
        let err = Reader::new(&[0xD0]).read_string_dictionary(&mut elements).unwrap_err();
        assert_eq!(err, Error::unexpected_type(ItemType::Dictionary, 0xD0));
    }

    #[test]
    fn test_trailing_data() {
        let bytes = [0xE0, 0x04];
        let mut elements = [DictionaryElement::keyed("a")];
        let err = Reader::new(&bytes).read_string_dictionary(&mut elements).unwrap_err();
        assert_eq!(err, Error::TrailingData);
    }

    #[test]
    #[should_panic(expected = "duplicate dictionary element key")]
    fn test_duplicate_labels_panic() {
        let mut elements = [DictionaryElement::keyed("a"), DictionaryElement::keyed("a")];
        let _ = Reader::new(&[0xE0]).read_string_dictionary(&mut elements);
    }
}
