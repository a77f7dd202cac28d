//! Array and object element readers: a small comma/brace state machine
//! shared in shape between `ArrayReader` and `MapReader`.

use super::{read_value, skip_whitespace, Document};
use crate::check::{Lock, MapLock};
use crate::error::{Error, Result};
use crate::io::ByteReader;

pub struct ArrayReader<'a, R> {
    stream: &'a mut R,
    parent_lock: &'a Lock,
    own_lock: Lock,
    started: bool,
}

impl<'a, R: ByteReader> ArrayReader<'a, R> {
    pub(crate) fn new(stream: &'a mut R, parent_lock: &'a Lock) -> Self {
        ArrayReader {
            stream,
            parent_lock,
            own_lock: Lock::new(),
            started: false,
        }
    }

    fn next_is_value(&mut self) -> Result<bool> {
        skip_whitespace(self.stream)?;
        let first = self.stream.peek()?;
        if first == Some(b']') {
            return Ok(false);
        }
        if self.started {
            match first {
                Some(b',') => {
                    self.stream.read_byte()?;
                    skip_whitespace(self.stream)?;
                }
                _ => return Err(Error::IllFormattedJsonData("expected ',' or ']'")),
            }
        }
        match self.stream.peek()? {
            None => Err(Error::UnexpectedEndOfStream),
            Some(b']') => Err(Error::IllFormattedJsonData("trailing comma before ']'")),
            _ => Ok(true),
        }
    }

    /// Reads the next element, or `None` once `]` has been consumed.
    pub fn read(&mut self) -> Result<Option<Document<'_, R>>> {
        self.own_lock.check_unlocked()?;
        if self.next_is_value()? {
            self.started = true;
            Ok(Some(read_value(self.stream, &self.own_lock)?))
        } else {
            self.stream.read_byte()?;
            self.parent_lock.unlock();
            Ok(None)
        }
    }
}

impl<'a, R: ByteReader> crate::copy::ArraySource for ArrayReader<'a, R> {
    type Item<'b>
        = Document<'b, R>
    where
        Self: 'b;

    fn next(&mut self) -> Result<Option<Self::Item<'_>>> {
        self.read()
    }
}

pub struct MapReader<'a, R> {
    stream: &'a mut R,
    parent_lock: &'a Lock,
    map_lock: MapLock,
    started: bool,
}

impl<'a, R: ByteReader> MapReader<'a, R> {
    pub(crate) fn new(stream: &'a mut R, parent_lock: &'a Lock) -> Self {
        MapReader {
            stream,
            parent_lock,
            map_lock: MapLock::new(),
            started: false,
        }
    }

    fn next_is_entry(&mut self) -> Result<bool> {
        skip_whitespace(self.stream)?;
        let first = self.stream.peek()?;
        if first == Some(b'}') {
            return Ok(false);
        }
        if self.started {
            match first {
                Some(b',') => {
                    self.stream.read_byte()?;
                    skip_whitespace(self.stream)?;
                }
                _ => return Err(Error::IllFormattedJsonData("expected ',' or '}'")),
            }
        }
        match self.stream.peek()? {
            Some(b'"') => Ok(true),
            None => Err(Error::UnexpectedEndOfStream),
            _ => Err(Error::IllFormattedJsonData("object key must be a string")),
        }
    }

    /// Reads the next key, or `None` once `}` has been consumed. Must be
    /// followed by [`Self::read_value`] before the next `read_key` call,
    /// enforced by [`MapLock`].
    pub fn read_key(&mut self) -> Result<Option<Document<'_, R>>> {
        self.map_lock.check_can_read_key()?;
        if self.next_is_entry()? {
            self.started = true;
            let doc = read_value(self.stream, self.map_lock.inner())?;
            self.map_lock.on_key_produced();
            Ok(Some(doc))
        } else {
            self.stream.read_byte()?;
            self.parent_lock.unlock();
            Ok(None)
        }
    }

    pub fn read_value(&mut self) -> Result<Document<'_, R>> {
        self.map_lock.check_can_read_value()?;
        skip_whitespace(self.stream)?;
        if self.stream.read_byte()? != b':' {
            return Err(Error::IllFormattedJsonData("expected ':' after object key"));
        }
        let doc = read_value(self.stream, self.map_lock.inner())?;
        self.map_lock.on_value_produced();
        Ok(doc)
    }
}

impl<'a, R: ByteReader> crate::copy::MapSource for MapReader<'a, R> {
    type Item<'b>
        = Document<'b, R>
    where
        Self: 'b;

    fn next_key(&mut self) -> Result<Option<Self::Item<'_>>> {
        self.read_key()
    }
    fn next_value(&mut self) -> Result<Self::Item<'_>> {
        self.read_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SliceReader;
    use crate::tag::Tag;

    #[test]
    fn array_reads_elements_and_closes() {
        let mut s = SliceReader::new(b"1,2,3]");
        let parent = Lock::new();
        let mut arr = ArrayReader::new(&mut s, &parent);
        let mut values = Vec::new();
        while let Some(doc) = arr.read().unwrap() {
            values.push(doc.as_u64().unwrap());
        }
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn array_rejects_trailing_comma() {
        let mut s = SliceReader::new(b"1,]");
        let parent = Lock::new();
        let mut arr = ArrayReader::new(&mut s, &parent);
        arr.read().unwrap().unwrap().seek_to_end().unwrap();
        assert!(arr.read().is_err());
    }

    #[test]
    fn map_alternates_key_and_value() {
        let mut s = SliceReader::new(br#""a":1,"b":2}"#);
        let parent = Lock::new();
        let mut map = MapReader::new(&mut s, &parent);

        let key = map.read_key().unwrap().unwrap();
        assert_eq!(key.tag(), Tag::String);
        key.seek_to_end().unwrap();
        let val = map.read_value().unwrap();
        assert_eq!(val.as_u64().unwrap(), 1);

        let key = map.read_key().unwrap().unwrap();
        key.seek_to_end().unwrap();
        let val = map.read_value().unwrap();
        assert_eq!(val.as_u64().unwrap(), 2);

        assert!(map.read_key().unwrap().is_none());
    }

    #[test]
    fn map_rejects_value_without_key() {
        let mut s = SliceReader::new(br#""a":1}"#);
        let parent = Lock::new();
        let mut map = MapReader::new(&mut s, &parent);
        assert!(map.read_value().is_err());
    }
}
