//! JSON reader and writer: the top-level entry points are
//! [`Reader`] and [`writer::Writer`].

mod container_reader;
mod string_reader;
pub mod writer;

pub use container_reader::{ArrayReader, MapReader};
pub use string_reader::StringReader;

use crate::check::Lock;
use crate::document::Classified;
use crate::error::{Error, Result};
use crate::io::base64::Base64Reader;
use crate::io::ByteReader;
use crate::number::{read_number, NumberValue};
use crate::tag::Tag;

/// JSON never produces a native binary value (binary is tunneled through a
/// base64-encoded string), so this uninhabited type fills the `Bin`
/// slot of [`Classified`] and is never actually constructed.
pub enum Never {}

impl ByteReader for Never {
    fn read_partial_buffer(&mut self, _dst: &mut [u8]) -> Result<usize> {
        match *self {}
    }
    fn peek(&mut self) -> Result<Option<u8>> {
        match *self {}
    }
}

pub(crate) fn skip_whitespace<R: ByteReader>(stream: &mut R) -> Result<()> {
    loop {
        match stream.peek()? {
            Some(b' ' | b'\t' | b'\r' | b'\n') => {
                stream.read_byte()?;
            }
            _ => return Ok(()),
        }
    }
}

fn expect_literal<R: ByteReader>(stream: &mut R, rest: &[u8]) -> Result<()> {
    for &want in rest {
        if stream.read_byte()? != want {
            return Err(Error::IllFormattedJsonData("invalid literal"));
        }
    }
    Ok(())
}

/// A single JSON value. Scalars are held by value; strings, arrays and
/// objects hold a child reader borrowed from the same stream.
pub struct Document<'a, R> {
    classified: Classified<StringReader<'a, R>, Never, ArrayReader<'a, R>, MapReader<'a, R>>,
}

impl<'a, R: ByteReader> Document<'a, R> {
    fn new(classified: Classified<StringReader<'a, R>, Never, ArrayReader<'a, R>, MapReader<'a, R>>) -> Self {
        Document { classified }
    }

    pub fn tag(&self) -> Tag {
        self.classified.tag()
    }

    pub fn is_exactly(&self, tag: Tag) -> bool {
        self.classified.is_exactly(tag)
    }

    pub fn is_null(&self) -> bool {
        self.classified.is_null()
    }

    pub fn is_undefined_or_null(&self) -> bool {
        self.classified.is_undefined_or_null()
    }

    pub fn as_string(self) -> Result<StringReader<'a, R>> {
        self.classified.as_string()
    }

    /// Base64-decodes this value, which must hold a JSON string: JSON has
    /// no native binary type, so binary payloads are tunneled through
    /// base64-encoded text.
    pub fn as_binary(self) -> Result<Base64Reader<StringReader<'a, R>>> {
        Ok(Base64Reader::new(self.classified.as_string()?))
    }

    pub fn as_array(self) -> Result<ArrayReader<'a, R>> {
        self.classified.as_array()
    }

    pub fn as_map(self) -> Result<MapReader<'a, R>> {
        self.classified.as_map()
    }

    pub fn as_bool(self) -> Result<bool> {
        self.classified.as_bool()
    }

    pub fn as_f64(self) -> Result<f64> {
        self.classified.as_f64(true)
    }

    pub fn as_u64(self) -> Result<u64> {
        self.classified.as_u64(true)
    }

    pub fn as_i64(self) -> Result<i64> {
        self.classified.as_i64(true)
    }

    /// Drains this value's remaining bytes or children, so its enclosing
    /// array/object can continue.
    pub fn seek_to_end(self) -> Result<()> {
        crate::copy::seek_to_end(self)
    }
}

impl<'a, R: ByteReader> crate::copy::Source for Document<'a, R> {
    type Str = StringReader<'a, R>;
    type Bin = Never;
    type Arr = ArrayReader<'a, R>;
    type Map = MapReader<'a, R>;

    fn classify(self) -> Classified<Self::Str, Self::Bin, Self::Arr, Self::Map> {
        self.classified
    }
}

/// Parses one JSON value; `lock` belongs to the enclosing container
/// (or a throwaway top-level lock) and is unlocked once this value, and
/// everything nested in it, has been fully consumed.
pub(crate) fn read_value<'a, R: ByteReader>(stream: &'a mut R, lock: &'a Lock) -> Result<Document<'a, R>> {
    skip_whitespace(stream)?;
    let first = stream.read_byte()?;
    let classified = match first {
        b'n' => {
            expect_literal(stream, b"ull")?;
            lock.unlock();
            Classified::Null
        }
        b't' => {
            expect_literal(stream, b"rue")?;
            lock.unlock();
            Classified::Boolean(true)
        }
        b'f' => {
            expect_literal(stream, b"alse")?;
            lock.unlock();
            Classified::Boolean(false)
        }
        b'"' => {
            lock.lock();
            Classified::String(StringReader::new(stream, lock))
        }
        b'[' => {
            lock.lock();
            Classified::Array(ArrayReader::new(stream, lock))
        }
        b'{' => {
            lock.lock();
            Classified::Map(MapReader::new(stream, lock))
        }
        b'-' | b'0'..=b'9' => {
            let n = read_number(stream, first)?;
            lock.unlock();
            match n {
                NumberValue::UnsignedInt(u) => Classified::UnsignedInt(u),
                NumberValue::SignedInt(i) => Classified::SignedInt(i),
                NumberValue::Float(f) => Classified::FloatingPoint(f),
            }
        }
        _ => return Err(Error::IllFormattedJsonData("expected a JSON value")),
    };
    Ok(Document::new(classified))
}

/// The entry point for reading a stream of JSON text.
pub struct Reader<R> {
    stream: R,
    lock: Lock,
}

impl<R: ByteReader> Reader<R> {
    pub fn new(stream: R) -> Self {
        Reader {
            stream,
            lock: Lock::new(),
        }
    }

    /// Reads the single top-level JSON value. Reading again after fully
    /// draining it is an error unless the stream genuinely holds another
    /// value (as with newline-delimited JSON).
    pub fn read(&mut self) -> Result<Document<'_, R>> {
        self.lock.check_unlocked()?;
        read_value(&mut self.stream, &self.lock)
    }

    pub fn into_inner(self) -> R {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SliceReader;

    #[test]
    fn reads_scalars() {
        let mut r = Reader::new(SliceReader::new(b"null"));
        assert!(r.read().unwrap().is_null());

        let mut r = Reader::new(SliceReader::new(b"true"));
        assert!(r.read().unwrap().as_bool().unwrap());

        let mut r = Reader::new(SliceReader::new(b"42"));
        assert_eq!(r.read().unwrap().as_u64().unwrap(), 42);

        let mut r = Reader::new(SliceReader::new(b"-3.5"));
        assert_eq!(r.read().unwrap().as_f64().unwrap(), -3.5);
    }

    #[test]
    fn reads_nested_array_and_object() {
        let mut r = Reader::new(SliceReader::new(br#"{"a":[1,2,true],"b":null}"#));
        let mut map = r.read().unwrap().as_map().unwrap();

        let key = map.read_key().unwrap().unwrap();
        let mut key_reader = key.as_string().unwrap();
        let mut key_bytes = [0u8; 4];
        assert_eq!(key_reader.read_full_buffer(&mut key_bytes).unwrap(), 1);
        assert_eq!(&key_bytes[..1], b"a");

        let mut arr = map.read_value().unwrap().as_array().unwrap();
        assert_eq!(arr.read().unwrap().unwrap().as_u64().unwrap(), 1);
        assert_eq!(arr.read().unwrap().unwrap().as_u64().unwrap(), 2);
        assert!(arr.read().unwrap().unwrap().as_bool().unwrap());
        assert!(arr.read().unwrap().is_none());

        let key = map.read_key().unwrap().unwrap();
        key.seek_to_end().unwrap();
        assert!(map.read_value().unwrap().is_null());
        assert!(map.read_key().unwrap().is_none());
    }

    #[test]
    fn binary_tunnels_through_base64_string() {
        let mut r = Reader::new(SliceReader::new(br#""3q2+7w==""#));
        let doc = r.read().unwrap();
        let mut bin = doc.as_binary().unwrap();
        let mut out = [0u8; 4];
        assert_eq!(bin.read_full_buffer(&mut out).unwrap(), 4);
        assert_eq!(out, [0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn string_coerces_to_number_and_bool() {
        let mut r = Reader::new(SliceReader::new(br#""42""#));
        assert_eq!(r.read().unwrap().as_u64().unwrap(), 42);

        let mut r = Reader::new(SliceReader::new(br#""true""#));
        assert!(r.read().unwrap().as_bool().unwrap());
    }
}
