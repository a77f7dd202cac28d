//! CBOR reader and writer: the top-level entry points are
//! [`Reader`] and [`writer::Writer`].

mod bytes_reader;
mod container_reader;
pub mod writer;

pub use bytes_reader::BytesReader;
pub use container_reader::{ArrayReader, MapReader};

use crate::check::Lock;
use crate::document::Classified;
use crate::error::{Error, Result};
use crate::io::ByteReader;
use crate::tag::Tag;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;
const MAJOR_SIMPLE: u8 = 7;

fn read_header<R: ByteReader>(stream: &mut R) -> Result<(u8, u8)> {
    let b = stream.read_byte()?;
    Ok((b >> 5, b & 0x1F))
}

/// Reads the argument following a major-type byte: the additional info
/// either *is* the value (0-23), names how many following big-endian bytes
/// hold it (24/25/26/27), or marks indefinite-length framing (31), reported
/// as `None`.
fn read_argument<R: ByteReader>(stream: &mut R, additional: u8) -> Result<Option<u64>> {
    match additional {
        0..=23 => Ok(Some(additional as u64)),
        24 => Ok(Some(stream.read_byte()? as u64)),
        25 => {
            let mut buf = [0u8; 2];
            stream.read_full_buffer(&mut buf)?;
            Ok(Some(u16::from_be_bytes(buf) as u64))
        }
        26 => {
            let mut buf = [0u8; 4];
            stream.read_full_buffer(&mut buf)?;
            Ok(Some(u32::from_be_bytes(buf) as u64))
        }
        27 => {
            let mut buf = [0u8; 8];
            stream.read_full_buffer(&mut buf)?;
            Ok(Some(u64::from_be_bytes(buf)))
        }
        31 => Ok(None),
        _ => Err(Error::IllFormatted("reserved additional-info value (28-30)")),
    }
}

/// Expands an IEEE 754 half-precision float into an `f64`.
fn half_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exp = ((bits >> 10) & 0x1F) as i32;
    let frac = (bits & 0x3FF) as f64;
    let magnitude = if exp == 0 {
        frac * 2f64.powi(-24)
    } else if exp == 0x1F {
        if frac == 0.0 {
            f64::INFINITY
        } else {
            f64::NAN
        }
    } else {
        (1.0 + frac / 1024.0) * 2f64.powi(exp - 15)
    };
    sign * magnitude
}

/// A single CBOR item. Scalars are held by value; byte strings, text
/// strings, arrays and maps hold a child reader borrowed from the same
/// stream. Unlike JSON, CBOR has a native binary type, so `Str` and `Bin`
/// are both plain [`BytesReader`]s distinguished only by which major type
/// framed them.
pub struct Document<'a, R> {
    classified: Classified<BytesReader<'a, R>, BytesReader<'a, R>, ArrayReader<'a, R>, MapReader<'a, R>>,
}

impl<'a, R: ByteReader> Document<'a, R> {
    fn new(
        classified: Classified<BytesReader<'a, R>, BytesReader<'a, R>, ArrayReader<'a, R>, MapReader<'a, R>>,
    ) -> Self {
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

    pub fn as_string(self) -> Result<BytesReader<'a, R>> {
        self.classified.as_string()
    }

    pub fn as_binary(self) -> Result<BytesReader<'a, R>> {
        match self.classified {
            Classified::Binary(b) => Ok(b),
            _ => Err(Error::BadVariantAccess("document value is not a binary string")),
        }
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
        self.classified.as_f64(false)
    }

    pub fn as_u64(self) -> Result<u64> {
        self.classified.as_u64(false)
    }

    pub fn as_i64(self) -> Result<i64> {
        self.classified.as_i64(false)
    }

    /// Drains this value's remaining bytes or children, so its enclosing
    /// array/map can continue.
    pub fn seek_to_end(self) -> Result<()> {
        crate::copy::seek_to_end(self)
    }
}

impl<'a, R: ByteReader> crate::copy::Source for Document<'a, R> {
    type Str = BytesReader<'a, R>;
    type Bin = BytesReader<'a, R>;
    type Arr = ArrayReader<'a, R>;
    type Map = MapReader<'a, R>;

    fn classify(self) -> Classified<Self::Str, Self::Bin, Self::Arr, Self::Map> {
        self.classified
    }
}

/// Parses one CBOR item; `lock` belongs to the enclosing container (or a
/// throwaway top-level lock). Semantic tags (major type 6) are transparent:
/// the tag number is read and discarded and the loop continues to the item
/// it annotates.
pub(crate) fn read_value<'a, R: ByteReader>(stream: &'a mut R, lock: &'a Lock) -> Result<Document<'a, R>> {
    let (major, additional) = loop {
        let (major, additional) = read_header(stream)?;
        if major == MAJOR_TAG {
            read_argument(stream, additional)?;
            continue;
        }
        break (major, additional);
    };

    let classified = match major {
        MAJOR_UNSIGNED => {
            let n = read_argument(stream, additional)?
                .ok_or(Error::IllFormatted("indefinite length is not allowed for an integer"))?;
            lock.unlock();
            Classified::UnsignedInt(n)
        }
        MAJOR_NEGATIVE => {
            let n = read_argument(stream, additional)?
                .ok_or(Error::IllFormatted("indefinite length is not allowed for an integer"))?;
            lock.unlock();
            if n > i64::MAX as u64 {
                return Err(Error::IntegerOverflowWhileCasting);
            }
            Classified::SignedInt(-1 - n as i64)
        }
        MAJOR_BYTES => {
            lock.lock();
            Classified::Binary(match read_argument(stream, additional)? {
                Some(len) => BytesReader::new_definite(stream, lock, MAJOR_BYTES, len),
                None => BytesReader::new_indefinite(stream, lock, MAJOR_BYTES),
            })
        }
        MAJOR_TEXT => {
            lock.lock();
            Classified::String(match read_argument(stream, additional)? {
                Some(len) => BytesReader::new_definite(stream, lock, MAJOR_TEXT, len),
                None => BytesReader::new_indefinite(stream, lock, MAJOR_TEXT),
            })
        }
        MAJOR_ARRAY => {
            lock.lock();
            Classified::Array(match read_argument(stream, additional)? {
                Some(count) => ArrayReader::new_definite(stream, lock, count),
                None => ArrayReader::new_indefinite(stream, lock),
            })
        }
        MAJOR_MAP => {
            lock.lock();
            Classified::Map(match read_argument(stream, additional)? {
                Some(count) => MapReader::new_definite(stream, lock, count),
                None => MapReader::new_indefinite(stream, lock),
            })
        }
        MAJOR_SIMPLE => match additional {
            20 => {
                lock.unlock();
                Classified::Boolean(false)
            }
            21 => {
                lock.unlock();
                Classified::Boolean(true)
            }
            22 => {
                lock.unlock();
                Classified::Null
            }
            23 => {
                lock.unlock();
                Classified::Undefined
            }
            25 => {
                let mut buf = [0u8; 2];
                stream.read_full_buffer(&mut buf)?;
                lock.unlock();
                Classified::FloatingPoint(half_to_f64(u16::from_be_bytes(buf)))
            }
            26 => {
                let mut buf = [0u8; 4];
                stream.read_full_buffer(&mut buf)?;
                lock.unlock();
                Classified::FloatingPoint(f32::from_be_bytes(buf) as f64)
            }
            27 => {
                let mut buf = [0u8; 8];
                stream.read_full_buffer(&mut buf)?;
                lock.unlock();
                Classified::FloatingPoint(f64::from_be_bytes(buf))
            }
            _ => return Err(Error::IllFormatted("unsupported simple value")),
        },
        _ => return Err(Error::IllFormatted("invalid major type")),
    };
    Ok(Document::new(classified))
}

/// The entry point for reading a stream of CBOR items.
pub struct Reader<R> {
    stream: R,
    lock: Lock,
}

impl<R: ByteReader> Reader<R> {
    pub fn new(stream: R) -> Self {
        Reader { stream, lock: Lock::new() }
    }

    /// Reads the single top-level CBOR item. Reading again after fully
    /// draining it only succeeds if the stream genuinely holds another item
    /// (as with a concatenated sequence of CBOR values).
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
        let mut r = Reader::new(SliceReader::new(&[0xF6]));
        assert!(r.read().unwrap().is_null());

        let mut r = Reader::new(SliceReader::new(&[0xF5]));
        assert!(r.read().unwrap().as_bool().unwrap());

        let mut r = Reader::new(SliceReader::new(&[0x18, 42]));
        assert_eq!(r.read().unwrap().as_u64().unwrap(), 42);

        let mut r = Reader::new(SliceReader::new(&[0x29])); // -10
        assert_eq!(r.read().unwrap().as_i64().unwrap(), -10);
    }

    #[test]
    fn reads_definite_array_and_map() {
        // {"a": [1, 2]} encoded as: BF-less definite map of 1 pair,
        // key "a" (61 61), value: definite array of 2 (82 01 02).
        let mut r = Reader::new(SliceReader::new(b"\xA1\x61a\x82\x01\x02"));
        let mut map = r.read().unwrap().as_map().unwrap();
        let key = map.read_key().unwrap().unwrap();
        let mut key_bytes = [0u8; 4];
        let n = key.as_string().unwrap().read_full_buffer(&mut key_bytes).unwrap();
        assert_eq!(&key_bytes[..n], b"a");

        let mut arr = map.read_value().unwrap().as_array().unwrap();
        assert_eq!(arr.read().unwrap().unwrap().as_u64().unwrap(), 1);
        assert_eq!(arr.read().unwrap().unwrap().as_u64().unwrap(), 2);
        assert!(arr.read().unwrap().is_none());
        assert!(map.read_key().unwrap().is_none());
    }

    #[test]
    fn semantic_tags_are_transparent() {
        // tag 0 (0xC0) wrapping the text string "x" (0x61 0x78).
        let mut r = Reader::new(SliceReader::new(b"\xC0\x61x"));
        let doc = r.read().unwrap();
        assert_eq!(doc.tag(), Tag::String);
        let mut s = doc.as_string().unwrap();
        let mut buf = [0u8; 1];
        s.read_full_buffer(&mut buf).unwrap();
        assert_eq!(&buf, b"x");
    }

    #[test]
    fn indefinite_binary_chunks_concatenate() {
        let mut r = Reader::new(SliceReader::new(b"\x5F\x42\x01\x02\x41\x03\xFF"));
        let mut bin = r.read().unwrap().as_binary().unwrap();
        let mut out = [0u8; 3];
        assert_eq!(bin.read_full_buffer(&mut out).unwrap(), 3);
        assert_eq!(out, [1, 2, 3]);
    }

    #[test]
    fn reads_double_precision_float() {
        let mut r = Reader::new(SliceReader::new(b"\xFB\x3F\xF8\x00\x00\x00\x00\x00\x00"));
        assert_eq!(r.read().unwrap().as_f64().unwrap(), 1.5);
    }

    #[test]
    fn reads_half_precision_float() {
        // 15.0 in half precision: 0x4B80
        let mut r = Reader::new(SliceReader::new(b"\xF9\x4B\x80"));
        assert_eq!(r.read().unwrap().as_f64().unwrap(), 15.0);
    }

    #[test]
    fn negative_integer_overflow_is_rejected() {
        let mut r = Reader::new(SliceReader::new(b"\x3B\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF"));
        assert!(matches!(r.read(), Err(Error::IntegerOverflowWhileCasting)));
    }
}
