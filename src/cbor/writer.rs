//! CBOR writer: [`Writer`] is the entry point; [`ArrayWriter`] and
//! [`MapWriter`] are RAII child writers, mirroring the JSON writer's
//! parent/child discipline. Since the final element count isn't known until
//! the child is finished, arrays and maps are always written with
//! indefinite-length framing, closed by a break byte on `end()`/`Drop`;
//! scalars and whole strings/binaries are written in one call, so those use
//! the shortest definite-length header instead.

use crate::error::Result;
use crate::io::ByteWriter;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_SIMPLE: u8 = 7;

const BREAK: u8 = 0xFF;

fn write_header<W: ByteWriter>(w: &mut W, major: u8, value: u64) -> Result<()> {
    let top = major << 5;
    if value < 24 {
        w.write_buffer(&[top | value as u8])
    } else if value <= u8::MAX as u64 {
        w.write_buffer(&[top | 24, value as u8])
    } else if value <= u16::MAX as u64 {
        let mut buf = [0u8; 3];
        buf[0] = top | 25;
        buf[1..].copy_from_slice(&(value as u16).to_be_bytes());
        w.write_buffer(&buf)
    } else if value <= u32::MAX as u64 {
        let mut buf = [0u8; 5];
        buf[0] = top | 26;
        buf[1..].copy_from_slice(&(value as u32).to_be_bytes());
        w.write_buffer(&buf)
    } else {
        let mut buf = [0u8; 9];
        buf[0] = top | 27;
        buf[1..].copy_from_slice(&value.to_be_bytes());
        w.write_buffer(&buf)
    }
}

fn write_indefinite_start<W: ByteWriter>(w: &mut W, major: u8) -> Result<()> {
    w.write_buffer(&[(major << 5) | 31])
}

fn write_i64<W: ByteWriter>(w: &mut W, value: i64) -> Result<()> {
    if value >= 0 {
        write_header(w, MAJOR_UNSIGNED, value as u64)
    } else {
        // -1 - value, computed without overflow via bitwise NOT (the two's
        // complement identity !x == -1 - x).
        write_header(w, MAJOR_NEGATIVE, !value as u64)
    }
}

/// Always encodes as a double (major 7, additional 27): canonical and
/// simplest, at the cost of never using the shorter half/single forms.
fn write_f64<W: ByteWriter>(w: &mut W, value: f64) -> Result<()> {
    let mut buf = [0u8; 9];
    buf[0] = (MAJOR_SIMPLE << 5) | 27;
    buf[1..].copy_from_slice(&value.to_bits().to_be_bytes());
    w.write_buffer(&buf)
}

/// The top-level CBOR writer. Application code writes exactly one item into
/// it, typically via `start_array`/`start_map` or one of the scalar
/// `write_*` methods.
pub struct Writer<W> {
    inner: W,
}

impl<W: ByteWriter> Writer<W> {
    pub fn new(inner: W) -> Self {
        Writer { inner }
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.inner.write_buffer(&[(MAJOR_SIMPLE << 5) | 22])
    }
    pub fn write_undefined(&mut self) -> Result<()> {
        self.inner.write_buffer(&[(MAJOR_SIMPLE << 5) | 23])
    }
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.inner.write_buffer(&[(MAJOR_SIMPLE << 5) | if value { 21 } else { 20 }])
    }
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        write_header(&mut self.inner, MAJOR_UNSIGNED, value)
    }
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        write_i64(&mut self.inner, value)
    }
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        write_f64(&mut self.inner, value)
    }
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        write_header(&mut self.inner, MAJOR_TEXT, value.len() as u64)?;
        self.inner.write_buffer(value.as_bytes())
    }
    pub fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        write_header(&mut self.inner, MAJOR_BYTES, value.len() as u64)?;
        self.inner.write_buffer(value)
    }

    pub fn start_array(&mut self) -> Result<ArrayWriter<'_, W>> {
        ArrayWriter::new(&mut self.inner)
    }
    pub fn start_map(&mut self) -> Result<MapWriter<'_, W>> {
        MapWriter::new(&mut self.inner)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

pub struct ArrayWriter<'a, W: ByteWriter> {
    inner: &'a mut W,
    is_ended: bool,
}

impl<'a, W: ByteWriter> ArrayWriter<'a, W> {
    fn new(inner: &'a mut W) -> Result<Self> {
        write_indefinite_start(inner, MAJOR_ARRAY)?;
        Ok(ArrayWriter { inner, is_ended: false })
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.inner.write_buffer(&[(MAJOR_SIMPLE << 5) | 22])
    }
    pub fn write_undefined(&mut self) -> Result<()> {
        self.inner.write_buffer(&[(MAJOR_SIMPLE << 5) | 23])
    }
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.inner.write_buffer(&[(MAJOR_SIMPLE << 5) | if value { 21 } else { 20 }])
    }
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        write_header(self.inner, MAJOR_UNSIGNED, value)
    }
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        write_i64(self.inner, value)
    }
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        write_f64(self.inner, value)
    }
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        write_header(self.inner, MAJOR_TEXT, value.len() as u64)?;
        self.inner.write_buffer(value.as_bytes())
    }
    pub fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        write_header(self.inner, MAJOR_BYTES, value.len() as u64)?;
        self.inner.write_buffer(value)
    }

    pub fn start_array(&mut self) -> Result<ArrayWriter<'_, W>> {
        ArrayWriter::new(self.inner)
    }
    pub fn start_map(&mut self) -> Result<MapWriter<'_, W>> {
        MapWriter::new(self.inner)
    }

    pub fn end(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if !self.is_ended {
            self.inner.write_buffer(&[BREAK])?;
            self.is_ended = true;
        }
        Ok(())
    }
}

impl<'a, W: ByteWriter> Drop for ArrayWriter<'a, W> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

pub struct MapWriter<'a, W: ByteWriter> {
    inner: &'a mut W,
    is_ended: bool,
}

impl<'a, W: ByteWriter> MapWriter<'a, W> {
    fn new(inner: &'a mut W) -> Result<Self> {
        write_indefinite_start(inner, MAJOR_MAP)?;
        Ok(MapWriter { inner, is_ended: false })
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        write_header(self.inner, MAJOR_TEXT, key.len() as u64)?;
        self.inner.write_buffer(key.as_bytes())
    }

    pub fn write_null(&mut self, key: &str) -> Result<()> {
        self.write_key(key)?;
        self.inner.write_buffer(&[(MAJOR_SIMPLE << 5) | 22])
    }
    pub fn write_undefined(&mut self, key: &str) -> Result<()> {
        self.write_key(key)?;
        self.inner.write_buffer(&[(MAJOR_SIMPLE << 5) | 23])
    }
    pub fn write_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.write_key(key)?;
        self.inner.write_buffer(&[(MAJOR_SIMPLE << 5) | if value { 21 } else { 20 }])
    }
    pub fn write_u64(&mut self, key: &str, value: u64) -> Result<()> {
        self.write_key(key)?;
        write_header(self.inner, MAJOR_UNSIGNED, value)
    }
    pub fn write_i64(&mut self, key: &str, value: i64) -> Result<()> {
        self.write_key(key)?;
        write_i64(self.inner, value)
    }
    pub fn write_f64(&mut self, key: &str, value: f64) -> Result<()> {
        self.write_key(key)?;
        write_f64(self.inner, value)
    }
    pub fn write_str(&mut self, key: &str, value: &str) -> Result<()> {
        self.write_key(key)?;
        write_header(self.inner, MAJOR_TEXT, value.len() as u64)?;
        self.inner.write_buffer(value.as_bytes())
    }
    pub fn write_binary(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.write_key(key)?;
        write_header(self.inner, MAJOR_BYTES, value.len() as u64)?;
        self.inner.write_buffer(value)
    }

    pub fn start_array(&mut self, key: &str) -> Result<ArrayWriter<'_, W>> {
        self.write_key(key)?;
        ArrayWriter::new(self.inner)
    }
    pub fn start_map(&mut self, key: &str) -> Result<MapWriter<'_, W>> {
        self.write_key(key)?;
        MapWriter::new(self.inner)
    }

    pub fn end(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if !self.is_ended {
            self.inner.write_buffer(&[BREAK])?;
            self.is_ended = true;
        }
        Ok(())
    }
}

impl<'a, W: ByteWriter> Drop for MapWriter<'a, W> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

impl<W: ByteWriter> crate::copy::Sink for Writer<W> {
    type Array<'a>
        = ArrayWriter<'a, W>
    where
        Self: 'a;
    type Map<'a>
        = MapWriter<'a, W>
    where
        Self: 'a;

    fn write_null(&mut self) -> Result<()> {
        self.write_null()
    }
    fn write_undefined(&mut self) -> Result<()> {
        self.write_undefined()
    }
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_bool(value)
    }
    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_u64(value)
    }
    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_i64(value)
    }
    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_f64(value)
    }
    fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_str(value)
    }
    fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.write_binary(value)
    }
    fn start_array(&mut self) -> Result<Self::Array<'_>> {
        self.start_array()
    }
    fn start_map(&mut self) -> Result<Self::Map<'_>> {
        self.start_map()
    }
}

impl<'a, W: ByteWriter> crate::copy::Sink for ArrayWriter<'a, W> {
    type Array<'b>
        = ArrayWriter<'b, W>
    where
        Self: 'b;
    type Map<'b>
        = MapWriter<'b, W>
    where
        Self: 'b;

    fn write_null(&mut self) -> Result<()> {
        self.write_null()
    }
    fn write_undefined(&mut self) -> Result<()> {
        self.write_undefined()
    }
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_bool(value)
    }
    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_u64(value)
    }
    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_i64(value)
    }
    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_f64(value)
    }
    fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_str(value)
    }
    fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.write_binary(value)
    }
    fn start_array(&mut self) -> Result<Self::Array<'_>> {
        self.start_array()
    }
    fn start_map(&mut self) -> Result<Self::Map<'_>> {
        self.start_map()
    }
}

impl<'a, W: ByteWriter> crate::copy::ArraySink for ArrayWriter<'a, W> {
    fn end(self) -> Result<()> {
        ArrayWriter::end(self)
    }
}

impl<'a, W: ByteWriter> crate::copy::MapSink for MapWriter<'a, W> {
    type Array<'b>
        = ArrayWriter<'b, W>
    where
        Self: 'b;
    type Map<'b>
        = MapWriter<'b, W>
    where
        Self: 'b;

    fn write_null(&mut self, key: &str) -> Result<()> {
        MapWriter::write_null(self, key)
    }
    fn write_undefined(&mut self, key: &str) -> Result<()> {
        MapWriter::write_undefined(self, key)
    }
    fn write_bool(&mut self, key: &str, value: bool) -> Result<()> {
        MapWriter::write_bool(self, key, value)
    }
    fn write_u64(&mut self, key: &str, value: u64) -> Result<()> {
        MapWriter::write_u64(self, key, value)
    }
    fn write_i64(&mut self, key: &str, value: i64) -> Result<()> {
        MapWriter::write_i64(self, key, value)
    }
    fn write_f64(&mut self, key: &str, value: f64) -> Result<()> {
        MapWriter::write_f64(self, key, value)
    }
    fn write_str(&mut self, key: &str, value: &str) -> Result<()> {
        MapWriter::write_str(self, key, value)
    }
    fn write_binary(&mut self, key: &str, value: &[u8]) -> Result<()> {
        MapWriter::write_binary(self, key, value)
    }
    fn start_array(&mut self, key: &str) -> Result<Self::Array<'_>> {
        MapWriter::start_array(self, key)
    }
    fn start_map(&mut self, key: &str) -> Result<Self::Map<'_>> {
        MapWriter::start_map(self, key)
    }
    fn end(self) -> Result<()> {
        MapWriter::end(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    type AW<'a> = ArrayWriter<'a, Vec<u8>>;

    #[rstest]
    #[case::empty(|_a: &mut AW| Ok(()), &[0x9F, 0xFF])]
    #[case::single(|a: &mut AW| a.write_u64(1), &[0x9F, 0x01, 0xFF])]
    #[case::two(|a: &mut AW| { a.write_u64(1)?; a.write_u64(2) }, &[0x9F, 0x01, 0x02, 0xFF])]
    fn array_writer(#[case] code: fn(&mut AW) -> Result<()>, #[case] expected: &[u8]) {
        let mut w = Writer::new(Vec::new());
        {
            let mut arr = w.start_array().unwrap();
            code(&mut arr).unwrap();
        }
        assert_eq!(w.into_inner(), expected);
    }

    #[test]
    fn integer_ladder_picks_shortest_header() {
        let mut w = Writer::new(Vec::new());
        w.write_u64(0).unwrap();
        w.write_u64(23).unwrap();
        w.write_u64(24).unwrap();
        w.write_u64(256).unwrap();
        assert_eq!(w.into_inner(), vec![0x00, 0x17, 0x18, 0x18, 0x19, 0x01, 0x00]);
    }

    #[test]
    fn negative_integers_use_major_type_one() {
        let mut w = Writer::new(Vec::new());
        w.write_i64(-1).unwrap();
        w.write_i64(-10).unwrap();
        w.write_i64(i64::MIN).unwrap();
        assert_eq!(
            w.into_inner(),
            vec![0x20, 0x29, 0x3B, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn float_is_always_encoded_as_double() {
        let mut w = Writer::new(Vec::new());
        w.write_f64(1.5).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes[0], (MAJOR_SIMPLE << 5) | 27);
        assert_eq!(bytes.len(), 9);
    }

    #[test]
    fn map_writer_encodes_text_keys() {
        let mut w = Writer::new(Vec::new());
        {
            let mut m = w.start_map().unwrap();
            m.write_u64("a", 1).unwrap();
        }
        // BF (indefinite map) 61 'a' (text len 1) 01 FF
        assert_eq!(w.into_inner(), vec![0xBF, 0x61, b'a', 0x01, 0xFF]);
    }

    #[test]
    fn binary_and_string_use_definite_length() {
        let mut w = Writer::new(Vec::new());
        w.write_binary(&[0xDE, 0xAD]).unwrap();
        assert_eq!(w.into_inner(), vec![0x42, 0xDE, 0xAD]);

        let mut w = Writer::new(Vec::new());
        w.write_str("hi").unwrap();
        assert_eq!(w.into_inner(), vec![0x62, b'h', b'i']);
    }
}
