//! JSON writer: [`Writer`] is the entry point; [`ArrayWriter`] and
//! [`MapWriter`] are RAII child writers returned from it, mirroring the
//! reader side's parent/child borrow discipline. The closing `]`/`}` is
//! written when a child writer is dropped or its `end()` is called
//! explicitly.

use crate::error::Result;
use crate::io::base64::Base64Writer;
use crate::io::ByteWriter;

/// Controls the whitespace a [`Writer`] emits between elements; purely
/// cosmetic, carried over from the teacher's compact/pretty split.
pub trait JsonFormatter {
    fn after_key<W: ByteWriter>(&self, w: &mut W) -> Result<()>;
    fn after_start_nested<W: ByteWriter>(&mut self, w: &mut W) -> Result<()>;
    fn after_element<W: ByteWriter>(&self, w: &mut W) -> Result<()>;
    fn before_end_nested<W: ByteWriter>(&mut self, is_empty: bool, w: &mut W) -> Result<()>;
    fn indent<W: ByteWriter>(&self, w: &mut W) -> Result<()>;
}

pub struct CompactFormatter;
impl JsonFormatter for CompactFormatter {
    fn after_key<W: ByteWriter>(&self, _w: &mut W) -> Result<()> {
        Ok(())
    }
    fn after_start_nested<W: ByteWriter>(&mut self, _w: &mut W) -> Result<()> {
        Ok(())
    }
    fn after_element<W: ByteWriter>(&self, _w: &mut W) -> Result<()> {
        Ok(())
    }
    fn before_end_nested<W: ByteWriter>(&mut self, _is_empty: bool, _w: &mut W) -> Result<()> {
        Ok(())
    }
    fn indent<W: ByteWriter>(&self, _w: &mut W) -> Result<()> {
        Ok(())
    }
}

pub struct PrettyFormatter {
    indent_level: usize,
}

impl PrettyFormatter {
    pub fn new() -> Self {
        PrettyFormatter { indent_level: 0 }
    }

    fn write_indent<W: ByteWriter>(&self, w: &mut W) -> Result<()> {
        w.write_buffer(b"\n")?;
        for _ in 0..self.indent_level {
            w.write_buffer(b"  ")?;
        }
        Ok(())
    }
}

impl Default for PrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormatter for PrettyFormatter {
    fn after_key<W: ByteWriter>(&self, w: &mut W) -> Result<()> {
        w.write_buffer(b" ")
    }
    fn after_start_nested<W: ByteWriter>(&mut self, w: &mut W) -> Result<()> {
        self.indent_level += 1;
        self.write_indent(w)
    }
    fn after_element<W: ByteWriter>(&self, w: &mut W) -> Result<()> {
        self.write_indent(w)
    }
    fn before_end_nested<W: ByteWriter>(&mut self, is_empty: bool, w: &mut W) -> Result<()> {
        self.indent_level -= 1;
        if is_empty {
            Ok(())
        } else {
            self.write_indent(w)
        }
    }
    fn indent<W: ByteWriter>(&self, w: &mut W) -> Result<()> {
        self.write_indent(w)
    }
}

fn write_escaped_string<W: ByteWriter>(w: &mut W, s: &str) -> Result<()> {
    w.write_buffer(b"\"")?;
    for b in s.bytes() {
        match b {
            b'"' => w.write_buffer(b"\\\"")?,
            b'\\' => w.write_buffer(b"\\\\")?,
            0x08 => w.write_buffer(b"\\b")?,
            0x0C => w.write_buffer(b"\\f")?,
            b'\n' => w.write_buffer(b"\\n")?,
            b'\r' => w.write_buffer(b"\\r")?,
            b'\t' => w.write_buffer(b"\\t")?,
            b if b < 0x20 => {
                const HEX: &[u8; 16] = b"0123456789abcdef";
                w.write_buffer(&[b'\\', b'u', b'0', b'0', HEX[(b >> 4) as usize], HEX[(b & 0xF) as usize]])?
            }
            b => w.write_buffer(&[b])?,
        }
    }
    w.write_buffer(b"\"")
}

fn write_f64<W: ByteWriter>(w: &mut W, value: f64) -> Result<()> {
    if value.is_finite() {
        let text = format!("{}", value);
        w.write_buffer(text.as_bytes())
    } else {
        w.write_buffer(b"null")
    }
}

/// The top-level JSON writer. Application code writes exactly one value
/// into it, typically by immediately calling `start_array`/`start_map` or
/// one of the scalar `write_*` methods.
pub struct Writer<W, F> {
    inner: W,
    formatter: F,
}

impl<W: ByteWriter> Writer<W, CompactFormatter> {
    pub fn new_compact(inner: W) -> Self {
        Writer { inner, formatter: CompactFormatter }
    }
}

impl<W: ByteWriter> Writer<W, PrettyFormatter> {
    pub fn new_pretty(inner: W) -> Self {
        Writer { inner, formatter: PrettyFormatter::new() }
    }
}

impl<W: ByteWriter, F: JsonFormatter> Writer<W, F> {
    pub fn new(inner: W, formatter: F) -> Self {
        Writer { inner, formatter }
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.inner.write_buffer(b"null")
    }
    /// JSON has no `undefined` literal; it is written as `null`.
    pub fn write_undefined(&mut self) -> Result<()> {
        self.write_null()
    }
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.inner.write_buffer(if value { b"true" } else { b"false" })
    }
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.inner.write_buffer(value.to_string().as_bytes())
    }
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.inner.write_buffer(value.to_string().as_bytes())
    }
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        write_f64(&mut self.inner, value)
    }
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        write_escaped_string(&mut self.inner, value)
    }

    /// Writes `value` base64-encoded inside a JSON string.
    pub fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.inner.write_buffer(b"\"")?;
        let mut b64 = Base64Writer::new(&mut self.inner);
        b64.write_buffer(value)?;
        b64.flush_no_inner_stream_flush()?;
        self.inner.write_buffer(b"\"")
    }

    pub fn start_array(&mut self) -> Result<ArrayWriter<'_, W, F>> {
        ArrayWriter::new(&mut self.inner, &mut self.formatter)
    }

    pub fn start_map(&mut self) -> Result<MapWriter<'_, W, F>> {
        MapWriter::new(&mut self.inner, &mut self.formatter)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

pub struct ArrayWriter<'a, W: ByteWriter, F: JsonFormatter> {
    inner: &'a mut W,
    formatter: &'a mut F,
    is_initial: bool,
    is_ended: bool,
}

impl<'a, W: ByteWriter, F: JsonFormatter> ArrayWriter<'a, W, F> {
    fn new(inner: &'a mut W, formatter: &'a mut F) -> Result<Self> {
        inner.write_buffer(b"[")?;
        formatter.after_start_nested(inner)?;
        Ok(ArrayWriter { inner, formatter, is_initial: true, is_ended: false })
    }

    fn handle_initial(&mut self) -> Result<()> {
        if self.is_initial {
            self.is_initial = false;
        } else {
            self.inner.write_buffer(b",")?;
            self.formatter.after_element(self.inner)?;
        }
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.handle_initial()?;
        self.inner.write_buffer(b"null")
    }
    pub fn write_undefined(&mut self) -> Result<()> {
        self.write_null()
    }
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.handle_initial()?;
        self.inner.write_buffer(if value { b"true" } else { b"false" })
    }
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.handle_initial()?;
        self.inner.write_buffer(value.to_string().as_bytes())
    }
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.handle_initial()?;
        self.inner.write_buffer(value.to_string().as_bytes())
    }
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.handle_initial()?;
        write_f64(self.inner, value)
    }
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.handle_initial()?;
        write_escaped_string(self.inner, value)
    }
    pub fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.handle_initial()?;
        self.inner.write_buffer(b"\"")?;
        let mut b64 = Base64Writer::new(&mut *self.inner);
        b64.write_buffer(value)?;
        b64.flush_no_inner_stream_flush()?;
        self.inner.write_buffer(b"\"")
    }

    pub fn start_array(&mut self) -> Result<ArrayWriter<'_, W, F>> {
        self.handle_initial()?;
        ArrayWriter::new(self.inner, self.formatter)
    }
    pub fn start_map(&mut self) -> Result<MapWriter<'_, W, F>> {
        self.handle_initial()?;
        MapWriter::new(self.inner, self.formatter)
    }

    pub fn end(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if !self.is_ended {
            self.formatter.before_end_nested(self.is_initial, self.inner)?;
            self.inner.write_buffer(b"]")?;
            self.is_ended = true;
        }
        Ok(())
    }
}

impl<'a, W: ByteWriter, F: JsonFormatter> Drop for ArrayWriter<'a, W, F> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

pub struct MapWriter<'a, W: ByteWriter, F: JsonFormatter> {
    inner: &'a mut W,
    formatter: &'a mut F,
    is_initial: bool,
    is_ended: bool,
}

impl<'a, W: ByteWriter, F: JsonFormatter> MapWriter<'a, W, F> {
    fn new(inner: &'a mut W, formatter: &'a mut F) -> Result<Self> {
        inner.write_buffer(b"{")?;
        formatter.after_start_nested(inner)?;
        Ok(MapWriter { inner, formatter, is_initial: true, is_ended: false })
    }

    fn handle_initial_and_key(&mut self, key: &str) -> Result<()> {
        if self.is_initial {
            self.is_initial = false;
        } else {
            self.inner.write_buffer(b",")?;
            self.formatter.after_element(self.inner)?;
        }
        write_escaped_string(self.inner, key)?;
        self.inner.write_buffer(b":")?;
        self.formatter.after_key(self.inner)
    }

    pub fn write_null(&mut self, key: &str) -> Result<()> {
        self.handle_initial_and_key(key)?;
        self.inner.write_buffer(b"null")
    }
    pub fn write_undefined(&mut self, key: &str) -> Result<()> {
        self.write_null(key)
    }
    pub fn write_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.handle_initial_and_key(key)?;
        self.inner.write_buffer(if value { b"true" } else { b"false" })
    }
    pub fn write_u64(&mut self, key: &str, value: u64) -> Result<()> {
        self.handle_initial_and_key(key)?;
        self.inner.write_buffer(value.to_string().as_bytes())
    }
    pub fn write_i64(&mut self, key: &str, value: i64) -> Result<()> {
        self.handle_initial_and_key(key)?;
        self.inner.write_buffer(value.to_string().as_bytes())
    }
    pub fn write_f64(&mut self, key: &str, value: f64) -> Result<()> {
        self.handle_initial_and_key(key)?;
        write_f64(self.inner, value)
    }
    pub fn write_str(&mut self, key: &str, value: &str) -> Result<()> {
        self.handle_initial_and_key(key)?;
        write_escaped_string(self.inner, value)
    }
    pub fn write_binary(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.handle_initial_and_key(key)?;
        self.inner.write_buffer(b"\"")?;
        let mut b64 = Base64Writer::new(&mut *self.inner);
        b64.write_buffer(value)?;
        b64.flush_no_inner_stream_flush()?;
        self.inner.write_buffer(b"\"")
    }

    pub fn start_array(&mut self, key: &str) -> Result<ArrayWriter<'_, W, F>> {
        self.handle_initial_and_key(key)?;
        ArrayWriter::new(self.inner, self.formatter)
    }
    pub fn start_map(&mut self, key: &str) -> Result<MapWriter<'_, W, F>> {
        self.handle_initial_and_key(key)?;
        MapWriter::new(self.inner, self.formatter)
    }

    pub fn end(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if !self.is_ended {
            self.formatter.before_end_nested(self.is_initial, self.inner)?;
            self.inner.write_buffer(b"}")?;
            self.is_ended = true;
        }
        Ok(())
    }
}

impl<'a, W: ByteWriter, F: JsonFormatter> Drop for MapWriter<'a, W, F> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

impl<W: ByteWriter, F: JsonFormatter> crate::copy::Sink for Writer<W, F> {
    type Array<'a> = ArrayWriter<'a, W, F> where Self: 'a;
    type Map<'a> = MapWriter<'a, W, F> where Self: 'a;

    fn write_null(&mut self) -> Result<()> {
        self.write_null()
    }
    fn write_undefined(&mut self) -> Result<()> {
        self.write_null()
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

impl<'a, W: ByteWriter, F: JsonFormatter> crate::copy::Sink for ArrayWriter<'a, W, F> {
    type Array<'b> = ArrayWriter<'b, W, F> where Self: 'b;
    type Map<'b> = MapWriter<'b, W, F> where Self: 'b;

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

impl<'a, W: ByteWriter, F: JsonFormatter> crate::copy::ArraySink for ArrayWriter<'a, W, F> {
    fn end(self) -> Result<()> {
        ArrayWriter::end(self)
    }
}

impl<'a, W: ByteWriter, F: JsonFormatter> crate::copy::MapSink for MapWriter<'a, W, F> {
    type Array<'b> = ArrayWriter<'b, W, F> where Self: 'b;
    type Map<'b> = MapWriter<'b, W, F> where Self: 'b;

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

    type AW<'a> = ArrayWriter<'a, Vec<u8>, CompactFormatter>;

    #[rstest]
    #[case::empty(|_a: &mut AW| Ok(()), "[]")]
    #[case::single(|a: &mut AW| a.write_null(), "[null]")]
    #[case::two(|a: &mut AW| { a.write_u64(1)?; a.write_u64(2) }, "[1,2]")]
    #[case::nested(|a: &mut AW| a.start_array()?.end(), "[[]]")]
    fn array_writer(#[case] code: fn(&mut AW) -> Result<()>, #[case] expected: &str) {
        let mut w = Writer::new_compact(Vec::new());
        {
            let mut arr = w.start_array().unwrap();
            code(&mut arr).unwrap();
        }
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), expected);
    }

    #[test]
    fn map_writer_quotes_keys_and_commas() {
        let mut w = Writer::new_compact(Vec::new());
        {
            let mut m = w.start_map().unwrap();
            m.write_u64("a", 1).unwrap();
            m.write_str("b", "x").unwrap();
        }
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), r#"{"a":1,"b":"x"}"#);
    }

    #[test]
    fn pretty_formatter_adds_newlines_and_indent() {
        let mut w = Writer::new_pretty(Vec::new());
        {
            let mut a = w.start_array().unwrap();
            a.write_u64(1).unwrap();
            a.write_u64(2).unwrap();
        }
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), "[\n  1,\n  2\n]");
    }

    #[test]
    fn binary_round_trips_through_reader() {
        let mut w = Writer::new_compact(Vec::new());
        w.write_binary(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), r#""3q2+7w==""#);
    }

    #[test]
    fn escapes_control_characters() {
        let mut w = Writer::new_compact(Vec::new());
        w.write_str("a\nb\"c").unwrap();
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), r#""a\nb\"c""#);
    }
}
