//! Generic streaming copy: walks any reader document and re-emits it into
//! any writer sink, tag by tag, without ever materializing a whole
//! container in memory. [`Source`]/[`ArraySource`]/[`MapSource`] are
//! implemented by `json::Document`/`cbor::Document` and their container
//! readers; [`Sink`]/[`ArraySink`]/[`MapSink`] are implemented by the two
//! formats' writers. [`copy`] is generic over any combination of the two,
//! so it doubles as the JSON↔CBOR interop routine and as a same-format
//! re-serializer.
//!
//! String and binary payloads are pumped through a fixed-size probe buffer
//! rather than assumed to fit in memory at the type level; since neither
//! writer exposes an incremental/unsized string primitive, the accumulated
//! bytes are still handed to the sink in one `write_str`/`write_binary`
//! call once the source is drained.

use crate::document::Classified;
use crate::error::{Error, Result};
use crate::io::ByteReader;

const PROBE_LEN: usize = 256;

/// A document consumable exactly once by [`copy`].
pub trait Source {
    type Str: ByteReader;
    type Bin: ByteReader;
    type Arr: ArraySource;
    type Map: MapSource;

    fn classify(self) -> Classified<Self::Str, Self::Bin, Self::Arr, Self::Map>;
}

/// An array reader driving [`copy`]; `next` reborrows `self`, so each
/// element's concrete type is tied to that call's lifetime.
pub trait ArraySource {
    type Item<'a>: Source
    where
        Self: 'a;

    fn next(&mut self) -> Result<Option<Self::Item<'_>>>;
}

/// A map reader driving [`copy`].
pub trait MapSource {
    type Item<'a>: Source
    where
        Self: 'a;

    fn next_key(&mut self) -> Result<Option<Self::Item<'_>>>;
    fn next_value(&mut self) -> Result<Self::Item<'_>>;
}

/// A writer scope [`copy`] can emit a single value into: either the
/// top-level writer, or an already-open array/map child.
pub trait Sink {
    type Array<'a>: ArraySink
    where
        Self: 'a;
    type Map<'a>: MapSink
    where
        Self: 'a;

    fn write_null(&mut self) -> Result<()>;
    fn write_undefined(&mut self) -> Result<()>;
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_u64(&mut self, value: u64) -> Result<()>;
    fn write_i64(&mut self, value: i64) -> Result<()>;
    fn write_f64(&mut self, value: f64) -> Result<()>;
    fn write_str(&mut self, value: &str) -> Result<()>;
    fn write_binary(&mut self, value: &[u8]) -> Result<()>;
    fn start_array(&mut self) -> Result<Self::Array<'_>>;
    fn start_map(&mut self) -> Result<Self::Map<'_>>;
}

/// An array [`Sink`] also knows how to close itself.
pub trait ArraySink: Sink {
    fn end(self) -> Result<()>;
}

/// A map writer scope: unlike [`Sink`], every write takes the entry's key,
/// mirroring the two formats' `MapWriter`s.
pub trait MapSink {
    type Array<'a>: ArraySink
    where
        Self: 'a;
    type Map<'a>: MapSink
    where
        Self: 'a;

    fn write_null(&mut self, key: &str) -> Result<()>;
    fn write_undefined(&mut self, key: &str) -> Result<()>;
    fn write_bool(&mut self, key: &str, value: bool) -> Result<()>;
    fn write_u64(&mut self, key: &str, value: u64) -> Result<()>;
    fn write_i64(&mut self, key: &str, value: i64) -> Result<()>;
    fn write_f64(&mut self, key: &str, value: f64) -> Result<()>;
    fn write_str(&mut self, key: &str, value: &str) -> Result<()>;
    fn write_binary(&mut self, key: &str, value: &[u8]) -> Result<()>;
    fn start_array(&mut self, key: &str) -> Result<Self::Array<'_>>;
    fn start_map(&mut self, key: &str) -> Result<Self::Map<'_>>;
    fn end(self) -> Result<()>;
}

fn drain_to_vec<R: ByteReader>(reader: &mut R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; PROBE_LEN];
    loop {
        let n = reader.read_partial_buffer(&mut chunk)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(buf)
}

fn drain_to_string<R: ByteReader>(reader: &mut R) -> Result<String> {
    let bytes = drain_to_vec(reader)?;
    String::from_utf8(bytes).map_err(|_| Error::IllFormatted("copied string is not valid UTF-8"))
}

/// Renders a map key for the destination format. A string key is drained
/// as-is; any other scalar is rendered as its plain decimal text (the
/// destination's own key-writing methods quote it), since a map key that
/// isn't natively a string is emitted as a quoted decimal string rather
/// than rejected. Binary, array, and map keys have no such rendering and
/// are rejected.
fn drain_key<S: Source>(doc: S) -> Result<String> {
    match doc.classify() {
        Classified::String(mut s) => drain_to_string(&mut s),
        Classified::Null | Classified::Undefined => Ok("null".to_string()),
        Classified::Boolean(b) => Ok(b.to_string()),
        Classified::UnsignedInt(u) => Ok(u.to_string()),
        Classified::SignedInt(i) => Ok(i.to_string()),
        Classified::FloatingPoint(f) => Ok(f.to_string()),
        Classified::Binary(_) | Classified::Array(_) | Classified::Map(_) => Err(Error::InvalidKeyType),
    }
}

/// Drains a value's remaining bytes or children without doing anything with
/// them, so its enclosing array/map can continue. Generic over any
/// [`Source`], so it also trivially accepts scalars (a no-op) as well as
/// both formats' container readers.
pub fn seek_to_end<S: Source>(doc: S) -> Result<()> {
    match doc.classify() {
        Classified::Null
        | Classified::Undefined
        | Classified::Boolean(_)
        | Classified::UnsignedInt(_)
        | Classified::SignedInt(_)
        | Classified::FloatingPoint(_) => Ok(()),
        Classified::String(mut s) => {
            s.seek(u64::MAX)?;
            Ok(())
        }
        Classified::Binary(mut b) => {
            b.seek(u64::MAX)?;
            Ok(())
        }
        Classified::Array(mut a) => {
            while let Some(child) = a.next()? {
                seek_to_end(child)?;
            }
            Ok(())
        }
        Classified::Map(mut m) => {
            loop {
                let key = match m.next_key()? {
                    Some(key) => key,
                    None => break,
                };
                seek_to_end(key)?;
                seek_to_end(m.next_value()?)?;
            }
            Ok(())
        }
    }
}

/// Copies one document into a top-level or array [`Sink`].
pub fn copy<S: Source, K: Sink>(doc: S, sink: &mut K) -> Result<()> {
    match doc.classify() {
        Classified::Null => sink.write_null(),
        Classified::Undefined => sink.write_undefined(),
        Classified::Boolean(b) => sink.write_bool(b),
        Classified::UnsignedInt(u) => sink.write_u64(u),
        Classified::SignedInt(i) => sink.write_i64(i),
        Classified::FloatingPoint(f) => sink.write_f64(f),
        Classified::String(mut s) => sink.write_str(&drain_to_string(&mut s)?),
        Classified::Binary(mut b) => sink.write_binary(&drain_to_vec(&mut b)?),
        Classified::Array(mut a) => {
            let mut dst = sink.start_array()?;
            while let Some(item) = a.next()? {
                copy(item, &mut dst)?;
            }
            dst.end()
        }
        Classified::Map(mut m) => {
            let mut dst = sink.start_map()?;
            loop {
                let key = match m.next_key()? {
                    Some(key) => key,
                    None => break,
                };
                let key = drain_key(key)?;
                let value = m.next_value()?;
                copy_entry(value, &key, &mut dst)?;
            }
            dst.end()
        }
    }
}

/// Copies one document into a keyed slot of a [`MapSink`].
fn copy_entry<S: Source, M: MapSink>(doc: S, key: &str, dst: &mut M) -> Result<()> {
    match doc.classify() {
        Classified::Null => dst.write_null(key),
        Classified::Undefined => dst.write_undefined(key),
        Classified::Boolean(b) => dst.write_bool(key, b),
        Classified::UnsignedInt(u) => dst.write_u64(key, u),
        Classified::SignedInt(i) => dst.write_i64(key, i),
        Classified::FloatingPoint(f) => dst.write_f64(key, f),
        Classified::String(mut s) => dst.write_str(key, &drain_to_string(&mut s)?),
        Classified::Binary(mut b) => dst.write_binary(key, &drain_to_vec(&mut b)?),
        Classified::Array(mut a) => {
            let mut child = dst.start_array(key)?;
            while let Some(item) = a.next()? {
                copy(item, &mut child)?;
            }
            child.end()
        }
        Classified::Map(mut m) => {
            let mut child = dst.start_map(key)?;
            loop {
                let k = match m.next_key()? {
                    Some(k) => k,
                    None => break,
                };
                let k = drain_key(k)?;
                let v = m.next_value()?;
                copy_entry(v, &k, &mut child)?;
            }
            child.end()
        }
    }
}
