//! Byte-stream contract and the adapters built on top of it.
//!
//! [`ByteReader`] and [`ByteWriter`] are this crate's abstraction for
//! blocking I/O, in the same spirit as the teacher's `BlockingRead`/
//! `BlockingWrite` traits: a thin, crate-local trait so format readers and
//! writers aren't hard-wired to `std::io`, plus a blanket impl so any
//! `std::io::Read`/`Write` can be used directly.

pub mod base64;

use crate::error::{Error, Result};

/// A pull-based byte source. `peek` and `read_byte` are the primitives every
/// format reader is built from; `read_partial_buffer` and `seek` are exposed
/// to callers of string/binary child readers.
pub trait ByteReader {
    /// Read up to `dst.len()` bytes. A short read (`n < dst.len()`) does not
    /// by itself signal end of stream; `n == 0` for a non-empty `dst` does.
    fn read_partial_buffer(&mut self, dst: &mut [u8]) -> Result<usize>;

    /// Non-destructively look at the next byte, or `None` at end of stream.
    fn peek(&mut self) -> Result<Option<u8>>;

    /// Read exactly one byte, failing with `UnexpectedEndOfStream` at EOS.
    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        if self.read_partial_buffer(&mut buf)? == 0 {
            return Err(Error::UnexpectedEndOfStream);
        }
        Ok(buf[0])
    }

    /// Skip up to `n` bytes, returning how many were actually skipped
    /// (`< n` only at end of stream).
    fn seek(&mut self, n: u64) -> Result<u64> {
        let mut skipped = 0u64;
        let mut buf = [0u8; 256];
        while skipped < n {
            let chunk = core::cmp::min(n - skipped, buf.len() as u64) as usize;
            let read = self.read_partial_buffer(&mut buf[..chunk])?;
            if read == 0 {
                break;
            }
            skipped += read as u64;
        }
        Ok(skipped)
    }

    /// Read until `dst` is completely filled or the stream ends, returning
    /// the number of bytes actually read.
    fn read_full_buffer(&mut self, dst: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < dst.len() {
            let n = self.read_partial_buffer(&mut dst[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }
}

/// A push-based byte sink.
pub trait ByteWriter {
    fn write_buffer(&mut self, src: &[u8]) -> Result<()>;

    /// Idempotent on the adapter itself, but may have side effects on the
    /// inner stream (base64 padding, indefinite-length terminators).
    fn flush(&mut self) -> Result<()>;
}

impl ByteWriter for Vec<u8> {
    fn write_buffer(&mut self, src: &[u8]) -> Result<()> {
        self.extend_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<W: ByteWriter + ?Sized> ByteWriter for &mut W {
    fn write_buffer(&mut self, src: &[u8]) -> Result<()> {
        (**self).write_buffer(src)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<R: ByteReader + ?Sized> ByteReader for &mut R {
    fn read_partial_buffer(&mut self, dst: &mut [u8]) -> Result<usize> {
        (**self).read_partial_buffer(dst)
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        (**self).peek()
    }
}

/// A [`ByteReader`] over an in-memory slice. The simplest possible source,
/// used heavily in tests and as the innermost reader for nested child
/// readers that don't need their own buffering.
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceReader { data, pos: 0 }
    }
}

impl<'a> ByteReader for SliceReader<'a> {
    fn read_partial_buffer(&mut self, dst: &mut [u8]) -> Result<usize> {
        let remaining = &self.data[self.pos..];
        let n = core::cmp::min(dst.len(), remaining.len());
        dst[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.data.get(self.pos).copied())
    }
}

/// Adapts any [`std::io::Read`] into a [`ByteReader`], buffering a single
/// byte so `peek` is possible on top of an unbuffered reader.
#[cfg(feature = "std")]
pub struct IoReader<R> {
    inner: R,
    peeked: Option<u8>,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> IoReader<R> {
    pub fn new(inner: R) -> Self {
        IoReader { inner, peeked: None }
    }

    fn fill_peek(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            let mut buf = [0u8; 1];
            let n = self.inner.read(&mut buf)?;
            if n == 1 {
                self.peeked = Some(buf[0]);
            }
        }
        Ok(self.peeked)
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ByteReader for IoReader<R> {
    fn read_partial_buffer(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }
        if let Some(b) = self.peeked.take() {
            dst[0] = b;
            return Ok(1);
        }
        Ok(self.inner.read(dst)?)
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        self.fill_peek()
    }
}

/// Adapts any [`std::io::Write`] into a [`ByteWriter`].
#[cfg(feature = "std")]
pub struct IoWriter<W> {
    inner: W,
}

#[cfg(feature = "std")]
impl<W: std::io::Write> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        IoWriter { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<W: std::io::Write> ByteWriter for IoWriter<W> {
    fn write_buffer(&mut self, src: &[u8]) -> Result<()> {
        self.inner.write_all(src)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_reader_partial_reads() {
        let mut r = SliceReader::new(b"abcde");
        let mut buf = [0u8; 3];
        assert_eq!(r.read_partial_buffer(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(r.read_partial_buffer(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"de");
        assert_eq!(r.read_partial_buffer(&mut buf).unwrap(), 0);
    }

    #[test]
    fn slice_reader_peek_is_non_destructive() {
        let mut r = SliceReader::new(b"xy");
        assert_eq!(r.peek().unwrap(), Some(b'x'));
        assert_eq!(r.peek().unwrap(), Some(b'x'));
        assert_eq!(r.read_byte().unwrap(), b'x');
        assert_eq!(r.read_byte().unwrap(), b'y');
        assert!(matches!(r.read_byte(), Err(Error::UnexpectedEndOfStream)));
    }

    #[test]
    fn seek_caps_at_remaining() {
        let mut r = SliceReader::new(b"abc");
        assert_eq!(r.seek(2).unwrap(), 2);
        assert_eq!(r.seek(5).unwrap(), 1);
        assert_eq!(r.seek(5).unwrap(), 0);
    }

    #[test]
    #[cfg(feature = "std")]
    fn io_reader_peek_over_unbuffered_source() {
        let cursor = std::io::Cursor::new(b"hi".to_vec());
        let mut r = IoReader::new(cursor);
        assert_eq!(r.peek().unwrap(), Some(b'h'));
        assert_eq!(r.read_byte().unwrap(), b'h');
        assert_eq!(r.read_byte().unwrap(), b'i');
        assert_eq!(r.peek().unwrap(), None);
    }
}
