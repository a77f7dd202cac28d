//! Lazy reading of a CBOR byte/text string's payload: both the
//! definite-length case (a known byte count) and the indefinite-length case
//! (a run of definite-length chunks of the same major type, terminated by a
//! break byte) are served through one reader.

use super::{read_argument, read_header};
use crate::check::Lock;
use crate::error::{Error, Result};
use crate::io::ByteReader;

enum Framing {
    Definite { remaining: u64 },
    Indefinite,
}

pub struct BytesReader<'a, R> {
    stream: &'a mut R,
    lock: &'a Lock,
    major: u8,
    framing: Framing,
    chunk_remaining: u64,
    finished: bool,
}

impl<'a, R: ByteReader> BytesReader<'a, R> {
    pub(crate) fn new_definite(stream: &'a mut R, lock: &'a Lock, major: u8, len: u64) -> Self {
        BytesReader {
            stream,
            lock,
            major,
            framing: Framing::Definite { remaining: len },
            chunk_remaining: 0,
            finished: false,
        }
    }

    pub(crate) fn new_indefinite(stream: &'a mut R, lock: &'a Lock, major: u8) -> Self {
        BytesReader {
            stream,
            lock,
            major,
            framing: Framing::Indefinite,
            chunk_remaining: 0,
            finished: false,
        }
    }

    /// Consumes any framing (chunk headers, the final break byte) standing
    /// between the cursor and the next payload byte. Returns whether a
    /// payload byte is actually available.
    fn ensure_available(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        match self.framing {
            Framing::Definite { remaining } => {
                if remaining == 0 {
                    self.finished = true;
                    self.lock.unlock();
                    return Ok(false);
                }
                Ok(true)
            }
            Framing::Indefinite => {
                if self.chunk_remaining == 0 {
                    if self.stream.peek()? == Some(0xFF) {
                        self.stream.read_byte()?;
                        self.finished = true;
                        self.lock.unlock();
                        return Ok(false);
                    }
                    let (major, additional) = read_header(self.stream)?;
                    if major != self.major {
                        return Err(Error::IllFormatted(
                            "indefinite-length chunk has the wrong major type",
                        ));
                    }
                    let len = read_argument(self.stream, additional)?.ok_or(Error::IllFormatted(
                        "a chunk of an indefinite-length string cannot itself be indefinite",
                    ))?;
                    self.chunk_remaining = len;
                    if len == 0 {
                        return self.ensure_available();
                    }
                }
                Ok(true)
            }
        }
    }
}

impl<'a, R: ByteReader> ByteReader for BytesReader<'a, R> {
    fn read_partial_buffer(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }
        if !self.ensure_available()? {
            return Ok(0);
        }
        match &mut self.framing {
            Framing::Definite { remaining } => {
                let n = core::cmp::min(*remaining, dst.len() as u64) as usize;
                let read = self.stream.read_partial_buffer(&mut dst[..n])?;
                *remaining -= read as u64;
                Ok(read)
            }
            Framing::Indefinite => {
                let n = core::cmp::min(self.chunk_remaining, dst.len() as u64) as usize;
                let read = self.stream.read_partial_buffer(&mut dst[..n])?;
                self.chunk_remaining -= read as u64;
                Ok(read)
            }
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        if !self.ensure_available()? {
            return Ok(None);
        }
        self.stream.peek()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SliceReader;

    fn drain<R: ByteReader>(r: &mut R) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 4];
        loop {
            let n = r.read_partial_buffer(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn definite_reads_exact_length() {
        let mut s = SliceReader::new(b"\x01\x02\x03trailing");
        let lock = Lock::new();
        lock.lock();
        let mut r = BytesReader::new_definite(&mut s, &lock, 2, 3);
        assert_eq!(drain(&mut r), vec![1, 2, 3]);
        assert!(lock.check_unlocked().is_ok());
    }

    #[test]
    fn indefinite_concatenates_chunks() {
        // two definite byte-string chunks (major 2): 01 02, then 03, then break.
        let mut s = SliceReader::new(b"\x42\x01\x02\x41\x03\xFF");
        let lock = Lock::new();
        lock.lock();
        let mut r = BytesReader::new_indefinite(&mut s, &lock, 2);
        assert_eq!(drain(&mut r), vec![1, 2, 3]);
        assert!(lock.check_unlocked().is_ok());
    }

    #[test]
    fn indefinite_rejects_mismatched_chunk_major() {
        // major 3 (text) chunk inside a major-2 (binary) indefinite string.
        let mut s = SliceReader::new(b"\x61a\xFF");
        let lock = Lock::new();
        lock.lock();
        let mut r = BytesReader::new_indefinite(&mut s, &lock, 2);
        let mut buf = [0u8; 1];
        assert!(r.read_partial_buffer(&mut buf).is_err());
    }
}
