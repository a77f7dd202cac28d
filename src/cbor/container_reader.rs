//! Array and map element readers: counts down a definite length, or watches
//! for a break byte for an indefinite one. Unlike JSON, there is no
//! punctuation between elements.

use super::read_value;
use crate::check::{Lock, MapLock};
use crate::error::Result;
use crate::io::ByteReader;

enum Framing {
    Definite(u64),
    Indefinite,
}

pub struct ArrayReader<'a, R> {
    stream: &'a mut R,
    parent_lock: &'a Lock,
    own_lock: Lock,
    framing: Framing,
}

impl<'a, R: ByteReader> ArrayReader<'a, R> {
    pub(crate) fn new_definite(stream: &'a mut R, parent_lock: &'a Lock, count: u64) -> Self {
        ArrayReader {
            stream,
            parent_lock,
            own_lock: Lock::new(),
            framing: Framing::Definite(count),
        }
    }

    pub(crate) fn new_indefinite(stream: &'a mut R, parent_lock: &'a Lock) -> Self {
        ArrayReader {
            stream,
            parent_lock,
            own_lock: Lock::new(),
            framing: Framing::Indefinite,
        }
    }

    /// Reads the next element, or `None` once the array is exhausted.
    pub fn read(&mut self) -> Result<Option<super::Document<'_, R>>> {
        self.own_lock.check_unlocked()?;
        match &mut self.framing {
            Framing::Definite(remaining) => {
                if *remaining == 0 {
                    self.parent_lock.unlock();
                    return Ok(None);
                }
                *remaining -= 1;
            }
            Framing::Indefinite => {
                if self.stream.peek()? == Some(0xFF) {
                    self.stream.read_byte()?;
                    self.parent_lock.unlock();
                    return Ok(None);
                }
            }
        }
        Ok(Some(read_value(self.stream, &self.own_lock)?))
    }
}

impl<'a, R: ByteReader> crate::copy::ArraySource for ArrayReader<'a, R> {
    type Item<'b>
        = super::Document<'b, R>
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
    framing: Framing,
}

impl<'a, R: ByteReader> MapReader<'a, R> {
    pub(crate) fn new_definite(stream: &'a mut R, parent_lock: &'a Lock, count: u64) -> Self {
        MapReader {
            stream,
            parent_lock,
            map_lock: MapLock::new(),
            framing: Framing::Definite(count),
        }
    }

    pub(crate) fn new_indefinite(stream: &'a mut R, parent_lock: &'a Lock) -> Self {
        MapReader {
            stream,
            parent_lock,
            map_lock: MapLock::new(),
            framing: Framing::Indefinite,
        }
    }

    /// Reads the next key, or `None` once the map is exhausted. Must be
    /// followed by [`Self::read_value`] before the next `read_key` call.
    pub fn read_key(&mut self) -> Result<Option<super::Document<'_, R>>> {
        self.map_lock.check_can_read_key()?;
        match &mut self.framing {
            Framing::Definite(remaining) => {
                if *remaining == 0 {
                    self.parent_lock.unlock();
                    return Ok(None);
                }
                *remaining -= 1;
            }
            Framing::Indefinite => {
                if self.stream.peek()? == Some(0xFF) {
                    self.stream.read_byte()?;
                    self.parent_lock.unlock();
                    return Ok(None);
                }
            }
        }
        let doc = read_value(self.stream, self.map_lock.inner())?;
        self.map_lock.on_key_produced();
        Ok(Some(doc))
    }

    pub fn read_value(&mut self) -> Result<super::Document<'_, R>> {
        self.map_lock.check_can_read_value()?;
        let doc = read_value(self.stream, self.map_lock.inner())?;
        self.map_lock.on_value_produced();
        Ok(doc)
    }
}

impl<'a, R: ByteReader> crate::copy::MapSource for MapReader<'a, R> {
    type Item<'b>
        = super::Document<'b, R>
    where
        Self: 'b;

    fn next_key(&mut self) -> Result<Option<Self::Item<'_>>> {
        self.read_key()
    }
    fn next_value(&mut self) -> Result<Self::Item<'_>> {
        self.read_value()
    }
}
