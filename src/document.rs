//! The Document variant: a tagged sum type shared, via generics, between the
//! CBOR and JSON readers. Scalars are stored by value; the
//! string/binary/array/map cases store a nested reader positioned at the
//! first unread byte of the payload.
//!
//! [`Classified`] is deliberately format-agnostic: `json::Document` and
//! `cbor::Document` are each a concrete instantiation of it with their own
//! child reader types, so the coercion rules between them are implemented
//! exactly once.

use crate::error::{Error, Result};
use crate::io::ByteReader;
use crate::number::{read_number, NumberValue};
use crate::tag::Tag;

fn bad_variant(msg: &'static str) -> Error {
    Error::BadVariantAccess(msg)
}

/// The ten tag-bearing cases a value can be classified as, generic over the
/// concrete reader types a format plugs in for `string`/`binary`/`array`/`map`.
pub enum Classified<Str, Bin, Arr, Map> {
    Null,
    Undefined,
    Boolean(bool),
    UnsignedInt(u64),
    SignedInt(i64),
    FloatingPoint(f64),
    String(Str),
    Binary(Bin),
    Array(Arr),
    Map(Map),
}

impl<Str, Bin, Arr, Map> Classified<Str, Bin, Arr, Map> {
    pub fn tag(&self) -> Tag {
        match self {
            Classified::Null => Tag::Null,
            Classified::Undefined => Tag::Undefined,
            Classified::Boolean(_) => Tag::Boolean,
            Classified::UnsignedInt(_) => Tag::UnsignedInt,
            Classified::SignedInt(_) => Tag::SignedInt,
            Classified::FloatingPoint(_) => Tag::FloatingPoint,
            Classified::String(_) => Tag::String,
            Classified::Binary(_) => Tag::Binary,
            Classified::Array(_) => Tag::Array,
            Classified::Map(_) => Tag::Map,
        }
    }

    pub fn is_exactly(&self, tag: Tag) -> bool {
        self.tag() == tag
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Classified::Null)
    }

    pub fn is_undefined_or_null(&self) -> bool {
        matches!(self, Classified::Null | Classified::Undefined)
    }

    pub fn as_string(self) -> Result<Str> {
        match self {
            Classified::String(s) => Ok(s),
            other => Err(bad_variant_for(other.tag(), Tag::String)),
        }
    }

    pub fn as_array(self) -> Result<Arr> {
        match self {
            Classified::Array(a) => Ok(a),
            other => Err(bad_variant_for(other.tag(), Tag::Array)),
        }
    }

    pub fn as_map(self) -> Result<Map> {
        match self {
            Classified::Map(m) => Ok(m),
            other => Err(bad_variant_for(other.tag(), Tag::Map)),
        }
    }

    pub fn as_bool(self) -> Result<bool>
    where
        Str: ByteReader,
    {
        match self {
            Classified::Boolean(b) => Ok(b),
            Classified::String(mut s) => {
                let mut buf = [0u8; 5];
                let n = s.read_full_buffer(&mut buf)?;
                let result = match &buf[..n] {
                    b"true" => true,
                    b"false" => false,
                    _ => return Err(bad_variant("string is not a boolean literal")),
                };
                if s.peek()?.is_some() {
                    return Err(bad_variant("string is not a boolean literal"));
                }
                Ok(result)
            }
            other => Err(bad_variant_for(other.tag(), Tag::Boolean)),
        }
    }
}

/// Parses a JSON number out of a string reader's bytes, used by every
/// string-to-number coercion below.
fn number_from_string<Str: ByteReader>(mut s: Str) -> Result<NumberValue> {
    let first = s.read_byte()?;
    read_number(&mut s, first)
}

impl<Str: ByteReader, Bin, Arr, Map> Classified<Str, Bin, Arr, Map> {
    /// Widens to `f64`. `does_json_conversions` gates the string-parses-as-
    /// number path, which only applies to the JSON document type.
    pub fn as_f64(self, does_json_conversions: bool) -> Result<f64> {
        match self {
            Classified::UnsignedInt(u) => Ok(u as f64),
            Classified::SignedInt(i) => Ok(i as f64),
            Classified::FloatingPoint(f) => Ok(f),
            Classified::String(s) if does_json_conversions => match number_from_string(s)? {
                NumberValue::UnsignedInt(u) => Ok(u as f64),
                NumberValue::SignedInt(i) => Ok(i as f64),
                NumberValue::Float(f) => Ok(f),
            },
            other => Err(bad_variant_for(other.tag(), Tag::FloatingPoint)),
        }
    }

    pub fn as_u64(self, does_json_conversions: bool) -> Result<u64> {
        match self {
            Classified::UnsignedInt(u) => Ok(u),
            Classified::SignedInt(i) => cast_signed_to_unsigned(i),
            Classified::FloatingPoint(f) => cast_float_to_unsigned(f),
            Classified::String(s) if does_json_conversions => match number_from_string(s)? {
                NumberValue::UnsignedInt(u) => Ok(u),
                NumberValue::SignedInt(i) => cast_signed_to_unsigned(i),
                NumberValue::Float(f) => cast_float_to_unsigned(f),
            },
            other => Err(bad_variant_for(other.tag(), Tag::UnsignedInt)),
        }
    }

    pub fn as_i64(self, does_json_conversions: bool) -> Result<i64> {
        match self {
            Classified::SignedInt(i) => Ok(i),
            Classified::UnsignedInt(u) => cast_unsigned_to_signed(u),
            Classified::FloatingPoint(f) => cast_float_to_signed(f),
            Classified::String(s) if does_json_conversions => match number_from_string(s)? {
                NumberValue::SignedInt(i) => Ok(i),
                NumberValue::UnsignedInt(u) => cast_unsigned_to_signed(u),
                NumberValue::Float(f) => cast_float_to_signed(f),
            },
            other => Err(bad_variant_for(other.tag(), Tag::SignedInt)),
        }
    }
}

fn bad_variant_for(found: Tag, wanted: Tag) -> Error {
    let _ = (found, wanted);
    bad_variant("document value does not hold the requested tag")
}

fn cast_signed_to_unsigned(x: i64) -> Result<u64> {
    if x < 0 {
        Err(Error::IntegerOverflowWhileCasting)
    } else {
        Ok(x as u64)
    }
}

fn cast_unsigned_to_signed(x: u64) -> Result<i64> {
    if x > i64::MAX as u64 {
        Err(Error::IntegerOverflowWhileCasting)
    } else {
        Ok(x as i64)
    }
}

fn cast_float_to_unsigned(x: f64) -> Result<u64> {
    if x.fract() == 0.0 && x >= 0.0 && x <= u64::MAX as f64 && x as u64 as f64 == x {
        Ok(x as u64)
    } else {
        Err(Error::IntegerOverflowWhileCasting)
    }
}

fn cast_float_to_signed(x: f64) -> Result<i64> {
    if x.fract() == 0.0 && x as i64 as f64 == x {
        Ok(x as i64)
    } else {
        Err(Error::IntegerOverflowWhileCasting)
    }
}

macro_rules! narrow_uint {
    ($name:ident, $t:ty) => {
        /// Range-checked narrowing from `as_u64`'s result.
        pub fn $name(x: u64) -> Result<$t> {
            <$t>::try_from(x).map_err(|_| Error::IntegerOverflowWhileCasting)
        }
    };
}
macro_rules! narrow_int {
    ($name:ident, $t:ty) => {
        pub fn $name(x: i64) -> Result<$t> {
            <$t>::try_from(x).map_err(|_| Error::IntegerOverflowWhileCasting)
        }
    };
}
narrow_uint!(narrow_u8, u8);
narrow_uint!(narrow_u16, u16);
narrow_uint!(narrow_u32, u32);
narrow_int!(narrow_i8, i8);
narrow_int!(narrow_i16, i16);
narrow_int!(narrow_i32, i32);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SliceReader;

    type TestDoc = Classified<SliceReader<'static>, SliceReader<'static>, (), ()>;

    #[test]
    fn tag_predicates() {
        let d: TestDoc = Classified::Null;
        assert!(d.is_null());
        assert!(Classified::<(), (), (), ()>::Undefined.is_undefined_or_null());
    }

    #[test]
    fn numeric_coercions_widen_and_range_check() {
        let d: TestDoc = Classified::UnsignedInt(7);
        assert_eq!(d.as_f64(true).unwrap(), 7.0);

        let d: TestDoc = Classified::SignedInt(-3);
        assert!(matches!(d.as_u64(true), Err(Error::IntegerOverflowWhileCasting)));

        let d: TestDoc = Classified::FloatingPoint(2.0);
        assert_eq!(d.as_u64(true).unwrap(), 2);

        let d: TestDoc = Classified::FloatingPoint(2.5);
        assert!(matches!(d.as_u64(true), Err(Error::IntegerOverflowWhileCasting)));
    }

    #[test]
    fn string_number_coercion_only_when_json() {
        let d: TestDoc = Classified::String(SliceReader::new(b"42"));
        assert_eq!(d.as_u64(true).unwrap(), 42);

        let d: TestDoc = Classified::String(SliceReader::new(b"42"));
        assert!(matches!(d.as_u64(false), Err(Error::BadVariantAccess(_))));
    }

    #[test]
    fn bool_from_string_literal() {
        let d: TestDoc = Classified::String(SliceReader::new(b"true"));
        assert!(d.as_bool().unwrap());
        let d: TestDoc = Classified::String(SliceReader::new(b"false"));
        assert!(!d.as_bool().unwrap());
        let d: TestDoc = Classified::String(SliceReader::new(b"nope"));
        assert!(d.as_bool().is_err());
    }

    #[test]
    fn bool_from_string_rejects_trailing_garbage() {
        let d: TestDoc = Classified::String(SliceReader::new(b"falsehood"));
        assert!(d.as_bool().is_err());
        let d: TestDoc = Classified::String(SliceReader::new(b"truest"));
        assert!(d.as_bool().is_err());
    }
}
