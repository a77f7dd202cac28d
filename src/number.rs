//! JSON number grammar, shared between the JSON reader's top-level number
//! literal and the document coercion path that parses a number out of a
//! JSON text string on demand.

use crate::error::{Error, Result};
use crate::io::ByteReader;

/// The three shapes a JSON number can parse into, matching the `unsigned_int`
/// / `signed_int` / `floating_point` tags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    UnsignedInt(u64),
    SignedInt(i64),
    Float(f64),
}

/// A fixed-size scratch buffer long enough for any `f64` text rendering
/// (sign, ~17 significant digits, `.`, exponent) with generous headroom;
/// characters beyond this cannot affect the parsed value (they have already
/// been drained from the accumulated integer/exponent magnitude) so the rest
/// of the literal is simply skipped.
const MAX_FLOAT_CHARS: usize = 1079;

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

/// Reads an unsigned integer starting with `first` (already consumed from
/// the stream). `allow_leading_zeroes` is used for exponent magnitudes,
/// where JSON's "no leading zero" rule for the integer part doesn't apply.
fn read_unsigned_integer<R: ByteReader>(
    r: &mut R,
    first: u8,
    allow_leading_zeroes: bool,
) -> Result<u64> {
    if !allow_leading_zeroes && first == b'0' {
        return Ok(0);
    }
    if !is_digit(first) {
        return Err(Error::IllFormattedJsonData("expected a digit"));
    }

    let mut result = (first - b'0') as u64;
    loop {
        match r.peek()? {
            Some(c) if is_digit(c) => {
                let digit = (c - b'0') as u64;
                result = result
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or(Error::IntegerOverflowInJson)?;
                r.read_byte()?;
            }
            _ => return Ok(result),
        }
    }
}

/// Parses a JSON number, with `first` being the first character of the
/// literal (already consumed by the caller, which needed it to decide this
/// was a number at all).
pub fn read_number<R: ByteReader>(r: &mut R, first: u8) -> Result<NumberValue> {
    let negative = first == b'-';
    let first_digit = if negative { r.read_byte()? } else { first };

    let integer = read_unsigned_integer(r, first_digit, false)?;

    let marker = r.peek()?;
    if marker != Some(b'.') && marker != Some(b'e') && marker != Some(b'E') {
        return if negative {
            const I64_MIN_MAGNITUDE: u64 = 1u64 << 63;
            if integer > I64_MIN_MAGNITUDE {
                Err(Error::IntegerOverflowInJson)
            } else if integer == I64_MIN_MAGNITUDE {
                Ok(NumberValue::SignedInt(i64::MIN))
            } else {
                Ok(NumberValue::SignedInt(-(integer as i64)))
            }
        } else {
            Ok(NumberValue::UnsignedInt(integer))
        };
    }

    // Floating point: reconstruct a canonical decimal string and hand it to
    // the platform parser rather than hand-rolling decimal math.
    let mut buf = [0u8; MAX_FLOAT_CHARS];
    let mut len = 0usize;
    let mut push = |c: u8, len: &mut usize| {
        if *len < buf.len() {
            buf[*len] = c;
            *len += 1;
        }
    };

    if negative {
        push(b'-', &mut len);
    }
    for c in integer.to_string().bytes() {
        push(c, &mut len);
    }

    if r.peek()? == Some(b'.') {
        r.read_byte()?;
        push(b'.', &mut len);
        let d = r.read_byte()?;
        if !is_digit(d) {
            return Err(Error::IllFormattedJsonData("expected a digit after '.'"));
        }
        push(d, &mut len);
        while let Some(c) = r.peek()? {
            if !is_digit(c) {
                break;
            }
            r.read_byte()?;
            push(c, &mut len);
        }
    }

    if let Some(e @ (b'e' | b'E')) = r.peek()? {
        r.read_byte()?;
        push(e, &mut len);
        if let Some(sign @ (b'+' | b'-')) = r.peek()? {
            r.read_byte()?;
            push(sign, &mut len);
        }
        let d = r.read_byte()?;
        if !is_digit(d) {
            return Err(Error::IllFormattedJsonData("expected a digit in exponent"));
        }
        push(d, &mut len);
        while let Some(c) = r.peek()? {
            if !is_digit(c) {
                break;
            }
            r.read_byte()?;
            push(c, &mut len);
        }
    }

    let text = core::str::from_utf8(&buf[..len]).expect("all pushed bytes are ASCII");
    text.parse::<f64>()
        .map(NumberValue::Float)
        .map_err(|_| Error::IntegerOverflowInJson)
}
