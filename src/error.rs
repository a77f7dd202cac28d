use core::fmt;

/// Root error type for the whole crate. Every fallible public operation returns
/// `Result<T, Error>` (aliased as [`crate::Result`]).
///
/// Mirrors the `goldfish::exception` hierarchy: a closed set of format errors,
/// numeric overflow errors (split by where the overflow happened), usage
/// errors surfaced by the debug-check wrapper, and I/O errors.
#[derive(Debug)]
pub enum Error {
    /// Malformed CBOR framing, or a JSON construct that isn't simply "bad JSON
    /// grammar" (e.g. a lone UTF-16 surrogate in a `\u` escape).
    IllFormatted(&'static str),
    /// JSON-specific grammar violation (unexpected character, bad literal, ...).
    IllFormattedJsonData(&'static str),
    /// A JSON number overflowed during parsing (u64 accumulation, or a negated
    /// magnitude that doesn't fit in i64).
    IntegerOverflowInJson,
    /// A coercion between tags (`as_u64`, `as_i64`, ...) lost information.
    IntegerOverflowWhileCasting,
    /// The underlying byte stream failed.
    Io(std::io::Error),
    /// A map writer was asked to write a non-scalar value as a key.
    InvalidKeyType,
    /// Fewer bytes were available than a fixed-size read required.
    UnexpectedEndOfStream,
    /// A coercion was attempted against the wrong tag, or the parent/child
    /// lock discipline was violated (live child not drained, map
    /// key/value alternation broken).
    BadVariantAccess(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IllFormatted(msg) => write!(f, "ill-formed input: {msg}"),
            Error::IllFormattedJsonData(msg) => write!(f, "ill-formed JSON data: {msg}"),
            Error::IntegerOverflowInJson => write!(f, "integer overflow parsing a JSON number"),
            Error::IntegerOverflowWhileCasting => write!(f, "integer overflow while casting a document value"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidKeyType => write!(f, "map keys must be scalars, not binary, arrays, or maps"),
            Error::UnexpectedEndOfStream => write!(f, "unexpected end of stream"),
            Error::BadVariantAccess(msg) => write!(f, "bad variant access: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

pub type Result<T> = core::result::Result<T, Error>;
