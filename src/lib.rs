//! A uniform, pull-based streaming document model shared by a JSON reader/
//! writer and a CBOR reader/writer: both formats parse into and write out
//! of the same [`document::Classified`] shape, so code written against one
//! format's `Document`/`Writer` reads almost identically against the
//! other's, and [`copy::copy`] can re-serialize any document read from one
//! format into the other without materializing it.
//!
//! Reading and writing never buffer a whole document: containers are
//! consumed element by element through child readers/writers borrowed from
//! the same stream, gated by the `checked` feature's runtime lock discipline
//! ([`check`]).
//!
//! `std` (on by default) enables the [`io::IoReader`]/[`io::IoWriter`]
//! adapters over `std::io::Read`/`Write`; the core readers and writers work
//! against the crate-local [`io::ByteReader`]/[`io::ByteWriter`] traits
//! either way.

pub mod cbor;
pub mod check;
pub mod copy;
pub mod document;
pub mod error;
pub mod io;
pub mod json;
pub mod number;
pub mod tag;

pub use document::Classified;
pub use error::{Error, Result};
pub use tag::Tag;
