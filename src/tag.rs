/// The closed set of value kinds every reader/writer value is dispatched by.
///
/// `String` and `Binary` are distinct even though both carry bytes: `String`
/// asserts UTF-8 text, `Binary` is opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Null,
    Undefined,
    Boolean,
    UnsignedInt,
    SignedInt,
    FloatingPoint,
    String,
    Binary,
    Array,
    Map,
}
