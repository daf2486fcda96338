//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, construct a new value. Types implementing this trait are
/// only ever produced through a validating constructor, so holding one is
/// proof the input was well-formed.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
