//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** - two instances
/// with the same attribute values are the same value. To "modify" one,
/// construct a new instance. A search query or a tracking event is a value
/// object; an order (identified by its id) is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}


