//! Value object marker: equality by value, not identity.

/// Marker trait for value objects.
///
/// A value object is **immutable** and **compared by value**: two instances
/// holding the same data are interchangeable. Construction is the only place
/// validation happens, so an instance that exists is always well-formed.
///
/// In Warden this covers things like bearer tokens and role names:
///
/// ```ignore
/// let a = BearerToken::parse("aaa.bbb.ccc")?;
/// let b = BearerToken::parse("aaa.bbb.ccc")?;
/// assert_eq!(a, b); // same string, same token
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
