//! `warden-core` — primitives shared by every Warden crate.
//!
//! This crate has no knowledge of HTTP, tokens or events.

pub mod error;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use value_object::ValueObject;
