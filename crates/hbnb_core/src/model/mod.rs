//! Domain model for shell-managed objects.
//!
//! # Responsibility
//! - Define the instance record, its kinds and its attribute values.
//! - Parse console literals into attribute values.
//! - Own the serialized mapping shape used by the storage layer.
//!
//! # Invariants
//! - Every instance is identified by `"<Kind>.<id>"` in the registry.
//! - Kind dispatch goes through the closed `ModelKind` enum only.

pub mod instance;
pub mod kind;
pub mod literal;
pub mod value;
