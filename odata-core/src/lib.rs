//! Typed entity graph for the odata crates.
//!
//! This crate holds what a decoded payload *is*, independent of wire format:
//! the recursive property-value tree, structured entity keys, navigation and
//! stream links, and the two entity shapes (identified vs. create-request).
//! The Atom engine in `odata-atom` produces these; serialization and CRUD
//! layers consume them.

mod entity;
mod key;
mod link;
mod property;

pub use entity::{BindableExtension, Entity, KeyedEntity, RequestEntity, StreamDescriptor};
pub use key::{EntityKey, KeyParseError};
pub use link::Link;
pub use property::{Property, Value, find_property};
