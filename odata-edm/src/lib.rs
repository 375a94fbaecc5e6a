//! Entity Data Model (EDM) schema types for the odata crates.
//!
//! The EDM describes entity types, their properties and relationships,
//! entity sets, and bound operations. Parsers and writers treat the schema
//! as a read-only collaborator: everything here is immutable once built and
//! shared via `Arc`.
//!
//! # Example
//!
//! ```
//! use odata_edm::{EdmDataServices, EdmEntityType, EdmSimpleType, EdmType};
//!
//! let product = EdmEntityType::builder("Catalog", "Product")
//!     .key(["ID"])
//!     .property("ID", EdmType::Simple(EdmSimpleType::Int32), false)
//!     .property("Name", EdmType::Simple(EdmSimpleType::String), true)
//!     .build();
//!
//! let schema = EdmDataServices::builder()
//!     .entity_type(&product)
//!     .entity_set("Products", &product)
//!     .build();
//!
//! assert!(schema.resolve_type("Catalog.Product").is_some());
//! ```

mod schema;
mod simple;
mod types;

pub use schema::{
    EdmDataServices, EdmDataServicesBuilder, EdmEntitySet, EdmFunctionImport, FunctionKind,
};
pub use simple::{EdmSimpleType, LiteralError, SimpleValue};
pub use types::{
    EdmComplexType, EdmEntityType, EdmEntityTypeBuilder, EdmNavigationProperty, EdmProperty,
    EdmStructuralType, EdmType,
};
