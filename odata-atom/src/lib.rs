//! Atom/XML payload engine for OData.
//!
//! This crate decodes wire-format Atom/XML documents (feeds and entries
//! describing entities, their properties, relationships, and bound
//! operations) into the typed, schema-validated entity graph of
//! `odata-core`, and encodes that graph back to wire XML. It also maps
//! parsed key URIs to structured keys.
//!
//! Parsing is a mutually-recursive, event-driven descent over a
//! forward-only XML cursor: a link may embed a full nested feed, which may
//! itself contain entries with further embedded feeds. A parse either
//! fully decodes its document or fails with an [`AtomError`]; there are no
//! partial results. Feeds are fully materialized in memory before being
//! returned; there is no lazy entry delivery, which bounds scalability
//! for very large feeds.
//!
//! # Example
//!
//! ```
//! use odata_atom::AtomFeedParser;
//! use odata_edm::{EdmDataServices, EdmEntityType, EdmSimpleType, EdmType};
//!
//! let product = EdmEntityType::builder("Catalog", "Product")
//!     .key(["ID"])
//!     .property("ID", EdmType::Simple(EdmSimpleType::Int32), false)
//!     .property("Name", EdmType::Simple(EdmSimpleType::String), true)
//!     .build();
//! let schema = EdmDataServices::builder()
//!     .entity_type(&product)
//!     .entity_set("Products", &product)
//!     .build();
//!
//! let document = r#"<?xml version="1.0" encoding="utf-8"?>
//! <feed xmlns="http://www.w3.org/2005/Atom"
//!       xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
//!       xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
//!   <entry>
//!     <id>http://host/svc.svc/Products(1)</id>
//!     <content type="application/xml">
//!       <m:properties>
//!         <d:ID m:type="Edm.Int32">1</d:ID>
//!         <d:Name>Chai</d:Name>
//!       </m:properties>
//!     </content>
//!   </entry>
//! </feed>"#;
//!
//! let feed = AtomFeedParser::new(&schema, "Products").parse(document).unwrap();
//! assert_eq!(feed.entries.len(), 1);
//! ```

mod error;
mod escaping;
mod materializer;
pub mod ns;
mod parser;
mod properties;
mod reader;
mod tracing_macros;
mod writer;

pub use error::AtomError;
pub use parser::{
    AtomFeedParser, ContentEntry, DEFAULT_MAX_DEPTH, DataEntry, EntryResult, Envelope, Feed,
    FeedCustomization, parse_entity_key,
};
pub use reader::XmlError;
pub use writer::AtomFeedWriter;
