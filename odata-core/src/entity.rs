//! Materialized entities.

use std::collections::BTreeMap;
use std::sync::Arc;

use odata_edm::{EdmEntitySet, EdmEntityType, EdmFunctionImport};

use crate::key::EntityKey;
use crate::link::Link;
use crate::property::{Property, find_property};

/// The media stream of a media-link entity.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Source URI of the stream.
    pub media_source: String,
    /// Advisory media type.
    pub content_type: Option<String>,
}

/// Operations advertised by an entry, resolved against the schema and keyed
/// by their fully-qualified name.
#[derive(Debug, Clone, Default)]
pub struct BindableExtension {
    /// Bound actions.
    pub actions: BTreeMap<String, Arc<EdmFunctionImport>>,
    /// Bound functions.
    pub functions: BTreeMap<String, Arc<EdmFunctionImport>>,
}

impl BindableExtension {
    /// Whether any binding was recorded.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.functions.is_empty()
    }
}

/// A materialized entity. The two shapes are structurally distinct: a
/// create-request payload is not a keyed entity with a missing key.
#[derive(Debug, Clone)]
pub enum Entity {
    /// A create-request payload: no identity yet.
    Request(RequestEntity),
    /// An identified entity decoded from the wire.
    Keyed(KeyedEntity),
}

/// The create-request shape.
#[derive(Debug, Clone)]
pub struct RequestEntity {
    /// The set the entity is addressed to.
    pub entity_set: Arc<EdmEntitySet>,
    /// Decoded properties, in document order.
    pub properties: Vec<Property>,
    /// Translated links.
    pub links: Vec<Link>,
    /// Feed-customization title, when mapped.
    pub title: Option<String>,
    /// Category term as sent, for polymorphic creates.
    pub category_term: Option<String>,
}

/// The identified shape.
#[derive(Debug, Clone)]
pub struct KeyedEntity {
    /// The set the entity belongs to.
    pub entity_set: Arc<EdmEntitySet>,
    /// The concrete (possibly derived) entity type.
    pub entity_type: Arc<EdmEntityType>,
    /// The entity key.
    pub key: EntityKey,
    /// Concurrency token, when sent.
    pub etag: Option<String>,
    /// Decoded properties, in document order.
    pub properties: Vec<Property>,
    /// Translated links.
    pub links: Vec<Link>,
    /// Feed-customization title, when mapped.
    pub title: Option<String>,
    /// Feed-customization summary, when mapped.
    pub summary: Option<String>,
    /// Operation bindings, present only when at least one was advertised.
    pub bindable: Option<BindableExtension>,
    /// Media stream, for media-link entities.
    pub media_stream: Option<StreamDescriptor>,
}

impl Entity {
    /// The set the entity belongs to or is addressed to.
    pub fn entity_set(&self) -> &Arc<EdmEntitySet> {
        match self {
            Entity::Request(e) => &e.entity_set,
            Entity::Keyed(e) => &e.entity_set,
        }
    }

    /// The entity key, when the entity has one.
    pub fn key(&self) -> Option<&EntityKey> {
        match self {
            Entity::Request(_) => None,
            Entity::Keyed(e) => Some(&e.key),
        }
    }

    /// Decoded properties, in document order.
    pub fn properties(&self) -> &[Property] {
        match self {
            Entity::Request(e) => &e.properties,
            Entity::Keyed(e) => &e.properties,
        }
    }

    /// Translated links.
    pub fn links(&self) -> &[Link] {
        match self {
            Entity::Request(e) => &e.links,
            Entity::Keyed(e) => &e.links,
        }
    }

    /// Find a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        find_property(self.properties(), name)
    }

    /// The keyed shape, when the entity has identity.
    pub fn as_keyed(&self) -> Option<&KeyedEntity> {
        match self {
            Entity::Keyed(e) => Some(e),
            Entity::Request(_) => None,
        }
    }
}
