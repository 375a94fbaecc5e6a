//! Turning a completed entry's accumulated state into an immutable entity.

use std::collections::BTreeMap;
use std::sync::Arc;

use odata_core::{
    BindableExtension, Entity, EntityKey, KeyedEntity, Link, Property, RequestEntity,
    StreamDescriptor, find_property,
};
use odata_edm::{
    EdmDataServices, EdmEntitySet, EdmEntityType, EdmFunctionImport, EdmSimpleType, EdmType,
};

use crate::error::AtomError;
use crate::ns;
use crate::parser::{AtomLink, Envelope, EntryResult, FeedCustomization, parse_entity_key};

/// Combine envelope, properties, links, key, and schema into the output
/// entity.
///
/// The key is resolved in priority order: a key parsed from a key-shaped
/// envelope id, then a caller-supplied override, then inference from the
/// concrete type's key properties. An entry that resolves no key at all is
/// the create-request shape, structurally distinct from a keyed entity.
#[allow(clippy::too_many_arguments)]
pub(crate) fn entity_from_entry(
    schema: &EdmDataServices,
    entity_set: &Arc<EdmEntitySet>,
    envelope: &Envelope,
    properties: &[Property],
    links: Vec<AtomLink>,
    key_override: Option<&EntityKey>,
    customization: Option<&FeedCustomization>,
    actions: BTreeMap<String, Arc<EdmFunctionImport>>,
    functions: BTreeMap<String, Arc<EdmFunctionImport>>,
) -> Result<Entity, AtomError> {
    let mut properties = properties.to_vec();
    if let Some(mapping) = customization {
        if let Some(name) = &mapping.title_property {
            properties.push(text_property(name, envelope.title.as_deref()));
        }
        if let Some(name) = &mapping.summary_property {
            properties.push(text_property(name, envelope.summary.as_deref()));
        }
    }

    let entity_type = match &envelope.category_term {
        Some(term) => schema
            .find_entity_type(term)
            .ok_or_else(|| AtomError::UnknownType { name: term.clone() })?
            .clone(),
        None => entity_set.ty.clone(),
    };

    // favor the key we just parsed, then the caller's override, then
    // inference from key properties
    let parsed = match envelope.id.as_deref() {
        Some(id) if !id.is_empty() && id.ends_with(')') => Some(parse_entity_key(id)?),
        _ => None,
    };
    let key = match parsed {
        Some(key) => Some(key),
        None => key_override
            .cloned()
            .or_else(|| infer_key(&entity_type, &properties)),
    };

    let links = translate_links(links);

    match key {
        None => Ok(Entity::Request(RequestEntity {
            entity_set: entity_set.clone(),
            properties,
            links,
            title: envelope.title.clone(),
            category_term: envelope.category_term.clone(),
        })),
        Some(key) => {
            let bindable = (!actions.is_empty() || !functions.is_empty())
                .then(|| BindableExtension { actions, functions });
            let media_stream = envelope.media_source.clone().map(|media_source| {
                StreamDescriptor {
                    media_source,
                    content_type: envelope.content_type.clone(),
                }
            });
            Ok(Entity::Keyed(KeyedEntity {
                entity_set: entity_set.clone(),
                entity_type,
                key,
                etag: envelope.etag.clone(),
                properties,
                links,
                title: envelope.title.clone(),
                summary: envelope.summary.clone(),
                bindable,
                media_stream,
            }))
        }
    }
}

fn text_property(name: &str, text: Option<&str>) -> Property {
    match text {
        Some(text) => Property::string(name, text),
        None => Property::null(name, EdmType::Simple(EdmSimpleType::String)),
    }
}

/// Infer a key by matching the concrete type's key-property names against
/// the decoded properties. All components must be present and
/// simple-valued; otherwise the entry stays key-less.
fn infer_key(entity_type: &EdmEntityType, properties: &[Property]) -> Option<EntityKey> {
    let names = entity_type.key_property_names();
    if names.is_empty() {
        return None;
    }
    let mut components = Vec::with_capacity(names.len());
    for name in names {
        let value = find_property(properties, name)?.as_simple()?.clone();
        components.push((name.clone(), value));
    }
    if components.len() == 1 {
        let (_, value) = components.remove(0);
        Some(EntityKey::Single(value))
    } else {
        Some(EntityKey::Named(components))
    }
}

/// Translate each parsed link by relation family and inline state.
/// Unrecognized relation families (self, edit, ...) are dropped.
fn translate_links(links: Vec<AtomLink>) -> Vec<Link> {
    let mut translated = Vec::with_capacity(links.len());
    for link in links {
        let Some(relation) = link.relation else {
            continue;
        };
        if relation.starts_with(ns::RELATED) {
            match link.media_type.as_deref() {
                Some(ns::ATOM_FEED_CONTENT_TYPE) => {
                    if link.inline_expected {
                        let entities = link
                            .inline_feed
                            .map(|feed| {
                                feed.entries
                                    .into_iter()
                                    .filter_map(EntryResult::into_entity)
                                    .collect()
                            })
                            .unwrap_or_default();
                        translated.push(Link::ExpandedCollection {
                            relation,
                            title: link.title,
                            href: link.href,
                            entities,
                        });
                    } else {
                        translated.push(Link::DeferredCollection {
                            relation,
                            title: link.title,
                            href: link.href,
                        });
                    }
                }
                Some(ns::ATOM_ENTRY_CONTENT_TYPE) => {
                    if link.inline_expected {
                        let entity = link
                            .inline_entry
                            .and_then(|entry| (*entry).into_entity())
                            .map(Box::new);
                        translated.push(Link::ExpandedSingle {
                            relation,
                            title: link.title,
                            href: link.href,
                            entity,
                        });
                    } else {
                        translated.push(Link::DeferredSingle {
                            relation,
                            title: link.title,
                            href: link.href,
                        });
                    }
                }
                _ => {}
            }
        } else if relation.starts_with(ns::EDIT_MEDIA)
            || relation.starts_with(ns::MEDIA_RESOURCE)
        {
            translated.push(Link::NamedStream {
                relation,
                title: link.title,
                href: link.href,
                content_type: link.media_type,
            });
        }
    }
    translated
}
