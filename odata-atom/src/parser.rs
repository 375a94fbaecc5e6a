//! The recursive-descent Atom payload parser.
//!
//! Feed, entry, and link parsing are mutually recursive, one call per
//! nesting level of the document: a link may embed a full nested feed,
//! which may itself contain entries with further embedded feeds. All levels
//! share one forward-only [`XmlEvents`] cursor; an inner call fully
//! consumes its own sub-document before returning, so an end tag always
//! closes the element at the *current* recursion level.

use std::collections::BTreeMap;
use std::sync::Arc;

use odata_core::{Entity, EntityKey, Property};
use odata_edm::{
    EdmDataServices, EdmEntitySet, EdmEntityType, EdmFunctionImport, EdmStructuralType,
    FunctionKind,
};

use crate::error::AtomError;
use crate::materializer::entity_from_entry;
use crate::ns;
use crate::properties::{check_depth, parse_properties};
use crate::reader::{StartEl, XmlEvent, XmlEvents};
use crate::tracing_macros::trace;

/// Default ceiling on document nesting. Each feed, entry, link, and
/// complex-property scope is one level.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A decoded feed: ordered entries plus an optional continuation cursor
/// taken from a `rel="next"` link.
#[derive(Debug)]
pub struct Feed {
    /// Entries in document order.
    pub entries: Vec<EntryResult>,
    /// Opaque continuation URI, when the producer paginated.
    pub next: Option<String>,
}

impl Feed {
    /// The materialized entities of the data entries, in document order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entries.iter().filter_map(EntryResult::entity)
    }
}

/// Scalar envelope fields accumulated over one entry's parse.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    /// Entry id URI.
    pub id: Option<String>,
    /// Entry title text.
    pub title: Option<String>,
    /// Entry summary text.
    pub summary: Option<String>,
    /// Entry updated timestamp, verbatim.
    pub updated: Option<String>,
    /// Category term: the fully-qualified concrete type name.
    pub category_term: Option<String>,
    /// Category scheme URI.
    pub category_scheme: Option<String>,
    /// Content type of the content element.
    pub content_type: Option<String>,
    /// External media source URI, for media-link entries.
    pub media_source: Option<String>,
    /// Concurrency token from the `m:etag` attribute.
    pub etag: Option<String>,
}

/// The two shapes an entry decodes into.
#[derive(Debug)]
pub enum EntryResult {
    /// The entry had no properties section; its content was captured
    /// opaquely and nothing was materialized.
    Content(ContentEntry),
    /// The entry carried a properties section and materialized into an
    /// entity.
    Data(DataEntry),
}

impl EntryResult {
    /// The entry envelope.
    pub fn envelope(&self) -> &Envelope {
        match self {
            Self::Content(e) => &e.envelope,
            Self::Data(e) => &e.envelope,
        }
    }

    /// The materialized entity of a data entry.
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            Self::Content(_) => None,
            Self::Data(e) => Some(&e.entity),
        }
    }

    /// Consume into the materialized entity of a data entry.
    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Self::Content(_) => None,
            Self::Data(e) => Some(e.entity),
        }
    }
}

/// A content-only entry.
#[derive(Debug)]
pub struct ContentEntry {
    /// The entry envelope.
    pub envelope: Envelope,
    /// The captured inner markup or text of the content element.
    pub content: String,
}

/// A fully decoded entry.
#[derive(Debug)]
pub struct DataEntry {
    /// The entry envelope.
    pub envelope: Envelope,
    /// The decoded properties, before feed-customization additions.
    pub properties: Vec<Property>,
    /// The materialized entity.
    pub entity: Entity,
}

/// Maps feed-customized title/summary back onto entity properties.
#[derive(Debug, Clone, Default)]
pub struct FeedCustomization {
    /// Property fed from the entry title, when customized.
    pub title_property: Option<String>,
    /// Property fed from the entry summary, when customized.
    pub summary_property: Option<String>,
}

/// Link accumulator. Exactly one inline state holds when the link closes:
/// no inline marker (deferred), marker with empty body, marker with feed,
/// or marker with entry.
#[derive(Debug)]
pub(crate) struct AtomLink {
    pub relation: Option<String>,
    pub title: Option<String>,
    pub media_type: Option<String>,
    pub href: Option<String>,
    pub inline_expected: bool,
    pub inline_feed: Option<Feed>,
    pub inline_entry: Option<Box<EntryResult>>,
}

/// Operation advertisement accumulator.
#[derive(Debug)]
struct AtomFunction {
    relation: Option<String>,
    target: Option<String>,
}

impl AtomFunction {
    fn from_element(start: &StartEl) -> Self {
        Self {
            relation: start.attr("rel").map(str::to_string),
            target: start.attr("target").map(str::to_string),
        }
    }

    /// The fully-qualified operation name: the relation, or else the last
    /// path segment of the target URI.
    fn fq_name(&self) -> Option<String> {
        if let Some(rel) = &self.relation {
            return Some(rel.clone());
        }
        self.target
            .as_ref()
            .map(|target| target.rsplit('/').next().unwrap_or(target).to_string())
    }
}

/// Resolve an advertisement against the schema and record it. Pure over its
/// inputs; unresolvable advertisements are dropped.
fn record_binding(
    schema: &EdmDataServices,
    function: &AtomFunction,
    bound_type: Option<&EdmEntityType>,
    kind: FunctionKind,
    bindings: &mut BTreeMap<String, Arc<EdmFunctionImport>>,
) {
    let Some(fq_name) = function.fq_name() else {
        return;
    };
    match schema.find_function_import(&fq_name, bound_type, kind) {
        Some(import) => {
            let import = import.clone();
            bindings.insert(fq_name, import);
        }
        None => {
            trace!("dropping unresolvable operation advertisement: {fq_name}");
        }
    }
}

/// The Atom payload parser: stateless across calls, configured once with
/// the schema and the entity-set context of the document.
pub struct AtomFeedParser<'s> {
    schema: &'s EdmDataServices,
    entity_set_name: String,
    entity_key: Option<EntityKey>,
    customization: Option<FeedCustomization>,
    function: Option<Arc<EdmFunctionImport>>,
    max_depth: usize,
}

impl<'s> AtomFeedParser<'s> {
    /// Create a parser for documents addressed to the named entity set.
    pub fn new(schema: &'s EdmDataServices, entity_set_name: impl Into<String>) -> Self {
        Self {
            schema,
            entity_set_name: entity_set_name.into(),
            entity_key: None,
            customization: None,
            function: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Supply a key for entries that carry none of their own, as update
    /// requests addressed to a keyed resource do.
    pub fn with_entity_key(mut self, key: EntityKey) -> Self {
        self.entity_key = Some(key);
        self
    }

    /// Map feed-customized title/summary back onto entity properties.
    pub fn with_customization(mut self, customization: FeedCustomization) -> Self {
        self.customization = Some(customization);
        self
    }

    /// The operation whose result this document is; its result set is the
    /// fallback entity-set context when the set name does not resolve.
    pub fn with_function(mut self, function: Arc<EdmFunctionImport>) -> Self {
        self.function = Some(function);
        self
    }

    /// Override the nesting ceiling.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse a feed document.
    pub fn parse(&self, input: &str) -> Result<Feed, AtomError> {
        let entity_set = self.target_entity_set()?;
        let mut events = XmlEvents::new(input);
        self.parse_feed(&mut events, Some(&entity_set), 1)
    }

    /// Parse a single-entity document, whose root is an entry rather than a
    /// feed.
    pub fn parse_entry_document(&self, input: &str) -> Result<EntryResult, AtomError> {
        let entity_set = self.target_entity_set()?;
        let mut events = XmlEvents::new(input);
        loop {
            match events.next()? {
                Some(XmlEvent::Start(start)) if start.is(ns::ATOM, "entry") => {
                    return self.parse_entry(&mut events, &start, Some(&entity_set), 1);
                }
                Some(_) => continue,
                None => {
                    return Err(AtomError::MalformedDocument {
                        expected: "an <entry> document root",
                    });
                }
            }
        }
    }

    fn target_entity_set(&self) -> Result<Arc<EdmEntitySet>, AtomError> {
        if let Some(set) = self.schema.find_entity_set(&self.entity_set_name) {
            return Ok(set.clone());
        }
        // could not derive the entity set by name; is this a function result?
        if let Some(set) = self
            .function
            .as_ref()
            .and_then(|f| f.entity_set.as_deref())
            .and_then(|name| self.schema.find_entity_set(name))
        {
            return Ok(set.clone());
        }
        Err(AtomError::UnresolvableEntitySet {
            name: self.entity_set_name.clone(),
        })
    }

    /// Consume events until the end tag closes the feed at this recursion
    /// level, delegating each entry to [`parse_entry`](Self::parse_entry).
    fn parse_feed(
        &self,
        events: &mut XmlEvents<'_>,
        entity_set: Option<&Arc<EdmEntitySet>>,
        depth: usize,
    ) -> Result<Feed, AtomError> {
        check_depth(depth, self.max_depth)?;
        let mut entries = Vec::new();
        let mut next = None;

        loop {
            let event = events.next()?.ok_or(AtomError::MalformedDocument {
                expected: "</feed>",
            })?;
            match event {
                XmlEvent::Start(start) if start.is(ns::ATOM, "entry") => {
                    entries.push(self.parse_entry(events, &start, entity_set, depth + 1)?);
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "link") => {
                    if start.attr("rel") == Some("next") {
                        next = start.attr("href").map(str::to_string);
                    }
                }
                // return from a sub feed, if we went down the hierarchy
                XmlEvent::End(name) if name.matches(ns::ATOM, "feed") => {
                    trace!("feed closed with {} entries", entries.len());
                    return Ok(Feed { entries, next });
                }
                _ => {}
            }
        }
    }

    fn parse_entry(
        &self,
        events: &mut XmlEvents<'_>,
        entry_start: &StartEl,
        entity_set: Option<&Arc<EdmEntitySet>>,
        depth: usize,
    ) -> Result<EntryResult, AtomError> {
        check_depth(depth, self.max_depth)?;

        let mut entity_set: Option<Arc<EdmEntitySet>> = entity_set.cloned();
        // the concrete type starts as the set's declared type and may narrow
        // to a derived type when a category term arrives
        let mut entity_type: Option<Arc<EdmEntityType>> =
            entity_set.as_ref().map(|set| set.ty.clone());
        let mut envelope = Envelope {
            etag: entry_start.attr_in(ns::METADATA, "etag").map(str::to_string),
            ..Envelope::default()
        };
        let mut links: Vec<AtomLink> = Vec::new();
        let mut actions: BTreeMap<String, Arc<EdmFunctionImport>> = BTreeMap::new();
        let mut functions: BTreeMap<String, Arc<EdmFunctionImport>> = BTreeMap::new();
        let mut properties: Option<Vec<Property>> = None;
        let mut content: Option<String> = None;

        loop {
            let event = events.next()?.ok_or(AtomError::MalformedDocument {
                expected: "</entry>",
            })?;
            match event {
                XmlEvent::End(name) if name == entry_start.name => {
                    return match properties {
                        Some(properties) => {
                            let set = entity_set.as_ref().ok_or_else(|| {
                                AtomError::UnresolvableEntitySet {
                                    name: self.entity_set_name.clone(),
                                }
                            })?;
                            let entity = entity_from_entry(
                                self.schema,
                                set,
                                &envelope,
                                &properties,
                                links,
                                self.entity_key.as_ref(),
                                self.customization.as_ref(),
                                actions,
                                functions,
                            )?;
                            Ok(EntryResult::Data(DataEntry {
                                envelope,
                                properties,
                                entity,
                            }))
                        }
                        None => Ok(EntryResult::Content(ContentEntry {
                            envelope,
                            content: content.unwrap_or_default(),
                        })),
                    };
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "id") => {
                    envelope.id = Some(events.element_text(&start)?);
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "title") => {
                    envelope.title = Some(events.element_text(&start)?);
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "summary") => {
                    envelope.summary = Some(events.element_text(&start)?);
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "updated") => {
                    envelope.updated = Some(events.element_text(&start)?);
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "category") => {
                    envelope.category_term = start.attr("term").map(str::to_string);
                    envelope.category_scheme = start.attr("scheme").map(str::to_string);
                    // The type of an entity set is polymorphic: re-resolve
                    // the active set to the concrete type's owning set, and
                    // decode properties against the concrete type.
                    if let Some(term) = &envelope.category_term {
                        let ty = self.schema.find_entity_type(term).ok_or_else(|| {
                            AtomError::UnknownType { name: term.clone() }
                        })?;
                        let set = self.schema.entity_set_for_type(ty).ok_or_else(|| {
                            AtomError::UnresolvableEntitySet { name: term.clone() }
                        })?;
                        entity_type = Some(ty.clone());
                        entity_set = Some(set.clone());
                    }
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "link") => {
                    links.push(self.parse_link(events, &start, entity_set.as_ref(), depth + 1)?);
                }
                XmlEvent::Start(start) if start.is(ns::METADATA, "properties") => {
                    properties = Some(self.parse_entry_properties(
                        events,
                        &start,
                        entity_type.as_ref(),
                        depth,
                    )?);
                }
                XmlEvent::Start(start) if start.is(ns::METADATA, "action") => {
                    record_binding(
                        self.schema,
                        &AtomFunction::from_element(&start),
                        entity_type.as_deref(),
                        FunctionKind::Action,
                        &mut actions,
                    );
                }
                XmlEvent::Start(start) if start.is(ns::METADATA, "function") => {
                    record_binding(
                        self.schema,
                        &AtomFunction::from_element(&start),
                        entity_type.as_deref(),
                        FunctionKind::Function,
                        &mut functions,
                    );
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "content") => {
                    envelope.content_type = start.attr("type").map(str::to_string);
                    envelope.media_source = start.attr("src").map(str::to_string);

                    if envelope.content_type.as_deref() == Some(ns::APPLICATION_XML) {
                        // structured body: inspect the single child element
                        let mut seen_child = false;
                        loop {
                            let event = events.next()?.ok_or(AtomError::MalformedDocument {
                                expected: "</content>",
                            })?;
                            match event {
                                XmlEvent::End(name) if name == start.name => break,
                                XmlEvent::Start(child) if !seen_child => {
                                    seen_child = true;
                                    if child.is(ns::METADATA, "properties") {
                                        properties = Some(self.parse_entry_properties(
                                            events,
                                            &child,
                                            entity_type.as_ref(),
                                            depth,
                                        )?);
                                    } else {
                                        content = Some(events.inner_xml(&child)?);
                                    }
                                }
                                _ => {}
                            }
                        }
                    } else if envelope.media_source.is_none() {
                        content = Some(events.inner_xml(&start)?);
                    }
                    // an external media source leaves the content element
                    // empty; nothing further to consume
                }
                _ => {}
            }
        }
    }

    fn parse_entry_properties(
        &self,
        events: &mut XmlEvents<'_>,
        container: &StartEl,
        entity_type: Option<&Arc<EdmEntityType>>,
        depth: usize,
    ) -> Result<Vec<Property>, AtomError> {
        let ty = entity_type.ok_or_else(|| AtomError::UnresolvableEntitySet {
            name: self.entity_set_name.clone(),
        })?;
        let scope = EdmStructuralType::Entity(ty.clone());
        parse_properties(
            events,
            container,
            self.schema,
            &scope,
            depth + 1,
            self.max_depth,
        )
    }

    /// Decode one link element, recursing into feed/entry parsing for
    /// inline content.
    fn parse_link(
        &self,
        events: &mut XmlEvents<'_>,
        link_start: &StartEl,
        entity_set: Option<&Arc<EdmEntitySet>>,
        depth: usize,
    ) -> Result<AtomLink, AtomError> {
        check_depth(depth, self.max_depth)?;

        let mut link = AtomLink {
            relation: link_start.attr("rel").map(str::to_string),
            title: link_start.attr("title").map(str::to_string),
            media_type: link_start.attr("type").map(str::to_string),
            href: link_start.attr("href").map(str::to_string),
            inline_expected: false,
            inline_feed: None,
            inline_entry: None,
        };

        // Best effort: non-navigation relations (edit-media, mediaresource)
        // legitimately fail to resolve and are retained anyway.
        let target_set: Option<Arc<EdmEntitySet>> = link
            .relation
            .as_deref()
            .and_then(|rel| rel.strip_prefix(ns::RELATED))
            .and_then(|nav| entity_set.and_then(|set| set.ty.find_navigation_property(nav)))
            .and_then(|nav| self.schema.find_entity_type(&nav.target_type))
            .and_then(|ty| self.schema.entity_set_for_type(ty))
            .cloned();

        // expected cases:
        // 1.  </link>                               - deferred
        // 2.  <m:inline/></link>                    - inlined but null/empty
        // 3.  <m:inline><feed>...</m:inline></link>   - inlined feed
        // 4.  <m:inline><entry>...</m:inline></link>  - inlined entry
        loop {
            let event = events.next()?.ok_or(AtomError::MalformedDocument {
                expected: "</link>",
            })?;
            match event {
                XmlEvent::End(name) if name == link_start.name => return Ok(link),
                XmlEvent::Start(start) if start.is(ns::METADATA, "inline") => {
                    link.inline_expected = true; // may still be null content
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "feed") => {
                    link.inline_feed =
                        Some(self.parse_feed(events, target_set.as_ref(), depth + 1)?);
                }
                XmlEvent::Start(start) if start.is(ns::ATOM, "entry") => {
                    link.inline_entry = Some(Box::new(self.parse_entry(
                        events,
                        &start,
                        target_set.as_ref(),
                        depth + 1,
                    )?));
                }
                _ => {}
            }
        }
    }
}

/// Resolve an entry id URI to a structured key.
///
/// The id is percent-decoded, every `/segment(` occurrence is found, and the
/// *last* one opens the key clause, which runs to the end of the string.
/// Preferring the rightmost clause handles nested-resource ids such as
/// `.../Categories(1)/Products(76)`, and treating interior parentheses within
/// the clause as literal content handles keys such as
/// `.../T(attribute='X (EASTING)',point_set_id=19)`.
pub fn parse_entity_key(entry_id: &str) -> Result<EntityKey, AtomError> {
    let malformed = || AtomError::MalformedKey {
        id: entry_id.to_string(),
    };
    let decoded = urlencoding::decode(entry_id).map_err(|_| malformed())?;

    let mut clause_start = None;
    let mut last_slash = None;
    for (i, c) in decoded.char_indices() {
        match c {
            '/' => last_slash = Some(i),
            '(' => {
                if let Some(slash) = last_slash {
                    let segment = &decoded[slash + 1..i];
                    if !segment.is_empty() && !segment.contains('(') {
                        clause_start = Some(i);
                    }
                }
            }
            _ => {}
        }
    }

    let start = clause_start.ok_or_else(malformed)?;
    EntityKey::parse(&decoded[start..]).map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_edm::SimpleValue;

    #[test]
    fn key_from_simple_id() {
        let key = parse_entity_key("http://host/svc.svc/Set(7)").unwrap();
        assert_eq!(key, EntityKey::Single(SimpleValue::Int32(7)));
    }

    #[test]
    fn key_prefers_the_last_clause() {
        let key = parse_entity_key("http://host/svc.svc/Outer(1)/Inner(76)").unwrap();
        assert_eq!(key, EntityKey::Single(SimpleValue::Int32(76)));
    }

    #[test]
    fn key_keeps_parens_inside_quoted_literals() {
        let key = parse_entity_key(
            "http://host/svc.svc/T(attribute='X (EASTING)',point_set_id=19)",
        )
        .unwrap();
        assert_eq!(
            key,
            EntityKey::named([
                ("attribute", SimpleValue::String("X (EASTING)".to_string())),
                ("point_set_id", SimpleValue::Int32(19)),
            ])
        );
    }

    #[test]
    fn key_decodes_percent_escapes() {
        let key = parse_entity_key("http://host/svc.svc/Set(%277%27)").unwrap();
        assert_eq!(key, EntityKey::Single(SimpleValue::String("7".to_string())));
    }

    #[test]
    fn id_without_key_clause_is_malformed() {
        assert!(matches!(
            parse_entity_key("http://host/svc.svc/Set"),
            Err(AtomError::MalformedKey { .. })
        ));
    }

    #[test]
    fn operation_name_falls_back_to_target_segment() {
        let with_rel = AtomFunction {
            relation: Some("NS.Discount".to_string()),
            target: Some("http://host/svc.svc/Products(1)/NS.Discount".to_string()),
        };
        assert_eq!(with_rel.fq_name().as_deref(), Some("NS.Discount"));

        let without_rel = AtomFunction {
            relation: None,
            target: Some("http://host/svc.svc/Products(1)/NS.Discount".to_string()),
        };
        assert_eq!(without_rel.fq_name().as_deref(), Some("NS.Discount"));
    }
}
