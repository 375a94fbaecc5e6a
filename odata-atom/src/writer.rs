//! The paired Atom encoder: entities and feeds back to wire XML.
//!
//! Covers what response encoding and round-tripping need: the entry
//! envelope, navigation links (deferred and expanded), and the properties
//! section. Operation advertisements are not re-emitted.

use core::fmt::Write as _;

use odata_core::{Entity, Link, Property, Value};

use crate::escaping::{escape_attr, escape_text};
use crate::ns;

/// Writes feeds and entries for entities of one service, rooted at a base
/// URI.
#[derive(Debug, Clone)]
pub struct AtomFeedWriter {
    base_uri: String,
    updated: Option<String>,
}

impl AtomFeedWriter {
    /// Create a writer rooted at the service base URI.
    pub fn new(base_uri: impl Into<String>) -> Self {
        let mut base_uri = base_uri.into();
        while base_uri.ends_with('/') {
            base_uri.pop();
        }
        Self {
            base_uri,
            updated: None,
        }
    }

    /// Timestamp to stamp feeds and entries with.
    pub fn with_updated(mut self, updated: impl Into<String>) -> Self {
        self.updated = Some(updated.into());
        self
    }

    /// Render a feed document over the given entities.
    pub fn write_feed(&self, set_name: &str, entities: &[Entity]) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        let _ = write!(
            out,
            r#"<feed xml:base="{base}/" xmlns="{atom}" xmlns:d="{d}" xmlns:m="{m}">"#,
            base = escape_attr(&self.base_uri),
            atom = ns::ATOM,
            d = ns::DATASERVICES,
            m = ns::METADATA,
        );
        let _ = write!(
            out,
            r#"<title type="text">{}</title>"#,
            escape_text(set_name)
        );
        let _ = write!(
            out,
            "<id>{}/{}</id>",
            escape_text(&self.base_uri),
            escape_text(set_name)
        );
        if let Some(updated) = &self.updated {
            let _ = write!(out, "<updated>{}</updated>", escape_text(updated));
        }
        for entity in entities {
            self.entry_fragment(entity, false, &mut out);
        }
        out.push_str("</feed>");
        out
    }

    /// Render a single-entry document.
    pub fn write_entry(&self, entity: &Entity) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        self.entry_fragment(entity, true, &mut out);
        out
    }

    fn entry_fragment(&self, entity: &Entity, standalone: bool, out: &mut String) {
        out.push_str("<entry");
        if standalone {
            let _ = write!(
                out,
                r#" xmlns="{atom}" xmlns:d="{d}" xmlns:m="{m}""#,
                atom = ns::ATOM,
                d = ns::DATASERVICES,
                m = ns::METADATA,
            );
        }
        let keyed = entity.as_keyed();
        if let Some(etag) = keyed.and_then(|k| k.etag.as_deref()) {
            let _ = write!(out, r#" m:etag="{}""#, escape_attr(etag));
        }
        out.push('>');

        let set_name = entity.entity_set().name.as_str();
        if let Some(keyed) = keyed {
            let id = format!("{}/{}{}", self.base_uri, set_name, keyed.key);
            let _ = write!(out, "<id>{}</id>", escape_text(&id));
        }

        let title = match entity {
            Entity::Keyed(k) => k.title.as_deref(),
            Entity::Request(r) => r.title.as_deref(),
        };
        let _ = write!(
            out,
            r#"<title type="text">{}</title>"#,
            escape_text(title.unwrap_or_default())
        );
        if let Some(updated) = &self.updated {
            let _ = write!(out, "<updated>{}</updated>", escape_text(updated));
        }

        let category_term = match entity {
            Entity::Keyed(k) => Some(k.entity_type.full_name()),
            Entity::Request(r) => r.category_term.clone(),
        };
        if let Some(term) = category_term {
            let _ = write!(
                out,
                r#"<category term="{}" scheme="{}"/>"#,
                escape_attr(&term),
                ns::SCHEME
            );
        }

        if let Some(keyed) = keyed {
            let href = format!("{}{}", set_name, keyed.key);
            let _ = write!(
                out,
                r#"<link rel="edit" title="{}" href="{}"/>"#,
                escape_attr(&keyed.entity_type.name),
                escape_attr(&href)
            );
        }

        for link in entity.links() {
            self.link_fragment(link, out);
        }

        // a media-link entry carries its properties directly under the
        // entry; everything else nests them in the content element
        match keyed.and_then(|k| k.media_stream.as_ref()) {
            Some(stream) => {
                out.push_str("<content");
                if let Some(content_type) = &stream.content_type {
                    let _ = write!(out, r#" type="{}""#, escape_attr(content_type));
                }
                let _ = write!(out, r#" src="{}"/>"#, escape_attr(&stream.media_source));
                out.push_str("<m:properties>");
                write_properties(entity.properties(), out);
                out.push_str("</m:properties>");
            }
            None => {
                let _ = write!(out, r#"<content type="{}">"#, ns::APPLICATION_XML);
                out.push_str("<m:properties>");
                write_properties(entity.properties(), out);
                out.push_str("</m:properties>");
                out.push_str("</content>");
            }
        }

        out.push_str("</entry>");
    }

    fn link_fragment(&self, link: &Link, out: &mut String) {
        match link {
            Link::DeferredCollection {
                relation,
                title,
                href,
            } => {
                link_open(relation, Some(ns::ATOM_FEED_CONTENT_TYPE), title, href, out);
                out.push_str("/>");
            }
            Link::DeferredSingle {
                relation,
                title,
                href,
            } => {
                link_open(relation, Some(ns::ATOM_ENTRY_CONTENT_TYPE), title, href, out);
                out.push_str("/>");
            }
            Link::ExpandedCollection {
                relation,
                title,
                href,
                entities,
            } => {
                link_open(relation, Some(ns::ATOM_FEED_CONTENT_TYPE), title, href, out);
                out.push_str("><m:inline><feed>");
                let _ = write!(
                    out,
                    r#"<title type="text">{}</title>"#,
                    escape_text(title.as_deref().unwrap_or_default())
                );
                for entity in entities {
                    self.entry_fragment(entity, false, out);
                }
                out.push_str("</feed></m:inline></link>");
            }
            Link::ExpandedSingle {
                relation,
                title,
                href,
                entity,
            } => {
                link_open(relation, Some(ns::ATOM_ENTRY_CONTENT_TYPE), title, href, out);
                match entity {
                    Some(entity) => {
                        out.push_str("><m:inline>");
                        self.entry_fragment(entity, false, out);
                        out.push_str("</m:inline></link>");
                    }
                    None => out.push_str("><m:inline/></link>"),
                }
            }
            Link::NamedStream {
                relation,
                title,
                href,
                content_type,
            } => {
                link_open(relation, content_type.as_deref(), title, href, out);
                out.push_str("/>");
            }
        }
    }
}

fn link_open(
    relation: &str,
    media_type: Option<&str>,
    title: &Option<String>,
    href: &Option<String>,
    out: &mut String,
) {
    let _ = write!(out, r#"<link rel="{}""#, escape_attr(relation));
    if let Some(media_type) = media_type {
        let _ = write!(out, r#" type="{}""#, escape_attr(media_type));
    }
    if let Some(title) = title {
        let _ = write!(out, r#" title="{}""#, escape_attr(title));
    }
    if let Some(href) = href {
        let _ = write!(out, r#" href="{}""#, escape_attr(href));
    }
}

fn write_properties(properties: &[Property], out: &mut String) {
    for property in properties {
        write_property(property, out);
    }
}

fn write_property(property: &Property, out: &mut String) {
    let _ = write!(out, "<d:{}", property.name);
    let type_name = property.ty.full_name();
    // Edm.String is the default and stays implicit, as readers expect
    if type_name != "Edm.String" {
        let _ = write!(out, r#" m:type="{}""#, escape_attr(&type_name));
    }
    match &property.value {
        Value::Null => out.push_str(r#" m:null="true"/>"#),
        Value::Simple(value) => {
            let _ = write!(
                out,
                ">{}</d:{}>",
                escape_text(&value.text()),
                property.name
            );
        }
        Value::Complex(children) => {
            out.push('>');
            write_properties(children, out);
            let _ = write!(out, "</d:{}>", property.name);
        }
        Value::Collection(items) => {
            out.push('>');
            for item in items {
                write_item(item, out);
            }
            let _ = write!(out, "</d:{}>", property.name);
        }
    }
}

fn write_item(item: &Value, out: &mut String) {
    match item {
        Value::Null => out.push_str(r#"<d:element m:null="true"/>"#),
        Value::Simple(value) => {
            let _ = write!(
                out,
                "<d:element>{}</d:element>",
                escape_text(&value.text())
            );
        }
        Value::Complex(children) => {
            out.push_str("<d:element>");
            write_properties(children, out);
            out.push_str("</d:element>");
        }
        Value::Collection(items) => {
            out.push_str("<d:element>");
            for item in items {
                write_item(item, out);
            }
            out.push_str("</d:element>");
        }
    }
}
