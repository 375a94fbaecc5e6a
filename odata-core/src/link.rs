//! Navigation and stream links of a materialized entity.

use crate::entity::Entity;

/// A translated link. Deferred links require a follow-up fetch; expanded
/// links carry their target content inline.
#[derive(Debug, Clone)]
pub enum Link {
    /// A to-many navigation with no inlined content.
    DeferredCollection {
        /// Full relation URI.
        relation: String,
        /// Link title.
        title: Option<String>,
        /// Target URI.
        href: Option<String>,
    },
    /// A to-many navigation with its target feed inlined.
    ExpandedCollection {
        /// Full relation URI.
        relation: String,
        /// Link title.
        title: Option<String>,
        /// Target URI.
        href: Option<String>,
        /// The inlined target entities, possibly empty.
        entities: Vec<Entity>,
    },
    /// A to-one navigation with no inlined content.
    DeferredSingle {
        /// Full relation URI.
        relation: String,
        /// Link title.
        title: Option<String>,
        /// Target URI.
        href: Option<String>,
    },
    /// A to-one navigation with its target inlined. `entity` is `None` for
    /// an inlined-but-null target.
    ExpandedSingle {
        /// Full relation URI.
        relation: String,
        /// Link title.
        title: Option<String>,
        /// Target URI.
        href: Option<String>,
        /// The inlined target entity, when present.
        entity: Option<Box<Entity>>,
    },
    /// A named binary stream associated with the entity.
    NamedStream {
        /// Full relation URI.
        relation: String,
        /// Link title.
        title: Option<String>,
        /// Stream URI.
        href: Option<String>,
        /// Advisory media type.
        content_type: Option<String>,
    },
}

impl Link {
    /// The link's full relation URI.
    pub fn relation(&self) -> &str {
        match self {
            Link::DeferredCollection { relation, .. }
            | Link::ExpandedCollection { relation, .. }
            | Link::DeferredSingle { relation, .. }
            | Link::ExpandedSingle { relation, .. }
            | Link::NamedStream { relation, .. } => relation,
        }
    }

    /// The link title, usually the navigation-property name.
    pub fn title(&self) -> Option<&str> {
        match self {
            Link::DeferredCollection { title, .. }
            | Link::ExpandedCollection { title, .. }
            | Link::DeferredSingle { title, .. }
            | Link::ExpandedSingle { title, .. }
            | Link::NamedStream { title, .. } => title.as_deref(),
        }
    }

    /// Whether the link carries inlined content.
    pub fn is_expanded(&self) -> bool {
        matches!(
            self,
            Link::ExpandedCollection { .. } | Link::ExpandedSingle { .. }
        )
    }
}
