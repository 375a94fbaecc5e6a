//! The wire vocabulary: namespaces, relation prefixes, and content types.

/// The Atom namespace (RFC 4287).
pub const ATOM: &str = "http://www.w3.org/2005/Atom";

/// The dataservices namespace qualifying property elements (`d:` by
/// convention).
pub const DATASERVICES: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";

/// The metadata namespace qualifying protocol attributes and elements
/// (`m:` by convention).
pub const METADATA: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

/// The category scheme identifying entity-type categories.
pub const SCHEME: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/scheme";

/// Relation prefix of navigation-property links.
pub const RELATED: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/related/";

/// Relation prefix of edit-media stream links.
pub const EDIT_MEDIA: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/edit-media/";

/// Relation prefix of named media-resource links.
pub const MEDIA_RESOURCE: &str =
    "http://schemas.microsoft.com/ado/2007/08/dataservices/mediaresource/";

/// Link type of a to-many navigation.
pub const ATOM_FEED_CONTENT_TYPE: &str = "application/atom+xml;type=feed";

/// Link type of a to-one navigation.
pub const ATOM_ENTRY_CONTENT_TYPE: &str = "application/atom+xml;type=entry";

/// Content type of a structured-XML entry body.
pub const APPLICATION_XML: &str = "application/xml";
