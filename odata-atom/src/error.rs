//! Error types for Atom payload decoding.
//!
//! Every error is fatal to its parse call: the engine never returns a
//! partial feed or a partially materialized entity.

use core::fmt;

use odata_edm::LiteralError;

use crate::reader::XmlError;

/// Error type for Atom payload decoding.
#[derive(Debug)]
pub enum AtomError {
    /// Underlying XML reader failure.
    Xml(XmlError),

    /// Event source exhausted before a required closing tag, or the
    /// document root was not the expected element.
    MalformedDocument {
        /// What was expected.
        expected: &'static str,
    },

    /// A type attribute or category term did not resolve against the
    /// schema.
    UnknownType {
        /// The unresolvable type name.
        name: String,
    },

    /// An entity-set context was required but absent or unresolvable.
    UnresolvableEntitySet {
        /// The set name that failed to resolve.
        name: String,
    },

    /// An entry id contained no parenthesized key clause, or the clause
    /// failed the key grammar.
    MalformedKey {
        /// The offending id.
        id: String,
    },

    /// Scalar text failed its type's literal grammar.
    Literal(LiteralError),

    /// Document nesting exceeded the configured ceiling.
    DepthLimitExceeded {
        /// The configured ceiling.
        limit: usize,
    },
}

impl fmt::Display for AtomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(e) => write!(f, "xml error: {e}"),
            Self::MalformedDocument { expected } => {
                write!(f, "malformed document: expected {expected}")
            }
            Self::UnknownType { name } => write!(f, "unknown type: {name}"),
            Self::UnresolvableEntitySet { name } => {
                write!(f, "could not derive the entity set: {name}")
            }
            Self::MalformedKey { id } => {
                write!(f, "unable to parse an entity key from id: {id}")
            }
            Self::Literal(e) => write!(f, "{e}"),
            Self::DepthLimitExceeded { limit } => {
                write!(f, "document nesting exceeded {limit} levels")
            }
        }
    }
}

impl std::error::Error for AtomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Xml(e) => Some(e),
            Self::Literal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<XmlError> for AtomError {
    fn from(e: XmlError) -> Self {
        Self::Xml(e)
    }
}

impl From<LiteralError> for AtomError {
    fn from(e: LiteralError) -> Self {
        Self::Literal(e)
    }
}
