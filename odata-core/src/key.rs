//! Structured entity keys and the key-clause grammar.

use core::fmt;

use odata_edm::{LiteralError, SimpleValue};

/// A structured entity key: either a single bare literal or a list of
/// `name=literal` components.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKey {
    /// `(7)`: a single unnamed key value.
    Single(SimpleValue),
    /// `(attribute='X',id=19)`: named components, in document order.
    Named(Vec<(String, SimpleValue)>),
}

/// A key clause failed to parse.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyParseError {
    /// The clause had no content.
    Empty,
    /// The clause mixed named and unnamed components, or was otherwise not
    /// shaped like a key.
    Malformed {
        /// The offending clause.
        text: String,
    },
    /// A component value failed the literal grammar.
    Literal(LiteralError),
}

impl fmt::Display for KeyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty key clause"),
            Self::Malformed { text } => write!(f, "malformed key clause: {:?}", text),
            Self::Literal(e) => write!(f, "key literal: {e}"),
        }
    }
}

impl std::error::Error for KeyParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Literal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LiteralError> for KeyParseError {
    fn from(e: LiteralError) -> Self {
        Self::Literal(e)
    }
}

impl EntityKey {
    /// A single-valued key.
    pub fn single(value: SimpleValue) -> Self {
        Self::Single(value)
    }

    /// A named-component key.
    pub fn named<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = (S, SimpleValue)>,
        S: Into<String>,
    {
        Self::Named(
            components
                .into_iter()
                .map(|(n, v)| (n.into(), v))
                .collect(),
        )
    }

    /// Parse a key clause, with or without its surrounding parentheses:
    /// `(7)`, `7`, `('a')`, or `(name='a',other=2)`.
    ///
    /// Commas and `=` inside quoted literals are content, so values such as
    /// `'X (EASTING)'` survive intact.
    pub fn parse(clause: &str) -> Result<Self, KeyParseError> {
        let trimmed = clause.trim();
        let inner = match trimmed.strip_prefix('(') {
            Some(rest) => rest.strip_suffix(')').ok_or_else(|| KeyParseError::Malformed {
                text: clause.to_string(),
            })?,
            None => trimmed,
        };
        if inner.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let parts = split_components(inner);
        let named: Vec<_> = parts
            .iter()
            .map(|part| split_name_value(part))
            .collect();

        if parts.len() == 1 && named[0].is_none() {
            return Ok(Self::Single(SimpleValue::parse_key_literal(
                parts[0].trim(),
            )?));
        }
        if named.iter().any(Option::is_none) {
            return Err(KeyParseError::Malformed {
                text: clause.to_string(),
            });
        }

        let mut components = Vec::with_capacity(parts.len());
        for (name, value) in named.into_iter().flatten() {
            components.push((
                name.trim().to_string(),
                SimpleValue::parse_key_literal(value.trim())?,
            ));
        }
        Ok(Self::Named(components))
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(v) => write!(f, "({})", v.to_literal()),
            Self::Named(components) => {
                f.write_str("(")?;
                for (i, (name, value)) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{name}={}", value.to_literal())?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Split on top-level commas; commas inside quoted literals stay put.
fn split_components(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in inner.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts
}

/// Split `name=value` at the first top-level `=`.
fn split_name_value(part: &str) -> Option<(&str, &str)> {
    let mut in_quotes = false;
    for (i, c) in part.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '=' if !in_quotes => return Some((&part[..i], &part[i + 1..])),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_int_key() {
        assert_eq!(
            EntityKey::parse("(7)").unwrap(),
            EntityKey::Single(SimpleValue::Int32(7))
        );
    }

    #[test]
    fn named_components_preserve_quoted_parens_and_commas() {
        let key = EntityKey::parse("(attribute='X (EASTING)',point_set_id=19)").unwrap();
        assert_eq!(
            key,
            EntityKey::named([
                ("attribute", SimpleValue::String("X (EASTING)".to_string())),
                ("point_set_id", SimpleValue::Int32(19)),
            ])
        );
    }

    #[test]
    fn comma_inside_quotes_is_content() {
        let key = EntityKey::parse("(name='a,b',id=1)").unwrap();
        let EntityKey::Named(components) = key else {
            panic!("expected named key");
        };
        assert_eq!(components[0].1, SimpleValue::String("a,b".to_string()));
    }

    #[test]
    fn mixing_named_and_bare_is_malformed() {
        assert!(matches!(
            EntityKey::parse("(1,b=2)"),
            Err(KeyParseError::Malformed { .. })
        ));
    }

    #[test]
    fn empty_clause_is_rejected() {
        assert_eq!(EntityKey::parse("()"), Err(KeyParseError::Empty));
    }

    #[test]
    fn display_round_trips() {
        for clause in ["(7)", "('a''b')", "(attribute='X (EASTING)',point_set_id=19)"] {
            let key = EntityKey::parse(clause).unwrap();
            assert_eq!(key.to_string(), clause);
            assert_eq!(EntityKey::parse(&key.to_string()).unwrap(), key);
        }
    }
}
