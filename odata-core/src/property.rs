//! The recursive property-value tree.

use odata_edm::{EdmSimpleType, EdmType, SimpleValue};

/// A named, typed property of an entity or complex value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// The resolved type the value was decoded against.
    pub ty: EdmType,
    /// The decoded value.
    pub value: Value,
}

/// A decoded property value. Exactly one shape holds; a null is its own
/// shape, not a nullable field on the others.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An explicit null.
    Null,
    /// A primitive value.
    Simple(SimpleValue),
    /// A complex value: an ordered run of named properties.
    Complex(Vec<Property>),
    /// An ordered collection of values.
    Collection(Vec<Value>),
}

impl Property {
    /// A primitive-valued property.
    pub fn simple(name: impl Into<String>, value: SimpleValue) -> Self {
        Self {
            name: name.into(),
            ty: EdmType::Simple(value.simple_type()),
            value: Value::Simple(value),
        }
    }

    /// A string-valued property.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::simple(name, SimpleValue::String(value.into()))
    }

    /// A null-valued property of the given type.
    pub fn null(name: impl Into<String>, ty: EdmType) -> Self {
        Self {
            name: name.into(),
            ty,
            value: Value::Null,
        }
    }

    /// The primitive value, when this property holds one.
    pub fn as_simple(&self) -> Option<&SimpleValue> {
        match &self.value {
            Value::Simple(v) => Some(v),
            _ => None,
        }
    }
}

impl Value {
    /// The primitive type of a simple value, `Edm.String` otherwise unknown.
    pub fn simple_type(&self) -> Option<EdmSimpleType> {
        match self {
            Value::Simple(v) => Some(v.simple_type()),
            _ => None,
        }
    }
}

/// Find a property by name in a decoded run.
pub fn find_property<'p>(properties: &'p [Property], name: &str) -> Option<&'p Property> {
    properties.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_property_carries_its_type() {
        let p = Property::simple("Rating", SimpleValue::Int32(4));
        assert_eq!(p.ty, EdmType::Simple(EdmSimpleType::Int32));
        assert_eq!(p.as_simple(), Some(&SimpleValue::Int32(4)));
    }

    #[test]
    fn find_property_by_name() {
        let props = vec![Property::string("A", "1"), Property::string("B", "2")];
        assert!(find_property(&props, "B").is_some());
        assert!(find_property(&props, "C").is_none());
    }
}
