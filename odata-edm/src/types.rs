//! Structural EDM types: properties, complex types, entity types.
//!
//! Schema graphs are immutable once built and shared via [`Arc`], so handing
//! a type to a parser or materializer is a cheap clone.

use std::sync::Arc;

use crate::simple::EdmSimpleType;

/// A resolved EDM type reference.
#[derive(Debug, Clone)]
pub enum EdmType {
    /// A primitive type.
    Simple(EdmSimpleType),
    /// A named complex type.
    Complex(Arc<EdmComplexType>),
    /// A named entity type.
    Entity(Arc<EdmEntityType>),
    /// An ordered collection of the item type.
    Collection(Box<EdmType>),
}

impl EdmType {
    /// Whether this is a primitive type.
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Simple(_))
    }

    /// The fully-qualified name, e.g. `Edm.Int32`, `NorthwindModel.Customer`
    /// or `Collection(Edm.String)`.
    pub fn full_name(&self) -> String {
        match self {
            Self::Simple(s) => s.name().to_string(),
            Self::Complex(c) => c.full_name(),
            Self::Entity(e) => e.full_name(),
            Self::Collection(item) => format!("Collection({})", item.full_name()),
        }
    }

    /// View this type as a structural (property-bearing) type, if it is one.
    pub fn as_structural(&self) -> Option<EdmStructuralType> {
        match self {
            Self::Complex(c) => Some(EdmStructuralType::Complex(c.clone())),
            Self::Entity(e) => Some(EdmStructuralType::Entity(e.clone())),
            _ => None,
        }
    }
}

impl PartialEq for EdmType {
    fn eq(&self, other: &Self) -> bool {
        self.full_name() == other.full_name()
    }
}

/// A declared structural property.
#[derive(Debug, Clone, PartialEq)]
pub struct EdmProperty {
    /// Property name.
    pub name: String,
    /// Declared type.
    pub ty: EdmType,
    /// Whether null is an allowed value.
    pub nullable: bool,
}

impl EdmProperty {
    /// Create a property declaration.
    pub fn new(name: impl Into<String>, ty: EdmType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable,
        }
    }
}

/// A named complex type: a property bag without identity.
#[derive(Debug)]
pub struct EdmComplexType {
    /// Schema namespace.
    pub namespace: String,
    /// Type name within the namespace.
    pub name: String,
    /// Declared properties.
    pub properties: Vec<EdmProperty>,
}

impl EdmComplexType {
    /// Create a complex type.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        properties: Vec<EdmProperty>,
    ) -> Arc<Self> {
        Arc::new(Self {
            namespace: namespace.into(),
            name: name.into(),
            properties,
        })
    }

    /// `namespace.name`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Look up a declared property.
    pub fn find_property(&self, name: &str) -> Option<&EdmProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A navigation property: a typed relationship to another entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EdmNavigationProperty {
    /// Navigation property name.
    pub name: String,
    /// Fully-qualified name of the target entity type.
    pub target_type: String,
    /// Whether the target side is a collection.
    pub many: bool,
}

/// A named entity type, possibly derived from a base type.
#[derive(Debug)]
pub struct EdmEntityType {
    /// Schema namespace.
    pub namespace: String,
    /// Type name within the namespace.
    pub name: String,
    /// Base type for derived types.
    pub base: Option<Arc<EdmEntityType>>,
    /// Key property names. Empty on derived types; the base chain owns them.
    pub keys: Vec<String>,
    /// Properties declared directly on this type.
    pub properties: Vec<EdmProperty>,
    /// Navigation properties declared directly on this type.
    pub navigation: Vec<EdmNavigationProperty>,
    /// Whether undeclared properties are permitted.
    pub open: bool,
}

impl EdmEntityType {
    /// Start building an entity type.
    pub fn builder(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> EdmEntityTypeBuilder {
        EdmEntityTypeBuilder {
            ty: Self {
                namespace: namespace.into(),
                name: name.into(),
                base: None,
                keys: Vec::new(),
                properties: Vec::new(),
                navigation: Vec::new(),
                open: false,
            },
        }
    }

    /// `namespace.name`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Look up a property on this type or any base type.
    pub fn find_property(&self, name: &str) -> Option<&EdmProperty> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.base.as_deref().and_then(|b| b.find_property(name)))
    }

    /// Look up a navigation property on this type or any base type.
    pub fn find_navigation_property(&self, name: &str) -> Option<&EdmNavigationProperty> {
        self.navigation
            .iter()
            .find(|n| n.name == name)
            .or_else(|| {
                self.base
                    .as_deref()
                    .and_then(|b| b.find_navigation_property(name))
            })
    }

    /// The key property names, inherited from the base chain when this type
    /// declares none.
    pub fn key_property_names(&self) -> &[String] {
        if !self.keys.is_empty() {
            return &self.keys;
        }
        match &self.base {
            Some(base) => base.key_property_names(),
            None => &self.keys,
        }
    }

    /// Whether `other` is this type or derives from it.
    pub fn is_assignable_from(&self, other: &EdmEntityType) -> bool {
        if self.full_name() == other.full_name() {
            return true;
        }
        match &other.base {
            Some(base) => self.is_assignable_from(base),
            None => false,
        }
    }
}

/// Builder for [`EdmEntityType`].
pub struct EdmEntityTypeBuilder {
    ty: EdmEntityType,
}

impl EdmEntityTypeBuilder {
    /// Derive from a base type.
    pub fn base(mut self, base: &Arc<EdmEntityType>) -> Self {
        self.ty.base = Some(base.clone());
        self
    }

    /// Declare the key property names.
    pub fn key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ty.keys = names.into_iter().map(Into::into).collect();
        self
    }

    /// Declare a property.
    pub fn property(mut self, name: impl Into<String>, ty: EdmType, nullable: bool) -> Self {
        self.ty.properties.push(EdmProperty::new(name, ty, nullable));
        self
    }

    /// Declare a navigation property.
    pub fn navigation(
        mut self,
        name: impl Into<String>,
        target_type: impl Into<String>,
        many: bool,
    ) -> Self {
        self.ty.navigation.push(EdmNavigationProperty {
            name: name.into(),
            target_type: target_type.into(),
            many,
        });
        self
    }

    /// Permit undeclared properties.
    pub fn open(mut self) -> Self {
        self.ty.open = true;
        self
    }

    /// Finish, returning a shareable handle.
    pub fn build(self) -> Arc<EdmEntityType> {
        Arc::new(self.ty)
    }
}

/// A property-bearing type: the scope the property decoder resolves names
/// against.
#[derive(Debug, Clone)]
pub enum EdmStructuralType {
    /// A complex-type scope.
    Complex(Arc<EdmComplexType>),
    /// An entity-type scope.
    Entity(Arc<EdmEntityType>),
}

impl EdmStructuralType {
    /// Look up a declared property, walking base chains for entity types.
    pub fn find_property(&self, name: &str) -> Option<&EdmProperty> {
        match self {
            Self::Complex(c) => c.find_property(name),
            Self::Entity(e) => e.find_property(name),
        }
    }

    /// The fully-qualified type name.
    pub fn full_name(&self) -> String {
        match self {
            Self::Complex(c) => c.full_name(),
            Self::Entity(e) => e.full_name(),
        }
    }
}
