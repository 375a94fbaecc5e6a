//! The schema container: entity sets, function imports, and name resolution.

use std::sync::Arc;

use crate::simple::EdmSimpleType;
use crate::types::{EdmComplexType, EdmEntityType, EdmType};

/// A named collection endpoint whose members share a (possibly polymorphic)
/// base type.
#[derive(Debug)]
pub struct EdmEntitySet {
    /// Set name.
    pub name: String,
    /// Declared element type.
    pub ty: Arc<EdmEntityType>,
}

impl EdmEntitySet {
    /// Create an entity set.
    pub fn new(name: impl Into<String>, ty: &Arc<EdmEntityType>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            ty: ty.clone(),
        })
    }
}

/// Whether an operation is a side-effecting action or a composable function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// A composable function.
    Function,
    /// A side-effecting action.
    Action,
}

/// A declared operation, possibly bound to an entity type.
#[derive(Debug)]
pub struct EdmFunctionImport {
    /// Operation name (unqualified).
    pub name: String,
    /// Action or function.
    pub kind: FunctionKind,
    /// Fully-qualified name of the entity type the operation binds to, when
    /// it is a bound operation.
    pub bound_type: Option<String>,
    /// Name of the entity set the operation returns into, when it returns
    /// entities.
    pub entity_set: Option<String>,
}

impl EdmFunctionImport {
    /// Create a function import.
    pub fn new(
        name: impl Into<String>,
        kind: FunctionKind,
        bound_type: Option<&str>,
        entity_set: Option<&str>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            kind,
            bound_type: bound_type.map(str::to_string),
            entity_set: entity_set.map(str::to_string),
        })
    }
}

/// A complete schema: the read-only collaborator every parse resolves types,
/// sets, and operations against.
#[derive(Debug, Default)]
pub struct EdmDataServices {
    entity_types: Vec<Arc<EdmEntityType>>,
    complex_types: Vec<Arc<EdmComplexType>>,
    entity_sets: Vec<Arc<EdmEntitySet>>,
    function_imports: Vec<Arc<EdmFunctionImport>>,
}

impl EdmDataServices {
    /// Start building a schema.
    pub fn builder() -> EdmDataServicesBuilder {
        EdmDataServicesBuilder {
            schema: Self::default(),
        }
    }

    /// Resolve a type by fully-qualified name. Handles `Edm.*` primitives,
    /// `Collection(...)`/`Bag(...)` wrappers, complex types, and entity types.
    pub fn resolve_type(&self, name: &str) -> Option<EdmType> {
        for wrapper in ["Collection(", "Bag("] {
            if let Some(item) = name
                .strip_prefix(wrapper)
                .and_then(|rest| rest.strip_suffix(')'))
            {
                return self
                    .resolve_type(item)
                    .map(|t| EdmType::Collection(Box::new(t)));
            }
        }
        if let Some(simple) = EdmSimpleType::from_name(name) {
            return Some(EdmType::Simple(simple));
        }
        if let Some(complex) = self.find_complex_type(name) {
            return Some(EdmType::Complex(complex.clone()));
        }
        self.find_entity_type(name)
            .map(|e| EdmType::Entity(e.clone()))
    }

    /// Look up an entity type by fully-qualified name.
    pub fn find_entity_type(&self, full_name: &str) -> Option<&Arc<EdmEntityType>> {
        self.entity_types
            .iter()
            .find(|t| t.full_name() == full_name)
    }

    /// Look up a complex type by fully-qualified name.
    pub fn find_complex_type(&self, full_name: &str) -> Option<&Arc<EdmComplexType>> {
        self.complex_types
            .iter()
            .find(|t| t.full_name() == full_name)
    }

    /// Look up an entity set by name.
    pub fn find_entity_set(&self, name: &str) -> Option<&Arc<EdmEntitySet>> {
        self.entity_sets.iter().find(|s| s.name == name)
    }

    /// The entity set whose element type is `ty` or an ancestor of it.
    /// Entity sets are polymorphic: a set declared over a base type contains
    /// instances of every derived type.
    pub fn entity_set_for_type(&self, ty: &EdmEntityType) -> Option<&Arc<EdmEntitySet>> {
        self.entity_sets.iter().find(|s| s.ty.is_assignable_from(ty))
    }

    /// Look up an operation by name, bound type, and kind. `name` may be
    /// fully qualified; its last dot-segment must match the import's name.
    pub fn find_function_import(
        &self,
        name: &str,
        bound_type: Option<&EdmEntityType>,
        kind: FunctionKind,
    ) -> Option<&Arc<EdmFunctionImport>> {
        let simple_name = name.rsplit('.').next().unwrap_or(name);
        self.function_imports.iter().find(|fi| {
            if fi.kind != kind || fi.name != simple_name {
                return false;
            }
            match (&fi.bound_type, bound_type) {
                (Some(declared), Some(actual)) => self
                    .find_entity_type(declared)
                    .is_some_and(|d| d.is_assignable_from(actual)),
                (Some(_), None) => false,
                (None, _) => true,
            }
        })
    }

    /// Whether the schema declares anything at all.
    pub fn is_empty(&self) -> bool {
        self.entity_sets.is_empty() && self.entity_types.is_empty()
    }
}

/// Builder for [`EdmDataServices`].
pub struct EdmDataServicesBuilder {
    schema: EdmDataServices,
}

impl EdmDataServicesBuilder {
    /// Register an entity type.
    pub fn entity_type(mut self, ty: &Arc<EdmEntityType>) -> Self {
        self.schema.entity_types.push(ty.clone());
        self
    }

    /// Register a complex type.
    pub fn complex_type(mut self, ty: &Arc<EdmComplexType>) -> Self {
        self.schema.complex_types.push(ty.clone());
        self
    }

    /// Register an entity set over a previously registered type.
    pub fn entity_set(mut self, name: impl Into<String>, ty: &Arc<EdmEntityType>) -> Self {
        self.schema.entity_sets.push(EdmEntitySet::new(name, ty));
        self
    }

    /// Register a function import.
    pub fn function_import(mut self, import: &Arc<EdmFunctionImport>) -> Self {
        self.schema.function_imports.push(import.clone());
        self
    }

    /// Finish building.
    pub fn build(self) -> EdmDataServices {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::EdmSimpleType;

    fn schema() -> EdmDataServices {
        let address = EdmComplexType::new(
            "NS",
            "Address",
            vec![crate::types::EdmProperty::new(
                "City",
                EdmType::Simple(EdmSimpleType::String),
                true,
            )],
        );
        let product = EdmEntityType::builder("NS", "Product")
            .key(["ID"])
            .property("ID", EdmType::Simple(EdmSimpleType::Int32), false)
            .build();
        let discontinued = EdmEntityType::builder("NS", "DiscontinuedProduct")
            .base(&product)
            .build();
        EdmDataServices::builder()
            .complex_type(&address)
            .entity_type(&product)
            .entity_type(&discontinued)
            .entity_set("Products", &product)
            .build()
    }

    #[test]
    fn resolves_simple_and_wrapped_types() {
        let schema = schema();
        assert_eq!(
            schema.resolve_type("Edm.Int32"),
            Some(EdmType::Simple(EdmSimpleType::Int32))
        );
        let bag = schema.resolve_type("Bag(Edm.String)").unwrap();
        assert_eq!(bag.full_name(), "Collection(Edm.String)");
        assert!(schema.resolve_type("NS.Address").is_some());
        assert!(schema.resolve_type("NS.Missing").is_none());
    }

    #[test]
    fn polymorphic_set_lookup_accepts_derived_types() {
        let schema = schema();
        let derived = schema.find_entity_type("NS.DiscontinuedProduct").unwrap().clone();
        let set = schema.entity_set_for_type(&derived).unwrap();
        assert_eq!(set.name, "Products");
    }
}
