//! Decoding a scoped run of typed property elements.
//!
//! A properties scope is everything between a container's start and its own
//! closing tag: the `m:properties` section of an entry, the body of a
//! complex-typed property, or the body of a collection item. Scopes nest by
//! ordinary recursion; each recursive call consumes exactly its own scope.

use odata_core::{Property, Value};
use odata_edm::{EdmDataServices, EdmSimpleType, EdmStructuralType, EdmType, SimpleValue};

use crate::error::AtomError;
use crate::ns;
use crate::reader::{StartEl, XmlEvent, XmlEvents};

/// Decode property elements up to the container's closing tag.
///
/// Name resolution per element: an explicit `m:type` attribute wins (fatal
/// [`AtomError::UnknownType`] when it does not resolve), then the structural
/// type's declared property, then the open-type fallback to `Edm.String`.
/// A later duplicate of a name overrides the earlier value in the scope.
pub(crate) fn parse_properties(
    events: &mut XmlEvents<'_>,
    container: &StartEl,
    schema: &EdmDataServices,
    structural: &EdmStructuralType,
    depth: usize,
    max_depth: usize,
) -> Result<Vec<Property>, AtomError> {
    check_depth(depth, max_depth)?;
    let mut properties: Vec<Property> = Vec::new();

    loop {
        let event = events.next()?.ok_or(AtomError::MalformedDocument {
            expected: "closing tag of the properties container",
        })?;
        match event {
            XmlEvent::End(name) if name == container.name => return Ok(properties),
            XmlEvent::Start(start)
                if start.name.namespace.as_deref() == Some(ns::DATASERVICES) =>
            {
                let property = parse_property(events, &start, schema, structural, depth, max_depth)?;
                upsert(&mut properties, property);
            }
            _ => {}
        }
    }
}

fn parse_property(
    events: &mut XmlEvents<'_>,
    start: &StartEl,
    schema: &EdmDataServices,
    structural: &EdmStructuralType,
    depth: usize,
    max_depth: usize,
) -> Result<Property, AtomError> {
    let name = start.name.local.clone();
    let ty = resolve_property_type(start, schema, structural, &name)?;
    let is_null = start.attr_in(ns::METADATA, "null") == Some("true");
    let value = decode_value(events, start, schema, &ty, is_null, depth, max_depth)?;
    Ok(Property { name, ty, value })
}

fn resolve_property_type(
    start: &StartEl,
    schema: &EdmDataServices,
    structural: &EdmStructuralType,
    name: &str,
) -> Result<EdmType, AtomError> {
    if let Some(type_name) = start.attr_in(ns::METADATA, "type") {
        return schema
            .resolve_type(type_name)
            .ok_or_else(|| AtomError::UnknownType {
                name: type_name.to_string(),
            });
    }
    match structural.find_property(name) {
        Some(declared) => Ok(declared.ty.clone()),
        // undeclared and untyped: open-type support
        None => Ok(EdmType::Simple(EdmSimpleType::String)),
    }
}

fn decode_value(
    events: &mut XmlEvents<'_>,
    start: &StartEl,
    schema: &EdmDataServices,
    ty: &EdmType,
    is_null: bool,
    depth: usize,
    max_depth: usize,
) -> Result<Value, AtomError> {
    if is_null {
        events.skip_element(start)?;
        return Ok(Value::Null);
    }
    match ty {
        EdmType::Collection(item) => Ok(Value::Collection(parse_collection(
            events,
            start,
            schema,
            item,
            depth + 1,
            max_depth,
        )?)),
        EdmType::Complex(complex) => {
            let scope = EdmStructuralType::Complex(complex.clone());
            parse_properties(events, start, schema, &scope, depth + 1, max_depth)
                .map(Value::Complex)
        }
        EdmType::Entity(entity) => {
            let scope = EdmStructuralType::Entity(entity.clone());
            parse_properties(events, start, schema, &scope, depth + 1, max_depth)
                .map(Value::Complex)
        }
        EdmType::Simple(simple) => {
            let text = events.element_text(start)?;
            Ok(Value::Simple(SimpleValue::parse_text(*simple, &text)?))
        }
    }
}

/// Decode collection items up to the collection element's closing tag. Each
/// item is decoded with the collection's item type unless it carries its own
/// `m:type` attribute.
fn parse_collection(
    events: &mut XmlEvents<'_>,
    container: &StartEl,
    schema: &EdmDataServices,
    item_ty: &EdmType,
    depth: usize,
    max_depth: usize,
) -> Result<Vec<Value>, AtomError> {
    check_depth(depth, max_depth)?;
    let mut items = Vec::new();

    loop {
        let event = events.next()?.ok_or(AtomError::MalformedDocument {
            expected: "closing tag of the collection element",
        })?;
        match event {
            XmlEvent::End(name) if name == container.name => return Ok(items),
            XmlEvent::Start(start)
                if start.name.namespace.as_deref() == Some(ns::DATASERVICES) =>
            {
                let ty = match start.attr_in(ns::METADATA, "type") {
                    Some(type_name) => {
                        schema
                            .resolve_type(type_name)
                            .ok_or_else(|| AtomError::UnknownType {
                                name: type_name.to_string(),
                            })?
                    }
                    None => item_ty.clone(),
                };
                let is_null = start.attr_in(ns::METADATA, "null") == Some("true");
                items.push(decode_value(
                    events, &start, schema, &ty, is_null, depth, max_depth,
                )?);
            }
            _ => {}
        }
    }
}

fn upsert(properties: &mut Vec<Property>, property: Property) {
    match properties.iter_mut().find(|p| p.name == property.name) {
        Some(existing) => *existing = property,
        None => properties.push(property),
    }
}

pub(crate) fn check_depth(depth: usize, max_depth: usize) -> Result<(), AtomError> {
    if depth > max_depth {
        return Err(AtomError::DepthLimitExceeded { limit: max_depth });
    }
    Ok(())
}
