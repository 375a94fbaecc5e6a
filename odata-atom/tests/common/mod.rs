//! A small commerce schema shared by the integration tests.

use odata_edm::{
    EdmComplexType, EdmDataServices, EdmEntityType, EdmFunctionImport, EdmProperty,
    EdmSimpleType, EdmType, FunctionKind,
};

fn simple(ty: EdmSimpleType) -> EdmType {
    EdmType::Simple(ty)
}

/// Customers with orders, products with a derived discontinued variant,
/// photos as media-link entities, and a couple of bound operations.
pub fn schema() -> EdmDataServices {
    let address = EdmComplexType::new(
        "NW",
        "Address",
        vec![
            EdmProperty::new("Street", simple(EdmSimpleType::String), true),
            EdmProperty::new("City", simple(EdmSimpleType::String), true),
        ],
    );

    let order = EdmEntityType::builder("NW", "Order")
        .key(["OrderID"])
        .property("OrderID", simple(EdmSimpleType::Int32), false)
        .property("Total", simple(EdmSimpleType::Decimal), true)
        .property("ShippedDate", simple(EdmSimpleType::DateTime), true)
        .navigation("Customer", "NW.Customer", false)
        .build();

    let customer = EdmEntityType::builder("NW", "Customer")
        .key(["CustomerID"])
        .property("CustomerID", simple(EdmSimpleType::String), false)
        .property("ContactName", simple(EdmSimpleType::String), true)
        .property("Address", EdmType::Complex(address.clone()), true)
        .navigation("Orders", "NW.Order", true)
        .build();

    let product = EdmEntityType::builder("NW", "Product")
        .key(["ID"])
        .property("ID", simple(EdmSimpleType::Int32), false)
        .property("Name", simple(EdmSimpleType::String), true)
        .property("Price", simple(EdmSimpleType::Decimal), true)
        .property(
            "Tags",
            EdmType::Collection(Box::new(simple(EdmSimpleType::String))),
            true,
        )
        .build();

    let discontinued = EdmEntityType::builder("NW", "DiscontinuedProduct")
        .base(&product)
        .property("DiscontinuedDate", simple(EdmSimpleType::DateTime), true)
        .build();

    let photo = EdmEntityType::builder("NW", "Photo")
        .key(["PhotoID"])
        .property("PhotoID", simple(EdmSimpleType::Int32), false)
        .property("Name", simple(EdmSimpleType::String), true)
        .build();

    let discount = EdmFunctionImport::new(
        "Discount",
        FunctionKind::Action,
        Some("NW.Product"),
        Some("Products"),
    );
    let top_orders = EdmFunctionImport::new(
        "TopOrders",
        FunctionKind::Function,
        Some("NW.Customer"),
        Some("Orders"),
    );

    EdmDataServices::builder()
        .complex_type(&address)
        .entity_type(&customer)
        .entity_type(&order)
        .entity_type(&product)
        .entity_type(&discontinued)
        .entity_type(&photo)
        .entity_set("Customers", &customer)
        .entity_set("Orders", &order)
        .entity_set("Products", &product)
        .entity_set("Photos", &photo)
        .function_import(&discount)
        .function_import(&top_orders)
        .build()
}
