//! Feed, entry, link, and property decoding against a fixture schema.

mod common;

use indoc::indoc;
use odata_atom::{AtomError, AtomFeedParser, EntryResult, FeedCustomization};
use odata_core::{Entity, EntityKey, Link, Value};
use odata_edm::{FunctionKind, SimpleValue};

use common::schema;

// ============================================================================
// Feeds
// ============================================================================

#[test]
fn empty_feed_yields_no_entries_and_no_cursor() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"></feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();

    assert!(feed.entries.is_empty());
    assert!(feed.next.is_none());
}

#[test]
fn feed_with_only_a_next_link_is_not_the_empty_feed() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom">
            <link rel="next" href="http://host/svc.svc/Products?page=2"/>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();

    assert!(feed.entries.is_empty());
    assert_eq!(
        feed.next.as_deref(),
        Some("http://host/svc.svc/Products?page=2")
    );
}

#[test]
fn entries_after_an_inline_feed_still_belong_to_the_outer_feed() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Customers('ALFKI')</id>
                <link rel="http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders"
                      type="application/atom+xml;type=feed" title="Orders"
                      href="Customers('ALFKI')/Orders">
                    <m:inline>
                        <feed>
                            <entry>
                                <id>http://host/svc.svc/Orders(10643)</id>
                                <content type="application/xml">
                                    <m:properties>
                                        <d:OrderID m:type="Edm.Int32">10643</d:OrderID>
                                    </m:properties>
                                </content>
                            </entry>
                        </feed>
                    </m:inline>
                </link>
                <content type="application/xml">
                    <m:properties><d:CustomerID>ALFKI</d:CustomerID></m:properties>
                </content>
            </entry>
            <entry>
                <id>http://host/svc.svc/Customers('ANATR')</id>
                <content type="application/xml">
                    <m:properties><d:CustomerID>ANATR</d:CustomerID></m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Customers").parse(xml).unwrap();

    assert_eq!(feed.entries.len(), 2);
    let first = feed.entries[0].entity().unwrap();
    let [link] = first.links() else {
        panic!("expected exactly one link");
    };
    let Link::ExpandedCollection { entities, .. } = link else {
        panic!("expected an expanded collection, got {link:?}");
    };
    assert_eq!(entities.len(), 1);
    // the inline entry materialized against the navigation's target set
    assert_eq!(entities[0].entity_set().name, "Orders");
    assert_eq!(
        entities[0].key(),
        Some(&EntityKey::Single(SimpleValue::Int32(10643)))
    );
}

// ============================================================================
// Entries and properties
// ============================================================================

const PRODUCT_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
      xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
    <entry m:etag="W/&quot;1&quot;">
        <id>http://host/svc.svc/Products(1)</id>
        <title type="text">Chai</title>
        <updated>2008-09-18T23:46:19Z</updated>
        <category term="NW.Product"
                  scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme"/>
        <content type="application/xml">
            <m:properties>
                <d:ID m:type="Edm.Int32">1</d:ID>
                <d:Name>Chai</d:Name>
                <d:Price m:type="Edm.Decimal">18.5</d:Price>
                <d:Tags m:type="Collection(Edm.String)">
                    <d:element>beverage</d:element>
                    <d:element>hot</d:element>
                </d:Tags>
            </m:properties>
        </content>
    </entry>
</feed>"#;

#[test]
fn data_entry_materializes_key_type_and_properties() {
    let schema = schema();
    let feed = AtomFeedParser::new(&schema, "Products")
        .parse(PRODUCT_FEED)
        .unwrap();

    let entity = feed.entries[0].entity().unwrap();
    let keyed = entity.as_keyed().unwrap();

    assert_eq!(keyed.key, EntityKey::Single(SimpleValue::Int32(1)));
    assert_eq!(keyed.entity_type.full_name(), "NW.Product");
    assert_eq!(keyed.etag.as_deref(), Some(r#"W/"1""#));
    assert_eq!(
        entity.property("ID").unwrap().as_simple(),
        Some(&SimpleValue::Int32(1))
    );
    assert_eq!(
        entity.property("Name").unwrap().as_simple(),
        Some(&SimpleValue::String("Chai".to_string()))
    );
    assert_eq!(entity.property("Price").unwrap().as_simple().unwrap().text(), "18.5");

    let Value::Collection(tags) = &entity.property("Tags").unwrap().value else {
        panic!("expected a collection value");
    };
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0], Value::Simple(SimpleValue::String("beverage".to_string())));
}

#[test]
fn complex_property_decodes_as_a_nested_scope() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Customers('ALFKI')</id>
                <content type="application/xml">
                    <m:properties>
                        <d:CustomerID>ALFKI</d:CustomerID>
                        <d:Address m:type="NW.Address">
                            <d:Street>Obere Str. 57</d:Street>
                            <d:City>Berlin</d:City>
                        </d:Address>
                    </m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Customers").parse(xml).unwrap();
    let entity = feed.entries[0].entity().unwrap();

    let Value::Complex(address) = &entity.property("Address").unwrap().value else {
        panic!("expected a complex value");
    };
    assert_eq!(address.len(), 2);
    assert_eq!(address[1].name, "City");
    assert_eq!(
        address[1].as_simple(),
        Some(&SimpleValue::String("Berlin".to_string()))
    );
}

#[test]
fn null_marker_decodes_to_the_null_shape() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Products(2)</id>
                <content type="application/xml">
                    <m:properties>
                        <d:ID m:type="Edm.Int32">2</d:ID>
                        <d:Price m:type="Edm.Decimal" m:null="true"/>
                    </m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();
    let entity = feed.entries[0].entity().unwrap();

    assert_eq!(entity.property("Price").unwrap().value, Value::Null);
}

#[test]
fn unresolvable_type_attribute_is_fatal() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Products(1)</id>
                <content type="application/xml">
                    <m:properties>
                        <d:Name m:type="NW.Bogus">x</d:Name>
                    </m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let err = AtomFeedParser::new(&schema, "Products")
        .parse(xml)
        .unwrap_err();
    assert!(matches!(err, AtomError::UnknownType { name } if name == "NW.Bogus"));
}

#[test]
fn undeclared_untyped_property_falls_back_to_string() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Products(1)</id>
                <content type="application/xml">
                    <m:properties>
                        <d:ID m:type="Edm.Int32">1</d:ID>
                        <d:Grown>locally</d:Grown>
                    </m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();
    let entity = feed.entries[0].entity().unwrap();

    assert_eq!(
        entity.property("Grown").unwrap().as_simple(),
        Some(&SimpleValue::String("locally".to_string()))
    );
}

#[test]
fn duplicate_property_last_occurrence_wins() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Products(1)</id>
                <content type="application/xml">
                    <m:properties>
                        <d:ID m:type="Edm.Int32">1</d:ID>
                        <d:Name>first</d:Name>
                        <d:Name>second</d:Name>
                    </m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();
    let entity = feed.entries[0].entity().unwrap();

    assert_eq!(
        entity.property("Name").unwrap().as_simple(),
        Some(&SimpleValue::String("second".to_string()))
    );
    let names: Vec<_> = entity.properties().iter().filter(|p| p.name == "Name").collect();
    assert_eq!(names.len(), 1);
}

#[test]
fn category_term_switches_to_the_derived_type() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Products(9)</id>
                <category term="NW.DiscontinuedProduct"
                          scheme="http://schemas.microsoft.com/ado/2007/08/dataservices/scheme"/>
                <content type="application/xml">
                    <m:properties>
                        <d:ID m:type="Edm.Int32">9</d:ID>
                        <d:DiscontinuedDate>2003-12-13T18:30:02</d:DiscontinuedDate>
                    </m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();
    let keyed = feed.entries[0].entity().unwrap().as_keyed().unwrap();

    assert_eq!(keyed.entity_type.full_name(), "NW.DiscontinuedProduct");
    // declared only on the derived type, so it decodes as a DateTime
    // rather than through the open-type string fallback
    assert!(matches!(
        keyed.entity_type.find_property("DiscontinuedDate").map(|p| &p.ty),
        Some(ty) if ty.full_name() == "Edm.DateTime"
    ));
    assert!(matches!(
        feed.entries[0].entity().unwrap().property("DiscontinuedDate").unwrap().value,
        Value::Simple(SimpleValue::DateTime(_))
    ));
}

// ============================================================================
// Links
// ============================================================================

#[test]
fn deferred_and_inlined_empty_links_are_distinct() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Customers('A')</id>
                <link rel="http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders"
                      type="application/atom+xml;type=feed" title="Orders"
                      href="Customers('A')/Orders"/>
                <content type="application/xml">
                    <m:properties><d:CustomerID>A</d:CustomerID></m:properties>
                </content>
            </entry>
            <entry>
                <id>http://host/svc.svc/Customers('B')</id>
                <link rel="http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders"
                      type="application/atom+xml;type=feed" title="Orders"
                      href="Customers('B')/Orders">
                    <m:inline/>
                </link>
                <content type="application/xml">
                    <m:properties><d:CustomerID>B</d:CustomerID></m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Customers").parse(xml).unwrap();

    let deferred = feed.entries[0].entity().unwrap().links();
    assert!(matches!(deferred, [Link::DeferredCollection { .. }]));

    let inlined = feed.entries[1].entity().unwrap().links();
    let [Link::ExpandedCollection { entities, .. }] = inlined else {
        panic!("expected an expanded collection, got {inlined:?}");
    };
    assert!(entities.is_empty());
}

#[test]
fn inline_entry_becomes_an_expanded_single_link() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Orders(10643)</id>
                <link rel="http://schemas.microsoft.com/ado/2007/08/dataservices/related/Customer"
                      type="application/atom+xml;type=entry" title="Customer"
                      href="Orders(10643)/Customer">
                    <m:inline>
                        <entry>
                            <id>http://host/svc.svc/Customers('ALFKI')</id>
                            <content type="application/xml">
                                <m:properties><d:CustomerID>ALFKI</d:CustomerID></m:properties>
                            </content>
                        </entry>
                    </m:inline>
                </link>
                <content type="application/xml">
                    <m:properties><d:OrderID m:type="Edm.Int32">10643</d:OrderID></m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Orders").parse(xml).unwrap();
    let links = feed.entries[0].entity().unwrap().links();

    let [Link::ExpandedSingle { entity: Some(customer), .. }] = links else {
        panic!("expected an expanded single link, got {links:?}");
    };
    assert_eq!(customer.entity_set().name, "Customers");
    assert_eq!(
        customer.key(),
        Some(&EntityKey::Single(SimpleValue::String("ALFKI".to_string())))
    );
}

// ============================================================================
// Content-only and media-link entries
// ============================================================================

#[test]
fn entry_without_properties_is_content_only() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom">
            <entry>
                <id>http://host/svc.svc/Pages(1)</id>
                <content type="application/xhtml+xml"><div>hello</div></content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();

    let EntryResult::Content(entry) = &feed.entries[0] else {
        panic!("expected a content-only entry");
    };
    assert_eq!(entry.content, "<div>hello</div>");
    assert!(feed.entries[0].entity().is_none());
}

#[test]
fn media_source_records_a_stream_descriptor() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Photos(3)</id>
                <content type="image/jpeg" src="Photos(3)/$value"/>
                <m:properties>
                    <d:PhotoID m:type="Edm.Int32">3</d:PhotoID>
                    <d:Name>sunset</d:Name>
                </m:properties>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Photos").parse(xml).unwrap();
    let keyed = feed.entries[0].entity().unwrap().as_keyed().unwrap();

    let stream = keyed.media_stream.as_ref().unwrap();
    assert_eq!(stream.media_source, "Photos(3)/$value");
    assert_eq!(stream.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(
        keyed.key,
        EntityKey::Single(SimpleValue::Int32(3))
    );
}

// ============================================================================
// Operations
// ============================================================================

#[test]
fn advertised_action_resolves_into_the_bindable_extension() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Products(1)</id>
                <m:action rel="NW.Discount" title="Discount"
                          target="http://host/svc.svc/Products(1)/Discount"/>
                <content type="application/xml">
                    <m:properties><d:ID m:type="Edm.Int32">1</d:ID></m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();
    let keyed = feed.entries[0].entity().unwrap().as_keyed().unwrap();

    let bindable = keyed.bindable.as_ref().unwrap();
    let discount = bindable.actions.get("NW.Discount").unwrap();
    assert_eq!(discount.kind, FunctionKind::Action);
    assert!(bindable.functions.is_empty());
}

#[test]
fn entry_without_advertisements_has_no_bindable_extension() {
    let schema = schema();
    let feed = AtomFeedParser::new(&schema, "Products")
        .parse(PRODUCT_FEED)
        .unwrap();
    let keyed = feed.entries[0].entity().unwrap().as_keyed().unwrap();

    assert!(keyed.bindable.is_none());
}

// ============================================================================
// Key resolution and entity shapes
// ============================================================================

#[test]
fn caller_supplied_key_applies_when_the_id_is_not_key_shaped() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <content type="application/xml">
                    <m:properties><d:Name>Chai</d:Name></m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products")
        .with_entity_key(EntityKey::Single(SimpleValue::Int32(77)))
        .parse(xml)
        .unwrap();
    let entity = feed.entries[0].entity().unwrap();

    assert_eq!(entity.key(), Some(&EntityKey::Single(SimpleValue::Int32(77))));
}

#[test]
fn key_infers_from_key_properties_when_nothing_else_supplies_one() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <content type="application/xml">
                    <m:properties>
                        <d:ID m:type="Edm.Int32">5</d:ID>
                        <d:Name>Chang</d:Name>
                    </m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();
    let entity = feed.entries[0].entity().unwrap();

    assert_eq!(entity.key(), Some(&EntityKey::Single(SimpleValue::Int32(5))));
}

#[test]
fn key_less_entry_materializes_as_a_create_request() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <content type="application/xml">
                    <m:properties><d:Name>Chai</d:Name></m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Products").parse(xml).unwrap();
    let entity = feed.entries[0].entity().unwrap();

    assert!(matches!(entity, Entity::Request(_)));
    assert!(entity.key().is_none());
}

// ============================================================================
// Customization, context resolution, and failure modes
// ============================================================================

#[test]
fn feed_customization_appends_mapped_properties() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Customers('ALFKI')</id>
                <title type="text">Maria Anders</title>
                <content type="application/xml">
                    <m:properties><d:CustomerID>ALFKI</d:CustomerID></m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "Customers")
        .with_customization(FeedCustomization {
            title_property: Some("ContactName".to_string()),
            summary_property: None,
        })
        .parse(xml)
        .unwrap();
    let entity = feed.entries[0].entity().unwrap();

    assert_eq!(
        entity.property("ContactName").unwrap().as_simple(),
        Some(&SimpleValue::String("Maria Anders".to_string()))
    );
}

#[test]
fn unknown_entity_set_cannot_be_derived() {
    let schema = schema();
    let err = AtomFeedParser::new(&schema, "Nowhere")
        .parse("<feed xmlns=\"http://www.w3.org/2005/Atom\"></feed>")
        .unwrap_err();
    assert!(matches!(err, AtomError::UnresolvableEntitySet { name } if name == "Nowhere"));
}

#[test]
fn function_result_set_is_the_fallback_context() {
    let schema = schema();
    let customer = schema.find_entity_type("NW.Customer").unwrap().clone();
    let top_orders = schema
        .find_function_import("TopOrders", Some(&customer), FunctionKind::Function)
        .unwrap()
        .clone();

    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Orders(10643)</id>
                <content type="application/xml">
                    <m:properties><d:OrderID m:type="Edm.Int32">10643</d:OrderID></m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let feed = AtomFeedParser::new(&schema, "TopOrders")
        .with_function(top_orders)
        .parse(xml)
        .unwrap();

    assert_eq!(feed.entries[0].entity().unwrap().entity_set().name, "Orders");
}

#[test]
fn exhaustion_before_the_feed_close_is_malformed() {
    let schema = schema();
    // a well-formed document whose root is an entry, handed to the feed
    // parser: the entry is consumed, then the source ends with no </feed>
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <entry xmlns="http://www.w3.org/2005/Atom">
            <id>http://host/svc.svc/Products(1)</id>
        </entry>
    "#};

    let err = AtomFeedParser::new(&schema, "Products")
        .parse(xml)
        .unwrap_err();
    assert!(matches!(err, AtomError::MalformedDocument { .. }));
}

#[test]
fn nesting_beyond_the_ceiling_is_rejected() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom"
              xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
              xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <entry>
                <id>http://host/svc.svc/Customers('A')</id>
                <link rel="http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders"
                      type="application/atom+xml;type=feed" title="Orders"
                      href="Customers('A')/Orders">
                    <m:inline>
                        <feed></feed>
                    </m:inline>
                </link>
                <content type="application/xml">
                    <m:properties><d:CustomerID>A</d:CustomerID></m:properties>
                </content>
            </entry>
        </feed>
    "#};

    let err = AtomFeedParser::new(&schema, "Customers")
        .with_max_depth(3)
        .parse(xml)
        .unwrap_err();
    assert!(matches!(err, AtomError::DepthLimitExceeded { limit: 3 }));

    // the same document fits under the default ceiling
    assert!(AtomFeedParser::new(&schema, "Customers").parse(xml).is_ok());
}

#[test]
fn single_entry_documents_parse_without_a_feed_wrapper() {
    let schema = schema();
    let xml = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <entry xmlns="http://www.w3.org/2005/Atom"
               xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
               xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
            <id>http://host/svc.svc/Products(1)</id>
            <content type="application/xml">
                <m:properties><d:ID m:type="Edm.Int32">1</d:ID></m:properties>
            </content>
        </entry>
    "#};

    let entry = AtomFeedParser::new(&schema, "Products")
        .parse_entry_document(xml)
        .unwrap();

    assert_eq!(
        entry.entity().unwrap().key(),
        Some(&EntityKey::Single(SimpleValue::Int32(1)))
    );
}
