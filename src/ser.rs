//! Serialization: walking a [`StanzaObject`] and its schema back out into a
//! [`minidom::Element`] tree.
//!
//! This is the mirror image of [`crate::parser`]: rather than driving a
//! schema against incoming events, [`serialize_object`] drives it against an
//! already-populated [`crate::instance::StanzaData`], emitting attributes,
//! text and children in the order the schema itself doesn't care about (XML
//! attribute order is never significant; element order follows whatever
//! order the descriptors were declared, which is the order `distinct_children`
//! returns them in since schema construction is insertion-ordered per tag).

use minidom::Element;

use crate::instance::{DynStanzaObject, HasStanzaData, StanzaObject};
use crate::schema::ChildEntry;

/// Render one stanza instance, including all of its nested children, into a
/// standalone [`Element`]. Recurses through `Child`/`ChildList`/`ChildMap`
/// descriptors via their own `serialize`, which calls back into this
/// function for each nested object.
pub fn serialize_object(obj: &DynStanzaObject) -> Element {
    let schema = obj.schema_dyn();
    let data = obj.stanza_data();
    let tag = obj.tag();

    let mut builder = Element::builder(tag.local_name(), tag.namespace().unwrap_or_default());

    for attr in schema.attrs() {
        if let Some(value) = attr.serialize(data) {
            builder = builder.attr(attr.attr_tag().local_name(), value);
        }
    }

    if let Some(text) = schema.text() {
        if let Some(value) = text.serialize(data) {
            builder = builder.append(value);
        }
    }

    for entry in schema.distinct_children() {
        let children: Vec<Element> = match entry {
            ChildEntry::Dispatched(dispatched) => dispatched.serialize(data),
            ChildEntry::Text(child_text) => child_text.serialize(data).into_iter().collect(),
            ChildEntry::Tag(child_tag) => child_tag.serialize(data).into_iter().collect(),
        };
        for child in children {
            builder = builder.append(child);
        }
    }

    if let Some(collector) = schema.collector() {
        for element in collector.serialize(data) {
            builder = builder.append(element);
        }
    }

    builder.build()
}

/// Render a stanza instance to its XML text form. Convenience wrapper
/// around [`serialize_object`] for callers that just want the bytes.
pub fn to_xml_string(obj: &DynStanzaObject) -> String {
    String::from(&serialize_object(obj))
}
