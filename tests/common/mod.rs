//! Shared test scaffolding: building literal [`Event`] streams by hand
//! (for feeding directly into a [`UnitParser`]/[`StanzaParser`] without
//! going through the `rxml` adapter) and replaying a serialized
//! [`minidom::Element`] back through the same event stream for round-trip
//! tests.

use std::collections::HashMap;

use minidom::{Element, Node};
use stanza_model::{Event, Tag};

/// Build a `Start` event from a bare tag string and `(name, value)` attrs.
pub fn start(tag: &str, attrs: &[(&str, &str)]) -> Event {
    let mut map = HashMap::new();
    for (name, value) in attrs {
        map.insert(Tag::normalize(*name).unwrap(), value.to_string());
    }
    Event::start(Tag::normalize(tag).unwrap(), map)
}

pub fn text(s: &str) -> Event {
    Event::Text(s.to_string())
}

pub fn end() -> Event {
    Event::End
}

/// Installs a tracing subscriber for test output, once per process.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Flatten a [`minidom::Element`] into the literal `Start`/`Text*`/`End`
/// sequence that would have produced it, for round-tripping a serialized
/// instance back through the parser without depending on `rxml`.
pub fn element_events(el: &Element, out: &mut Vec<Event>) {
    let ns = el.ns();
    let tag = if ns.is_empty() {
        Tag::normalize(el.name()).unwrap()
    } else {
        Tag::normalize((Some(ns.as_str()), el.name())).unwrap()
    };
    let mut attrs = HashMap::new();
    for (name, value) in el.attrs() {
        attrs.insert(Tag::normalize(name).unwrap(), value.to_string());
    }
    out.push(Event::start(tag, attrs));
    for node in el.nodes() {
        match node {
            Node::Text(t) => out.push(Event::Text(t.clone())),
            Node::Element(child) => element_events(child, out),
        }
    }
    out.push(Event::End);
}
