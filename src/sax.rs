//! Adapts `rxml`'s namespace-aware pull parser into the narrow [`Event`]
//! stream [`crate::parser::UnitParser`] and [`crate::dispatcher::StanzaParser`]
//! consume.
//!
//! `rxml` already resolves namespace prefixes for us; this module's only job
//! is reshaping its event stream into our `(namespace, local) -> Tag` and
//! attribute-map shape, and turning its errors into [`ParseError`].

use std::collections::HashMap;

use crate::error::ParseError;
use crate::event::Event;
use crate::tag::Tag;

/// Incrementally feeds raw XML bytes to an `rxml` parser and translates its
/// output into [`Event`]s one at a time.
pub struct RxmlAdapter {
    parser: rxml::FeedParser<Vec<u8>>,
}

impl Default for RxmlAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RxmlAdapter {
    pub fn new() -> Self {
        Self {
            parser: rxml::FeedParser::new(),
        }
    }

    /// Feed more bytes read off the wire. Does not itself produce events;
    /// call [`Self::next_event`] in a loop afterwards to drain them.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.parser.feed(bytes.to_vec());
    }

    /// Signal that no more bytes will arrive.
    pub fn feed_eof(&mut self) {
        self.parser.feed_eof();
    }

    /// Pull the next translated event, if the buffered input is enough to
    /// produce one. Returns `Ok(None)` when more bytes are needed.
    pub fn next_event(&mut self) -> Result<Option<Event>, ParseError> {
        loop {
            match self.parser.read() {
                Ok(Some(ev)) => {
                    if let Some(translated) = translate(ev)? {
                        return Ok(Some(translated));
                    }
                    // XML declarations and the like don't map to our Event
                    // shape; keep pulling until something does or input runs out.
                }
                Ok(None) => return Ok(None),
                Err(err) => return Err(ParseError::Format(crate::error::FormatError::new(
                    err.to_string(),
                    "rxml event",
                ))),
            }
        }
    }
}

fn translate(event: rxml::Event) -> Result<Option<Event>, ParseError> {
    match event {
        rxml::Event::StartElement(_ctx, name, attrs) => {
            let (ns, local) = split_qname(name);
            let tag = Tag::normalize((ns.as_deref(), local.as_str()))?;
            let mut out = HashMap::with_capacity(attrs.len());
            for (attr_name, value) in attrs.into_iter() {
                let (attr_ns, attr_local) = split_qname(attr_name);
                let attr_tag = Tag::normalize((attr_ns.as_deref(), attr_local.as_str()))?;
                out.insert(attr_tag, value.to_string());
            }
            Ok(Some(Event::start(tag, out)))
        }
        rxml::Event::Text(_ctx, data) => Ok(Some(Event::Text(data.to_string()))),
        rxml::Event::EndElement(_ctx) => Ok(Some(Event::End)),
        _ => Ok(None),
    }
}

/// Splits an `rxml` qualified name into `(namespace, local)`, matching the
/// `{uri}local` shape [`Tag`] otherwise parses out of an ElementTree-style
/// string.
fn split_qname(name: rxml::QName) -> (Option<String>, String) {
    let (ns, local) = name;
    let ns = ns.as_str();
    if ns.is_empty() {
        (None, local.as_str().to_string())
    } else {
        (Some(ns.to_string()), local.as_str().to_string())
    }
}
