//! The internal event shape the parser consumes.
//!
//! This is a deliberately narrow view of SAX-style parsing: only the three
//! event kinds the schema layer cares about. A full namespace-aware parser
//! (see [`crate::sax`]) translates whatever its underlying library emits
//! down to this shape before handing events to [`crate::parser`].

use std::collections::HashMap;

use crate::tag::Tag;

/// The raw arguments of a start-element event, before any attribute has been
/// interpreted by a descriptor: `(namespace_uri, local_name, attrs)`.
///
/// Kept in this tuple shape rather than a struct because it is also what
/// gets handed verbatim to a `stanza_error_handler` hook and to
/// [`crate::error::ParseError::UnknownTopLevelTag`] — callers that only
/// want to log or re-dispatch the element need no named fields.
pub type RawStartArgs = (Option<String>, String, HashMap<Tag, String>);

/// One parse event, namespace-resolved down to [`Tag`] identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A start tag, with its attributes already collected as `Tag -> value`.
    Start {
        tag: Tag,
        attrs: HashMap<Tag, String>,
    },
    /// A contiguous run of character data. Adjacent runs are never merged by
    /// the adapter; `Text` descriptors and collectors concatenate as needed.
    Text(String),
    /// The end of the element most recently opened by `Start`.
    End,
}

impl Event {
    pub fn start(tag: Tag, attrs: HashMap<Tag, String>) -> Self {
        Self::Start { tag, attrs }
    }

    /// The raw-args view of a `Start` event, for error reporting. Returns
    /// `None` for non-`Start` events.
    pub fn as_raw_start_args(&self) -> Option<RawStartArgs> {
        match self {
            Event::Start { tag, attrs } => Some((
                tag.namespace().map(str::to_string),
                tag.local_name().to_string(),
                attrs.clone(),
            )),
            _ => None,
        }
    }
}
