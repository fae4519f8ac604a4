//! Error types for the schema and parsing layers.
//!
//! Schema-construction failures (`SchemaError`) and parse-time failures
//! (`ParseError`) are kept as two separate enums: the former can only ever
//! be raised once, eagerly, when a [`crate::schema::Schema`] is built or a
//! child class is registered; the latter is the only error surface a
//! running parser can produce, so callers driving a parse never have to
//! account for a "can't happen here" schema variant.

use std::fmt;

use thiserror::Error;

use crate::event::RawStartArgs;
use crate::tag::Tag;

/// A codec's `parse` could not interpret the given text, or [`Tag::normalize`]
/// rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse {text:?} as {type_name}")]
pub struct FormatError {
    pub text: String,
    pub type_name: &'static str,
}

impl FormatError {
    pub fn new(text: impl Into<String>, type_name: &'static str) -> Self {
        Self {
            text: text.into(),
            type_name,
        }
    }
}

/// Errors raised while constructing a [`crate::schema::Schema`] or while
/// registering a late child class. Always raised eagerly, never during
/// parsing.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two distinct `Attr` descriptors claim the same attribute tag.
    #[error("ambiguous Attr descriptors: more than one claims tag {0}")]
    DuplicateAttr(Tag),

    /// Two distinct child-bearing descriptors claim the same child tag.
    #[error("ambiguous child descriptors: more than one claims tag {0}")]
    DuplicateChild(Tag),

    /// More than one distinct `Text` descriptor is reachable.
    #[error("multiple distinct Text descriptors on one class")]
    MultipleText,

    /// More than one distinct `Collector` descriptor is reachable.
    #[error("multiple distinct Collector descriptors on one class")]
    MultipleCollector,

    /// The class's `TAG` failed to normalize.
    #[error("malformed TAG: {0}")]
    MalformedTag(#[from] FormatError),

    /// A dispatcher already has a binding for this tag.
    #[error("duplicate top-level tag registration: {0}")]
    DuplicateTopLevelTag(Tag),
}

/// Errors raised while parsing a stream of events against a schema.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("validation failed for {descriptor}: {value}")]
    Validation {
        descriptor: &'static str,
        value: String,
    },

    #[error("unexpected child element {0}")]
    UnexpectedChild(Tag),

    #[error("unexpected attribute {0}")]
    UnexpectedAttribute(Tag),

    #[error("unexpected text content")]
    UnexpectedText,

    #[error("missing required attribute {0}")]
    MissingAttribute(Tag),

    /// The dispatcher received a start-element whose tag is not registered.
    /// Carries the raw `(namespace_uri, local_name, attrs)` event arguments.
    #[error("unhandled top-level element: ({:?}, {:?})", .0.0, .0.1)]
    UnknownTopLevelTag(RawStartArgs),
}

impl ParseError {
    pub fn validation(descriptor: &'static str, value: impl fmt::Debug) -> Self {
        Self::Validation {
            descriptor,
            value: format!("{value:?}"),
        }
    }
}
