//! Top-level stanza dispatch: the entry point that turns a stream of
//! [`Event`]s into a stream of finished stanza instances.
//!
//! A tag -> class table plus at most one in-progress [`UnitParser`] at a
//! time, since only one top-level element can be open at once in a
//! well-formed document.

use crate::descriptor::Dispatch;
use crate::error::{ParseError, SchemaError};
use crate::event::{Event, RawStartArgs};
use crate::instance::{DynStanzaObject, StanzaClass};
use crate::parser::{DynSuspendable, Suspend, Suspendable};
use crate::tag::{IntoTag, Tag};

/// What to do when [`StanzaParser`] sees a top-level start tag no
/// registered class claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownTopLevelAction {
    Fail,
    Drop,
}

type ErrorHandler = Box<dyn FnMut(RawStartArgs) -> UnknownTopLevelAction + Send>;

/// Drives one top-level stanza class table against an event stream.
pub struct StanzaParser {
    dispatch: Dispatch,
    current: Option<Box<DynSuspendable>>,
    dropping_depth: Option<u32>,
    error_handler: Option<ErrorHandler>,
}

impl Default for StanzaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StanzaParser {
    pub fn new() -> Self {
        Self {
            dispatch: Dispatch::new(),
            current: None,
            dropping_depth: None,
            error_handler: None,
        }
    }

    /// Register `T` to be recognized under its own `TAG`.
    pub fn add_class<T: StanzaClass>(&mut self) -> Result<(), SchemaError> {
        self.dispatch.register::<T>(T::TAG)
    }

    /// Register `T` under an alternate top-level tag.
    pub fn add_class_as<T: StanzaClass>(&mut self, tag: impl IntoTag) -> Result<(), SchemaError> {
        self.dispatch.register::<T>(tag)
    }

    /// Stop recognizing whatever class is currently bound to `tag`. Has no
    /// effect on a stanza already mid-parse.
    pub fn remove_class(&mut self, tag: &Tag) -> bool {
        self.dispatch.unregister(tag)
    }

    pub fn registered_tags(&self) -> Vec<Tag> {
        self.dispatch.tags()
    }

    /// Install a hook consulted whenever an unrecognized top-level tag
    /// arrives, in place of immediately failing. Receives the same
    /// `(namespace_uri, local_name, attrs)` raw arguments a
    /// [`crate::error::ParseError::UnknownTopLevelTag`] would carry.
    pub fn set_error_handler<F>(&mut self, handler: F)
    where
        F: FnMut(RawStartArgs) -> UnknownTopLevelAction + Send + 'static,
    {
        self.error_handler = Some(Box::new(handler));
    }

    /// Feed the next event. Returns a finished stanza object once its
    /// closing tag has been seen; otherwise `None`.
    pub fn feed(&mut self, event: Event) -> Result<Option<Box<DynStanzaObject>>, ParseError> {
        if let Some(depth) = self.dropping_depth.as_mut() {
            match event {
                Event::Start { .. } => *depth += 1,
                Event::End => *depth -= 1,
                Event::Text(_) => {}
            }
            if *depth == 0 {
                self.dropping_depth = None;
            }
            return Ok(None);
        }

        if let Some(parser) = self.current.as_mut() {
            return match parser.feed(event)? {
                Suspend::Pending => Ok(None),
                Suspend::Done(obj) => {
                    self.current = None;
                    Ok(Some(obj))
                }
            };
        }

        match event {
            Event::Start { tag, attrs } => {
                if let Some(mut parser) = self.dispatch.create(&tag) {
                    match parser.feed(Event::start(tag, attrs))? {
                        Suspend::Pending => {
                            self.current = Some(parser);
                            Ok(None)
                        }
                        Suspend::Done(obj) => Ok(Some(obj)),
                    }
                } else {
                    let raw: RawStartArgs = (
                        tag.namespace().map(str::to_string),
                        tag.local_name().to_string(),
                        attrs,
                    );
                    let action = match self.error_handler.as_mut() {
                        Some(handler) => handler(raw.clone()),
                        None => UnknownTopLevelAction::Fail,
                    };
                    match action {
                        UnknownTopLevelAction::Fail => Err(ParseError::UnknownTopLevelTag(raw)),
                        UnknownTopLevelAction::Drop => {
                            self.dropping_depth = Some(1);
                            Ok(None)
                        }
                    }
                }
            }
            // Whitespace between top-level stanzas; stream framing itself
            // is out of scope here, so anything arriving with nothing open
            // is simply not meaningful content.
            Event::Text(_) | Event::End => Ok(None),
        }
    }
}
