//! The per-class parse state machine.
//!
//! Parsing one stanza class suspends while it waits for more events and
//! resumes when the driver feeds the next one in. Rust has no stackful
//! coroutines available here, so the suspend/resume shape is built as an
//! explicit state machine: [`UnitParser`] holds a `Vec<Frame>` standing in
//! for a generator's call stack, and [`Suspendable::feed`] is called once
//! per event.

use std::collections::HashMap;

use minidom::ElementBuilder;
use tracing::{debug, trace, warn};

use crate::descriptor::DispatchedChild;
use crate::error::ParseError;
use crate::event::Event;
use crate::instance::{DynStanzaObject, HasStanzaData, StanzaClass, StanzaData};
use crate::schema::{ChildEntry, Schema, UnknownAttrPolicy, UnknownChildPolicy, UnknownTextPolicy};
use crate::tag::Tag;

/// What a [`Suspendable`] reports after consuming one event.
pub enum Suspend {
    /// More events are needed before this unit is complete.
    Pending,
    /// The unit is complete; this is its final value.
    Done(Box<DynStanzaObject>),
}

/// Anything that can consume one [`Event`] at a time and eventually produce
/// a finished [`StanzaObject`]. [`UnitParser`] is the only implementation in
/// this crate; the trait exists so descriptor dispatch tables
/// ([`crate::descriptor::Dispatch`]) can hold a `Box<DynSuspendable>`
/// without naming the concrete stanza class.
pub trait Suspendable: Send + Sync {
    fn feed(&mut self, event: Event) -> Result<Suspend, ParseError>;
}

/// See [`crate::instance::DynStanzaObject`] for why this needs the explicit
/// `+ Send + Sync` rather than relying on the trait's own supertraits.
pub type DynSuspendable = dyn Suspendable + Send + Sync;

/// What happens once a drop-sink or marker-tag subtree finishes closing.
enum DropAction {
    /// Plain drop: an unknown element being discarded per policy.
    None,
    /// A `ChildTag` marker element: record which alternative tag matched.
    ChildTag(std::sync::Arc<crate::descriptor::DynChildTag>, Tag),
}

/// One level of in-progress nested parsing inside a [`UnitParser`].
enum Frame {
    /// A nested stanza class is being parsed by its own `UnitParser`,
    /// reached through a `Child`/`ChildList`/`ChildMap` descriptor.
    Nested {
        entry_tag: Tag,
        parser: Box<DynSuspendable>,
    },
    /// Accumulating the text content of a `ChildText` element.
    Text { tag: Tag, buffer: String },
    /// Skipping a subtree: an unmatched element under `Drop` policy, or
    /// (via `action`) a content-free `ChildTag` marker whose subtree is
    /// still consumed and discarded.
    Drop { depth: u32, action: DropAction },
    /// Building an arbitrary subtree for a `Collector`, depth-for-depth
    /// alongside the SAX events; finishes when `builders` empties.
    Collecting { builders: Vec<ElementBuilder> },
}

/// Drives one stanza class's schema against a stream of [`Event`]s,
/// producing a finished instance of `T` once its closing tag is seen.
pub struct UnitParser<T: StanzaClass> {
    tag: Tag,
    data: StanzaData,
    stack: Vec<Frame>,
    started: bool,
    text_buffer: String,
    _marker: std::marker::PhantomData<T>,
}

impl<T: StanzaClass> UnitParser<T> {
    /// `tag` is the concrete tag this instance was matched under (may differ
    /// from `T::TAG` when the class is registered under an alternate tag via
    /// `Dispatch::add_as`).
    pub fn new(tag: Tag) -> Self {
        debug!(%tag, "unit parser entered");
        Self {
            tag,
            data: StanzaData::new(),
            stack: Vec::new(),
            started: false,
            text_buffer: String::new(),
            _marker: std::marker::PhantomData,
        }
    }

    fn schema(&self) -> &'static Schema {
        T::schema()
    }

    /// Consumes the element's own start-tag attributes and immediately
    /// checks required-attribute presence, before any child element is
    /// touched: a missing required attribute must fail fast, not leave a
    /// nested child partially parsed first.
    fn handle_own_start(&mut self, attrs: HashMap<Tag, String>) -> Result<(), ParseError> {
        self.started = true;
        let schema = self.schema();
        for (tag, text) in &attrs {
            match schema.attr(tag) {
                Some(attr) => attr.parse_and_store(&mut self.data, text)?,
                None => {
                    if schema.unknown_attr_policy() == UnknownAttrPolicy::Fail {
                        return Err(ParseError::UnexpectedAttribute(tag.clone()));
                    }
                    warn!(attr = %tag, "dropped unexpected attribute");
                }
            }
        }
        for attr in schema.attrs() {
            attr.finish(&mut self.data)?;
        }
        Ok(())
    }

    fn handle_own_text(&mut self, text: String) -> Result<(), ParseError> {
        let schema = self.schema();
        if schema.text().is_some() {
            self.text_buffer.push_str(&text);
            Ok(())
        } else if !text.trim().is_empty() && schema.unknown_text_policy() == UnknownTextPolicy::Fail
        {
            Err(ParseError::UnexpectedText)
        } else {
            if !text.trim().is_empty() {
                warn!("dropped unexpected character data");
            }
            Ok(())
        }
    }

    fn begin_child(&mut self, tag: Tag, attrs: HashMap<Tag, String>) -> Result<(), ParseError> {
        let schema = self.schema();
        if let Some(entry) = schema.child_entry(&tag).cloned() {
            match entry {
                ChildEntry::Dispatched(dispatched) => {
                    let mut parser = dispatched.begin(&tag);
                    match parser.feed(Event::start(tag.clone(), attrs))? {
                        Suspend::Pending => {
                            self.stack.push(Frame::Nested {
                                entry_tag: tag,
                                parser,
                            });
                        }
                        Suspend::Done(obj) => dispatched.store(&mut self.data, obj),
                    }
                }
                ChildEntry::Text(child_text) => {
                    if !attrs.is_empty() {
                        if child_text.attr_policy() == UnknownAttrPolicy::Fail {
                            let offending = attrs.into_keys().next().expect("checked non-empty");
                            return Err(ParseError::UnexpectedAttribute(offending));
                        }
                        warn!(child = %tag, "dropped attributes on child-text element");
                    }
                    self.stack.push(Frame::Text {
                        tag,
                        buffer: String::new(),
                    });
                }
                ChildEntry::Tag(child_tag) => {
                    if !attrs.is_empty() {
                        if child_tag.attr_policy() == UnknownAttrPolicy::Fail {
                            let offending = attrs.into_keys().next().expect("checked non-empty");
                            return Err(ParseError::UnexpectedAttribute(offending));
                        }
                        warn!(child = %tag, "dropped attributes on child-tag marker");
                    }
                    self.stack.push(Frame::Drop {
                        depth: 1,
                        action: DropAction::ChildTag(child_tag, tag),
                    });
                }
            }
            return Ok(());
        }
        if schema.collector().is_some() {
            self.stack.push(Frame::Collecting {
                builders: vec![new_builder(&tag, &attrs)],
            });
            return Ok(());
        }
        match schema.unknown_child_policy() {
            UnknownChildPolicy::Drop => {
                warn!(child = %tag, "dropped unexpected child element");
                self.stack.push(Frame::Drop {
                    depth: 1,
                    action: DropAction::None,
                });
                Ok(())
            }
            UnknownChildPolicy::Fail => Err(ParseError::UnexpectedChild(tag)),
        }
    }

    fn finish(&mut self) -> Result<Box<DynStanzaObject>, ParseError> {
        let schema = self.schema();
        if let Some(text_desc) = schema.text() {
            text_desc.parse_and_store(&mut self.data, &self.text_buffer)?;
        }
        let mut instance = T::new_empty(self.tag.clone());
        *instance.stanza_data_mut() = std::mem::take(&mut self.data);
        instance
            .stanza_data_mut()
            .set(crate::instance::instance_tag_slot(), self.tag.clone());
        debug!(tag = %self.tag, "unit parser finished");
        Ok(Box::new(instance))
    }
}

impl<T: StanzaClass> Suspendable for UnitParser<T> {
    fn feed(&mut self, event: Event) -> Result<Suspend, ParseError> {
        trace!(tag = %self.tag, ?event, depth = self.stack.len(), "event dispatched");
        // Frames are popped off the stack before being matched on, and
        // pushed back only if still pending, so that finishing a frame
        // (which needs `&mut self.data` / `self.stack`) never has to fight
        // a borrow still held by the frame itself.
        if let Some(mut frame) = self.stack.pop() {
            match &mut frame {
                Frame::Nested { parser, .. } => match parser.feed(event)? {
                    Suspend::Pending => {
                        self.stack.push(frame);
                        Ok(Suspend::Pending)
                    }
                    Suspend::Done(obj) => {
                        let Frame::Nested { entry_tag, .. } = frame else {
                            unreachable!()
                        };
                        let schema = self.schema();
                        if let Some(ChildEntry::Dispatched(dispatched)) =
                            schema.child_entry(&entry_tag)
                        {
                            dispatched.store(&mut self.data, obj);
                        }
                        Ok(Suspend::Pending)
                    }
                },
                Frame::Text { tag, buffer } => match event {
                    Event::Text(t) => {
                        buffer.push_str(&t);
                        self.stack.push(frame);
                        Ok(Suspend::Pending)
                    }
                    Event::Start { tag: nested_tag, .. } => {
                        let child_policy = match self.schema().child_entry(&*tag) {
                            Some(ChildEntry::Text(child_text)) => child_text.child_policy(),
                            _ => UnknownChildPolicy::Fail,
                        };
                        match child_policy {
                            UnknownChildPolicy::Fail => Err(ParseError::UnexpectedChild(nested_tag)),
                            UnknownChildPolicy::Drop => {
                                warn!(child = %nested_tag, "dropped nested element inside child-text");
                                self.stack.push(frame);
                                self.stack.push(Frame::Drop {
                                    depth: 1,
                                    action: DropAction::None,
                                });
                                Ok(Suspend::Pending)
                            }
                        }
                    }
                    Event::End => {
                        let Frame::Text { tag, buffer } = frame else {
                            unreachable!()
                        };
                        if let Some(ChildEntry::Text(child_text)) = self.schema().child_entry(&tag)
                        {
                            child_text.parse_and_store(&mut self.data, &buffer)?;
                        }
                        Ok(Suspend::Pending)
                    }
                },
                Frame::Drop { depth, action } => {
                    match &event {
                        Event::Start { tag: nested_tag, .. } => {
                            if *depth == 1 {
                                if let DropAction::ChildTag(child_tag, _) = action {
                                    if child_tag.child_policy() == UnknownChildPolicy::Fail {
                                        return Err(ParseError::UnexpectedChild(nested_tag.clone()));
                                    }
                                    warn!(child = %nested_tag, "dropped nested element inside child-tag marker");
                                }
                            }
                            *depth += 1;
                        }
                        Event::End => *depth -= 1,
                        Event::Text(text) => {
                            if *depth == 1 {
                                if let DropAction::ChildTag(child_tag, _) = action {
                                    if !text.trim().is_empty() {
                                        if child_tag.text_policy() == UnknownTextPolicy::Fail {
                                            return Err(ParseError::UnexpectedText);
                                        }
                                        warn!("dropped character data inside child-tag marker");
                                    }
                                }
                            }
                        }
                    }
                    let done = *depth == 0;
                    if done {
                        let Frame::Drop { action, .. } = frame else {
                            unreachable!()
                        };
                        if let DropAction::ChildTag(child_tag, tag) = action {
                            child_tag.store_matched(&mut self.data, tag);
                        }
                    } else {
                        self.stack.push(frame);
                    }
                    Ok(Suspend::Pending)
                }
                Frame::Collecting { builders } => {
                    match event {
                        Event::Start { tag, attrs } => {
                            builders.push(new_builder(&tag, &attrs));
                            self.stack.push(frame);
                        }
                        Event::Text(t) => {
                            let top = builders
                                .pop()
                                .expect("collecting frame never empty mid-subtree");
                            builders.push(top.append(t));
                            self.stack.push(frame);
                        }
                        Event::End => {
                            let built = builders.pop().unwrap().build();
                            if builders.is_empty() {
                                if let Some(collector) = self.schema().collector() {
                                    collector.push(&mut self.data, built);
                                }
                            } else {
                                let parent = builders.pop().unwrap();
                                builders.push(parent.append(built));
                                self.stack.push(frame);
                            }
                        }
                    }
                    Ok(Suspend::Pending)
                }
            }
        } else if !self.started {
            match event {
                Event::Start { tag, attrs } => {
                    self.tag = tag;
                    self.handle_own_start(attrs)?;
                    Ok(Suspend::Pending)
                }
                _ => unreachable!("UnitParser fed a non-Start event before starting"),
            }
        } else {
            match event {
                Event::Start { tag, attrs } => {
                    self.begin_child(tag, attrs)?;
                    Ok(Suspend::Pending)
                }
                Event::Text(text) => {
                    self.handle_own_text(text)?;
                    Ok(Suspend::Pending)
                }
                Event::End => Ok(Suspend::Done(self.finish()?)),
            }
        }
    }
}

fn new_builder(tag: &Tag, attrs: &HashMap<Tag, String>) -> ElementBuilder {
    let mut builder = minidom::Element::builder(tag.local_name(), tag.namespace().unwrap_or_default());
    for (attr_tag, value) in attrs {
        builder = builder.attr(attr_tag.local_name(), value.as_str());
    }
    builder
}
