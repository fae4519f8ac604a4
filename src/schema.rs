//! Schema construction: the table of descriptors that defines how one
//! stanza class parses from and serializes to XML.
//!
//! Schemas are built once per class (typically into a `static` behind a
//! `OnceLock`, see [`crate::instance::StanzaClass::schema`]) and are
//! immutable afterwards. All of the uniqueness invariants enforced at
//! class-definition time are checked here, eagerly, as descriptors
//! are added — never during parsing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::descriptor::{DynAttr, DynChild, DynChildTag, DynChildText, DynCollector, DynText};
use crate::error::SchemaError;
use crate::instance::DescId;
use crate::tag::{IntoTag, Tag};

/// What to do when an attribute is present on the wire that no `Attr`
/// descriptor claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownAttrPolicy {
    #[default]
    Fail,
    Drop,
}

/// What to do when a child element is present that no child-bearing
/// descriptor and no `Collector` claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownChildPolicy {
    #[default]
    Fail,
    Drop,
}

/// What to do when character data is present that no `Text` descriptor
/// claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTextPolicy {
    #[default]
    Fail,
    Drop,
}

/// Whichever kind of child-bearing descriptor claims one tag. `Child`,
/// `ChildList` and `ChildMap` share [`DispatchedChild`] since all three
/// dispatch to a nested stanza class; `ChildText` and `ChildTag` handle
/// their own, much narrower, content directly.
#[derive(Clone)]
pub enum ChildEntry {
    Dispatched(Arc<DynChild>),
    Text(Arc<DynChildText>),
    Tag(Arc<DynChildTag>),
}

impl ChildEntry {
    pub fn id(&self) -> DescId {
        match self {
            ChildEntry::Dispatched(d) => d.id(),
            ChildEntry::Text(t) => t.id(),
            ChildEntry::Tag(t) => t.id(),
        }
    }

    fn claimed_tags(&self) -> Vec<Tag> {
        match self {
            ChildEntry::Dispatched(d) => d.claimed_tags(),
            ChildEntry::Text(t) => vec![t.child_tag().clone()],
            ChildEntry::Tag(t) => t.claimed_tags(),
        }
    }
}

/// The immutable, fully-built descriptor table for one stanza class.
pub struct Schema {
    tag: Tag,
    attrs: HashMap<Tag, Arc<DynAttr>>,
    text: Option<Arc<DynText>>,
    collector: Option<Arc<DynCollector>>,
    children: HashMap<Tag, ChildEntry>,
    unknown_attr_policy: UnknownAttrPolicy,
    unknown_child_policy: UnknownChildPolicy,
    unknown_text_policy: UnknownTextPolicy,
}

impl Schema {
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn attr(&self, tag: &Tag) -> Option<&Arc<DynAttr>> {
        self.attrs.get(tag)
    }

    pub fn attrs(&self) -> impl Iterator<Item = &Arc<DynAttr>> {
        self.attrs.values()
    }

    pub fn text(&self) -> Option<&Arc<DynText>> {
        self.text.as_ref()
    }

    pub fn collector(&self) -> Option<&Arc<DynCollector>> {
        self.collector.as_ref()
    }

    pub fn child_entry(&self, tag: &Tag) -> Option<&ChildEntry> {
        self.children.get(tag)
    }

    /// Every distinct child-bearing descriptor, without repeats for
    /// descriptors that claim more than one tag.
    pub fn distinct_children(&self) -> Vec<&ChildEntry> {
        let mut seen = HashSet::new();
        self.children
            .values()
            .filter(|c| seen.insert(c.id()))
            .collect()
    }

    pub fn unknown_attr_policy(&self) -> UnknownAttrPolicy {
        self.unknown_attr_policy
    }

    pub fn unknown_child_policy(&self) -> UnknownChildPolicy {
        self.unknown_child_policy
    }

    pub fn unknown_text_policy(&self) -> UnknownTextPolicy {
        self.unknown_text_policy
    }
}

/// Accumulates descriptors for one class, checking the uniqueness
/// invariants as each is added.
pub struct SchemaBuilder {
    tag: Tag,
    attrs: HashMap<Tag, Arc<DynAttr>>,
    text: Option<Arc<DynText>>,
    collector: Option<Arc<DynCollector>>,
    children: HashMap<Tag, ChildEntry>,
    unknown_attr_policy: UnknownAttrPolicy,
    unknown_child_policy: UnknownChildPolicy,
    unknown_text_policy: UnknownTextPolicy,
}

impl SchemaBuilder {
    /// `tag` is the class's `TAG` constant; a malformed tag is rejected
    /// here rather than surfacing later as a confusing parse failure.
    pub fn new(tag: impl IntoTag) -> Result<Self, SchemaError> {
        Ok(Self {
            tag: Tag::normalize(tag)?,
            attrs: HashMap::new(),
            text: None,
            collector: None,
            children: HashMap::new(),
            unknown_attr_policy: UnknownAttrPolicy::default(),
            unknown_child_policy: UnknownChildPolicy::default(),
            unknown_text_policy: UnknownTextPolicy::default(),
        })
    }

    pub fn attr(&mut self, attr: Arc<DynAttr>) -> Result<&mut Self, SchemaError> {
        let tag = attr.attr_tag().clone();
        if let Some(existing) = self.attrs.get(&tag) {
            if existing.id() != attr.id() {
                return Err(SchemaError::DuplicateAttr(tag));
            }
        }
        debug!(class = %self.tag, attr = %tag, "registered attr descriptor");
        self.attrs.insert(tag, attr);
        Ok(self)
    }

    pub fn text(&mut self, text: Arc<DynText>) -> Result<&mut Self, SchemaError> {
        if let Some(existing) = &self.text {
            if existing.id() != text.id() {
                return Err(SchemaError::MultipleText);
            }
        }
        debug!(class = %self.tag, "registered text descriptor");
        self.text = Some(text);
        Ok(self)
    }

    pub fn collector(&mut self, collector: Arc<DynCollector>) -> Result<&mut Self, SchemaError> {
        if let Some(existing) = &self.collector {
            if existing.id() != collector.id() {
                return Err(SchemaError::MultipleCollector);
            }
        }
        debug!(class = %self.tag, "registered collector descriptor");
        self.collector = Some(collector);
        Ok(self)
    }

    fn insert_child_entry(&mut self, entry: ChildEntry) -> Result<&mut Self, SchemaError> {
        for tag in entry.claimed_tags() {
            if let Some(existing) = self.children.get(&tag) {
                if existing.id() != entry.id() {
                    return Err(SchemaError::DuplicateChild(tag));
                }
            }
        }
        for tag in entry.claimed_tags() {
            trace!(class = %self.tag, child = %tag, "registered child descriptor");
            self.children.insert(tag, entry.clone());
        }
        Ok(self)
    }

    pub fn child(&mut self, child: Arc<DynChild>) -> Result<&mut Self, SchemaError> {
        self.insert_child_entry(ChildEntry::Dispatched(child))
    }

    pub fn child_text(&mut self, child: Arc<DynChildText>) -> Result<&mut Self, SchemaError> {
        self.insert_child_entry(ChildEntry::Text(child))
    }

    pub fn child_tag(&mut self, child: Arc<DynChildTag>) -> Result<&mut Self, SchemaError> {
        self.insert_child_entry(ChildEntry::Tag(child))
    }

    pub fn unknown_attr_policy(&mut self, policy: UnknownAttrPolicy) -> &mut Self {
        self.unknown_attr_policy = policy;
        self
    }

    pub fn unknown_child_policy(&mut self, policy: UnknownChildPolicy) -> &mut Self {
        self.unknown_child_policy = policy;
        self
    }

    pub fn unknown_text_policy(&mut self, policy: UnknownTextPolicy) -> &mut Self {
        self.unknown_text_policy = policy;
        self
    }

    /// Pull every descriptor from `parent` into this builder. Used when a
    /// class inherits another's schema; descriptors that arrive through more
    /// than one inheritance path are recognized by identity (`Arc::ptr_eq`
    /// semantics via `DescId`) and do not trip the duplicate checks.
    pub fn inherit(&mut self, parent: &Schema) -> Result<&mut Self, SchemaError> {
        for attr in parent.attrs.values() {
            self.attr(Arc::clone(attr))?;
        }
        if let Some(text) = &parent.text {
            self.text(Arc::clone(text))?;
        }
        if let Some(collector) = &parent.collector {
            self.collector(Arc::clone(collector))?;
        }
        for child in parent.distinct_children() {
            self.insert_child_entry(child.clone())?;
        }
        Ok(self)
    }

    pub fn build(self) -> Schema {
        Schema {
            tag: self.tag,
            attrs: self.attrs,
            text: self.text,
            collector: self.collector,
            children: self.children,
            unknown_attr_policy: self.unknown_attr_policy,
            unknown_child_policy: self.unknown_child_policy,
            unknown_text_policy: self.unknown_text_policy,
        }
    }
}
