use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::DispatchedChild;
use crate::error::SchemaError;
use crate::instance::{DescId, DynStanzaObject, StanzaClass, StanzaData, StanzaObject};
use crate::parser::{DynSuspendable, UnitParser};
use crate::tag::{IntoTag, Tag};

type Factory = Arc<dyn Fn(Tag) -> Box<DynSuspendable> + Send + Sync>;

/// A tag -> stanza-class dispatch table, shared by [`Child`], `ChildList`
/// and `ChildMap`: all three let more than one concrete class satisfy the
/// same slot, distinguished by which tag showed up on the wire.
#[derive(Clone, Default)]
pub struct Dispatch {
    factories: HashMap<Tag, Factory>,
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("tags", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Dispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its own `TAG`.
    pub fn add<T: StanzaClass>(mut self) -> Result<Self, SchemaError> {
        self.register::<T>(T::TAG)?;
        Ok(self)
    }

    /// Register `T` under an alternate tag, e.g. when the same class is
    /// reused for a handful of related elements.
    pub fn add_as<T: StanzaClass>(mut self, tag: impl IntoTag) -> Result<Self, SchemaError> {
        self.register::<T>(tag)?;
        Ok(self)
    }

    /// In-place variant of [`Self::add_as`], for callers (like
    /// [`crate::dispatcher::StanzaParser`]) that add and remove class
    /// bindings after the dispatch table is already built.
    pub fn register<T: StanzaClass>(&mut self, tag: impl IntoTag) -> Result<(), SchemaError> {
        let tag = Tag::normalize(tag)?;
        if self.factories.contains_key(&tag) {
            return Err(SchemaError::DuplicateChild(tag));
        }
        self.factories
            .insert(tag, Arc::new(|t| Box::new(UnitParser::<T>::new(t))));
        Ok(())
    }

    /// Removes whatever class is registered under `tag`, if any. Returns
    /// whether a binding was actually removed.
    pub fn unregister(&mut self, tag: &Tag) -> bool {
        self.factories.remove(tag).is_some()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.factories.keys().cloned().collect()
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.factories.contains_key(tag)
    }

    pub fn create(&self, tag: &Tag) -> Option<Box<DynSuspendable>> {
        self.factories.get(tag).map(|f| f(tag.clone()))
    }
}

/// A single nested stanza object, chosen at parse time from among the
/// classes registered in `dispatch`. Replaces whatever was previously
/// stored if the element appears more than once (last write wins).
pub struct Child {
    id: DescId,
    dispatch: Dispatch,
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Child").field("dispatch", &self.dispatch).finish()
    }
}

impl Child {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            id: DescId::new(),
            dispatch,
        }
    }

    pub fn id(&self) -> DescId {
        self.id
    }

    pub fn get<'a>(&self, data: &'a StanzaData) -> Option<&'a DynStanzaObject> {
        data.get::<Box<DynStanzaObject>>(self.id).map(|b| b.as_ref())
    }

    pub fn get_as<'a, T: StanzaClass>(&self, data: &'a StanzaData) -> Option<&'a T> {
        self.get(data).and_then(|o| o.as_any().downcast_ref())
    }

    pub fn set(&self, data: &mut StanzaData, value: Box<DynStanzaObject>) {
        data.set(self.id, value);
    }
}

impl DispatchedChild for Child {
    fn id(&self) -> DescId {
        self.id
    }

    fn claimed_tags(&self) -> Vec<Tag> {
        self.dispatch.tags()
    }

    fn begin(&self, tag: &Tag) -> Box<DynSuspendable> {
        self.dispatch
            .create(tag)
            .expect("begin called with an unclaimed tag")
    }

    fn store(&self, data: &mut StanzaData, payload: Box<DynStanzaObject>) {
        data.set(self.id, payload);
    }

    fn serialize(&self, data: &StanzaData) -> Vec<minidom::Element> {
        match data.get::<Box<DynStanzaObject>>(self.id) {
            Some(obj) => vec![crate::ser::serialize_object(obj.as_ref())],
            None => Vec::new(),
        }
    }
}
