use std::fmt;

use crate::descriptor::{child::Dispatch, DispatchedChild};
use crate::instance::{DescId, DynStanzaObject, StanzaClass, StanzaData, StanzaObject};
use crate::parser::DynSuspendable;
use crate::tag::Tag;

/// Nested stanza objects grouped by the tag they were parsed from. Storage
/// is `Vec<(Tag, Vec<Box<DynStanzaObject>>)>` rather than a `HashMap`, so
/// iteration order matches the order tags first appeared on the wire.
pub struct ChildMap {
    id: DescId,
    dispatch: Dispatch,
}

impl fmt::Debug for ChildMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildMap").field("dispatch", &self.dispatch).finish()
    }
}

type Groups = Vec<(Tag, Vec<Box<DynStanzaObject>>)>;

impl ChildMap {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            id: DescId::new(),
            dispatch,
        }
    }

    pub fn id(&self) -> DescId {
        self.id
    }

    pub fn get<'a>(&self, data: &'a StanzaData) -> &'a [(Tag, Vec<Box<DynStanzaObject>>)] {
        data.get::<Groups>(self.id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_tag<'a>(&self, data: &'a StanzaData, tag: &Tag) -> &'a [Box<DynStanzaObject>] {
        self.get(data)
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn push(&self, data: &mut StanzaData, tag: Tag, value: Box<DynStanzaObject>) {
        let groups = data.get_or_insert_with::<Groups, _>(self.id, Vec::new);
        match groups.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, values)) => values.push(value),
            None => groups.push((tag, vec![value])),
        }
    }
}

impl DispatchedChild for ChildMap {
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
        let tag = payload.tag().clone();
        self.push(data, tag, payload);
    }

    fn serialize(&self, data: &StanzaData) -> Vec<minidom::Element> {
        self.get(data)
            .iter()
            .flat_map(|(_, values)| values.iter())
            .map(|obj| crate::ser::serialize_object(obj.as_ref()))
            .collect()
    }
}
