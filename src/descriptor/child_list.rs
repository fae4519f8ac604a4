use std::fmt;

use crate::descriptor::{child::Dispatch, DispatchedChild};
use crate::instance::{DescId, DynStanzaObject, StanzaClass, StanzaData, StanzaObject};
use crate::parser::DynSuspendable;
use crate::tag::Tag;

/// An ordered sequence of nested stanza objects, any number of which may
/// appear, each matching one of the classes registered in `dispatch`.
pub struct ChildList {
    id: DescId,
    dispatch: Dispatch,
}

impl fmt::Debug for ChildList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildList").field("dispatch", &self.dispatch).finish()
    }
}

impl ChildList {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            id: DescId::new(),
            dispatch,
        }
    }

    pub fn id(&self) -> DescId {
        self.id
    }

    pub fn get<'a>(&self, data: &'a StanzaData) -> &'a [Box<DynStanzaObject>] {
        data.get::<Vec<Box<DynStanzaObject>>>(self.id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter_as<'a, T: StanzaClass>(&self, data: &'a StanzaData) -> impl Iterator<Item = &'a T> {
        self.get(data).iter().filter_map(|o| o.as_any().downcast_ref())
    }

    pub fn push(&self, data: &mut StanzaData, value: Box<DynStanzaObject>) {
        data.get_or_insert_with(self.id, Vec::new).push(value);
    }
}

impl DispatchedChild for ChildList {
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
        self.push(data, payload);
    }

    fn serialize(&self, data: &StanzaData) -> Vec<minidom::Element> {
        self.get(data)
            .iter()
            .map(|obj| crate::ser::serialize_object(obj.as_ref()))
            .collect()
    }
}
