//! Descriptors: the declarative building blocks a stanza class schema is
//! made of.
//!
//! Each kind below owns exactly one [`crate::instance::DescId`] slot and
//! knows how to parse its own piece of the wire format into that slot, and
//! how to serialize the slot back out. The schema (see [`crate::schema`])
//! only ever talks to descriptors through the small set of object-safe
//! traits declared here, which is what lets one `HashMap<Tag, ...>` hold a
//! mix of `Attr<Str>`, `Attr<JidCodec>`, `Attr<Integer<i64>>` and so on.

mod attr;
mod child;
mod child_list;
mod child_map;
mod child_tag;
mod child_text;
mod collector;
mod text;

pub use attr::Attr;
pub use child::{Child, Dispatch};
pub use child_list::ChildList;
pub use child_map::ChildMap;
pub use child_tag::ChildTag;
pub use child_text::ChildText;
pub use collector::Collector;
pub use text::Text;

use std::fmt;

use minidom::Element;

use crate::codec::ValidateMode;
use crate::error::ParseError;
use crate::instance::{DescId, DynStanzaObject, StanzaData};
use crate::parser::DynSuspendable;
use crate::schema::{UnknownAttrPolicy, UnknownChildPolicy, UnknownTextPolicy};
use crate::tag::Tag;

/// An `Attr<C>` erased to its codec-independent surface, so a schema's
/// attribute table can hold descriptors of unrelated codec types.
pub trait ErasedAttr: fmt::Debug + Send + Sync {
    fn id(&self) -> DescId;
    fn attr_tag(&self) -> &Tag;
    fn required(&self) -> bool;
    fn parse_and_store(&self, data: &mut StanzaData, text: &str) -> Result<(), ParseError>;
    /// Missing-attribute handling: apply the descriptor's default, or fail
    /// if none and the attribute is required.
    fn finish(&self, data: &mut StanzaData) -> Result<(), ParseError>;
    fn serialize(&self, data: &StanzaData) -> Option<String>;
}

/// See [`crate::instance::DynStanzaObject`] for why the auto traits need
/// spelling out explicitly on the trait-object type.
pub type DynAttr = dyn ErasedAttr + Send + Sync;

/// A `Text<C>` erased to its codec-independent surface. At most one of
/// these is reachable per class.
pub trait ErasedText: fmt::Debug + Send + Sync {
    fn id(&self) -> DescId;
    fn parse_and_store(&self, data: &mut StanzaData, text: &str) -> Result<(), ParseError>;
    fn serialize(&self, data: &StanzaData) -> Option<String>;
}

pub type DynText = dyn ErasedText + Send + Sync;

/// Common surface for the three descriptors that dispatch a child element to
/// a nested stanza class by tag: `Child`, `ChildList`, `ChildMap`. Unifying
/// these lets [`crate::parser::UnitParser`] drive all three through one code
/// path: look up the tag, call `begin` to get a fresh [`Suspendable`] for
/// whichever class claimed it, feed events until it reports `Done`, then
/// `store` the finished object.
pub trait DispatchedChild: fmt::Debug + Send + Sync {
    fn id(&self) -> DescId;
    fn claimed_tags(&self) -> Vec<Tag>;
    fn begin(&self, tag: &Tag) -> Box<DynSuspendable>;
    fn store(&self, data: &mut StanzaData, payload: Box<DynStanzaObject>);
    fn serialize(&self, data: &StanzaData) -> Vec<Element>;
}

pub type DynChild = dyn DispatchedChild + Send + Sync;

/// A `ChildText` erased to its codec-independent surface: a single child
/// element whose own text content is captured as a scalar value on the
/// parent instance, e.g. `<status>Away</status>` inside a presence stanza.
pub trait ErasedChildText: fmt::Debug + Send + Sync {
    fn id(&self) -> DescId;
    fn child_tag(&self) -> &Tag;
    /// How the element's own attributes are handled: DROP silently
    /// ignores them, FAIL raises `UnexpectedAttribute`.
    fn attr_policy(&self) -> UnknownAttrPolicy;
    /// How a nested element inside the child is handled: DROP drains its
    /// subtree via the parser's drop-sink, FAIL raises `UnexpectedChild`.
    fn child_policy(&self) -> UnknownChildPolicy;
    fn parse_and_store(&self, data: &mut StanzaData, text: &str) -> Result<(), ParseError>;
    fn serialize(&self, data: &StanzaData) -> Option<Element>;
}

pub type DynChildText = dyn ErasedChildText + Send + Sync;

/// A `ChildTag` erased to its codec-independent surface: one of a set of
/// alternative, content-free marker child elements, e.g. presence's `<show/>`
/// alternatives (`away`, `dnd`, `xa`, `chat`). Whichever tag is present on
/// the wire is recorded; the others are not expected to also appear.
pub trait ErasedChildTag: fmt::Debug + Send + Sync {
    fn id(&self) -> DescId;
    fn claimed_tags(&self) -> Vec<Tag>;
    /// How the matched marker element's own attributes are handled.
    fn attr_policy(&self) -> UnknownAttrPolicy;
    /// How a nested element inside the matched marker is handled.
    fn child_policy(&self) -> UnknownChildPolicy;
    /// How character data inside the matched marker is handled.
    fn text_policy(&self) -> UnknownTextPolicy;
    fn store_matched(&self, data: &mut StanzaData, tag: Tag);
    fn serialize(&self, data: &StanzaData) -> Option<Element>;
}

pub type DynChildTag = dyn ErasedChildTag + Send + Sync;

/// A `Collector` erased to its codec-independent surface. At most one of
/// these is reachable per class. Unlike [`DispatchedChild`]
/// it does not claim a fixed tag set: it absorbs whatever child element no
/// other descriptor claimed, as a literal subtree rather than a parsed
/// stanza object, so the parser builds the subtree itself (see
/// [`crate::parser::Frame::Collecting`]) and only calls `push` once it is
/// complete.
pub trait ErasedCollector: fmt::Debug + Send + Sync {
    fn id(&self) -> DescId;
    fn push(&self, data: &mut StanzaData, element: Element);
    fn serialize(&self, data: &StanzaData) -> Vec<Element>;
}

pub type DynCollector = dyn ErasedCollector + Send + Sync;

pub(crate) fn apply_validate_mode<T>(
    validator: Option<&(dyn crate::codec::Validator<T> + Send + Sync)>,
    value: &T,
    mode: ValidateMode,
    from_recv: bool,
) -> bool {
    match validator {
        None => true,
        Some(v) => {
            let gated = if from_recv {
                mode.from_recv()
            } else {
                mode.from_code()
            };
            !gated || v.validate(value)
        }
    }
}
