use std::fmt;

use minidom::Element;

use crate::descriptor::ErasedChildTag;
use crate::error::ParseError;
use crate::instance::{DescId, StanzaData};
use crate::schema::{UnknownAttrPolicy, UnknownChildPolicy, UnknownTextPolicy};
use crate::tag::{IntoTag, Tag};

/// One of a fixed set of content-free marker child elements, e.g.
/// presence's `<show/>` alternatives. Whichever tag appeared on the wire is
/// recorded as the slot's value; the others are simply not matched.
pub struct ChildTag {
    id: DescId,
    options: Vec<Tag>,
    default_ns: Option<String>,
    allow_none: bool,
    default: Option<Tag>,
    attr_policy: UnknownAttrPolicy,
    child_policy: UnknownChildPolicy,
    text_policy: UnknownTextPolicy,
    declare_prefix: Option<String>,
}

impl fmt::Debug for ChildTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildTag").field("options", &self.options).finish()
    }
}

impl ChildTag {
    /// Own attributes, nested children and character data inside the
    /// matched marker all default to DROP (the marker carries no payload,
    /// so its content is normally uninteresting); `allow_none` defaults to
    /// `false`.
    pub fn new(options: Vec<impl IntoTag>) -> Result<Self, crate::error::FormatError> {
        let options = options
            .into_iter()
            .map(Tag::normalize)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: DescId::new(),
            options,
            default_ns: None,
            allow_none: false,
            default: None,
            attr_policy: UnknownAttrPolicy::Drop,
            child_policy: UnknownChildPolicy::Drop,
            text_policy: UnknownTextPolicy::Drop,
            declare_prefix: None,
        })
    }

    /// Applies `ns` to every option tag that was given without one.
    pub fn with_default_ns(mut self, ns: impl Into<String>) -> Self {
        let ns = ns.into();
        self.options = self
            .options
            .into_iter()
            .map(|t| {
                if t.namespace().is_some() {
                    t
                } else {
                    Tag::normalize((Some(ns.as_str()), t.local_name()))
                        .expect("re-namespacing an already-normalized tag cannot fail")
                }
            })
            .collect();
        self.default_ns = Some(ns);
        self
    }

    pub fn allow_none(mut self) -> Self {
        self.allow_none = true;
        self
    }

    pub fn with_default(mut self, default: Tag) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_attr_policy(mut self, policy: UnknownAttrPolicy) -> Self {
        self.attr_policy = policy;
        self
    }

    pub fn with_child_policy(mut self, policy: UnknownChildPolicy) -> Self {
        self.child_policy = policy;
        self
    }

    pub fn with_text_policy(mut self, policy: UnknownTextPolicy) -> Self {
        self.text_policy = policy;
        self
    }

    pub fn with_declare_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.declare_prefix = Some(prefix.into());
        self
    }

    pub fn id(&self) -> DescId {
        self.id
    }

    pub fn get<'a>(&self, data: &'a StanzaData) -> Option<&'a Tag> {
        data.get::<Tag>(self.id).or(self.default.as_ref())
    }

    pub fn set(&self, data: &mut StanzaData, tag: Tag) {
        data.set(self.id, tag);
    }

    /// Explicitly unassigns the slot. Fails unless the descriptor was built
    /// with `.allow_none()`.
    pub fn clear(&self, data: &mut StanzaData) -> Result<(), ParseError> {
        if !self.allow_none {
            return Err(ParseError::validation("ChildTag", "None"));
        }
        data.remove(self.id);
        Ok(())
    }
}

impl ErasedChildTag for ChildTag {
    fn id(&self) -> DescId {
        self.id
    }

    fn claimed_tags(&self) -> Vec<Tag> {
        self.options.clone()
    }

    fn attr_policy(&self) -> UnknownAttrPolicy {
        self.attr_policy
    }

    fn child_policy(&self) -> UnknownChildPolicy {
        self.child_policy
    }

    fn text_policy(&self) -> UnknownTextPolicy {
        self.text_policy
    }

    fn store_matched(&self, data: &mut StanzaData, tag: Tag) {
        data.set(self.id, tag);
    }

    fn serialize(&self, data: &StanzaData) -> Option<Element> {
        let tag = data.get::<Tag>(self.id).or(self.default.as_ref())?;
        let mut builder = Element::builder(tag.local_name(), tag.namespace().unwrap_or_default());
        if let (Some(prefix), Some(ns)) = (self.declare_prefix.as_deref(), tag.namespace()) {
            builder = builder.attr(format!("xmlns:{prefix}"), ns);
        }
        Some(builder.build())
    }
}
