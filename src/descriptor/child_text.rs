use std::fmt;
use std::sync::Arc;

use minidom::Element;

use crate::codec::{ValidateMode, ValueCodec, Validator};
use crate::descriptor::{apply_validate_mode, ErasedChildText};
use crate::error::ParseError;
use crate::instance::{DescId, StanzaData};
use crate::schema::{UnknownAttrPolicy, UnknownChildPolicy};
use crate::tag::{IntoTag, Tag};

/// A single child element whose own text content is the value of interest,
/// e.g. `<status>Away</status>` nested inside a `<presence/>`. Unlike
/// [`crate::descriptor::Child`] the child is not itself a stanza class: its
/// only meaningful content is the text node, decoded through a codec same
/// as [`crate::descriptor::Attr`] or [`crate::descriptor::Text`].
pub struct ChildText<C: ValueCodec> {
    id: DescId,
    tag: Tag,
    codec: C,
    default: Option<C::Value>,
    validator: Option<Arc<dyn Validator<C::Value> + Send + Sync>>,
    validate_mode: ValidateMode,
    attr_policy: UnknownAttrPolicy,
    child_policy: UnknownChildPolicy,
    declare_prefix: Option<String>,
}

impl<C: ValueCodec> fmt::Debug for ChildText<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildText").field("tag", &self.tag).finish()
    }
}

impl<C: ValueCodec> ChildText<C> {
    /// Own attributes default to DROP and nested children to FAIL, matching
    /// the narrow case a `ChildText` is meant for: a leaf text element with
    /// no substructure of its own.
    pub fn new(tag: impl IntoTag, codec: C) -> Result<Self, crate::error::FormatError> {
        Ok(Self {
            id: DescId::new(),
            tag: Tag::normalize(tag)?,
            codec,
            default: None,
            validator: None,
            validate_mode: ValidateMode::Always,
            attr_policy: UnknownAttrPolicy::Drop,
            child_policy: UnknownChildPolicy::Fail,
            declare_prefix: None,
        })
    }

    pub fn with_default(mut self, default: C::Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_validator(
        mut self,
        validator: Arc<dyn Validator<C::Value> + Send + Sync>,
        mode: ValidateMode,
    ) -> Self {
        self.validator = Some(validator);
        self.validate_mode = mode;
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

    /// A namespace prefix hint declared on the emitted element, e.g.
    /// `xmlns:stream="..."`. Purely a serialization hint; parsing is
    /// unaffected by which prefix the wire used.
    pub fn with_declare_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.declare_prefix = Some(prefix.into());
        self
    }

    pub fn id(&self) -> DescId {
        self.id
    }

    pub fn get<'a>(&self, data: &'a StanzaData) -> Option<&'a C::Value> {
        data.get::<C::Value>(self.id)
    }

    pub fn set(&self, data: &mut StanzaData, value: C::Value) -> Result<(), ParseError> {
        if !apply_validate_mode(
            self.validator.as_deref(),
            &value,
            self.validate_mode,
            false,
        ) {
            return Err(ParseError::validation("ChildText", &value));
        }
        data.set(self.id, value);
        Ok(())
    }
}

impl<C> ErasedChildText for ChildText<C>
where
    C: ValueCodec,
    C::Value: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn id(&self) -> DescId {
        self.id
    }

    fn child_tag(&self) -> &Tag {
        &self.tag
    }

    fn attr_policy(&self) -> UnknownAttrPolicy {
        self.attr_policy
    }

    fn child_policy(&self) -> UnknownChildPolicy {
        self.child_policy
    }

    fn parse_and_store(&self, data: &mut StanzaData, text: &str) -> Result<(), ParseError> {
        let value = self.codec.parse(text)?;
        if !apply_validate_mode(self.validator.as_deref(), &value, self.validate_mode, true) {
            return Err(ParseError::validation("ChildText", &value));
        }
        data.set(self.id, value);
        Ok(())
    }

    fn serialize(&self, data: &StanzaData) -> Option<Element> {
        let value = data.get::<C::Value>(self.id).or(self.default.as_ref())?;
        let text = self.codec.format(value);
        Some(build_element(&self.tag, &text, self.declare_prefix.as_deref()))
    }
}

fn build_element(tag: &Tag, text: &str, declare_prefix: Option<&str>) -> Element {
    let mut builder = Element::builder(tag.local_name(), tag.namespace().unwrap_or_default());
    if let (Some(prefix), Some(ns)) = (declare_prefix, tag.namespace()) {
        builder = builder.attr(format!("xmlns:{prefix}"), ns);
    }
    builder = builder.append(text);
    builder.build()
}
