use std::fmt;
use std::sync::Arc;

use crate::codec::{ValidateMode, ValueCodec, Validator};
use crate::descriptor::{apply_validate_mode, ErasedAttr};
use crate::error::ParseError;
use crate::instance::{DescId, StanzaData};
use crate::tag::{IntoTag, Tag};

/// Binds one XML attribute to one instance slot, via a codec that converts
/// between wire text and a typed Rust value.
pub struct Attr<C: ValueCodec> {
    id: DescId,
    tag: Tag,
    codec: C,
    default: Option<C::Value>,
    required: bool,
    validator: Option<Arc<dyn Validator<C::Value> + Send + Sync>>,
    validate_mode: ValidateMode,
}

impl<C: ValueCodec> fmt::Debug for Attr<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attr").field("tag", &self.tag).finish()
    }
}

impl<C: ValueCodec> Attr<C> {
    pub fn new(tag: impl IntoTag, codec: C) -> Result<Self, crate::error::FormatError> {
        Ok(Self {
            id: DescId::new(),
            tag: Tag::normalize(tag)?,
            codec,
            default: None,
            required: false,
            validator: None,
            validate_mode: ValidateMode::Always,
        })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
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
            return Err(ParseError::validation("Attr", &value));
        }
        data.set(self.id, value);
        Ok(())
    }
}

impl<C> ErasedAttr for Attr<C>
where
    C: ValueCodec,
    C::Value: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn id(&self) -> DescId {
        self.id
    }

    fn attr_tag(&self) -> &Tag {
        &self.tag
    }

    fn required(&self) -> bool {
        self.required
    }

    fn parse_and_store(&self, data: &mut StanzaData, text: &str) -> Result<(), ParseError> {
        let value = self.codec.parse(text)?;
        if !apply_validate_mode(self.validator.as_deref(), &value, self.validate_mode, true) {
            return Err(ParseError::validation("Attr", &value));
        }
        data.set(self.id, value);
        Ok(())
    }

    fn finish(&self, data: &mut StanzaData) -> Result<(), ParseError> {
        if data.contains(self.id) {
            return Ok(());
        }
        if let Some(default) = self.default.clone() {
            data.set(self.id, default);
            Ok(())
        } else if self.required {
            Err(ParseError::MissingAttribute(self.tag.clone()))
        } else {
            Ok(())
        }
    }

    fn serialize(&self, data: &StanzaData) -> Option<String> {
        data.get::<C::Value>(self.id)
            .map(|v| self.codec.format(v))
            .or_else(|| self.default.as_ref().map(|v| self.codec.format(v)))
    }
}
