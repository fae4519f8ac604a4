use std::fmt;
use std::sync::Arc;

use crate::codec::{ValidateMode, ValueCodec, Validator};
use crate::descriptor::{apply_validate_mode, ErasedText};
use crate::error::ParseError;
use crate::instance::{DescId, StanzaData};

/// Binds the character-data content of an element directly (not a child
/// element's content — see [`crate::descriptor::ChildText`] for that) to one
/// instance slot. At most one `Text` descriptor may be reachable on a class.
pub struct Text<C: ValueCodec> {
    id: DescId,
    codec: C,
    default: Option<C::Value>,
    validator: Option<Arc<dyn Validator<C::Value> + Send + Sync>>,
    validate_mode: ValidateMode,
}

impl<C: ValueCodec> fmt::Debug for Text<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Text").finish()
    }
}

impl<C: ValueCodec> Text<C> {
    pub fn new(codec: C) -> Self {
        Self {
            id: DescId::new(),
            codec,
            default: None,
            validator: None,
            validate_mode: ValidateMode::Always,
        }
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
            return Err(ParseError::validation("Text", &value));
        }
        data.set(self.id, value);
        Ok(())
    }
}

impl<C> ErasedText for Text<C>
where
    C: ValueCodec,
    C::Value: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn id(&self) -> DescId {
        self.id
    }

    fn parse_and_store(&self, data: &mut StanzaData, text: &str) -> Result<(), ParseError> {
        let value = self.codec.parse(text)?;
        if !apply_validate_mode(self.validator.as_deref(), &value, self.validate_mode, true) {
            return Err(ParseError::validation("Text", &value));
        }
        data.set(self.id, value);
        Ok(())
    }

    fn serialize(&self, data: &StanzaData) -> Option<String> {
        data.get::<C::Value>(self.id)
            .map(|v| self.codec.format(v))
            .or_else(|| self.default.as_ref().map(|v| self.codec.format(v)))
    }
}
