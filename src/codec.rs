//! Value codecs: bidirectional conversions between wire text and typed Rust
//! values, plus the validator hook descriptors consult before storing a
//! parsed value.
//!
//! A small codec set (`String`, `Bool`, `Integer`, `JID`, ...) behind a
//! single object-safe trait rather than a class hierarchy, so descriptors
//! can hold `Arc<dyn ErasedAttr>` etc. without knowing the concrete codec
//! type.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::FormatError;

/// Bidirectional text <-> value conversion for one Rust type.
pub trait ValueCodec: fmt::Debug + Send + Sync {
    type Value: Clone + fmt::Debug + Send + Sync + 'static;

    /// Parse wire text into a value. Called once per attribute occurrence or
    /// once on the accumulated text of a `Text`/`ChildText` descriptor.
    fn parse(&self, text: &str) -> Result<Self::Value, FormatError>;

    /// Render a value back to wire text for serialization.
    fn format(&self, value: &Self::Value) -> String;
}

/// When a [`Validator`] runs relative to where a value came from: every
/// real validator either always checks, or only checks one direction, so
/// there's no need for a bitwise-combinable flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateMode {
    /// Only validate values obtained by parsing incoming XML.
    FromRecv,
    /// Only validate values assigned to an instance from application code.
    FromCode,
    /// Validate both directions.
    Always,
}

impl ValidateMode {
    pub fn from_recv(self) -> bool {
        matches!(self, ValidateMode::FromRecv | ValidateMode::Always)
    }

    pub fn from_code(self) -> bool {
        matches!(self, ValidateMode::FromCode | ValidateMode::Always)
    }
}

/// A post-parse or pre-assignment check on a codec's value type.
pub trait Validator<T>: fmt::Debug + Send + Sync {
    fn validate(&self, value: &T) -> bool;
}

/// Plain UTF-8 text, passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

impl ValueCodec for Str {
    type Value = String;

    fn parse(&self, text: &str) -> Result<Self::Value, FormatError> {
        Ok(text.to_string())
    }

    fn format(&self, value: &Self::Value) -> String {
        value.clone()
    }
}

/// XML-schema boolean lexical space: `true`/`false`/`1`/`0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

impl ValueCodec for Bool {
    type Value = bool;

    fn parse(&self, text: &str) -> Result<Self::Value, FormatError> {
        match text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(FormatError::new(text, "Bool")),
        }
    }

    fn format(&self, value: &Self::Value) -> String {
        if *value { "true".into() } else { "false".into() }
    }
}

/// Any integer type implementing [`FromStr`]/[`fmt::Display`], e.g.
/// `Integer::<i64>::default()` or `Integer::<u32>::default()`.
#[derive(Clone, Copy, Default)]
pub struct Integer<T>(PhantomData<T>);

impl<T> fmt::Debug for Integer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Integer<{}>", std::any::type_name::<T>())
    }
}

impl<T> ValueCodec for Integer<T>
where
    T: FromStr + fmt::Display + Clone + fmt::Debug + Send + Sync + 'static,
{
    type Value = T;

    fn parse(&self, text: &str) -> Result<Self::Value, FormatError> {
        text.trim()
            .parse()
            .map_err(|_| FormatError::new(text, "Integer"))
    }

    fn format(&self, value: &Self::Value) -> String {
        value.to_string()
    }
}

/// Base64-encoded binary payloads, as used for e.g. SASL challenge bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64;

impl ValueCodec for Base64 {
    type Value = Vec<u8>;

    fn parse(&self, text: &str) -> Result<Self::Value, FormatError> {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(text.trim())
            .map_err(|_| FormatError::new(text, "Base64"))
    }

    fn format(&self, value: &Self::Value) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(value)
    }
}

/// A bare JID in its canonical `local@domain/resource` string form.
#[derive(Debug, Clone, Copy, Default)]
pub struct JidCodec;

impl ValueCodec for JidCodec {
    type Value = jid::Jid;

    fn parse(&self, text: &str) -> Result<Self::Value, FormatError> {
        text.parse().map_err(|_| FormatError::new(text, "Jid"))
    }

    fn format(&self, value: &Self::Value) -> String {
        value.to_string()
    }
}

/// Rejects values outside `[min, max]` (inclusive).
#[derive(Debug, Clone)]
pub struct NumericRange<T> {
    pub min: T,
    pub max: T,
}

impl<T> NumericRange<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T> Validator<T> for NumericRange<T>
where
    T: PartialOrd + fmt::Debug + Send + Sync,
{
    fn validate(&self, value: &T) -> bool {
        *value >= self.min && *value <= self.max
    }
}

/// Rejects values not present in a fixed set, e.g. an enumerated attribute.
#[derive(Debug, Clone)]
pub struct RestrictToSet<T> {
    pub allowed: Vec<T>,
}

impl<T> RestrictToSet<T> {
    pub fn new(allowed: Vec<T>) -> Self {
        Self { allowed }
    }
}

impl<T> Validator<T> for RestrictToSet<T>
where
    T: PartialEq + fmt::Debug + Send + Sync,
{
    fn validate(&self, value: &T) -> bool {
        self.allowed.contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_round_trips() {
        let c = Str;
        let v = c.parse("hello").unwrap();
        assert_eq!(c.format(&v), "hello");
    }

    #[test]
    fn bool_accepts_numeric_and_lexical_forms() {
        let c = Bool;
        assert!(c.parse("true").unwrap());
        assert!(c.parse("1").unwrap());
        assert!(!c.parse("false").unwrap());
        assert!(!c.parse("0").unwrap());
        assert!(c.parse("yes").is_err());
    }

    #[test]
    fn integer_round_trips() {
        let c: Integer<i64> = Integer::default();
        assert_eq!(c.parse("-42").unwrap(), -42);
        assert_eq!(c.format(&-42), "-42");
        assert!(c.parse("not a number").is_err());
    }

    #[test]
    fn base64_round_trips() {
        let c = Base64;
        let bytes = c.parse("aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(c.format(&bytes), "aGVsbG8=");
    }

    #[test]
    fn numeric_range_validates_inclusive_bounds() {
        let v = NumericRange::new(1, 10);
        assert!(v.validate(&1));
        assert!(v.validate(&10));
        assert!(!v.validate(&0));
        assert!(!v.validate(&11));
    }

    #[test]
    fn restrict_to_set_validates_membership() {
        let v = RestrictToSet::new(vec!["get".to_string(), "set".to_string()]);
        assert!(v.validate(&"get".to_string()));
        assert!(!v.validate(&"result".to_string()));
    }
}
