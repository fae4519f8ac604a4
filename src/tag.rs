//! Tag identity: `(namespace_uri, local_name)` pairs, as used throughout the
//! schema and parser modules to key attributes and child elements.

use std::fmt;

use crate::error::FormatError;

/// An XML element or attribute identity as `(namespace_uri, local_name)`.
///
/// Two tags are equal iff both components are equal; hashing uses both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    ns: Option<String>,
    local: String,
}

impl Tag {
    /// Build a tag directly from already-validated parts. Prefer
    /// [`Tag::normalize`] when the input comes from outside this crate.
    fn from_parts(ns: Option<String>, local: String) -> Result<Self, FormatError> {
        if local.is_empty() {
            return Err(FormatError::new(local, "Tag local_name"));
        }
        Ok(Self { ns, local })
    }

    /// The namespace URI, or `None` for the no-namespace marker.
    pub fn namespace(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    /// The local (unqualified) name.
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Normalize `input` into a canonical `Tag`. Accepts an ElementTree-style
    /// `"{uri}local"` string, a bare `"local"` string, or a
    /// `(namespace, local)` pair. See [`IntoTag`] for the accepted shapes.
    pub fn normalize(input: impl IntoTag) -> Result<Tag, FormatError> {
        input.into_tag()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// Conversion into a canonical [`Tag`], fallible since the textual forms can
/// be malformed.
pub trait IntoTag {
    fn into_tag(self) -> Result<Tag, FormatError>;
}

impl IntoTag for Tag {
    fn into_tag(self) -> Result<Tag, FormatError> {
        Ok(self)
    }
}

impl IntoTag for &Tag {
    fn into_tag(self) -> Result<Tag, FormatError> {
        Ok(self.clone())
    }
}

/// Parses the ElementTree string form: `"{uri}local"` or bare `"local"`.
impl IntoTag for &str {
    fn into_tag(self) -> Result<Tag, FormatError> {
        // Split on the first '}' anywhere in the string, not just when it
        // starts with '{'.
        match self.split_once('}') {
            Some((prefix, local)) => match prefix.strip_prefix('{') {
                Some(ns) => Tag::from_parts(Some(ns.to_string()), local.to_string()),
                None => Err(FormatError::new(self, "Tag etree-form (missing leading '{')")),
            },
            None => Tag::from_parts(None, self.to_string()),
        }
    }
}

impl IntoTag for String {
    fn into_tag(self) -> Result<Tag, FormatError> {
        self.as_str().into_tag()
    }
}

/// `(namespace, local)` tuple form; the no-namespace marker is `None`.
impl IntoTag for (Option<&str>, &str) {
    fn into_tag(self) -> Result<Tag, FormatError> {
        let (ns, local) = self;
        Tag::from_parts(ns.map(str::to_string), local.to_string())
    }
}

impl IntoTag for (&str, &str) {
    fn into_tag(self) -> Result<Tag, FormatError> {
        let (ns, local) = self;
        Tag::from_parts(Some(ns.to_string()), local.to_string())
    }
}

impl IntoTag for (Option<String>, String) {
    fn into_tag(self) -> Result<Tag, FormatError> {
        Tag::from_parts(self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_tag_has_no_namespace() {
        let tag = Tag::normalize("body").unwrap();
        assert_eq!(tag.namespace(), None);
        assert_eq!(tag.local_name(), "body");
    }

    #[test]
    fn etree_form_round_trips() {
        let tag = Tag::normalize("{jabber:client}body").unwrap();
        assert_eq!(tag.namespace(), Some("jabber:client"));
        assert_eq!(tag.to_string(), "{jabber:client}body");
    }

    #[test]
    fn pair_form_accepts_no_namespace() {
        let tag = Tag::normalize((None, "type")).unwrap();
        assert_eq!(tag.to_string(), "type");
    }

    #[test]
    fn malformed_etree_form_without_leading_brace_fails() {
        assert!(Tag::normalize("uri}local").is_err());
    }

    #[test]
    fn unclosed_brace_is_treated_as_bare_local_name() {
        // No '}' at all means there is nothing to split on; the whole
        // string is taken as the local name.
        let tag = Tag::normalize("{uri-without-closing-brace").unwrap();
        assert_eq!(tag.namespace(), None);
    }

    #[test]
    fn empty_local_name_fails() {
        assert!(Tag::normalize((Some("uri"), "")).is_err());
    }

    #[test]
    fn normalize_is_idempotent() {
        // normalize is idempotent: normalize(normalize(t)) == normalize(t)
        let once = Tag::normalize("{jabber:client}message").unwrap();
        let twice = Tag::normalize(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn tag_string_round_trip() {
        // round-trips through its string form: normalize(to_string(normalize(t))) == normalize(t)
        let t = Tag::normalize((Some("jabber:client"), "iq")).unwrap();
        let s = t.to_string();
        let t2 = Tag::normalize(s.as_str()).unwrap();
        assert_eq!(t, t2);
    }
}
