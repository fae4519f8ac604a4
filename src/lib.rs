//! Declarative, schema-driven binding between XML elements and typed Rust
//! objects.
//!
//! A stanza class declares its wire shape once, as a [`schema::Schema`] of
//! [`descriptor`] entries (attributes, text content, nested child classes),
//! and the rest of the crate drives that schema in both directions: an
//! event stream in through [`parser`] and [`dispatcher`], a finished
//! instance back out through [`ser`]. [`tag`] is the namespace-qualified
//! identity both directions key off of.
//!
//! Nothing here speaks to a particular protocol's stanza catalogue, a
//! network transport, or a stream's framing; this crate only binds already
//! namespace-resolved XML to Rust values and back.

pub mod codec;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod instance;
pub mod parser;
pub mod sax;
pub mod schema;
pub mod ser;
pub mod tag;

pub use dispatcher::StanzaParser;
pub use error::{ParseError, SchemaError};
pub use event::Event;
pub use instance::{DescId, DynStanzaObject, HasStanzaData, StanzaClass, StanzaData, StanzaObject};
pub use schema::{Schema, SchemaBuilder};
pub use tag::Tag;
