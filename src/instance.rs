//! Instance storage and the object/class trait split.
//!
//! Rust has no descriptor protocol, so the attribute/child binding idea is
//! built explicitly: every instance carries a [`StanzaData`] property bag
//! keyed by [`DescId`], and descriptors (see [`crate::descriptor`]) are
//! handed a `&StanzaData`/`&mut StanzaData` to read and write their own slot
//! by identity rather than by name.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::schema::Schema;
use crate::tag::Tag;

/// Unique identity of one descriptor instance, assigned at descriptor
/// construction time. Two descriptors never collide, even if declared on
/// unrelated classes, which is what lets [`StanzaData`] use a flat map
/// instead of a per-class layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescId(u64);

impl DescId {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for DescId {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-instance storage for every descriptor-owned slot, type-erased since
/// one bag holds values of unrelated types (strings, JIDs, child object
/// lists, ...).
#[derive(Default)]
pub struct StanzaData {
    slots: HashMap<DescId, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for StanzaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StanzaData")
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl StanzaData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: 'static>(&self, id: DescId) -> Option<&T> {
        self.slots.get(&id).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self, id: DescId) -> Option<&mut T> {
        self.slots.get_mut(&id).and_then(|v| v.downcast_mut())
    }

    pub fn set<T: Send + Sync + 'static>(&mut self, id: DescId, value: T) {
        self.slots.insert(id, Box::new(value));
    }

    pub fn remove(&mut self, id: DescId) {
        self.slots.remove(&id);
    }

    pub fn contains(&self, id: DescId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Returns the existing slot value, inserting `default()` first if the
    /// slot is empty. Used by `ChildList`/`ChildMap`/`Collector`, whose
    /// storage is always present once touched, never `Option`-wrapped.
    pub fn get_or_insert_with<T, F>(&mut self, id: DescId, default: F) -> &mut T
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.slots
            .entry(id)
            .or_insert_with(|| Box::new(default()))
            .downcast_mut()
            .expect("slot type mismatch for DescId")
    }
}

/// Object-safe view of a stanza instance: anything a descriptor or the
/// schema/parser layer needs regardless of concrete class.
pub trait StanzaObject: HasStanzaData + fmt::Debug + Send + Sync {
    /// The tag this *instance* was parsed as, or will serialize as.
    fn tag(&self) -> &Tag;

    /// The originating class's schema, reached without knowing the concrete
    /// type. This is what lets [`crate::ser::serialize_object`] walk an
    /// arbitrary `&DynStanzaObject` tree.
    fn schema_dyn(&self) -> &'static Schema;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// `dyn StanzaObject` alone isn't known to the type system to be
/// `Send + Sync`, even though every type that can implement `StanzaObject`
/// must be (it's one of the trait's own supertraits) — a trait object
/// doesn't automatically pick up its principal trait's auto-trait
/// supertraits, those have to be spelled out on the object type itself.
/// This is the boxed, properly-annotated form used everywhere a finished
/// child instance is stored or passed around.
pub type DynStanzaObject = dyn StanzaObject + Send + Sync;

/// Accessor trait implemented by every generated stanza struct, giving
/// descriptors a uniform way to reach the property bag without matching on
/// the concrete type.
pub trait HasStanzaData {
    fn stanza_data(&self) -> &StanzaData;
    fn stanza_data_mut(&mut self) -> &mut StanzaData;
}

/// Sized, concrete-class trait implemented by every `#[derive]`d or
/// hand-written stanza struct. Distinct from [`StanzaObject`] because
/// `schema()` returns `&'static Schema`, which requires `Self: Sized` to
/// resolve via a type-level registry rather than a vtable slot.
pub trait StanzaClass: HasStanzaData + fmt::Debug + Send + Sync + Sized + 'static {
    /// The default tag this class parses/serializes as.
    const TAG: &'static str;

    /// The class's schema, built once and cached (see
    /// `crate::schema::schema_for`).
    fn schema() -> &'static Schema;

    /// Construct a fresh, empty instance during parsing. Populated
    /// incrementally by [`crate::parser::UnitParser`] as events arrive.
    fn new_empty(tag: Tag) -> Self;
}

impl<T: StanzaClass> StanzaObject for T {
    fn tag(&self) -> &Tag {
        self.stanza_data()
            .get::<Tag>(instance_tag_slot())
            .expect("instance tag slot populated by new_empty")
    }

    fn schema_dyn(&self) -> &'static Schema {
        T::schema()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The well-known slot every [`StanzaClass::new_empty`] populates with the
/// instance's resolved tag. A single process-wide id is fine: it is never
/// compared against a descriptor's own id, only used as a private key.
pub fn instance_tag_slot() -> DescId {
    static SLOT: std::sync::OnceLock<DescId> = std::sync::OnceLock::new();
    *SLOT.get_or_init(DescId::new)
}
