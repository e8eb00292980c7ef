//! Objects: the rewriteable units owned by the container.

use sepro_lang::{CounterMap, Symbol, TagList};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Stable identifier of an object within its container. Plain copyable
/// value; holding one does not keep the object alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef(u64);

impl ObjectRef {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ObjectRef {
    fn from(id: u64) -> Self {
        ObjectRef(id)
    }
}

impl From<ObjectRef> for u64 {
    fn from(id: ObjectRef) -> Self {
        id.0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The rewriteable unit: tags, counters, and slot bindings. The binding
/// map's key set *is* the declared slot set, fixed at creation, so
/// `bindings.keys ⊆ slots` holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    id: ObjectRef,
    pub tags: TagList,
    pub counters: CounterMap,
    bindings: BTreeMap<Symbol, Option<ObjectRef>>,
}

impl Object {
    pub(crate) fn new(
        id: ObjectRef,
        tags: TagList,
        counters: CounterMap,
        slots: &BTreeSet<Symbol>,
    ) -> Self {
        Self {
            id,
            tags,
            counters,
            bindings: slots.iter().map(|&slot| (slot, None)).collect(),
        }
    }

    pub fn id(&self) -> ObjectRef {
        self.id
    }

    /// Whether the slot exists on this object (bound or not).
    pub fn declares_slot(&self, slot: Symbol) -> bool {
        self.bindings.contains_key(&slot)
    }

    /// The object currently bound at `slot`, if the slot is declared and bound.
    pub fn binding(&self, slot: Symbol) -> Option<ObjectRef> {
        self.bindings.get(&slot).copied().flatten()
    }

    /// Bind or unbind a declared slot.
    pub(crate) fn set_binding(&mut self, slot: Symbol, target: Option<ObjectRef>) {
        debug_assert!(self.declares_slot(slot), "binding an undeclared slot");
        if let Some(binding) = self.bindings.get_mut(&slot) {
            *binding = target;
        }
    }

    /// Declared slots in order.
    pub fn slots(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.bindings.keys().copied()
    }

    /// Declared slots with their current bindings.
    pub fn bindings(&self) -> impl Iterator<Item = (Symbol, Option<ObjectRef>)> + '_ {
        self.bindings.iter().map(|(&slot, &target)| (slot, target))
    }
}
