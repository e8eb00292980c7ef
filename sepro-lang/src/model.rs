//! Compiled model data types consumed by the simulation engine.
//!
//! A model declares concepts (object templates), actuators (production
//! rules), worlds (initial populations), and measures (observed scalars).
//! All identifiers are interned [`Symbol`]s; predicate kinds, modifier
//! actions, and reference targets are closed sum types matched exhaustively.

use crate::symbol::{Symbol, SymbolTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A set of tag symbols with the usual set algebra.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagList {
    tags: BTreeSet<Symbol>,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Symbol) {
        self.tags.insert(tag);
    }

    pub fn contains(&self, tag: Symbol) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_subset(&self, other: &TagList) -> bool {
        self.tags.is_subset(&other.tags)
    }

    pub fn is_disjoint(&self, other: &TagList) -> bool {
        self.tags.is_disjoint(&other.tags)
    }

    pub fn union(&self, other: &TagList) -> Self {
        Self {
            tags: self.tags.union(&other.tags).copied().collect(),
        }
    }

    pub fn difference(&self, other: &TagList) -> Self {
        Self {
            tags: self.tags.difference(&other.tags).copied().collect(),
        }
    }

    /// Add every tag in `other` to this list.
    pub fn extend_from(&mut self, other: &TagList) {
        self.tags.extend(other.iter());
    }

    /// Remove every tag in `other` from this list.
    pub fn remove_all(&mut self, other: &TagList) {
        for tag in other.iter() {
            self.tags.remove(&tag);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.tags.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Symbol> for TagList {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

/// Counter bindings of an object or concept. A key that is absent is
/// distinct from a key bound to zero: guards treat them differently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterMap {
    counters: BTreeMap<Symbol, i64>,
}

impl CounterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, counter: Symbol) -> Option<i64> {
        self.counters.get(&counter).copied()
    }

    pub fn contains(&self, counter: Symbol) -> bool {
        self.counters.contains_key(&counter)
    }

    pub fn set(&mut self, counter: Symbol, value: i64) {
        self.counters.insert(counter, value);
    }

    /// Add `delta` to an existing counter; a missing key is left missing.
    pub fn add(&mut self, counter: Symbol, delta: i64) {
        if let Some(value) = self.counters.get_mut(&counter) {
            *value += delta;
        }
    }

    /// Reset an existing counter to zero; a missing key is left missing.
    pub fn clear(&mut self, counter: Symbol) {
        if let Some(value) = self.counters.get_mut(&counter) {
            *value = 0;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, i64)> + '_ {
        self.counters.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

impl FromIterator<(Symbol, i64)> for CounterMap {
    fn from_iter<I: IntoIterator<Item = (Symbol, i64)>>(iter: I) -> Self {
        Self {
            counters: iter.into_iter().collect(),
        }
    }
}

/// An object template: default tags, default counters, declared slot names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub name: Symbol,
    pub tags: TagList,
    pub counters: CounterMap,
    pub slots: BTreeSet<Symbol>,
}

impl Concept {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            tags: TagList::new(),
            counters: CounterMap::new(),
            slots: BTreeSet::new(),
        }
    }
}

/// Content test for one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredicateKind {
    /// Always true.
    All,
    /// True when every listed tag is present on the object.
    TagSet(TagList),
    /// True when the counter is present and equal to zero.
    CounterZero(Symbol),
    /// True when the slot is bound.
    IsBound(Symbol),
}

/// A predicate, optionally dereferenced through a named slot before the
/// content test runs. An unbound indirection slot fails the predicate
/// regardless of negation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub kind: PredicateKind,
    pub is_negated: bool,
    pub in_slot: Option<Symbol>,
}

impl Predicate {
    pub fn new(kind: PredicateKind) -> Self {
        Self {
            kind,
            is_negated: false,
            in_slot: None,
        }
    }

    pub fn negated(mut self) -> Self {
        self.is_negated = true;
        self
    }

    pub fn in_slot(mut self, slot: Symbol) -> Self {
        self.in_slot = Some(slot);
        self
    }
}

/// Conjunction of predicates selecting objects from the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selector {
    /// Every object matches.
    All,
    /// Objects satisfying all predicates match.
    Match { predicates: Vec<Predicate> },
}

impl Selector {
    pub fn matching<I: IntoIterator<Item = Predicate>>(predicates: I) -> Self {
        Selector::Match {
            predicates: predicates.into_iter().collect(),
        }
    }
}

/// Which object a modifier resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Root,
    This,
    Other,
}

/// A symbolic reference to an object: ROOT, THIS, or OTHER, optionally
/// dereferenced through a slot declared on the chosen object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierTarget {
    pub kind: TargetKind,
    pub slot: Option<Symbol>,
}

impl ModifierTarget {
    pub fn new(kind: TargetKind) -> Self {
        Self { kind, slot: None }
    }

    pub fn in_slot(kind: TargetKind, slot: Symbol) -> Self {
        Self {
            kind,
            slot: Some(slot),
        }
    }
}

/// The fixed set of state mutations an actuator can request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModifierAction {
    Nothing,
    SetTags(TagList),
    UnsetTags(TagList),
    Inc(Symbol),
    Dec(Symbol),
    Clear(Symbol),
    Bind { slot: Symbol, to: ModifierTarget },
    Unbind { slot: Symbol },
}

/// One mutation applied to a resolved target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub target: ModifierTarget,
    pub action: ModifierAction,
}

impl Modifier {
    /// A modifier acting on `THIS`.
    pub fn on_this(action: ModifierAction) -> Self {
        Self {
            target: ModifierTarget::new(TargetKind::This),
            action,
        }
    }

    pub fn new(target: ModifierTarget, action: ModifierAction) -> Self {
        Self { target, action }
    }
}

/// A production rule: a selector (plus optional combined selector for the
/// `other` side), modifiers, and trap/notification/halt effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actuator {
    pub selector: Selector,
    pub combined_selector: Option<Selector>,
    pub modifiers: Vec<Modifier>,
    pub traps: Vec<Symbol>,
    pub notifications: Vec<Symbol>,
    pub does_halt: bool,
}

impl Actuator {
    pub fn unary(selector: Selector, modifiers: Vec<Modifier>) -> Self {
        Self {
            selector,
            combined_selector: None,
            modifiers,
            traps: Vec::new(),
            notifications: Vec::new(),
            does_halt: false,
        }
    }

    pub fn combined(selector: Selector, combined_selector: Selector, modifiers: Vec<Modifier>) -> Self {
        Self {
            selector,
            combined_selector: Some(combined_selector),
            modifiers,
            traps: Vec::new(),
            notifications: Vec::new(),
            does_halt: false,
        }
    }

    pub fn is_combined(&self) -> bool {
        self.combined_selector.is_some()
    }
}

/// How many instances of a concept a world creates, and whether the first
/// one is remembered under an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstanceKind {
    /// One instance, remembered under the alias in the map `initialize` returns.
    Named(Symbol),
    /// `count` anonymous instances.
    Counted(u32),
}

/// Per-instance override applied on top of the concept defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    Tag(Symbol),
    Counter(Symbol, i64),
}

/// One line of a world's instance graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub concept: Symbol,
    pub kind: InstanceKind,
    pub initializers: Vec<Initializer>,
}

/// The instances a world creates, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceGraph {
    pub instances: Vec<InstanceSpec>,
}

/// Initial population descriptor: optional root concept plus instance graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub root: Option<Symbol>,
    pub graph: InstanceGraph,
}

/// Aggregation a measure folds matching objects into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregateFunction {
    /// Number of matching objects.
    Count,
    /// Sum of a counter over matching objects (missing keys contribute 0).
    Sum(Symbol),
    /// Minimum of a counter over matching objects.
    Min(Symbol),
    /// Maximum of a counter over matching objects.
    Max(Symbol),
}

/// An observed scalar: each probe pass folds every matching object through
/// the aggregate function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: Symbol,
    pub predicates: Vec<Predicate>,
    pub function: AggregateFunction,
}

/// A compiled model: everything the engine needs to run, including the
/// symbol table so downstream consumers can render names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub concepts: HashMap<Symbol, Concept>,
    pub actuators: Vec<Actuator>,
    pub worlds: HashMap<Symbol, World>,
    pub measures: Vec<Measure>,
    pub symbols: SymbolTable,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concept(&self, name: Symbol) -> Option<&Concept> {
        self.concepts.get(&name)
    }

    pub fn world(&self, name: Symbol) -> Option<&World> {
        self.worlds.get(&name)
    }

    pub fn add_concept(&mut self, concept: Concept) {
        self.concepts.insert(concept.name, concept);
    }

    pub fn add_world(&mut self, name: Symbol, world: World) {
        self.worlds.insert(name, world);
    }

    pub fn add_actuator(&mut self, actuator: Actuator) {
        self.actuators.push(actuator);
    }

    pub fn add_measure(&mut self, measure: Measure) {
        self.measures.push(measure);
    }
}
