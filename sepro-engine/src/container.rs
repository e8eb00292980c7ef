//! The container: an arena owning every object in a simulation.
//!
//! Objects are created and destroyed only through the container and are
//! referenced everywhere else by [`ObjectRef`]. Slot bindings may form
//! cycles; keeping ownership in one arena keyed by integer refs breaks
//! those cycles.

use crate::object::{Object, ObjectRef};
use sepro_lang::{CounterMap, Predicate, PredicateKind, Selector, Symbol, TagList};
use std::collections::{BTreeMap, BTreeSet};

/// Arena owning all objects, with a distinguished root and a monotone id
/// counter. Ids are unique for the container's lifetime until
/// [`remove_all`](Container::remove_all) resets it.
#[derive(Debug, Clone, Default)]
pub struct Container {
    objects: BTreeMap<ObjectRef, Object>,
    root: Option<ObjectRef>,
    next_id: u64,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh object. Each declared slot starts unbound.
    pub fn create_object(
        &mut self,
        tags: TagList,
        counters: CounterMap,
        slots: &BTreeSet<Symbol>,
    ) -> ObjectRef {
        let id = ObjectRef::new(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, Object::new(id, tags, counters, slots));
        id
    }

    pub fn get(&self, id: ObjectRef) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectRef) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Empty the container and reset the id counter. The root becomes
    /// invalid until reassigned.
    pub fn remove_all(&mut self) {
        self.objects.clear();
        self.root = None;
        self.next_id = 0;
    }

    pub fn set_root(&mut self, root: ObjectRef) {
        debug_assert!(self.objects.contains_key(&root));
        self.root = Some(root);
    }

    /// The distinguished root object. Panics when no world has been
    /// initialized; resolving ROOT without a root is a programmer error.
    pub fn root(&self) -> ObjectRef {
        self.root.expect("container has no root object")
    }

    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    /// Ids of every object satisfying the selector, snapshotted before any
    /// caller-side mutation. A single pass over the result sees each
    /// matching object at most once; dereference through
    /// [`get`](Container::get) re-checks existence.
    pub fn select(&self, selector: &Selector) -> Vec<ObjectRef> {
        match selector {
            Selector::All => self.objects.keys().copied().collect(),
            Selector::Match { predicates } => self
                .objects
                .values()
                .filter(|object| {
                    predicates
                        .iter()
                        .all(|predicate| self.predicate_matches(predicate, object))
                })
                .map(|object| object.id())
                .collect(),
        }
    }

    /// Re-evaluate a predicate list against the object currently referred
    /// to by `id`. Used for the post-mutation recheck in combined dispatch
    /// and by measure probing.
    pub fn predicates_match(&self, predicates: &[Predicate], id: ObjectRef) -> bool {
        match self.get(id) {
            Some(object) => predicates
                .iter()
                .all(|predicate| self.predicate_matches(predicate, object)),
            None => false,
        }
    }

    /// Evaluate one predicate against an object. An `in_slot` indirection
    /// through an unbound slot fails regardless of negation; otherwise the
    /// content test runs on the bound object and negation applies last.
    pub fn predicate_matches(&self, predicate: &Predicate, object: &Object) -> bool {
        let subject = match predicate.in_slot {
            Some(slot) => match object.binding(slot) {
                Some(target) => self
                    .get(target)
                    .expect("slot binding refers to a removed object"),
                None => return false,
            },
            None => object,
        };

        let base = match &predicate.kind {
            PredicateKind::All => true,
            PredicateKind::TagSet(tags) => tags.is_subset(&subject.tags),
            PredicateKind::CounterZero(counter) => subject.counters.get(*counter) == Some(0),
            PredicateKind::IsBound(slot) => subject.binding(*slot).is_some(),
        };

        base != predicate.is_negated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sepro_lang::SymbolTable;

    fn tags(table: &mut SymbolTable, names: &[&str]) -> TagList {
        names.iter().map(|n| table.intern(n)).collect()
    }

    #[test]
    fn test_create_assigns_unique_monotone_ids() {
        let mut container = Container::new();
        let a = container.create_object(TagList::new(), CounterMap::new(), &BTreeSet::new());
        let b = container.create_object(TagList::new(), CounterMap::new(), &BTreeSet::new());
        assert_ne!(a, b);
        assert!(a.as_u64() < b.as_u64());
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_remove_all_resets_ids_and_root() {
        let mut container = Container::new();
        let a = container.create_object(TagList::new(), CounterMap::new(), &BTreeSet::new());
        container.set_root(a);
        container.remove_all();
        assert!(container.is_empty());
        assert!(!container.has_root());

        let b = container.create_object(TagList::new(), CounterMap::new(), &BTreeSet::new());
        assert_eq!(b.as_u64(), 0);
    }

    #[test]
    fn test_select_all_and_by_tags() {
        let mut table = SymbolTable::new();
        let mut container = Container::new();
        container.create_object(tags(&mut table, &["link", "free"]), CounterMap::new(), &BTreeSet::new());
        container.create_object(tags(&mut table, &["link"]), CounterMap::new(), &BTreeSet::new());

        assert_eq!(container.select(&Selector::All).len(), 2);

        let free = Predicate::new(PredicateKind::TagSet(tags(&mut table, &["free"])));
        let matching = container.select(&Selector::matching([free]));
        assert_eq!(matching.len(), 1);
    }

    #[test]
    fn test_counter_zero_predicate_distinguishes_absence() {
        let mut table = SymbolTable::new();
        let fuse = table.intern("fuse");
        let mut container = Container::new();

        let mut zeroed = CounterMap::new();
        zeroed.set(fuse, 0);
        let with_zero = container.create_object(TagList::new(), zeroed, &BTreeSet::new());
        let without = container.create_object(TagList::new(), CounterMap::new(), &BTreeSet::new());

        let zero = Predicate::new(PredicateKind::CounterZero(fuse));
        assert!(container.predicates_match(&[zero.clone()], with_zero));
        // Absent counter is not zero
        assert!(!container.predicates_match(&[zero], without));
    }

    #[test]
    fn test_unbound_in_slot_fails_even_when_negated() {
        let mut table = SymbolTable::new();
        let left = table.intern("left");
        let slots: BTreeSet<Symbol> = [left].into_iter().collect();
        let mut container = Container::new();
        let holder = container.create_object(TagList::new(), CounterMap::new(), &slots);

        let through_slot = Predicate::new(PredicateKind::All).in_slot(left);
        assert!(!container.predicates_match(&[through_slot.clone()], holder));

        let negated = through_slot.negated();
        assert!(!container.predicates_match(&[negated], holder));
    }

    #[test]
    fn test_in_slot_predicate_follows_binding() {
        let mut table = SymbolTable::new();
        let left = table.intern("left");
        let slots: BTreeSet<Symbol> = [left].into_iter().collect();
        let mut container = Container::new();

        let target = container.create_object(tags(&mut table, &["free"]), CounterMap::new(), &BTreeSet::new());
        let holder = container.create_object(TagList::new(), CounterMap::new(), &slots);
        container.get_mut(holder).unwrap().set_binding(left, Some(target));

        let free = Predicate::new(PredicateKind::TagSet(tags(&mut table, &["free"]))).in_slot(left);
        assert!(container.predicates_match(&[free], holder));
    }

    #[test]
    fn test_is_bound_predicate() {
        let mut table = SymbolTable::new();
        let next = table.intern("next");
        let slots: BTreeSet<Symbol> = [next].into_iter().collect();
        let mut container = Container::new();

        let a = container.create_object(TagList::new(), CounterMap::new(), &slots);
        let b = container.create_object(TagList::new(), CounterMap::new(), &slots);
        container.get_mut(a).unwrap().set_binding(next, Some(b));

        let bound = Predicate::new(PredicateKind::IsBound(next));
        assert!(container.predicates_match(&[bound.clone()], a));
        assert!(!container.predicates_match(&[bound.clone()], b));
        assert!(container.predicates_match(&[bound.negated()], b));
    }
}
