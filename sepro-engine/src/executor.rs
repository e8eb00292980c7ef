//! Reference resolution and modifier execution.
//!
//! A modifier runs in two phases: `can_apply` resolves its target under the
//! current `(this, other)` binding pair and checks the action's guard;
//! `apply` performs the mutation. The dispatcher only calls `apply` after
//! every guard in the actuator's modifier group passed, and `apply` treats
//! a target that resolves to nothing as a no-op, since earlier modifiers in
//! the same group may have changed what a later target resolves to.

use crate::container::Container;
use crate::object::ObjectRef;
use sepro_lang::{Modifier, ModifierAction, ModifierTarget, TargetKind};

/// Map a symbolic target to the concrete object it refers to under the
/// given binding pair.
///
/// Returns `None` when the target dereferences an unbound slot: there is
/// nothing to act on. Dereferencing a slot the chosen object does not
/// declare is a model bug and panics.
pub fn resolve(
    container: &Container,
    target: &ModifierTarget,
    this: ObjectRef,
    other: Option<ObjectRef>,
) -> Option<ObjectRef> {
    let chosen = match target.kind {
        TargetKind::Root => container.root(),
        TargetKind::This => this,
        TargetKind::Other => other.expect("OTHER target resolved outside combined dispatch"),
    };

    let slot = match target.slot {
        None => return Some(chosen),
        Some(slot) => slot,
    };

    let object = container
        .get(chosen)
        .expect("target refers to a removed object");
    assert!(
        object.declares_slot(slot),
        "target dereferences slot {:?} which {} does not declare",
        slot,
        chosen
    );

    let bound = object.binding(slot)?;
    // Dangling bindings are forbidden
    container
        .get(bound)
        .expect("slot binding refers to a removed object");
    Some(bound)
}

/// Guard phase: whether the modifier may fire for this pair.
pub fn can_apply(
    container: &Container,
    modifier: &Modifier,
    this: ObjectRef,
    other: Option<ObjectRef>,
) -> bool {
    let current = resolve(container, &modifier.target, this, other);

    match &modifier.action {
        // Unconditional; apply tolerates an unresolved target.
        ModifierAction::Nothing | ModifierAction::SetTags(_) | ModifierAction::UnsetTags(_) => true,
        ModifierAction::Inc(counter) | ModifierAction::Clear(counter) => current
            .and_then(|id| container.get(id))
            .map_or(false, |object| object.counters.contains(*counter)),
        ModifierAction::Dec(counter) => current
            .and_then(|id| container.get(id))
            .map_or(false, |object| object.counters.get(*counter).map_or(false, |v| v > 0)),
        ModifierAction::Bind { slot, to } => {
            let target = resolve(container, to, this, other);
            match (current, target) {
                (Some(current), Some(_)) => container
                    .get(current)
                    .map_or(false, |object| object.declares_slot(*slot)),
                _ => false,
            }
        }
        ModifierAction::Unbind { slot } => current
            .and_then(|id| container.get(id))
            .map_or(false, |object| object.declares_slot(*slot)),
    }
}

/// Apply phase. Every guard in the group has already passed; a target that
/// no longer resolves is skipped.
pub fn apply(
    container: &mut Container,
    modifier: &Modifier,
    this: ObjectRef,
    other: Option<ObjectRef>,
) {
    let current = resolve(container, &modifier.target, this, other);

    match &modifier.action {
        ModifierAction::Nothing => {}
        ModifierAction::SetTags(tags) => {
            if let Some(object) = current.and_then(|id| container.get_mut(id)) {
                object.tags.extend_from(tags);
            }
        }
        ModifierAction::UnsetTags(tags) => {
            if let Some(object) = current.and_then(|id| container.get_mut(id)) {
                object.tags.remove_all(tags);
            }
        }
        ModifierAction::Inc(counter) => {
            if let Some(object) = current.and_then(|id| container.get_mut(id)) {
                object.counters.add(*counter, 1);
            }
        }
        ModifierAction::Dec(counter) => {
            if let Some(object) = current.and_then(|id| container.get_mut(id)) {
                object.counters.add(*counter, -1);
            }
        }
        ModifierAction::Clear(counter) => {
            if let Some(object) = current.and_then(|id| container.get_mut(id)) {
                object.counters.clear(*counter);
            }
        }
        ModifierAction::Bind { slot, to } => {
            let target = resolve(container, to, this, other);
            if let (Some(current), Some(target)) = (current, target) {
                if let Some(object) = container.get_mut(current) {
                    object.set_binding(*slot, Some(target));
                }
            }
        }
        ModifierAction::Unbind { slot } => {
            // Kept from the reference engine: unbind always writes on
            // `this`, not on the resolved modifier target.
            if let Some(object) = container.get_mut(this) {
                if object.declares_slot(*slot) {
                    object.set_binding(*slot, None);
                }
            }
        }
    }
}
