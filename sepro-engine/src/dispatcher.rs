//! Actuator dispatch: unary and combined (cartesian) evaluation.

use crate::container::Container;
use crate::executor;
use sepro_lang::{Actuator, Selector};
use tracing::trace;

/// Evaluate one actuator against the container, applying its modifier
/// group to every matching object (or object pair). Returns whether at
/// least one group was applied.
pub fn dispatch(container: &mut Container, actuator: &Actuator) -> bool {
    match &actuator.combined_selector {
        Some(combined) => dispatch_combined(container, actuator, combined),
        None => dispatch_unary(container, actuator),
    }
}

/// All modifiers of the actuator apply to one `this` as a group, or none
/// do. No atomicity holds between distinct `this` objects.
fn dispatch_unary(container: &mut Container, actuator: &Actuator) -> bool {
    let mut applied = false;

    for this in container.select(&actuator.selector) {
        if actuator
            .modifiers
            .iter()
            .all(|modifier| executor::can_apply(container, modifier, this, None))
        {
            for modifier in &actuator.modifiers {
                executor::apply(container, modifier, this, None);
            }
            trace!(this = %this, "applied modifier group");
            applied = true;
        }
    }

    applied
}

/// Cartesian evaluation over `thisSet × otherSet`. Both sets are
/// snapshotted up front; object contents may still mutate while the loops
/// run, which is intentional. An object is never paired with itself. After
/// a group applies, the left selector is re-checked against `this` and the
/// inner loop breaks once `this` no longer satisfies it.
fn dispatch_combined(
    container: &mut Container,
    actuator: &Actuator,
    combined_selector: &Selector,
) -> bool {
    let this_set = container.select(&actuator.selector);
    let other_set = container.select(combined_selector);
    let mut applied = false;

    for this in this_set {
        for &other in &other_set {
            if this == other {
                continue;
            }
            if !actuator
                .modifiers
                .iter()
                .all(|modifier| executor::can_apply(container, modifier, this, Some(other)))
            {
                continue;
            }
            for modifier in &actuator.modifiers {
                executor::apply(container, modifier, this, Some(other));
            }
            trace!(this = %this, other = %other, "applied modifier group");
            applied = true;

            if let Selector::Match { predicates } = &actuator.selector {
                if !container.predicates_match(predicates, this) {
                    break;
                }
            }
        }
    }

    applied
}
