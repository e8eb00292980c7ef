//! Measure probing: folds matching objects into one scalar per measure.

use crate::object::Object;
use sepro_lang::{AggregateFunction, Symbol};
use std::collections::BTreeMap;

/// One record emitted per probe pass: measure name to scalar value.
pub type Record = BTreeMap<Symbol, i64>;

/// Accumulator for a single measure over one probe pass. Built fresh per
/// pass and discarded afterwards.
#[derive(Debug)]
pub struct Probe {
    function: AggregateFunction,
    count: i64,
    sum: i64,
    min: Option<i64>,
    max: Option<i64>,
}

impl Probe {
    pub fn new(function: AggregateFunction) -> Self {
        Self {
            function,
            count: 0,
            sum: 0,
            min: None,
            max: None,
        }
    }

    /// Fold one matching object into the accumulator. Missing counter keys
    /// contribute zero.
    pub fn probe(&mut self, object: &Object) {
        match &self.function {
            AggregateFunction::Count => self.count += 1,
            AggregateFunction::Sum(counter) => {
                self.sum += object.counters.get(*counter).unwrap_or(0);
            }
            AggregateFunction::Min(counter) => {
                let value = object.counters.get(*counter).unwrap_or(0);
                self.min = Some(self.min.map_or(value, |m| m.min(value)));
            }
            AggregateFunction::Max(counter) => {
                let value = object.counters.get(*counter).unwrap_or(0);
                self.max = Some(self.max.map_or(value, |m| m.max(value)));
            }
        }
    }

    /// The accumulated scalar. Min/max over no objects yield zero.
    pub fn value(&self) -> i64 {
        match self.function {
            AggregateFunction::Count => self.count,
            AggregateFunction::Sum(_) => self.sum,
            AggregateFunction::Min(_) => self.min.unwrap_or(0),
            AggregateFunction::Max(_) => self.max.unwrap_or(0),
        }
    }
}
