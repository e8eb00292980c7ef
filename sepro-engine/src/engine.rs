//! The simulation engine: owns the model and container, drives steps.
//!
//! Each step shuffles the model's actuators with an engine-owned RNG,
//! dispatches them in that order, then runs delegate hooks, probes
//! measures, and hands collected traps to the delegate. A HALT requested
//! by an actuator stops [`run`](Engine::run) after the current step
//! completes.

use crate::container::Container;
use crate::dispatcher;
use crate::error::ModelError;
use crate::object::ObjectRef;
use crate::observers::{Delegate, Logger};
use crate::probe::{Probe, Record};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sepro_lang::{CounterMap, Initializer, InstanceKind, Model, Symbol, TagList};
use std::collections::{BTreeSet, HashMap};
use std::io;
use tracing::debug;

/// Discrete simulator over a compiled model.
pub struct Engine {
    model: Model,
    container: Container,
    step_count: u64,
    is_halted: bool,
    traps: Vec<Symbol>,
    rng: StdRng,
    delegate: Option<Box<dyn Delegate>>,
    logger: Option<Box<dyn Logger>>,
}

impl Engine {
    /// Engine over an empty container with a nondeterministic shuffle seed.
    pub fn new(model: Model) -> Self {
        Self::with_container(model, Container::new())
    }

    /// Engine over a pre-built container.
    pub fn with_container(model: Model, container: Container) -> Self {
        Self {
            model,
            container,
            step_count: 0,
            is_halted: false,
            traps: Vec::new(),
            rng: StdRng::from_entropy(),
            delegate: None,
            logger: None,
        }
    }

    /// Engine with a fixed shuffle seed, for reproducible runs.
    pub fn with_seed(model: Model, seed: u64) -> Self {
        let mut engine = Self::new(model);
        engine.rng = StdRng::seed_from_u64(seed);
        engine
    }

    pub fn set_delegate(&mut self, delegate: Box<dyn Delegate>) {
        self.delegate = Some(delegate);
    }

    pub fn set_logger(&mut self, logger: Box<dyn Logger>) {
        self.logger = Some(logger);
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Number of completed steps since construction (or the last
    /// [`reset`](Engine::reset)).
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn is_halted(&self) -> bool {
        self.is_halted
    }

    /// Repopulate the container from a declared world. The step counter and
    /// halt flag are left untouched; use [`reset`](Engine::reset) to clear
    /// them. Returns the aliased instances of the world's graph.
    pub fn initialize(&mut self, world_name: &str) -> Result<HashMap<Symbol, ObjectRef>, ModelError> {
        let world = self
            .model
            .symbols
            .get(world_name)
            .and_then(|sym| self.model.world(sym))
            .ok_or_else(|| ModelError::UnknownWorld(world_name.to_string()))?
            .clone();

        self.container.remove_all();

        let root = match world.root {
            Some(concept) => self.instantiate(concept, &[])?,
            None => self
                .container
                .create_object(TagList::new(), CounterMap::new(), &BTreeSet::new()),
        };
        self.container.set_root(root);

        let mut named = HashMap::new();
        for instance in &world.graph.instances {
            match instance.kind {
                InstanceKind::Named(alias) => {
                    let id = self.instantiate(instance.concept, &instance.initializers)?;
                    named.insert(alias, id);
                }
                InstanceKind::Counted(count) => {
                    for _ in 0..count {
                        self.instantiate(instance.concept, &instance.initializers)?;
                    }
                }
            }
        }

        debug!(world = world_name, objects = self.container.len(), "initialized");
        Ok(named)
    }

    /// Create one object from a concept, applying initializers on top of
    /// the concept's defaults. The object is tagged with the concept name.
    pub fn instantiate(
        &mut self,
        concept_name: Symbol,
        initializers: &[Initializer],
    ) -> Result<ObjectRef, ModelError> {
        let concept = self.model.concept(concept_name).ok_or_else(|| {
            ModelError::UnknownConcept(self.model.symbols.display(concept_name))
        })?;

        let mut tags = concept.tags.clone();
        tags.insert(concept_name);
        let mut counters = concept.counters.clone();
        for initializer in initializers {
            match initializer {
                Initializer::Tag(tag) => tags.insert(*tag),
                // Last write wins over the concept default
                Initializer::Counter(counter, value) => counters.set(*counter, *value),
            }
        }

        Ok(self.container.create_object(tags, counters, &concept.slots))
    }

    /// Clear the step counter, halt flag, and pending traps.
    pub fn reset(&mut self) {
        self.step_count = 0;
        self.is_halted = false;
        self.traps.clear();
    }

    /// Run one step: shuffle actuators, dispatch each, then notify
    /// observers.
    pub fn step(&mut self) {
        self.traps.clear();
        self.step_count += 1;
        debug!(step = self.step_count, "stepping");

        if let Some(delegate) = self.delegate.as_mut() {
            delegate.will_step(self.step_count);
        }

        let mut order: Vec<usize> = (0..self.model.actuators.len()).collect();
        order.shuffle(&mut self.rng);

        for index in order {
            let actuator = &self.model.actuators[index];
            let applied = dispatcher::dispatch(&mut self.container, actuator);

            // Traps and notifications fire on every dispatch, matched or not.
            self.traps.extend(actuator.traps.iter().copied());
            if let Some(logger) = self.logger.as_mut() {
                for &symbol in &actuator.notifications {
                    logger.log_notification(self.step_count, symbol);
                }
            }

            if applied {
                // Assignment, not OR: a later actuator that applied
                // overwrites an earlier halt request in the same step.
                self.is_halted = actuator.does_halt;
            }
        }

        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_step(self.step_count);
        }

        if self.logger.is_some() {
            self.probe();
        }

        if !self.traps.is_empty() {
            if let Some(delegate) = self.delegate.as_mut() {
                delegate.handle_trap(self.step_count, &self.traps);
            }
        }
    }

    /// Run up to `steps` steps, stopping early after a step that raised
    /// HALT. The halting step's delegate callbacks still fire.
    pub fn run(&mut self, steps: u64) {
        if let Some(logger) = self.logger.as_mut() {
            logger.logging_will_start(&self.model.measures, steps);
        }
        if self.logger.is_some() {
            self.probe();
        }

        if let Some(delegate) = self.delegate.as_mut() {
            delegate.will_run();
        }

        let mut steps_run = 0;
        for _ in 0..steps {
            self.step();
            steps_run += 1;
            if self.is_halted {
                if let Some(delegate) = self.delegate.as_mut() {
                    delegate.handle_halt(self.step_count);
                }
                break;
            }
        }

        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_run();
        }
        if let Some(logger) = self.logger.as_mut() {
            logger.logging_did_end(steps_run);
        }
    }

    /// Evaluate every measure over the container and hand the record to the
    /// logger.
    fn probe(&mut self) {
        let Some(logger) = self.logger.as_mut() else {
            return;
        };

        let mut record = Record::new();
        for measure in &self.model.measures {
            let mut probe = Probe::new(measure.function.clone());
            for object in self.container.iter() {
                if self.container.predicates_match(&measure.predicates, object.id()) {
                    probe.probe(object);
                }
            }
            record.insert(measure.name, probe.value());
        }

        logger.log_record(self.step_count, &record);
    }

    /// Write a human-readable dump of the engine state.
    pub fn debug_dump(&self, out: &mut impl io::Write) -> io::Result<()> {
        let symbols = &self.model.symbols;
        writeln!(
            out,
            "step {} halted {} objects {}",
            self.step_count,
            self.is_halted,
            self.container.len()
        )?;

        for object in self.container.iter() {
            let marker = if self.container.has_root() && self.container.root() == object.id() {
                " root"
            } else {
                ""
            };
            write!(out, "{}{}:", object.id(), marker)?;

            let tags = object
                .tags
                .iter()
                .map(|tag| symbols.display(tag))
                .collect::<Vec<_>>()
                .join(",");
            write!(out, " tags[{}]", tags)?;

            if !object.counters.is_empty() {
                let counters = object
                    .counters
                    .iter()
                    .map(|(counter, value)| format!("{}={}", symbols.display(counter), value))
                    .collect::<Vec<_>>()
                    .join(",");
                write!(out, " counters[{}]", counters)?;
            }

            let bindings = object
                .bindings()
                .map(|(slot, target)| match target {
                    Some(target) => format!("{}->{}", symbols.display(slot), target),
                    None => format!("{}->", symbols.display(slot)),
                })
                .collect::<Vec<_>>()
                .join(",");
            if !bindings.is_empty() {
                write!(out, " slots[{}]", bindings)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
