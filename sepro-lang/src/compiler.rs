//! Lowers the declaration AST into a compiled [`Model`].
//!
//! Interns every name, assembles concepts/actuators/worlds/measures, and
//! rejects duplicate declarations. References to concepts that were never
//! declared are left for the engine to report at world initialization, so a
//! model library can be compiled piecemeal.

use crate::error::{Result, SeproError};
use crate::model::{
    Actuator, AggregateFunction, Concept, Initializer, InstanceGraph, InstanceKind, InstanceSpec,
    Measure, Model, Modifier, ModifierAction, ModifierTarget, Predicate, PredicateKind, Selector,
    TagList, TargetKind, World,
};
use crate::parser::{
    ActionDecl, ActuatorDecl, ConceptDecl, Declaration, FunctionDecl, InstanceDecl, MeasureDecl,
    ModifierDecl, PredicateDecl, PredicateKindDecl, SelectorDecl, TargetDecl, TargetKindDecl,
    WorldDecl,
};
use crate::symbol::SymbolTable;

/// Compiles parsed declarations into a `Model`, interning as it goes.
pub struct Compiler {
    symbols: SymbolTable,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
        }
    }

    pub fn compile(mut self, declarations: &[Declaration]) -> Result<Model> {
        let mut model = Model::new();

        for declaration in declarations {
            match declaration {
                Declaration::Concept(decl) => {
                    let concept = self.compile_concept(decl);
                    if model.concepts.contains_key(&concept.name) {
                        return Err(duplicate("concept", &decl.name));
                    }
                    model.add_concept(concept);
                }
                Declaration::Actuator(decl) => {
                    model.add_actuator(self.compile_actuator(decl));
                }
                Declaration::World(decl) => {
                    let name = self.symbols.intern(&decl.name);
                    if model.worlds.contains_key(&name) {
                        return Err(duplicate("world", &decl.name));
                    }
                    let world = self.compile_world(decl);
                    model.add_world(name, world);
                }
                Declaration::Measure(decl) => {
                    let measure = self.compile_measure(decl);
                    if model.measures.iter().any(|m| m.name == measure.name) {
                        return Err(duplicate("measure", &decl.name));
                    }
                    model.add_measure(measure);
                }
            }
        }

        model.symbols = self.symbols;
        Ok(model)
    }

    fn compile_concept(&mut self, decl: &ConceptDecl) -> Concept {
        let mut concept = Concept::new(self.symbols.intern(&decl.name));
        for tag in &decl.tags {
            concept.tags.insert(self.symbols.intern(tag));
        }
        for slot in &decl.slots {
            concept.slots.insert(self.symbols.intern(slot));
        }
        for (counter, value) in &decl.counters {
            concept.counters.set(self.symbols.intern(counter), *value);
        }
        concept
    }

    fn compile_actuator(&mut self, decl: &ActuatorDecl) -> Actuator {
        Actuator {
            selector: self.compile_selector(&decl.selector),
            combined_selector: decl.combined.as_ref().map(|s| self.compile_selector(s)),
            modifiers: decl.modifiers.iter().map(|m| self.compile_modifier(m)).collect(),
            traps: decl.traps.iter().map(|t| self.symbols.intern(t)).collect(),
            notifications: decl
                .notifications
                .iter()
                .map(|n| self.symbols.intern(n))
                .collect(),
            does_halt: decl.does_halt,
        }
    }

    fn compile_selector(&mut self, decl: &SelectorDecl) -> Selector {
        match decl {
            SelectorDecl::All => Selector::All,
            SelectorDecl::Match(predicates) => Selector::Match {
                predicates: predicates.iter().map(|p| self.compile_predicate(p)).collect(),
            },
        }
    }

    fn compile_predicate(&mut self, decl: &PredicateDecl) -> Predicate {
        let kind = match &decl.kind {
            PredicateKindDecl::Tag(tag) => {
                PredicateKind::TagSet([self.symbols.intern(tag)].into_iter().collect())
            }
            PredicateKindDecl::Zero(counter) => {
                PredicateKind::CounterZero(self.symbols.intern(counter))
            }
            PredicateKindDecl::Bound(slot) => PredicateKind::IsBound(self.symbols.intern(slot)),
        };

        Predicate {
            kind,
            is_negated: decl.negated,
            in_slot: decl.in_slot.as_ref().map(|s| self.symbols.intern(s)),
        }
    }

    fn compile_modifier(&mut self, decl: &ModifierDecl) -> Modifier {
        let action = match &decl.action {
            ActionDecl::Nothing => ModifierAction::Nothing,
            ActionDecl::Set(tags) => ModifierAction::SetTags(self.intern_tags(tags)),
            ActionDecl::Unset(tags) => ModifierAction::UnsetTags(self.intern_tags(tags)),
            ActionDecl::Inc(counter) => ModifierAction::Inc(self.symbols.intern(counter)),
            ActionDecl::Dec(counter) => ModifierAction::Dec(self.symbols.intern(counter)),
            ActionDecl::Zero(counter) => ModifierAction::Clear(self.symbols.intern(counter)),
            ActionDecl::Bind { slot, to } => ModifierAction::Bind {
                slot: self.symbols.intern(slot),
                to: self.compile_target(to),
            },
            ActionDecl::Unbind(slot) => ModifierAction::Unbind {
                slot: self.symbols.intern(slot),
            },
        };

        Modifier::new(self.compile_target(&decl.target), action)
    }

    fn compile_target(&mut self, decl: &TargetDecl) -> ModifierTarget {
        let kind = match decl.kind {
            TargetKindDecl::Root => TargetKind::Root,
            TargetKindDecl::This => TargetKind::This,
            TargetKindDecl::Other => TargetKind::Other,
        };

        ModifierTarget {
            kind,
            slot: decl.slot.as_ref().map(|s| self.symbols.intern(s)),
        }
    }

    fn compile_world(&mut self, decl: &WorldDecl) -> World {
        let instances = decl
            .instances
            .iter()
            .map(|instance| self.compile_instance(instance))
            .collect();

        World {
            root: decl.root.as_ref().map(|r| self.symbols.intern(r)),
            graph: InstanceGraph { instances },
        }
    }

    fn compile_instance(&mut self, decl: &InstanceDecl) -> InstanceSpec {
        let kind = match &decl.alias {
            Some(alias) => InstanceKind::Named(self.symbols.intern(alias)),
            None => InstanceKind::Counted(decl.count),
        };

        let initializers = decl
            .initializers
            .iter()
            .map(|init| {
                let name = self.symbols.intern(&init.name);
                match init.value {
                    Some(value) => Initializer::Counter(name, value),
                    None => Initializer::Tag(name),
                }
            })
            .collect();

        InstanceSpec {
            concept: self.symbols.intern(&decl.concept),
            kind,
            initializers,
        }
    }

    fn compile_measure(&mut self, decl: &MeasureDecl) -> Measure {
        let function = match &decl.function {
            FunctionDecl::Count => AggregateFunction::Count,
            FunctionDecl::Sum(counter) => AggregateFunction::Sum(self.symbols.intern(counter)),
            FunctionDecl::Min(counter) => AggregateFunction::Min(self.symbols.intern(counter)),
            FunctionDecl::Max(counter) => AggregateFunction::Max(self.symbols.intern(counter)),
        };

        Measure {
            name: self.symbols.intern(&decl.name),
            predicates: decl
                .predicates
                .iter()
                .map(|p| self.compile_predicate(p))
                .collect(),
            function,
        }
    }

    fn intern_tags(&mut self, tags: &[String]) -> TagList {
        tags.iter().map(|t| self.symbols.intern(t)).collect()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate(kind: &str, name: &str) -> SeproError {
    SeproError::CompileError {
        message: format!("Duplicate {} '{}'", kind, name),
    }
}
