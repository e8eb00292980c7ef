//! Symbol interning for model identifiers.
//!
//! Every name in a compiled model (tags, concepts, counters, slots, traps,
//! notification labels, worlds, measures) is interned to a `Symbol` so that
//! equality is identity and the engine never compares strings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An interned identifier. Equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(u32);

impl Symbol {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Two-way interner: name → `Symbol` for compilation, `Symbol` → name for
/// dumps, DOT labels, and error messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    names: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning the existing symbol if it was seen before.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.symbols.get(name) {
            sym
        } else {
            let sym = Symbol::new(self.names.len() as u32);
            self.symbols.insert(name.to_string(), sym);
            self.names.push(name.to_string());
            sym
        }
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    /// Recover the name of an interned symbol.
    pub fn name(&self, sym: Symbol) -> Option<&str> {
        self.names.get(sym.id() as usize).map(String::as_str)
    }

    /// Like [`name`](Self::name), but renders foreign symbols as `#<id>`
    /// instead of failing. Intended for diagnostics.
    pub fn display(&self, sym: Symbol) -> String {
        match self.name(sym) {
            Some(name) => name.to_string(),
            None => format!("#{}", sym.id()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
