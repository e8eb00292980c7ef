//! # Sepro model language
//!
//! Data types and DSL front-end for Sepro models: concepts (object
//! templates), actuators (production rules), worlds (initial populations),
//! and measures (observed scalars). The simulation engine consumes the
//! compiled [`Model`]; everything here is about producing one.
//!
//! ## Example
//!
//! ```
//! let model = sepro_lang::compile_source(
//!     "CONCEPT link TAG free SLOT next
//!      WHERE link AND free DO UNSET free
//!      WORLD main OBJECT link * 3",
//! )
//! .unwrap();
//! assert_eq!(model.actuators.len(), 1);
//! ```

pub mod compiler;
pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod symbol;

#[cfg(test)]
mod tests;

pub use compiler::Compiler;
pub use error::{Result, SeproError, Span};
pub use lexer::{tokenize, SpannedToken, Token};
pub use model::{
    Actuator, AggregateFunction, Concept, CounterMap, Initializer, InstanceGraph, InstanceKind,
    InstanceSpec, Measure, Model, Modifier, ModifierAction, ModifierTarget, Predicate,
    PredicateKind, Selector, TagList, TargetKind, World,
};
pub use parser::{parse, Declaration, Parser};
pub use symbol::{Symbol, SymbolTable};

/// Parse model source into declarations
pub fn parse_source(source: &str) -> Result<Vec<Declaration>> {
    let tokens = tokenize(source)?;
    parse(&tokens)
}

/// Compile model source into a `Model`
pub fn compile_source(source: &str) -> Result<Model> {
    let declarations = parse_source(source)?;
    Compiler::new().compile(&declarations)
}
