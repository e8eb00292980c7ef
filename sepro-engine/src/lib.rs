//! # Sepro simulation engine
//!
//! A rule-based discrete simulator over object graphs. The engine consumes
//! a compiled [`sepro_lang::Model`] and rewrites a population of objects
//! step by step: each step shuffles the model's actuators, selects matching
//! objects (or object pairs) for each one, and applies its modifier group
//! atomically per match. Traps, notifications, and a halt flag let rules
//! signal observers and stop the run.
//!
//! ## Example
//!
//! ```
//! use sepro_engine::Engine;
//!
//! let model = sepro_lang::compile_source(
//!     "CONCEPT link TAG free
//!      WHERE link AND free DO UNSET free
//!      WORLD main OBJECT link * 3",
//! )
//! .unwrap();
//!
//! let mut engine = Engine::with_seed(model, 1);
//! engine.initialize("main").unwrap();
//! engine.run(1);
//! assert_eq!(engine.step_count(), 1);
//! ```

pub mod container;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod executor;
pub mod object;
pub mod observers;
pub mod probe;

pub use container::Container;
pub use engine::Engine;
pub use error::ModelError;
pub use object::{Object, ObjectRef};
pub use observers::{ConsoleLogger, Delegate, Logger};
pub use probe::{Probe, Record};
