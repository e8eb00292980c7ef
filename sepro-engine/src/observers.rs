//! Observer interfaces for the engine.
//!
//! Delegates watch the run lifecycle; loggers receive measure records and
//! notifications. Both are observational only and must not reach back into
//! the engine or container.

use crate::probe::Record;
use sepro_lang::{Measure, Symbol, SymbolTable};

/// Run lifecycle observer.
///
/// All methods default to no-ops, so implementors override only what they
/// care about.
pub trait Delegate {
    fn will_run(&mut self) {}

    fn did_run(&mut self) {}

    fn will_step(&mut self, step: u64) {
        let _ = step;
    }

    fn did_step(&mut self, step: u64) {
        let _ = step;
    }

    /// Traps raised during the step, as a multiset: a symbol appears once
    /// per actuator dispatch that listed it.
    fn handle_trap(&mut self, step: u64, traps: &[Symbol]) {
        let _ = (step, traps);
    }

    /// The run is stopping because an actuator requested HALT.
    fn handle_halt(&mut self, step: u64) {
        let _ = step;
    }
}

/// Measurement and notification sink.
pub trait Logger {
    fn logging_will_start(&mut self, measures: &[Measure], steps: u64) {
        let _ = (measures, steps);
    }

    fn logging_did_end(&mut self, steps_run: u64) {
        let _ = steps_run;
    }

    /// One record per probe pass: measure name to scalar.
    fn log_record(&mut self, step: u64, record: &Record) {
        let _ = (step, record);
    }

    fn log_notification(&mut self, step: u64, symbol: Symbol) {
        let _ = (step, symbol);
    }
}

/// A logger that renders records and notifications through `tracing`.
pub struct ConsoleLogger {
    symbols: SymbolTable,
}

impl ConsoleLogger {
    pub fn new(symbols: SymbolTable) -> Self {
        Self { symbols }
    }
}

impl Logger for ConsoleLogger {
    fn logging_will_start(&mut self, measures: &[Measure], steps: u64) {
        tracing::info!(measures = measures.len(), steps, "logging started");
    }

    fn logging_did_end(&mut self, steps_run: u64) {
        tracing::info!(steps_run, "logging ended");
    }

    fn log_record(&mut self, step: u64, record: &Record) {
        let rendered = record
            .iter()
            .map(|(&name, value)| format!("{}={}", self.symbols.display(name), value))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(step, "{}", rendered);
    }

    fn log_notification(&mut self, step: u64, symbol: Symbol) {
        tracing::info!(step, "notification: {}", self.symbols.display(symbol));
    }
}
