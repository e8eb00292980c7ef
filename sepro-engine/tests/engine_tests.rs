//! End-to-end tests driving the engine from model source.

use sepro_engine::{Delegate, Engine, Logger, ObjectRef, Record};
use sepro_lang::{compile_source, Measure, Symbol};
use std::cell::RefCell;
use std::rc::Rc;

/// Delegate that records every callback for later inspection.
#[derive(Default)]
struct Journal {
    steps_started: Vec<u64>,
    steps_finished: Vec<u64>,
    traps: Vec<(u64, Vec<Symbol>)>,
    halts: Vec<u64>,
    runs: u64,
}

#[derive(Clone, Default)]
struct JournalDelegate(Rc<RefCell<Journal>>);

impl Delegate for JournalDelegate {
    fn will_run(&mut self) {
        self.0.borrow_mut().runs += 1;
    }

    fn will_step(&mut self, step: u64) {
        self.0.borrow_mut().steps_started.push(step);
    }

    fn did_step(&mut self, step: u64) {
        self.0.borrow_mut().steps_finished.push(step);
    }

    fn handle_trap(&mut self, step: u64, traps: &[Symbol]) {
        self.0.borrow_mut().traps.push((step, traps.to_vec()));
    }

    fn handle_halt(&mut self, step: u64) {
        self.0.borrow_mut().halts.push(step);
    }
}

#[derive(Default)]
struct Log {
    started: Option<(usize, u64)>,
    ended: Option<u64>,
    records: Vec<(u64, Record)>,
    notifications: Vec<(u64, Symbol)>,
}

#[derive(Clone, Default)]
struct JournalLogger(Rc<RefCell<Log>>);

impl Logger for JournalLogger {
    fn logging_will_start(&mut self, measures: &[Measure], steps: u64) {
        self.0.borrow_mut().started = Some((measures.len(), steps));
    }

    fn logging_did_end(&mut self, steps_run: u64) {
        self.0.borrow_mut().ended = Some(steps_run);
    }

    fn log_record(&mut self, step: u64, record: &Record) {
        self.0.borrow_mut().records.push((step, record.clone()));
    }

    fn log_notification(&mut self, step: u64, symbol: Symbol) {
        self.0.borrow_mut().notifications.push((step, symbol));
    }
}

fn engine_for(source: &str, seed: u64) -> Engine {
    let model = compile_source(source).expect("model should compile");
    let mut engine = Engine::with_seed(model, seed);
    engine.initialize("main").expect("world should initialize");
    engine
}

fn sym(engine: &Engine, name: &str) -> Symbol {
    engine.model().symbols.get(name).expect("symbol should exist")
}

/// Objects carrying the given tag, in id order.
fn tagged(engine: &Engine, name: &str) -> Vec<ObjectRef> {
    let tag = sym(engine, name);
    engine
        .container()
        .iter()
        .filter(|object| object.tags.contains(tag))
        .map(|object| object.id())
        .collect()
}

/// A chain builder stepping through phases one, two, advance, cleanup:
/// grab a free link into the scratch slot, append it behind the tail,
/// advance the tail, release the scratch slot.
const CHAIN_RULES: &str = "
    CONCEPT link TAG free SLOT next
    CONCEPT linker SLOT left, right

    WHERE linker AND NOT BOUND left ON link AND free
        DO BIND left TO OTHER IN OTHER UNSET free SET one

    WHERE linker AND one AND NOT BOUND right ON link AND free
        DO BIND right TO OTHER IN OTHER UNSET free UNSET one SET two

    WHERE linker AND two
        DO IN THIS.left BIND next TO THIS.right UNSET two SET advance

    WHERE linker AND advance
        DO BIND left TO THIS.right UNSET advance SET cleanup

    WHERE linker AND cleanup
        DO UNBIND right UNSET cleanup SET one
";

#[test]
fn ready_linker_binds_a_free_link() {
    let mut engine = engine_for(
        "CONCEPT link TAG free SLOT next
         CONCEPT linker TAG ready SLOT left, right

         WHERE linker AND NOT BOUND left ON link AND free
             DO BIND left TO OTHER IN OTHER UNSET free SET one

         WORLD main OBJECT linker OBJECT link",
        7,
    );

    engine.step();

    let linker = tagged(&engine, "linker")[0];
    let link = tagged(&engine, "link")[0];
    let linker_obj = engine.container().get(linker).unwrap();
    assert!(linker_obj.tags.contains(sym(&engine, "one")));
    assert_eq!(linker_obj.binding(sym(&engine, "left")), Some(link));

    let link_obj = engine.container().get(link).unwrap();
    assert!(!link_obj.tags.contains(sym(&engine, "free")));
}

#[test]
fn chain_construction_succeeds_without_a_fault() {
    let source = format!("{CHAIN_RULES} WORLD main OBJECT linker OBJECT link * 3");
    let mut engine = engine_for(&source, 11);

    engine.run(30);

    let next = sym(&engine, "next");
    let free = sym(&engine, "free");
    let links = tagged(&engine, "link");
    assert_eq!(links.len(), 3);

    // Links are chained in creation order and none is free anymore.
    for window in links.windows(2) {
        let head = engine.container().get(window[0]).unwrap();
        assert_eq!(head.binding(next), Some(window[1]));
    }
    for &link in &links {
        let object = engine.container().get(link).unwrap();
        assert!(!object.tags.contains(free));
    }
    let tail = engine.container().get(*links.last().unwrap()).unwrap();
    assert_eq!(tail.binding(next), None);

    // The linker rests at phase one with its tail pointer on the last link.
    let linker = engine.container().get(tagged(&engine, "linker")[0]).unwrap();
    assert!(linker.tags.contains(sym(&engine, "one")));
    assert_eq!(linker.binding(sym(&engine, "left")), Some(*links.last().unwrap()));
    assert_eq!(linker.binding(sym(&engine, "right")), None);
}

#[test]
fn fault_blocks_chain_growth() {
    // The fault advertises itself as a free link but declares no `next`
    // slot. Once it becomes the tail, appending behind it is guarded off
    // and the chain stops growing.
    let source = format!(
        "{CHAIN_RULES}
         CONCEPT fault TAG link, free
         WORLD main OBJECT linker OBJECT link OBJECT fault OBJECT link * 2"
    );
    let mut engine = engine_for(&source, 3);

    engine.run(30);

    let next = sym(&engine, "next");
    let free = sym(&engine, "free");
    let fault = tagged(&engine, "fault")[0];
    let links: Vec<ObjectRef> = tagged(&engine, "link")
        .into_iter()
        .filter(|&id| id != fault)
        .collect();
    assert_eq!(links.len(), 3);

    // The first link was appended, then the fault became the tail. One more
    // link was grabbed into the scratch slot before the append was guarded
    // off; the last link was never touched.
    let head = engine.container().get(links[0]).unwrap();
    assert_eq!(head.binding(next), Some(fault));

    let grabbed = engine.container().get(links[1]).unwrap();
    assert!(!grabbed.tags.contains(free));
    assert_eq!(grabbed.binding(next), None);

    let untouched = engine.container().get(links[2]).unwrap();
    assert!(untouched.tags.contains(free));
    assert_eq!(untouched.binding(next), None);

    // The linker is stuck in phase two: the fault at its tail declares no
    // `next` slot, so the append never fires again.
    let linker = engine.container().get(tagged(&engine, "linker")[0]).unwrap();
    assert!(linker.tags.contains(sym(&engine, "two")));
    assert_eq!(linker.binding(sym(&engine, "left")), Some(fault));
    assert_eq!(linker.binding(sym(&engine, "right")), Some(links[1]));
}

#[test]
fn traps_fire_once_per_dispatch_without_matches() {
    // The actuator never matches anything, yet its trap is raised on every
    // dispatch.
    let mut engine = engine_for(
        "WHERE ghost DO NOTHING TRAP overflow
         WORLD main",
        5,
    );
    let delegate = JournalDelegate::default();
    engine.set_delegate(Box::new(delegate.clone()));

    engine.run(3);

    let overflow = sym(&engine, "overflow");
    let journal = delegate.0.borrow();
    assert_eq!(journal.traps.len(), 3);
    for (index, (step, traps)) in journal.traps.iter().enumerate() {
        assert_eq!(*step, index as u64 + 1);
        assert_eq!(traps.as_slice(), &[overflow]);
    }
}

#[test]
fn traps_reset_at_each_step_start() {
    let mut engine = engine_for(
        "WHERE ghost DO NOTHING TRAP overflow
         WORLD main",
        5,
    );
    let delegate = JournalDelegate::default();
    engine.set_delegate(Box::new(delegate.clone()));

    engine.step();
    engine.step();

    // Each step hands over exactly one trap, not an accumulation.
    let journal = delegate.0.borrow();
    assert_eq!(journal.traps[0].1.len(), 1);
    assert_eq!(journal.traps[1].1.len(), 1);
}

#[test]
fn halt_stops_run_after_the_halting_step_completes() {
    let mut engine = engine_for(
        "WHERE ALL DO SET seen HALT
         WORLD main",
        9,
    );
    let delegate = JournalDelegate::default();
    engine.set_delegate(Box::new(delegate.clone()));

    engine.run(10);

    assert!(engine.is_halted());
    assert_eq!(engine.step_count(), 1);

    let journal = delegate.0.borrow();
    assert_eq!(journal.runs, 1);
    assert_eq!(journal.halts.len(), 1);
    // The halting step's callbacks still fired.
    assert_eq!(journal.steps_started.as_slice(), &[1]);
    assert_eq!(journal.steps_finished.as_slice(), &[1]);
}

#[test]
fn delayed_halt_exits_early() {
    // The fuse burns down one step before the halting actuator can match;
    // depending on dispatch order within the step the halt lands on step 1
    // or 2, never later.
    let mut engine = engine_for(
        "CONCEPT timer COUNTER fuse 1
         WHERE timer AND NOT ZERO fuse DO DEC fuse
         WHERE timer AND ZERO fuse DO SET done HALT
         WORLD main OBJECT timer",
        21,
    );
    let delegate = JournalDelegate::default();
    engine.set_delegate(Box::new(delegate.clone()));

    engine.run(10);

    assert!(engine.is_halted());
    assert!(engine.step_count() <= 2, "halt came too late");
    assert_eq!(delegate.0.borrow().halts.len(), 1);
}

#[test]
fn halt_is_an_assignment_not_an_or() {
    // Two actuators apply every step; one requests HALT, the other clears
    // it when dispatched later. Across seeds both step orders occur, so a
    // halt-or semantics would stop every run while assignment lets some
    // continue.
    let source = "CONCEPT thing
         WHERE thing DO SET a HALT
         WHERE thing DO SET b
         WORLD main OBJECT thing";

    let mut halted = 0;
    let mut survived = 0;
    for seed in 0..64 {
        let mut engine = engine_for(source, seed);
        engine.step();
        if engine.is_halted() {
            halted += 1;
        } else {
            survived += 1;
        }
    }

    assert!(halted > 0, "the halting actuator never won the shuffle");
    assert!(survived > 0, "a later non-halting actuator must clear the halt");
}

#[test]
fn notifications_reach_the_logger_each_dispatch() {
    let mut engine = engine_for(
        "WHERE ghost DO NOTHING NOTIFY tick
         WORLD main",
        2,
    );
    let logger = JournalLogger::default();
    engine.set_logger(Box::new(logger.clone()));

    engine.run(2);

    let tick = sym(&engine, "tick");
    let log = logger.0.borrow();
    assert_eq!(log.notifications.as_slice(), &[(1, tick), (2, tick)]);
}

#[test]
fn measures_are_probed_before_the_run_and_after_each_step() {
    let mut engine = engine_for(
        "CONCEPT link TAG free
         WHERE link AND free DO UNSET free
         MEASURE free_links COUNT WHERE link AND free
         WORLD main OBJECT link * 3",
        13,
    );
    let logger = JournalLogger::default();
    engine.set_logger(Box::new(logger.clone()));

    engine.run(2);

    let free_links = sym(&engine, "free_links");
    let log = logger.0.borrow();
    assert_eq!(log.started, Some((1, 2)));
    assert_eq!(log.ended, Some(2));

    // One record before the run, one after each step. The single unary
    // actuator frees every link in its first step.
    assert_eq!(log.records.len(), 3);
    assert_eq!(log.records[0].0, 0);
    assert_eq!(log.records[0].1[&free_links], 3);
    assert_eq!(log.records[1].1[&free_links], 0);
    assert_eq!(log.records[2].1[&free_links], 0);
}

#[test]
fn runs_with_the_same_seed_are_identical() {
    let source = format!("{CHAIN_RULES} WORLD main OBJECT linker OBJECT link * 3");

    let mut dumps = Vec::new();
    for _ in 0..2 {
        let mut engine = engine_for(&source, 42);
        engine.run(20);
        let mut out = Vec::new();
        engine.debug_dump(&mut out).unwrap();
        dumps.push(out);
    }

    assert_eq!(dumps[0], dumps[1]);
}

#[test]
fn combined_actuator_never_pairs_an_object_with_itself() {
    // Every seeker is also a valid partner; with a single object the only
    // candidate pair is the object itself, which must be skipped.
    let mut engine = engine_for(
        "CONCEPT node TAG lonely SLOT peer
         WHERE node ON node DO BIND peer TO OTHER
         WORLD main OBJECT node",
        17,
    );

    engine.run(3);

    let node = tagged(&engine, "node")[0];
    let peer = sym(&engine, "peer");
    assert_eq!(engine.container().get(node).unwrap().binding(peer), None);
}
