//! Host-facing debugger operations: create, ram, registers, step, continue,
//! destroy.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use dcpu_core::encoding::{basic_word, special_word};
use dcpu_core::{
    BasicOpcode, CancelToken, DecodePolicy, Debugger, FaultCode, MachineConfig, NeverCancel,
    RegisterSnapshot, RunLimits, SpecialOpcode, StepOutcome, StopReason, ADDRESS_SPACE_WORDS,
};
use log as _;
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const A: u8 = 0x00;
const B: u8 = 0x01;
const PC: u8 = 0x1c;

fn lit(value: i8) -> u8 {
    u8::try_from(0x21 + i16::from(value)).expect("embedded literal in -1..=30")
}

fn op(opcode: BasicOpcode, b: u8, a: u8) -> u16 {
    basic_word(opcode.code(), b, a)
}

fn special(opcode: SpecialOpcode, a: u8) -> u16 {
    special_word(opcode.code(), a)
}

// SET A, 1 ; ADD A, 1 ; SUB PC, 1
fn counting_loop() -> Debugger {
    let mut debugger = Debugger::new();
    debugger
        .load(
            0,
            &[
                op(BasicOpcode::Set, A, lit(1)),
                op(BasicOpcode::Add, A, lit(1)),
                op(BasicOpcode::Sub, PC, lit(1)),
            ],
        )
        .expect("fits");
    debugger
}

/// Cancels after a fixed number of polls.
struct CancelAfter {
    remaining: Cell<u32>,
}

impl CancelToken for CancelAfter {
    fn is_cancelled(&self) -> bool {
        let left = self.remaining.get();
        if left == 0 {
            return true;
        }
        self.remaining.set(left - 1);
        false
    }
}

#[test]
fn created_debugger_is_in_reset_state() {
    let debugger = Debugger::new();
    assert_eq!(debugger.registers(), RegisterSnapshot::default());
    assert_eq!(debugger.ram().len(), ADDRESS_SPACE_WORDS);
    assert!(debugger.ram().iter().all(|word| *word == 0));
    assert_eq!(debugger.cycles(), 0);
}

#[test]
fn ram_writes_are_visible_to_the_next_step() {
    let mut debugger = Debugger::new();
    debugger.ram_mut()[0] = op(BasicOpcode::Set, A, lit(5));
    debugger.ram_mut()[1] = op(BasicOpcode::Add, A, lit(3));

    assert_eq!(debugger.step(), StepOutcome::Retired { cycles: 1 });
    assert_eq!(debugger.step(), StepOutcome::Retired { cycles: 2 });
    let regs = debugger.registers();
    assert_eq!((regs.a, regs.ex, regs.pc), (8, 0, 2));
    assert_eq!(debugger.cycles(), 3);
}

#[test]
fn registers_are_a_detached_copy() {
    let mut debugger = counting_loop();
    let before = debugger.registers();
    debugger.step();
    assert_eq!(before.a, 0);
    assert_eq!(debugger.registers().a, 1);
}

#[rstest]
#[case::ticks(RunLimits::ticks(7), StopReason::TickLimit)]
#[case::cycles(RunLimits::cycles(9), StopReason::CycleLimit)]
fn continue_honours_run_limits(#[case] limits: RunLimits, #[case] stop: StopReason) {
    let mut debugger = counting_loop();
    let outcome = debugger.continue_exec(limits, &NeverCancel);
    assert_eq!(outcome.stop, stop);
    assert!(outcome.ticks > 0);
}

#[test]
fn continue_stops_on_cancellation_between_ticks() {
    let mut debugger = counting_loop();
    let cancel = CancelAfter {
        remaining: Cell::new(3),
    };
    let outcome = debugger.continue_exec(RunLimits::UNBOUNDED, &cancel);
    assert_eq!(outcome.stop, StopReason::Cancelled);
    assert_eq!(outcome.ticks, 3);
}

/// Shared flag that reports the first poll, so the host knows the run has
/// started before cancelling it.
struct StartedFlag {
    flag: Arc<AtomicBool>,
    started: Mutex<Option<mpsc::Sender<()>>>,
}

impl CancelToken for StartedFlag {
    fn is_cancelled(&self) -> bool {
        let cancelled = self.flag.as_ref().is_cancelled();
        if let Some(started) = self.started.lock().expect("started lock").take() {
            started.send(()).expect("host waiting");
        }
        cancelled
    }
}

#[test]
fn continue_can_be_cancelled_from_another_thread() {
    let flag = Arc::new(AtomicBool::new(false));
    let (started, running) = mpsc::channel();
    let token = StartedFlag {
        flag: Arc::clone(&flag),
        started: Mutex::new(Some(started)),
    };
    let worker = std::thread::spawn(move || {
        let mut debugger = counting_loop();
        debugger.continue_exec(RunLimits::UNBOUNDED, &token)
    });

    running.recv().expect("run started");
    flag.store(true, Ordering::Relaxed);
    let outcome = worker.join().expect("worker thread");
    assert_eq!(outcome.stop, StopReason::Cancelled);
    assert!(outcome.ticks > 0);
}

#[test]
fn continue_stops_at_breakpoints() {
    let mut debugger = counting_loop();
    debugger.add_breakpoint(2);
    let outcome = debugger.continue_exec(RunLimits::ticks(100), &NeverCancel);
    assert_eq!(outcome.stop, StopReason::Breakpoint { pc: 2 });
    assert_eq!(debugger.registers().a, 2);

    debugger.remove_breakpoint(2);
    let outcome = debugger.continue_exec(RunLimits::ticks(5), &NeverCancel);
    assert_eq!(outcome.stop, StopReason::TickLimit);
}

#[test]
fn continue_reports_brk_and_halt() {
    let mut debugger = Debugger::new();
    debugger
        .load(
            0,
            &[
                special(SpecialOpcode::Log, lit(4)),
                special(SpecialOpcode::Brk, lit(30)),
                special(SpecialOpcode::Hlt, lit(0)),
            ],
        )
        .expect("fits");

    let outcome = debugger.continue_exec(RunLimits::UNBOUNDED, &NeverCancel);
    assert_eq!(outcome.stop, StopReason::Break { message: 30 });
    assert_eq!(outcome.last_step, Some(StepOutcome::Break { message: 30 }));
    assert_eq!(debugger.drain_log(), vec![4]);

    let outcome = debugger.continue_exec(RunLimits::UNBOUNDED, &NeverCancel);
    assert_eq!(outcome.stop, StopReason::Halted);
    assert_eq!(debugger.step(), StepOutcome::Halted);
    assert_eq!(debugger.registers().pc, 3);
}

#[test]
fn strict_decode_fault_stops_continue() {
    let config = MachineConfig {
        decode_policy: DecodePolicy::Strict,
        ..MachineConfig::default()
    };
    let mut debugger = Debugger::with_config(config);
    debugger
        .load(0, &[op(BasicOpcode::Set, B, lit(2)), 0x0019])
        .expect("fits");

    let outcome = debugger.continue_exec(RunLimits::UNBOUNDED, &NeverCancel);
    assert_eq!(
        outcome.stop,
        StopReason::Fault {
            cause: FaultCode::IllegalEncoding
        }
    );
    assert_eq!(debugger.registers().pc, 1);
    assert_eq!(debugger.registers().b, 2);
}

#[test]
fn reset_keeps_program_and_breakpoints() {
    let mut debugger = counting_loop();
    debugger.add_breakpoint(1);
    debugger.continue_exec(RunLimits::ticks(50), &NeverCancel);
    debugger.reset();

    assert_eq!(debugger.registers(), RegisterSnapshot::default());
    assert_eq!(debugger.ram()[0], op(BasicOpcode::Set, A, lit(1)));
    assert_eq!(debugger.breakpoints().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn host_interrupts_reach_the_handler() {
    let mut debugger = Debugger::new();
    debugger
        .load(0, &[special(SpecialOpcode::Ias, lit(16))])
        .expect("fits");
    debugger.step();
    debugger.interrupt(0x0777).expect("queued");
    debugger.step();
    assert_eq!(debugger.registers().pc, 16);
    assert_eq!(debugger.registers().a, 0x0777);
}

#[test]
fn disassembly_follows_memory() {
    let debugger = counting_loop();
    let text: Vec<_> = debugger
        .disassemble(0, 3)
        .into_iter()
        .map(|row| row.text)
        .collect();
    assert_eq!(text, ["SET A, 0x1", "ADD A, 0x1", "SUB PC, 0x1"]);
}

#[test]
fn debugger_moves_across_threads_and_drops_there() {
    let mut debugger = counting_loop();
    debugger.step();
    let handle = std::thread::spawn(move || {
        debugger.step();
        debugger.registers().a
    });
    assert_eq!(handle.join().expect("worker thread"), 2);
}
