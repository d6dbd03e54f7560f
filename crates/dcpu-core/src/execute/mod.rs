//! Instruction execution pipeline for the DCPU-16 ISA.
//!
//! One tick is, in order:
//! 1. Decode the instruction at `PC` from a three-word window
//! 2. If the skip flag is set, pass over it and stop
//! 3. Advance `PC` past the instruction and its next words
//! 4. Resolve `a`, then `b`
//! 5. Compute and write back, charging base plus operand cycles
//! 6. Tick attached devices, raising any interrupts they return
//! 7. Service one pending interrupt
//!
//! Reserved encodings under the strict policy fault before step 3 and leave the
//! machine untouched.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    unknown_lints,
    missing_docs
)]

pub mod alu;
pub mod operands;

use log::{debug, error, info, trace, warn};

pub use operands::Location;

use crate::decoder::{DecodedInstruction, InstructionKind, Operand};
use crate::encoding::{BasicOpcode, SpecialOpcode};
use crate::interrupts::{Admission, InterruptController};
use crate::timing::{basic_cycles, special_cycles, RESERVED_CYCLES, SKIP_CYCLES};
use crate::{
    DecodePolicy, DeviceBus, FaultCode, Machine, Register, RunState, StepOutcome, TraceEvent,
};

/// Runs one tick of `machine`.
///
/// A latched fault or a halt short-circuits without touching state.
pub fn step_one(machine: &mut Machine) -> StepOutcome {
    match machine.run_state {
        RunState::FaultLatched(cause) => return StepOutcome::Fault { cause },
        RunState::Halted => return StepOutcome::Halted,
        RunState::Running => {}
    }

    let pc = machine.registers.pc();
    let window = machine.memory.read_window::<3>(pc);
    let instruction = machine.decoder.decode(window);

    if machine.registers.skip() {
        return skip_instruction(machine, pc, &instruction);
    }

    if instruction.is_reserved() {
        match machine.config.decode_policy {
            DecodePolicy::Strict => {
                warn!("reserved encoding {:#06x} at {pc:#06x}", instruction.raw);
                machine.emit(TraceEvent::FaultRaised {
                    cause: FaultCode::IllegalEncoding,
                    pc,
                });
                return StepOutcome::Fault {
                    cause: FaultCode::IllegalEncoding,
                };
            }
            DecodePolicy::Permissive => {
                warn!(
                    "reserved encoding {:#06x} at {pc:#06x} treated as no-op",
                    instruction.raw
                );
            }
        }
    }

    machine.emit(TraceEvent::InstructionStart {
        pc,
        raw_word: instruction.raw,
    });
    machine.registers.advance_pc(instruction.words);

    let outcome = execute_instruction(machine, &instruction);

    match outcome {
        StepOutcome::Retired { cycles } => {
            trace!(
                "retired {:#06x} at {pc:#06x} in {cycles} cycles",
                instruction.raw
            );
            machine.emit(TraceEvent::InstructionRetired { pc, cycles });
        }
        StepOutcome::Fault { cause } => {
            machine.emit(TraceEvent::FaultRaised { cause, pc });
            return outcome;
        }
        StepOutcome::Halted => return outcome,
        StepOutcome::Break { .. } | StepOutcome::Skipped { .. } => {}
    }

    if let Err(cause) = tick_devices(machine) {
        machine.emit(TraceEvent::FaultRaised { cause, pc });
        return StepOutcome::Fault { cause };
    }
    service_interrupt(machine);
    outcome
}

/// Passes over `instruction` because a conditional failed.
///
/// `PC` moves by the instruction's full length and `SP` is left alone even for
/// `PUSH`/`POP` operands. A skipped conditional keeps the flag set so chains
/// of `IF*` skip together.
fn skip_instruction(
    machine: &mut Machine,
    pc: u16,
    instruction: &DecodedInstruction,
) -> StepOutcome {
    machine.registers.advance_pc(instruction.words);
    machine.registers.set_skip(instruction.is_conditional());
    machine.registers.charge(SKIP_CYCLES);
    trace!("skipped {:#06x} at {pc:#06x}", instruction.raw);
    machine.emit(TraceEvent::InstructionSkipped {
        pc,
        raw_word: instruction.raw,
    });
    if let Err(cause) = tick_devices(machine) {
        machine.emit(TraceEvent::FaultRaised { cause, pc });
        return StepOutcome::Fault { cause };
    }
    service_interrupt(machine);
    StepOutcome::Skipped {
        cycles: SKIP_CYCLES,
    }
}

/// Executes an already-fetched instruction. `PC` must point past it.
pub fn execute_instruction(machine: &mut Machine, instruction: &DecodedInstruction) -> StepOutcome {
    let operand_cycles = instruction.operand_cycles();
    match instruction.kind {
        InstructionKind::Basic { op, b, a } => {
            let cycles = basic_cycles(op).saturating_add(operand_cycles);
            execute_basic(machine, op, b, a);
            machine.registers.charge(cycles);
            StepOutcome::Retired { cycles }
        }
        InstructionKind::Special { op, a } => {
            let base = special_cycles(op).saturating_add(operand_cycles);
            execute_special(machine, op, a, base)
        }
        InstructionKind::Reserved => {
            machine.registers.charge(RESERVED_CYCLES);
            StepOutcome::Retired {
                cycles: RESERVED_CYCLES,
            }
        }
    }
}

fn execute_basic(machine: &mut Machine, op: BasicOpcode, b: Operand, a: Operand) {
    let regs = &mut machine.registers;
    let a_loc = operands::resolve(a, regs);
    let a_val = operands::read(a_loc, regs, &machine.memory);
    let b_loc = operands::resolve(b, regs);

    if op.is_conditional() {
        let b_val = operands::read(b_loc, regs, &machine.memory);
        if !alu::condition(op, b_val, a_val) {
            regs.set_skip(true);
        }
        return;
    }

    let b_val = if op.ignores_b_value() {
        0
    } else {
        operands::read(b_loc, regs, &machine.memory)
    };
    let (result, ex) = alu::compute(op, b_val, a_val, regs.ex());
    operands::write(b_loc, result, regs, &mut machine.memory);
    if let Some(ex) = ex {
        regs.set_ex(ex);
    }

    let step = match op {
        BasicOpcode::Sti => 1_u16,
        BasicOpcode::Std => 1_u16.wrapping_neg(),
        _ => return,
    };
    for reg in [Register::I, Register::J] {
        regs.set_gpr(reg, regs.gpr(reg).wrapping_add(step));
    }
}

fn execute_special(
    machine: &mut Machine,
    op: SpecialOpcode,
    a: Operand,
    base_cycles: u16,
) -> StepOutcome {
    let a_loc = operands::resolve(a, &mut machine.registers);
    let a_val = operands::read(a_loc, &machine.registers, &machine.memory);
    let mut cycles = base_cycles;
    let mut outcome = None;

    match op {
        SpecialOpcode::Jsr => {
            let ret = machine.registers.pc();
            let slot = machine.registers.push_slot();
            machine.memory.write(slot, ret);
            machine.registers.set_pc(a_val);
        }
        SpecialOpcode::Int => {
            if let Err(cause) = raise_interrupt(machine, a_val) {
                outcome = Some(StepOutcome::Fault { cause });
            }
        }
        SpecialOpcode::Iag => {
            let ia = machine.registers.ia();
            operands::write(a_loc, ia, &mut machine.registers, &mut machine.memory);
        }
        SpecialOpcode::Ias => machine.registers.set_ia(a_val),
        SpecialOpcode::Rfi => {
            machine.interrupts.set_queueing(false);
            let a_slot = machine.registers.pop_slot();
            machine
                .registers
                .set_gpr(Register::A, machine.memory.read(a_slot));
            let pc_slot = machine.registers.pop_slot();
            machine.registers.set_pc(machine.memory.read(pc_slot));
        }
        SpecialOpcode::Iaq => machine.interrupts.set_queueing(a_val != 0),
        SpecialOpcode::Hwn => {
            let count = u16::try_from(machine.devices.len()).unwrap_or(u16::MAX);
            operands::write(a_loc, count, &mut machine.registers, &mut machine.memory);
        }
        SpecialOpcode::Hwq => query_device(machine, a_val),
        SpecialOpcode::Hwi => {
            cycles = cycles.saturating_add(interrupt_device(machine, a_val));
        }
        SpecialOpcode::Log => {
            info!(target: "dcpu::log", "LOG {a_val:#06x}");
            machine.log_queue.push_back(a_val);
        }
        SpecialOpcode::Brk => {
            debug!("BRK {a_val:#06x}");
            outcome = Some(StepOutcome::Break { message: a_val });
        }
        SpecialOpcode::Hlt => {
            debug!("HLT at {:#06x}", machine.registers.pc());
            machine.run_state = RunState::Halted;
            outcome = Some(StepOutcome::Halted);
        }
    }

    machine.registers.charge(cycles);
    outcome.unwrap_or(StepOutcome::Retired { cycles })
}

fn query_device(machine: &mut Machine, index: u16) {
    let Some(device) = machine.devices.get(usize::from(index)) else {
        warn!("HWQ on missing device {index}");
        return;
    };
    let (id, version, manufacturer) = (
        device.hardware_id(),
        device.hardware_version(),
        device.manufacturer(),
    );
    let regs = &mut machine.registers;
    regs.set_gpr(Register::A, id as u16);
    regs.set_gpr(Register::B, (id >> 16) as u16);
    regs.set_gpr(Register::C, version);
    regs.set_gpr(Register::X, manufacturer as u16);
    regs.set_gpr(Register::Y, (manufacturer >> 16) as u16);
}

fn interrupt_device(machine: &mut Machine, index: u16) -> u16 {
    let Some(device) = machine.devices.get_mut(usize::from(index)) else {
        warn!("HWI on missing device {index}");
        return 0;
    };
    let mut bus = DeviceBus {
        registers: &mut machine.registers,
        memory: &mut machine.memory,
    };
    device.interrupt(&mut bus)
}

/// Gives every attached device its per-tick callback, in attach order, then
/// bumps the tick count. An overflowing device interrupt leaves the count as
/// it was.
fn tick_devices(machine: &mut Machine) -> Result<(), FaultCode> {
    let tick = machine.ticks;
    for index in 0..machine.devices.len() {
        let mut bus = DeviceBus {
            registers: &mut machine.registers,
            memory: &mut machine.memory,
        };
        if let Some(message) = machine.devices[index].tick(&mut bus, tick) {
            trace!("device {index} raised interrupt {message:#06x}");
            raise_interrupt(machine, message)?;
        }
    }
    machine.ticks = tick.wrapping_add(1);
    Ok(())
}

/// Admits `message` into the interrupt queue.
///
/// Overflow latches the machine on fire and returns the fault.
pub(crate) fn raise_interrupt(machine: &mut Machine, message: u16) -> Result<(), FaultCode> {
    match InterruptController::admission(machine.registers.ia()) {
        Admission::Drop => {
            debug!("interrupt {message:#06x} dropped, IA is zero");
            machine.emit(TraceEvent::InterruptDropped { message });
            Ok(())
        }
        Admission::Enqueue => machine.interrupts.enqueue(message).map_err(|err| {
            let cause = err.fault_code();
            error!(
                "interrupt queue overflow at {} messages, machine on fire",
                machine.interrupts.len()
            );
            machine.run_state = RunState::FaultLatched(cause);
            cause
        }),
    }
}

/// Delivers at most one queued interrupt.
///
/// Nothing happens while queueing is on or a skip is pending. A message popped
/// while `IA` is zero is discarded.
pub(crate) fn service_interrupt(machine: &mut Machine) {
    if machine.registers.skip() || !matches!(machine.run_state, RunState::Running) {
        return;
    }
    let Some(message) = machine.interrupts.next_deliverable() else {
        return;
    };

    let ia = machine.registers.ia();
    if ia == 0 {
        debug!("interrupt {message:#06x} discarded, IA cleared before delivery");
        machine.emit(TraceEvent::InterruptDropped { message });
        return;
    }

    machine.interrupts.set_queueing(true);
    let regs = &mut machine.registers;
    let pc_slot = regs.push_slot();
    machine.memory.write(pc_slot, regs.pc());
    let a_slot = regs.push_slot();
    machine.memory.write(a_slot, regs.gpr(Register::A));
    regs.set_pc(ia);
    regs.set_gpr(Register::A, message);
    trace!("dispatched interrupt {message:#06x} to {ia:#06x}");
    machine.emit(TraceEvent::InterruptDispatched { message });
}
