//! Public host-facing API contracts for embedding the emulator core.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::interrupts::INTERRUPT_QUEUE_CAPACITY;
use crate::{FaultCode, Memory, Register, RegisterFile};

/// How the executor treats unassigned opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DecodePolicy {
    /// Reserved encodings retire as a one-cycle no-op.
    #[default]
    Permissive,
    /// Reserved encodings report [`FaultCode::IllegalEncoding`] and leave the
    /// machine untouched.
    Strict,
}

/// Top-level immutable configuration for a machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Reserved-opcode handling.
    pub decode_policy: DecodePolicy,
    /// Maximum number of pending interrupts before the machine catches fire.
    pub interrupt_queue_capacity: usize,
    /// Decodes the `LOG`, `BRK` and `HLT` debugging opcodes.
    pub debug_extensions: bool,
    /// Enables trace callback dispatch to an installed [`TraceSink`].
    pub tracing_enabled: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            decode_policy: DecodePolicy::Permissive,
            interrupt_queue_capacity: INTERRUPT_QUEUE_CAPACITY,
            debug_extensions: true,
            tracing_enabled: false,
        }
    }
}

/// Immutable copy of the twelve architectural registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct RegisterSnapshot {
    pub a: u16,
    pub b: u16,
    pub c: u16,
    pub i: u16,
    pub j: u16,
    pub x: u16,
    pub y: u16,
    pub z: u16,
    pub pc: u16,
    pub ia: u16,
    pub sp: u16,
    pub ex: u16,
}

impl From<&RegisterFile> for RegisterSnapshot {
    fn from(regs: &RegisterFile) -> Self {
        Self {
            a: regs.gpr(Register::A),
            b: regs.gpr(Register::B),
            c: regs.gpr(Register::C),
            i: regs.gpr(Register::I),
            j: regs.gpr(Register::J),
            x: regs.gpr(Register::X),
            y: regs.gpr(Register::Y),
            z: regs.gpr(Register::Z),
            pc: regs.pc(),
            ia: regs.ia(),
            sp: regs.sp(),
            ex: regs.ex(),
        }
    }
}

/// Output status from one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// Instruction executed and consumed `cycles`.
    Retired {
        /// Cycles charged, operand and device costs included.
        cycles: u16,
    },
    /// Instruction passed over because of a failed conditional.
    Skipped {
        /// Cycles charged for the skip.
        cycles: u16,
    },
    /// `BRK` retired with the given message.
    Break {
        /// Operand of the `BRK` instruction.
        message: u16,
    },
    /// Machine is halted; nothing was executed.
    Halted,
    /// A fault was raised or is latched.
    Fault {
        /// Canonical fault code.
        cause: FaultCode,
    },
}

/// Host-supplied bounds for free-running execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RunLimits {
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Stop once this many cycles have been charged during the run.
    pub max_cycles: Option<u64>,
}

impl RunLimits {
    /// No bound: run until a fault, halt, break or cancellation.
    pub const UNBOUNDED: Self = Self {
        max_ticks: None,
        max_cycles: None,
    };

    /// Bound the run to `ticks` ticks.
    #[must_use]
    pub const fn ticks(ticks: u64) -> Self {
        Self {
            max_ticks: Some(ticks),
            max_cycles: None,
        }
    }

    /// Bound the run to `cycles` cycles.
    #[must_use]
    pub const fn cycles(cycles: u64) -> Self {
        Self {
            max_ticks: None,
            max_cycles: Some(cycles),
        }
    }
}

/// Why a run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StopReason {
    /// `max_ticks` reached.
    TickLimit,
    /// `max_cycles` reached.
    CycleLimit,
    /// The cancel token fired between ticks.
    Cancelled,
    /// `PC` reached a host breakpoint.
    Breakpoint {
        /// Address of the breakpoint.
        pc: u16,
    },
    /// `BRK` retired.
    Break {
        /// Operand of the `BRK` instruction.
        message: u16,
    },
    /// Machine is halted.
    Halted,
    /// A fault was raised or is latched.
    Fault {
        /// Canonical fault code.
        cause: FaultCode,
    },
}

/// Aggregated outcome of a run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Ticks executed during this call.
    pub ticks: u64,
    /// Reason the loop returned.
    pub stop: StopReason,
    /// Outcome of the last tick, if any ran.
    pub last_step: Option<StepOutcome>,
}

/// Cooperative cancellation checked between ticks.
pub trait CancelToken {
    /// Returns `true` once the host wants the run to stop.
    fn is_cancelled(&self) -> bool;
}

impl CancelToken for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Token that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Machine state lent to a device while it handles `HWI` or ticks.
#[derive(Debug)]
pub struct DeviceBus<'a> {
    /// Register file, including `PC`/`SP`/`EX`.
    pub registers: &'a mut RegisterFile,
    /// Main memory.
    pub memory: &'a mut Memory,
}

/// Hardware attached to the machine and reachable through `HWN`/`HWQ`/`HWI`.
pub trait Device: std::fmt::Debug + Send {
    /// 32-bit hardware identifier reported by `HWQ` in `B:A`.
    fn hardware_id(&self) -> u32;

    /// Hardware version reported by `HWQ` in `C`.
    fn hardware_version(&self) -> u16;

    /// 32-bit manufacturer identifier reported by `HWQ` in `Y:X`.
    fn manufacturer(&self) -> u32;

    /// Handles `HWI`, returning extra cycles to charge.
    fn interrupt(&mut self, bus: &mut DeviceBus<'_>) -> u16;

    /// Called once per executed or skipped instruction with the machine's
    /// running tick count. A returned message is raised as a hardware
    /// interrupt.
    fn tick(&mut self, bus: &mut DeviceBus<'_>, tick: u64) -> Option<u16> {
        let _ = (bus, tick);
        None
    }
}

/// Deterministic trace events emitted in execution order when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Instruction fetched and about to execute.
    InstructionStart {
        /// Address of the instruction word.
        pc: u16,
        /// Raw instruction word.
        raw_word: u16,
    },
    /// Instruction finished executing.
    InstructionRetired {
        /// Address of the instruction word.
        pc: u16,
        /// Cycles charged.
        cycles: u16,
    },
    /// Instruction passed over by a failed conditional.
    InstructionSkipped {
        /// Address of the instruction word.
        pc: u16,
        /// Raw instruction word.
        raw_word: u16,
    },
    /// Queued interrupt delivered to the handler at `IA`.
    InterruptDispatched {
        /// Interrupt message placed in `A`.
        message: u16,
    },
    /// Interrupt discarded because `IA` was zero.
    InterruptDropped {
        /// Discarded message.
        message: u16,
    },
    /// Fault raised.
    FaultRaised {
        /// Canonical fault code.
        cause: FaultCode,
        /// `PC` when the fault was observed.
        pc: u16,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink: Send {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}
