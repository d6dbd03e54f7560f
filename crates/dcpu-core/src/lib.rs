//! Core emulator crate for the DCPU-16.

/// Flat 64 Ki-word memory.
pub mod memory;
pub use memory::{Memory, ADDRESS_SPACE_WORDS};

/// Fault taxonomy and host-misuse errors.
pub mod fault;
pub use fault::{FaultCode, LoadError};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{Register, RegisterFile, RunState, GENERAL_REGISTER_COUNT};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CancelToken, DecodePolicy, Device, DeviceBus, MachineConfig, NeverCancel, RegisterSnapshot,
    RunLimits, RunOutcome, StepOutcome, StopReason, TraceEvent, TraceSink,
};

/// Opcode tables and instruction-word field layout.
pub mod encoding;
pub use encoding::{BasicOpcode, SpecialOpcode, BASIC_OPCODE_TABLE, SPECIAL_OPCODE_TABLE};

/// Deterministic instruction cycle-cost tables and lookup helpers.
pub mod timing;
pub use timing::{basic_cycles, special_cycles, BASIC_CYCLE_TABLE, SPECIAL_CYCLE_TABLE};

/// Instruction decode pipeline.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder, InstructionKind, Operand, OperandSlot};

/// Interrupt queue and admission policy.
pub mod interrupts;
pub use interrupts::{
    Admission, InterruptController, InterruptEnqueueError, INTERRUPT_QUEUE_CAPACITY,
};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{execute_instruction, step_one, Location};

/// Whole-machine aggregate and run loops.
pub mod machine;
pub use machine::Machine;

/// Instruction disassembly.
pub mod disasm;
pub use disasm::{disassemble, DisassemblyRow};

/// Debugger façade.
pub mod debugger;
pub use debugger::Debugger;

#[cfg(test)]
use proptest as _;
