//! Instruction disassembly for the DCPU-16 ISA.
//!
//! Rows are produced by walking forward from an address with the same decoder
//! the executor uses, so instruction lengths always agree with execution.

use std::fmt;

use crate::decoder::{DecodedInstruction, Decoder, InstructionKind, Operand};
use crate::Memory;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the instruction word.
    pub addr: u16,
    /// Instruction word followed by any next words.
    pub words: Vec<u16>,
    /// Assembly text, e.g. `SET A, 0x5`.
    pub text: String,
    /// Whether the encoding is reserved.
    pub is_reserved: bool,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Register(reg) => f.write_str(reg.name()),
            Self::Indirect(reg) => write!(f, "[{}]", reg.name()),
            Self::IndirectOffset(reg, offset) => write!(f, "[{}+{offset:#x}]", reg.name()),
            Self::Pop => f.write_str("POP"),
            Self::Push => f.write_str("PUSH"),
            Self::Peek => f.write_str("PEEK"),
            Self::Pick(offset) => write!(f, "PICK {offset:#x}"),
            Self::Sp => f.write_str("SP"),
            Self::Pc => f.write_str("PC"),
            Self::Ex => f.write_str("EX"),
            Self::Address(addr) => write!(f, "[{addr:#x}]"),
            Self::NextLiteral(value) | Self::Literal(value) => write!(f, "{value:#x}"),
        }
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InstructionKind::Basic { op, b, a } => write!(f, "{} {b}, {a}", op.mnemonic()),
            InstructionKind::Special { op, a } => write!(f, "{} {a}", op.mnemonic()),
            InstructionKind::Reserved => write!(f, "DAT {:#06x}", self.raw),
        }
    }
}

/// Disassembles `count` consecutive instructions starting at `start`.
///
/// Addresses wrap past `0xFFFF`. `extensions` selects whether `LOG`, `BRK`
/// and `HLT` decode or show as reserved data.
#[must_use]
pub fn disassemble(
    memory: &Memory,
    start: u16,
    count: usize,
    extensions: bool,
) -> Vec<DisassemblyRow> {
    let decoder = Decoder::new(extensions);
    let mut rows = Vec::with_capacity(count);
    let mut addr = start;

    for _ in 0..count {
        let window = memory.read_window::<3>(addr);
        let instruction = decoder.decode(window);
        rows.push(DisassemblyRow {
            addr,
            words: window[..usize::from(instruction.words)].to_vec(),
            text: instruction.to_string(),
            is_reserved: instruction.is_reserved(),
        });
        addr = addr.wrapping_add(instruction.words);
    }

    rows
}
