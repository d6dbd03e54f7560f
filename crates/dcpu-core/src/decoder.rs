//! Instruction decoder for the DCPU-16 ISA.
//!
//! Decoding is pure: it reads a three-word window starting at `PC` and never
//! touches machine state. The same result drives execution and skipping, so
//! both advance `PC` by the same number of words.

use crate::encoding::{split_word, BasicOpcode, SpecialOpcode};
use crate::state::Register;
use crate::timing::NEXT_WORD_CYCLES;

/// Operand field position inside an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandSlot {
    /// Source field (6 bits); may hold embedded literals.
    A,
    /// Destination field (5 bits).
    B,
}

/// Decoded operand with any next word already captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operand {
    /// `register`
    Register(Register),
    /// `[register]`
    Indirect(Register),
    /// `[register + next word]`
    IndirectOffset(Register, u16),
    /// `POP` / `[SP++]`, only in the `a` slot.
    Pop,
    /// `PUSH` / `[--SP]`, only in the `b` slot.
    Push,
    /// `PEEK` / `[SP]`
    Peek,
    /// `PICK n` / `[SP + next word]`
    Pick(u16),
    /// `SP`
    Sp,
    /// `PC`
    Pc,
    /// `EX`
    Ex,
    /// `[next word]`
    Address(u16),
    /// Next-word literal.
    NextLiteral(u16),
    /// Literal embedded in the `a` field (`-1..=30`).
    Literal(u16),
}

impl Operand {
    /// Decodes an operand field. `next` is the word following whatever the
    /// instruction has consumed so far; it is only captured by next-word forms.
    #[must_use]
    pub fn decode(field: u8, next: u16, slot: OperandSlot) -> Self {
        let reg = Register::from_u3(field & 0x07).unwrap_or(Register::A);
        match field {
            0x00..=0x07 => Self::Register(reg),
            0x08..=0x0f => Self::Indirect(reg),
            0x10..=0x17 => Self::IndirectOffset(reg, next),
            0x18 => match slot {
                OperandSlot::A => Self::Pop,
                OperandSlot::B => Self::Push,
            },
            0x19 => Self::Peek,
            0x1a => Self::Pick(next),
            0x1b => Self::Sp,
            0x1c => Self::Pc,
            0x1d => Self::Ex,
            0x1e => Self::Address(next),
            0x1f => Self::NextLiteral(next),
            _ => Self::Literal(u16::from(field & 0x3f).wrapping_sub(0x21)),
        }
    }

    /// Number of words consumed after the instruction word.
    #[must_use]
    pub const fn extra_words(self) -> u16 {
        match self {
            Self::IndirectOffset(..) | Self::Pick(_) | Self::Address(_) | Self::NextLiteral(_) => 1,
            Self::Register(_)
            | Self::Indirect(_)
            | Self::Pop
            | Self::Push
            | Self::Peek
            | Self::Sp
            | Self::Pc
            | Self::Ex
            | Self::Literal(_) => 0,
        }
    }

    /// Cycles charged for resolving this operand.
    #[must_use]
    pub const fn extra_cycles(self) -> u16 {
        self.extra_words() * NEXT_WORD_CYCLES
    }
}

/// Decoded instruction shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionKind {
    /// `op b, a`
    Basic {
        /// Opcode.
        op: BasicOpcode,
        /// Destination operand.
        b: Operand,
        /// Source operand.
        a: Operand,
    },
    /// `op a`
    Special {
        /// Opcode.
        op: SpecialOpcode,
        /// Sole operand.
        a: Operand,
    },
    /// Unassigned opcode. Operand words are still accounted for in `words`.
    Reserved,
}

/// Fully decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Raw instruction word.
    pub raw: u16,
    /// Instruction shape and operands.
    pub kind: InstructionKind,
    /// Total length in words, including the instruction word (1..=3).
    pub words: u16,
}

impl DecodedInstruction {
    /// Returns `true` for the `IF*` family.
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        match self.kind {
            InstructionKind::Basic { op, .. } => op.is_conditional(),
            InstructionKind::Special { .. } | InstructionKind::Reserved => false,
        }
    }

    /// Returns `true` for unassigned encodings.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        matches!(self.kind, InstructionKind::Reserved)
    }

    /// Cycles charged by operand resolution alone.
    #[must_use]
    pub const fn operand_cycles(&self) -> u16 {
        match self.kind {
            InstructionKind::Basic { b, a, .. } => a.extra_cycles() + b.extra_cycles(),
            InstructionKind::Special { a, .. } => a.extra_cycles(),
            InstructionKind::Reserved => 0,
        }
    }
}

/// Instruction decoder for the DCPU-16 ISA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decoder {
    extensions: bool,
}

impl Decoder {
    /// Creates a decoder; `extensions` enables the `LOG`/`BRK`/`HLT` opcodes.
    #[must_use]
    pub const fn new(extensions: bool) -> Self {
        Self { extensions }
    }

    /// Decodes the instruction at the head of `window`.
    ///
    /// `window` holds the instruction word and the two words after it. The
    /// `a` operand's next word always precedes the `b` operand's.
    #[must_use]
    pub fn decode(self, window: [u16; 3]) -> DecodedInstruction {
        let raw = window[0];
        let (op_bits, b_bits, a_bits) = split_word(raw);

        let a = Operand::decode(a_bits, window[1], OperandSlot::A);
        let a_words = a.extra_words();

        if op_bits == 0 {
            let kind = SpecialOpcode::from_code(b_bits, self.extensions)
                .map_or(InstructionKind::Reserved, |op| InstructionKind::Special { op, a });
            return DecodedInstruction {
                raw,
                kind,
                words: 1 + a_words,
            };
        }

        let b_next = window[usize::from(1 + a_words)];
        let b = Operand::decode(b_bits, b_next, OperandSlot::B);
        let kind = BasicOpcode::from_code(op_bits)
            .map_or(InstructionKind::Reserved, |op| InstructionKind::Basic { op, b, a });

        DecodedInstruction {
            raw,
            kind,
            words: 1 + a_words + b.extra_words(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Decoder, InstructionKind, Operand, OperandSlot};
    use crate::encoding::{basic_word, special_word, BasicOpcode, SpecialOpcode};
    use crate::state::Register;

    #[test]
    fn embedded_literals_span_minus_one_to_thirty() {
        assert_eq!(
            Operand::decode(0x20, 0, OperandSlot::A),
            Operand::Literal(0xFFFF)
        );
        assert_eq!(
            Operand::decode(0x21, 0, OperandSlot::A),
            Operand::Literal(0)
        );
        assert_eq!(
            Operand::decode(0x3f, 0, OperandSlot::A),
            Operand::Literal(30)
        );
    }

    #[test]
    fn stack_field_depends_on_slot() {
        assert_eq!(Operand::decode(0x18, 0, OperandSlot::A), Operand::Pop);
        assert_eq!(Operand::decode(0x18, 0, OperandSlot::B), Operand::Push);
    }

    #[test]
    fn next_word_forms_consume_a_word_and_a_cycle() {
        for field in [0x10, 0x17, 0x1a, 0x1e, 0x1f] {
            let operand = Operand::decode(field, 0x1234, OperandSlot::A);
            assert_eq!(operand.extra_words(), 1, "field {field:#x}");
            assert_eq!(operand.extra_cycles(), 1, "field {field:#x}");
        }
        for field in [0x00, 0x08, 0x18, 0x19, 0x1b, 0x1c, 0x1d, 0x25] {
            let operand = Operand::decode(field, 0x1234, OperandSlot::A);
            assert_eq!(operand.extra_words(), 0, "field {field:#x}");
        }
    }

    #[test]
    fn a_next_word_precedes_b_next_word() {
        // SET [0x1000], 0x2000 -> b = 0x1e, a = 0x1f
        let word = basic_word(0x01, 0x1e, 0x1f);
        let decoded = Decoder::new(true).decode([word, 0x2000, 0x1000]);
        assert_eq!(decoded.words, 3);
        assert_eq!(
            decoded.kind,
            InstructionKind::Basic {
                op: BasicOpcode::Set,
                b: Operand::Address(0x1000),
                a: Operand::NextLiteral(0x2000),
            }
        );
        assert_eq!(decoded.operand_cycles(), 2);
    }

    #[test]
    fn special_instruction_decodes_opcode_from_b_field() {
        // JSR [B + 5]
        let word = special_word(0x01, 0x11);
        let decoded = Decoder::new(true).decode([word, 5, 0]);
        assert_eq!(decoded.words, 2);
        assert_eq!(
            decoded.kind,
            InstructionKind::Special {
                op: SpecialOpcode::Jsr,
                a: Operand::IndirectOffset(Register::B, 5),
            }
        );
    }

    #[test]
    fn reserved_encodings_still_measure_their_length() {
        let basic = basic_word(0x18, 0x1f, 0x1e);
        let decoded = Decoder::new(true).decode([basic, 1, 2]);
        assert!(decoded.is_reserved());
        assert_eq!(decoded.words, 3);

        let special = special_word(0x00, 0x1f);
        let decoded = Decoder::new(true).decode([special, 1, 2]);
        assert!(decoded.is_reserved());
        assert_eq!(decoded.words, 2);
    }

    #[test]
    fn extensions_off_turns_brk_into_reserved() {
        let word = special_word(0x14, 0x21);
        assert!(Decoder::new(false).decode([word, 0, 0]).is_reserved());
        assert!(!Decoder::new(true).decode([word, 0, 0]).is_reserved());
    }

    #[test]
    fn conditional_flag_follows_opcode() {
        let ife = basic_word(0x12, 0x00, 0x01);
        assert!(Decoder::default().decode([ife, 0, 0]).is_conditional());
        let set = basic_word(0x01, 0x00, 0x01);
        assert!(!Decoder::default().decode([set, 0, 0]).is_conditional());
    }
}
