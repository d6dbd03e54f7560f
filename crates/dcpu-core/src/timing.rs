use crate::encoding::{BasicOpcode, SpecialOpcode};

/// Cycles charged for a reserved encoding under the permissive policy.
pub const RESERVED_CYCLES: u16 = 1;
/// Cycles charged for each instruction passed over by a failed conditional.
pub const SKIP_CYCLES: u16 = 1;
/// Cycles added by each operand that consumes a next word.
pub const NEXT_WORD_CYCLES: u16 = 1;

/// Base cycle costs of the basic opcodes, before operand costs.
pub const BASIC_CYCLE_TABLE: &[(BasicOpcode, u16)] = &[
    (BasicOpcode::Set, 1),
    (BasicOpcode::Add, 2),
    (BasicOpcode::Sub, 2),
    (BasicOpcode::Mul, 2),
    (BasicOpcode::Mli, 2),
    (BasicOpcode::Div, 3),
    (BasicOpcode::Dvi, 3),
    (BasicOpcode::Mod, 3),
    (BasicOpcode::Mdi, 3),
    (BasicOpcode::And, 1),
    (BasicOpcode::Bor, 1),
    (BasicOpcode::Xor, 1),
    (BasicOpcode::Shr, 1),
    (BasicOpcode::Asr, 1),
    (BasicOpcode::Shl, 1),
    (BasicOpcode::Ifb, 2),
    (BasicOpcode::Ifc, 2),
    (BasicOpcode::Ife, 2),
    (BasicOpcode::Ifn, 2),
    (BasicOpcode::Ifg, 2),
    (BasicOpcode::Ifa, 2),
    (BasicOpcode::Ifl, 2),
    (BasicOpcode::Ifu, 2),
    (BasicOpcode::Adx, 3),
    (BasicOpcode::Sbx, 3),
    (BasicOpcode::Sti, 2),
    (BasicOpcode::Std, 2),
];

/// Base cycle costs of the special opcodes, before operand and device costs.
pub const SPECIAL_CYCLE_TABLE: &[(SpecialOpcode, u16)] = &[
    (SpecialOpcode::Jsr, 3),
    (SpecialOpcode::Int, 4),
    (SpecialOpcode::Iag, 1),
    (SpecialOpcode::Ias, 1),
    (SpecialOpcode::Rfi, 3),
    (SpecialOpcode::Iaq, 2),
    (SpecialOpcode::Hwn, 2),
    (SpecialOpcode::Hwq, 4),
    (SpecialOpcode::Hwi, 4),
    (SpecialOpcode::Log, 1),
    (SpecialOpcode::Brk, 1),
    (SpecialOpcode::Hlt, 1),
];

/// Looks up the base cost of a basic opcode.
#[must_use]
pub fn basic_cycles(op: BasicOpcode) -> u16 {
    BASIC_CYCLE_TABLE
        .iter()
        .find_map(|(entry, cycles)| (*entry == op).then_some(*cycles))
        .unwrap_or(1)
}

/// Looks up the base cost of a special opcode.
#[must_use]
pub fn special_cycles(op: SpecialOpcode) -> u16 {
    SPECIAL_CYCLE_TABLE
        .iter()
        .find_map(|(entry, cycles)| (*entry == op).then_some(*cycles))
        .unwrap_or(1)
}
