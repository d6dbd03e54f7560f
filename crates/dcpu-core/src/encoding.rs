//! Opcode tables and instruction-word field layout.
//!
//! An instruction word is laid out as `aaaaaabbbbbooooo`. When `o` is zero the
//! word is a special instruction and its opcode lives in the `b` field.

/// Mask of the basic opcode field (bits 4..0).
pub const OPCODE_MASK: u16 = 0b1_1111;
/// Mask of the `b` operand field once shifted down.
pub const B_FIELD_MASK: u16 = 0b1_1111;
/// Shift of the `b` operand field.
pub const B_FIELD_SHIFT: u16 = 5;
/// Shift of the `a` operand field.
pub const A_FIELD_SHIFT: u16 = 10;

/// Two-operand instructions (`op b, a`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum BasicOpcode {
    Set,
    Add,
    Sub,
    Mul,
    Mli,
    Div,
    Dvi,
    Mod,
    Mdi,
    And,
    Bor,
    Xor,
    Shr,
    Asr,
    Shl,
    Ifb,
    Ifc,
    Ife,
    Ifn,
    Ifg,
    Ifa,
    Ifl,
    Ifu,
    Adx,
    Sbx,
    Sti,
    Std,
}

/// One-operand instructions (`op a`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum SpecialOpcode {
    Jsr,
    Int,
    Iag,
    Ias,
    Rfi,
    Iaq,
    Hwn,
    Hwq,
    Hwi,
    Log,
    Brk,
    Hlt,
}

/// Assigned basic opcodes: `(o field, opcode, mnemonic)`.
///
/// Any `o` value absent from this table (other than zero) is reserved.
pub const BASIC_OPCODE_TABLE: &[(u8, BasicOpcode, &str)] = &[
    (0x01, BasicOpcode::Set, "SET"),
    (0x02, BasicOpcode::Add, "ADD"),
    (0x03, BasicOpcode::Sub, "SUB"),
    (0x04, BasicOpcode::Mul, "MUL"),
    (0x05, BasicOpcode::Mli, "MLI"),
    (0x06, BasicOpcode::Div, "DIV"),
    (0x07, BasicOpcode::Dvi, "DVI"),
    (0x08, BasicOpcode::Mod, "MOD"),
    (0x09, BasicOpcode::Mdi, "MDI"),
    (0x0a, BasicOpcode::And, "AND"),
    (0x0b, BasicOpcode::Bor, "BOR"),
    (0x0c, BasicOpcode::Xor, "XOR"),
    (0x0d, BasicOpcode::Shr, "SHR"),
    (0x0e, BasicOpcode::Asr, "ASR"),
    (0x0f, BasicOpcode::Shl, "SHL"),
    (0x10, BasicOpcode::Ifb, "IFB"),
    (0x11, BasicOpcode::Ifc, "IFC"),
    (0x12, BasicOpcode::Ife, "IFE"),
    (0x13, BasicOpcode::Ifn, "IFN"),
    (0x14, BasicOpcode::Ifg, "IFG"),
    (0x15, BasicOpcode::Ifa, "IFA"),
    (0x16, BasicOpcode::Ifl, "IFL"),
    (0x17, BasicOpcode::Ifu, "IFU"),
    (0x1a, BasicOpcode::Adx, "ADX"),
    (0x1b, BasicOpcode::Sbx, "SBX"),
    (0x1e, BasicOpcode::Sti, "STI"),
    (0x1f, BasicOpcode::Std, "STD"),
];

/// Assigned special opcodes: `(b field, opcode, mnemonic, debug extension)`.
pub const SPECIAL_OPCODE_TABLE: &[(u8, SpecialOpcode, &str, bool)] = &[
    (0x01, SpecialOpcode::Jsr, "JSR", false),
    (0x08, SpecialOpcode::Int, "INT", false),
    (0x09, SpecialOpcode::Iag, "IAG", false),
    (0x0a, SpecialOpcode::Ias, "IAS", false),
    (0x0b, SpecialOpcode::Rfi, "RFI", false),
    (0x0c, SpecialOpcode::Iaq, "IAQ", false),
    (0x10, SpecialOpcode::Hwn, "HWN", false),
    (0x11, SpecialOpcode::Hwq, "HWQ", false),
    (0x12, SpecialOpcode::Hwi, "HWI", false),
    (0x13, SpecialOpcode::Log, "LOG", true),
    (0x14, SpecialOpcode::Brk, "BRK", true),
    (0x15, SpecialOpcode::Hlt, "HLT", true),
];

impl BasicOpcode {
    /// Classifies a basic `o` field.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        BASIC_OPCODE_TABLE
            .iter()
            .find_map(|(entry, op, _)| (*entry == code).then_some(*op))
    }

    /// Stable `o` field value for this opcode.
    #[must_use]
    pub fn code(self) -> u8 {
        BASIC_OPCODE_TABLE
            .iter()
            .find_map(|(code, op, _)| (*op == self).then_some(*code))
            .unwrap_or(0)
    }

    /// Assembly mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        BASIC_OPCODE_TABLE
            .iter()
            .find_map(|(_, op, name)| (*op == self).then_some(*name))
            .unwrap_or("???")
    }

    /// Returns `true` for the `IF*` family, which chains skips.
    #[must_use]
    pub const fn is_conditional(self) -> bool {
        matches!(
            self,
            Self::Ifb
                | Self::Ifc
                | Self::Ife
                | Self::Ifn
                | Self::Ifg
                | Self::Ifa
                | Self::Ifl
                | Self::Ifu
        )
    }

    /// Returns `true` when the instruction overwrites `b` without reading it.
    #[must_use]
    pub const fn ignores_b_value(self) -> bool {
        matches!(self, Self::Set | Self::Sti | Self::Std)
    }
}

impl SpecialOpcode {
    /// Classifies a special `b` field. Debug extensions only decode when
    /// `extensions` is set.
    #[must_use]
    pub fn from_code(code: u8, extensions: bool) -> Option<Self> {
        SPECIAL_OPCODE_TABLE
            .iter()
            .find_map(|(entry, op, _, is_extension)| {
                (*entry == code && (extensions || !*is_extension)).then_some(*op)
            })
    }

    /// Stable `b` field value for this opcode.
    #[must_use]
    pub fn code(self) -> u8 {
        SPECIAL_OPCODE_TABLE
            .iter()
            .find_map(|(code, op, _, _)| (*op == self).then_some(*code))
            .unwrap_or(0)
    }

    /// Assembly mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        SPECIAL_OPCODE_TABLE
            .iter()
            .find_map(|(_, op, name, _)| (*op == self).then_some(*name))
            .unwrap_or("???")
    }
}

/// Splits an instruction word into `(o, b, a)` fields.
#[must_use]
pub const fn split_word(word: u16) -> (u8, u8, u8) {
    let op = (word & OPCODE_MASK) as u8;
    let b = ((word >> B_FIELD_SHIFT) & B_FIELD_MASK) as u8;
    let a = (word >> A_FIELD_SHIFT) as u8;
    (op, b, a)
}

/// Builds a basic instruction word from raw fields.
#[must_use]
pub const fn basic_word(op: u8, b: u8, a: u8) -> u16 {
    ((a as u16) << A_FIELD_SHIFT)
        | (((b as u16) & B_FIELD_MASK) << B_FIELD_SHIFT)
        | ((op as u16) & OPCODE_MASK)
}

/// Builds a special instruction word from raw fields.
#[must_use]
pub const fn special_word(op: u8, a: u8) -> u16 {
    basic_word(0, op, a)
}
