/// Number of general-purpose registers (`A..J`).
pub const GENERAL_REGISTER_COUNT: usize = 8;

/// General-purpose register identifier in operand-field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    A = 0,
    B = 1,
    C = 2,
    X = 3,
    Y = 4,
    Z = 5,
    I = 6,
    J = 7,
}

impl Register {
    /// Ordered list of all general-purpose registers.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::A,
        Self::B,
        Self::C,
        Self::X,
        Self::Y,
        Self::Z,
        Self::I,
        Self::J,
    ];

    /// Returns the array index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes the low three bits of an operand field.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            3 => Some(Self::X),
            4 => Some(Self::Y),
            5 => Some(Self::Z),
            6 => Some(Self::I),
            7 => Some(Self::J),
            _ => None,
        }
    }

    /// Assembly mnemonic for this register.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
            Self::I => "I",
            Self::J => "J",
        }
    }
}

/// Register file plus the hidden skip flag and cycle counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    gpr: [u16; GENERAL_REGISTER_COUNT],
    pc: u16,
    sp: u16,
    ia: u16,
    ex: u16,
    skip: bool,
    cycles: u64,
}

impl RegisterFile {
    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> u16 {
        self.gpr[reg.index()]
    }

    /// Writes a general-purpose register.
    pub const fn set_gpr(&mut self, reg: Register, value: u16) {
        self.gpr[reg.index()] = value;
    }

    /// Reads `PC`.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Writes `PC`.
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    /// Reads `SP`.
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.sp
    }

    /// Writes `SP`.
    pub const fn set_sp(&mut self, value: u16) {
        self.sp = value;
    }

    /// Reads `IA`.
    #[must_use]
    pub const fn ia(&self) -> u16 {
        self.ia
    }

    /// Writes `IA`.
    pub const fn set_ia(&mut self, value: u16) {
        self.ia = value;
    }

    /// Reads `EX`.
    #[must_use]
    pub const fn ex(&self) -> u16 {
        self.ex
    }

    /// Writes `EX`.
    pub const fn set_ex(&mut self, value: u16) {
        self.ex = value;
    }

    /// Returns `true` while the next instruction is to be skipped.
    #[must_use]
    pub const fn skip(&self) -> bool {
        self.skip
    }

    /// Arms or clears the skip flag.
    pub const fn set_skip(&mut self, skip: bool) {
        self.skip = skip;
    }

    /// Total cycles charged since reset.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Charges `cycles`; the counter never decreases.
    pub const fn charge(&mut self, cycles: u16) {
        self.cycles = self.cycles.saturating_add(cycles as u64);
    }

    /// Advances `PC` by `words`, wrapping.
    pub const fn advance_pc(&mut self, words: u16) {
        self.pc = self.pc.wrapping_add(words);
    }

    /// Pre-decrements `SP` and returns the new top-of-stack address.
    pub const fn push_slot(&mut self) -> u16 {
        self.sp = self.sp.wrapping_sub(1);
        self.sp
    }

    /// Returns the current top-of-stack address and post-increments `SP`.
    pub const fn pop_slot(&mut self) -> u16 {
        let slot = self.sp;
        self.sp = self.sp.wrapping_add(1);
        slot
    }
}
