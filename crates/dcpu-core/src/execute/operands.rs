//! Operand resolver: turns decoded operands into concrete read/write targets.

use crate::decoder::Operand;
use crate::{Memory, Register, RegisterFile};

/// Concrete location an operand refers to for the current instruction.
///
/// Locations are recomputed every instruction and never outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// General-purpose register.
    Register(Register),
    /// Memory cell.
    Memory(u16),
    /// Stack pointer.
    Sp,
    /// Program counter.
    Pc,
    /// Overflow register.
    Ex,
    /// Read-only value; writes are discarded.
    Literal(u16),
}

/// Resolves `operand` against the current registers.
///
/// `POP` post-increments and `PUSH` pre-decrements `SP` as a side effect, so
/// each operand must be resolved exactly once, `a` before `b`.
pub fn resolve(operand: Operand, regs: &mut RegisterFile) -> Location {
    match operand {
        Operand::Register(reg) => Location::Register(reg),
        Operand::Indirect(reg) => Location::Memory(regs.gpr(reg)),
        Operand::IndirectOffset(reg, offset) => {
            Location::Memory(regs.gpr(reg).wrapping_add(offset))
        }
        Operand::Pop => Location::Memory(regs.pop_slot()),
        Operand::Push => Location::Memory(regs.push_slot()),
        Operand::Peek => Location::Memory(regs.sp()),
        Operand::Pick(offset) => Location::Memory(regs.sp().wrapping_add(offset)),
        Operand::Sp => Location::Sp,
        Operand::Pc => Location::Pc,
        Operand::Ex => Location::Ex,
        Operand::Address(addr) => Location::Memory(addr),
        Operand::NextLiteral(value) | Operand::Literal(value) => Location::Literal(value),
    }
}

/// Reads the value stored at `location`.
#[must_use]
pub fn read(location: Location, regs: &RegisterFile, memory: &Memory) -> u16 {
    match location {
        Location::Register(reg) => regs.gpr(reg),
        Location::Memory(addr) => memory.read(addr),
        Location::Sp => regs.sp(),
        Location::Pc => regs.pc(),
        Location::Ex => regs.ex(),
        Location::Literal(value) => value,
    }
}

/// Stores `value` at `location`. Literal targets swallow the write.
pub fn write(location: Location, value: u16, regs: &mut RegisterFile, memory: &mut Memory) {
    match location {
        Location::Register(reg) => regs.set_gpr(reg, value),
        Location::Memory(addr) => memory.write(addr, value),
        Location::Sp => regs.set_sp(value),
        Location::Pc => regs.set_pc(value),
        Location::Ex => regs.set_ex(value),
        Location::Literal(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::{read, resolve, write, Location};
    use crate::decoder::Operand;
    use crate::{Memory, Register, RegisterFile};

    #[test]
    fn indirect_offset_wraps_around_memory() {
        let mut regs = RegisterFile::default();
        regs.set_gpr(Register::X, 0xFFFF);
        assert_eq!(
            resolve(Operand::IndirectOffset(Register::X, 2), &mut regs),
            Location::Memory(0x0001)
        );
    }

    #[test]
    fn push_and_pop_move_sp_in_opposite_directions() {
        let mut regs = RegisterFile::default();
        regs.set_sp(0x1000);
        assert_eq!(resolve(Operand::Push, &mut regs), Location::Memory(0x0FFF));
        assert_eq!(regs.sp(), 0x0FFF);
        assert_eq!(resolve(Operand::Pop, &mut regs), Location::Memory(0x0FFF));
        assert_eq!(regs.sp(), 0x1000);
    }

    #[test]
    fn peek_and_pick_leave_sp_alone() {
        let mut regs = RegisterFile::default();
        regs.set_sp(0xFFFE);
        assert_eq!(resolve(Operand::Peek, &mut regs), Location::Memory(0xFFFE));
        assert_eq!(
            resolve(Operand::Pick(3), &mut regs),
            Location::Memory(0x0001)
        );
        assert_eq!(regs.sp(), 0xFFFE);
    }

    #[test]
    fn literal_writes_are_discarded() {
        let mut regs = RegisterFile::default();
        let mut memory = Memory::new();
        let location = resolve(Operand::Literal(5), &mut regs);
        write(location, 99, &mut regs, &mut memory);
        assert_eq!(read(location, &regs, &memory), 5);
        assert_eq!(regs, RegisterFile::default());
        assert_eq!(memory, Memory::new());
    }

    #[test]
    fn pseudo_registers_round_trip() {
        let mut regs = RegisterFile::default();
        let mut memory = Memory::new();
        for location in [Location::Sp, Location::Pc, Location::Ex] {
            write(location, 0x4242, &mut regs, &mut memory);
            assert_eq!(read(location, &regs, &memory), 0x4242);
        }
    }
}
