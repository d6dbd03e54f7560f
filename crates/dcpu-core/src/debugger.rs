//! Host-facing debugger handle: stepping, free running and breakpoints over a
//! single owned [`Machine`].
//!
//! Dropping a [`Debugger`] destroys the machine with it.

use std::collections::BTreeSet;

use log::debug;

use crate::disasm::{disassemble, DisassemblyRow};
use crate::{
    CancelToken, Device, FaultCode, LoadError, Machine, MachineConfig, RegisterSnapshot, RunLimits,
    RunOutcome, StepOutcome,
};

/// Debugger façade over one machine.
#[derive(Debug, Default)]
pub struct Debugger {
    machine: Machine,
    breakpoints: BTreeSet<u16>,
}

impl Debugger {
    /// Creates a debugger over a machine in reset state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    /// Creates a debugger over a machine built from `config`.
    #[must_use]
    pub fn with_config(config: MachineConfig) -> Self {
        Self {
            machine: Machine::with_config(config),
            breakpoints: BTreeSet::new(),
        }
    }

    /// Whole memory, read-only.
    #[must_use]
    pub fn ram(&self) -> &[u16] {
        self.machine.memory().as_slice()
    }

    /// Whole memory, writable between ticks.
    pub fn ram_mut(&mut self) -> &mut [u16] {
        self.machine.memory_mut().as_mut_slice()
    }

    /// Register values at this instant.
    #[must_use]
    pub fn registers(&self) -> RegisterSnapshot {
        self.machine.snapshot()
    }

    /// Executes one tick.
    pub fn step(&mut self) -> StepOutcome {
        self.machine.tick()
    }

    /// Runs until `limits`, `cancel`, a breakpoint, `BRK`, halt or a fault.
    ///
    /// Breakpoints are checked after each tick, so continuing from a
    /// breakpoint address always makes progress.
    pub fn continue_exec(&mut self, limits: RunLimits, cancel: &dyn CancelToken) -> RunOutcome {
        let breakpoints = &self.breakpoints;
        self.machine
            .run_until(limits, cancel, |pc| breakpoints.contains(&pc))
    }

    /// Adds a breakpoint; returns `false` if it was already set.
    pub fn add_breakpoint(&mut self, addr: u16) -> bool {
        debug!("breakpoint set at {addr:#06x}");
        self.breakpoints.insert(addr)
    }

    /// Removes a breakpoint; returns `false` if none was set.
    pub fn remove_breakpoint(&mut self, addr: u16) -> bool {
        self.breakpoints.remove(&addr)
    }

    /// Breakpoints in ascending address order.
    pub fn breakpoints(&self) -> impl Iterator<Item = u16> + '_ {
        self.breakpoints.iter().copied()
    }

    /// Copies `image` into memory at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ImageTooLarge`] when `image` exceeds the address
    /// space.
    pub fn load(&mut self, offset: u16, image: &[u16]) -> Result<(), LoadError> {
        self.machine.memory_mut().load(offset, image)
    }

    /// Resets registers, interrupts and run state. Memory and breakpoints
    /// are kept.
    pub fn reset(&mut self) {
        self.machine.reset();
    }

    /// Raises a host interrupt.
    ///
    /// # Errors
    ///
    /// See [`Machine::interrupt`].
    pub fn interrupt(&mut self, message: u16) -> Result<(), FaultCode> {
        self.machine.interrupt(message)
    }

    /// Values written by `LOG` since the last drain.
    pub fn drain_log(&mut self) -> Vec<u16> {
        self.machine.drain_log()
    }

    /// Total cycles charged.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.machine.cycles()
    }

    /// Disassembles `count` instructions from `addr`.
    #[must_use]
    pub fn disassemble(&self, addr: u16, count: usize) -> Vec<DisassemblyRow> {
        disassemble(
            self.machine.memory(),
            addr,
            count,
            self.machine.config().debug_extensions,
        )
    }

    /// Attaches a device; see [`Machine::attach_device`].
    pub fn attach_device(&mut self, device: Box<dyn Device>) -> u16 {
        self.machine.attach_device(device)
    }

    /// Underlying machine.
    #[must_use]
    pub const fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Underlying machine, mutable.
    pub const fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// Consumes the debugger, returning its machine.
    #[must_use]
    pub fn into_machine(self) -> Machine {
        self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::Debugger;
    use crate::encoding::basic_word;
    use crate::{NeverCancel, RunLimits, StopReason};

    #[test]
    fn ram_is_the_whole_address_space() {
        let mut debugger = Debugger::new();
        assert_eq!(debugger.ram().len(), 65536);
        debugger.ram_mut()[0xFFFF] = 7;
        assert_eq!(debugger.machine().memory().read(0xFFFF), 7);
    }

    #[test]
    fn breakpoint_set_is_ordered_and_deduplicated() {
        let mut debugger = Debugger::new();
        assert!(debugger.add_breakpoint(9));
        assert!(debugger.add_breakpoint(3));
        assert!(!debugger.add_breakpoint(9));
        assert_eq!(debugger.breakpoints().collect::<Vec<_>>(), vec![3, 9]);
        assert!(debugger.remove_breakpoint(3));
        assert!(!debugger.remove_breakpoint(3));
    }

    #[test]
    fn continue_from_a_breakpoint_makes_progress() {
        // SET A, 1 ; SET B, 2 ; SUB PC, 1
        let mut debugger = Debugger::new();
        debugger
            .load(
                0,
                &[
                    basic_word(0x01, 0x00, 0x22),
                    basic_word(0x01, 0x01, 0x23),
                    basic_word(0x03, 0x1c, 0x22),
                ],
            )
            .expect("fits");
        debugger.add_breakpoint(0);
        debugger.add_breakpoint(2);

        let outcome = debugger.continue_exec(RunLimits::ticks(10), &NeverCancel);
        assert_eq!(outcome.stop, StopReason::Breakpoint { pc: 2 });
        assert_eq!(debugger.registers().b, 2);

        let outcome = debugger.continue_exec(RunLimits::ticks(10), &NeverCancel);
        assert_eq!(outcome.stop, StopReason::Breakpoint { pc: 2 });
        assert_eq!(outcome.ticks, 1);
    }

    #[test]
    fn into_machine_keeps_state() {
        let mut debugger = Debugger::new();
        debugger
            .load(0, &[basic_word(0x01, 0x00, 0x22)])
            .expect("fits");
        debugger.step();

        let machine = debugger.into_machine();
        assert_eq!(machine.registers().pc(), 1);
        assert_eq!(machine.memory().read(0), basic_word(0x01, 0x00, 0x22));
        assert_eq!(machine.cycles(), 1);
    }
}
