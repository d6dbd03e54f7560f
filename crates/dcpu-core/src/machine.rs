//! Whole-machine aggregate: registers, memory, interrupts, devices and the
//! run loops that drive them.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::decoder::Decoder;
use crate::execute::{raise_interrupt, step_one};
use crate::interrupts::InterruptController;
use crate::{
    CancelToken, Device, FaultCode, MachineConfig, Memory, RegisterFile, RegisterSnapshot,
    RunLimits, RunOutcome, RunState, StepOutcome, StopReason, TraceEvent, TraceSink,
};

/// A complete DCPU-16.
///
/// All state is owned; distinct machines share nothing and may live on
/// different threads.
pub struct Machine {
    pub(crate) config: MachineConfig,
    pub(crate) decoder: Decoder,
    pub(crate) registers: RegisterFile,
    pub(crate) memory: Memory,
    pub(crate) interrupts: InterruptController,
    pub(crate) run_state: RunState,
    pub(crate) devices: Vec<Box<dyn Device>>,
    pub(crate) log_queue: VecDeque<u16>,
    pub(crate) ticks: u64,
    trace: Option<Box<dyn TraceSink>>,
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("config", &self.config)
            .field("registers", &self.registers)
            .field("memory", &self.memory)
            .field("interrupts", &self.interrupts)
            .field("run_state", &self.run_state)
            .field("devices", &self.devices)
            .field("log_queue", &self.log_queue.len())
            .field("ticks", &self.ticks)
            .field("trace", &self.trace.is_some())
            .finish()
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Creates a zeroed machine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    /// Creates a zeroed machine.
    #[must_use]
    pub fn with_config(config: MachineConfig) -> Self {
        Self {
            decoder: Decoder::new(config.debug_extensions),
            interrupts: InterruptController::with_capacity(config.interrupt_queue_capacity),
            config,
            registers: RegisterFile::default(),
            memory: Memory::new(),
            run_state: RunState::Running,
            devices: Vec::new(),
            log_queue: VecDeque::new(),
            ticks: 0,
            trace: None,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Live register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Mutable register file, for host patching between ticks.
    pub const fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    /// Copy of the architectural registers.
    #[must_use]
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot::from(&self.registers)
    }

    /// Main memory.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable main memory.
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Interrupt queue and queueing switch.
    #[must_use]
    pub const fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    /// Current execution state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Returns `true` once the interrupt queue has overflowed.
    #[must_use]
    pub const fn on_fire(&self) -> bool {
        self.run_state.on_fire()
    }

    /// Total cycles charged since creation or the last reset.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.registers.cycles()
    }

    /// Ticks that ran to completion since creation or the last reset. Ticks
    /// that halt or fault are not counted.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Attaches `device`, returning the index `HWQ`/`HWI` address it by.
    pub fn attach_device(&mut self, device: Box<dyn Device>) -> u16 {
        let index = u16::try_from(self.devices.len()).unwrap_or(u16::MAX);
        debug!("attached device {index}: {device:?}");
        self.devices.push(device);
        index
    }

    /// Number of attached devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Installs a trace sink. Events flow only while tracing is enabled in
    /// the configuration.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }

    pub(crate) fn emit(&mut self, event: TraceEvent) {
        if !self.config.tracing_enabled {
            return;
        }
        if let Some(sink) = self.trace.as_mut() {
            sink.on_event(event);
        }
    }

    /// Values written by `LOG` since the last drain, oldest first.
    pub fn drain_log(&mut self) -> Vec<u16> {
        self.log_queue.drain(..).collect()
    }

    /// Raises an interrupt from the host side, as hardware would.
    ///
    /// # Errors
    ///
    /// Returns the latched fault if the machine is already on fire, or
    /// [`FaultCode::InterruptQueueOverflow`] when this message overflows the
    /// queue.
    pub fn interrupt(&mut self, message: u16) -> Result<(), FaultCode> {
        if let Some(cause) = self.run_state.latched_fault() {
            return Err(cause);
        }
        raise_interrupt(self, message)
    }

    /// Executes one tick.
    pub fn tick(&mut self) -> StepOutcome {
        step_one(self)
    }

    /// Alias of [`Machine::tick`].
    pub fn step(&mut self) -> StepOutcome {
        self.tick()
    }

    /// Runs until a limit, cancellation, break, halt or fault.
    pub fn run(&mut self, limits: RunLimits, cancel: &dyn CancelToken) -> RunOutcome {
        self.run_until(limits, cancel, |_| false)
    }

    /// Runs like [`Machine::run`], also stopping when `at_breakpoint` accepts
    /// the `PC` reached after a tick.
    ///
    /// Limits and cancellation are checked before every tick.
    pub fn run_until<F>(
        &mut self,
        limits: RunLimits,
        cancel: &dyn CancelToken,
        mut at_breakpoint: F,
    ) -> RunOutcome
    where
        F: FnMut(u16) -> bool,
    {
        let start_cycles = self.cycles();
        let mut ticks = 0_u64;
        let mut last_step = None;

        let stop = loop {
            match self.run_state {
                RunState::FaultLatched(cause) => break StopReason::Fault { cause },
                RunState::Halted => break StopReason::Halted,
                RunState::Running => {}
            }
            if limits.max_ticks.is_some_and(|max| ticks >= max) {
                break StopReason::TickLimit;
            }
            if limits
                .max_cycles
                .is_some_and(|max| self.cycles().saturating_sub(start_cycles) >= max)
            {
                break StopReason::CycleLimit;
            }
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let outcome = self.tick();
            ticks += 1;
            last_step = Some(outcome);

            match outcome {
                StepOutcome::Fault { cause } => break StopReason::Fault { cause },
                StepOutcome::Halted => break StopReason::Halted,
                StepOutcome::Break { message } => break StopReason::Break { message },
                StepOutcome::Retired { .. } | StepOutcome::Skipped { .. } => {}
            }

            let pc = self.registers.pc();
            if at_breakpoint(pc) {
                break StopReason::Breakpoint { pc };
            }
        };

        debug!("run stopped after {ticks} ticks: {stop:?}");
        RunOutcome {
            ticks,
            stop,
            last_step,
        }
    }

    /// Returns to the power-on state: registers, queue, log, tick count and
    /// run state are cleared. Memory and devices are kept.
    pub fn reset(&mut self) {
        if self.run_state.on_fire() {
            warn!("resetting a machine that was on fire");
        }
        self.registers = RegisterFile::default();
        self.interrupts.clear();
        self.log_queue.clear();
        self.ticks = 0;
        self.run_state = RunState::Running;
    }
}
