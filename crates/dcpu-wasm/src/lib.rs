use dcpu_core::{Debugger, NeverCancel, RunLimits, RunState};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

macro_rules! console_log {
    ($($t:tt)*) => (web_sys::console::log_1(&JsValue::from_str(&format!($($t)*))))
}

/// JS-facing summary of the machine's run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasmStatus {
    pub cycles: u64,
    pub on_fire: bool,
    pub halted: bool,
    pub pending_interrupts: usize,
}

impl WasmStatus {
    fn of(debugger: &Debugger) -> Self {
        let machine = debugger.machine();
        Self {
            cycles: machine.cycles(),
            on_fire: machine.on_fire(),
            halted: machine.run_state() == RunState::Halted,
            pending_interrupts: machine.interrupts().len(),
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

/// Browser handle over one debugger. Calling `free()` (or `destroy()`)
/// releases the machine.
#[wasm_bindgen]
pub struct WasmDebugger {
    debugger: Debugger,
}

impl Default for WasmDebugger {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmDebugger {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        Self {
            debugger: Debugger::new(),
        }
    }

    /// Copies `program` into memory starting at `offset`.
    pub fn load_program(&mut self, offset: u16, program: &[u16]) -> Result<(), JsValue> {
        self.debugger
            .load(offset, program)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        console_log!("Loaded {} words at {:#06x}", program.len(), offset);
        Ok(())
    }

    /// Copy of the whole memory as a `Uint16Array`.
    #[must_use]
    pub fn ram(&self) -> js_sys::Uint16Array {
        js_sys::Uint16Array::from(self.debugger.ram())
    }

    /// Writes a single memory word.
    pub fn write_ram(&mut self, addr: u16, value: u16) {
        self.debugger.ram_mut()[usize::from(addr)] = value;
    }

    /// Register snapshot as a plain JS object.
    pub fn registers(&self) -> Result<JsValue, JsValue> {
        to_js(&self.debugger.registers())
    }

    /// Executes one tick.
    pub fn step(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.debugger.step())
    }

    /// Runs at most `max_ticks` ticks, stopping early on breakpoints.
    pub fn continue_for(&mut self, max_ticks: u32) -> Result<JsValue, JsValue> {
        let outcome = self
            .debugger
            .continue_exec(RunLimits::ticks(u64::from(max_ticks)), &NeverCancel);
        to_js(&outcome)
    }

    pub fn add_breakpoint(&mut self, addr: u16) -> bool {
        self.debugger.add_breakpoint(addr)
    }

    pub fn remove_breakpoint(&mut self, addr: u16) -> bool {
        self.debugger.remove_breakpoint(addr)
    }

    /// Raises a hardware interrupt; rejects once the machine is on fire.
    pub fn interrupt(&mut self, message: u16) -> Result<(), JsValue> {
        self.debugger
            .interrupt(message)
            .map_err(|cause| JsValue::from_str(&cause.to_string()))
    }

    pub fn drain_log(&mut self) -> Vec<u16> {
        self.debugger.drain_log()
    }

    /// Disassembly text for `count` instructions from `addr`.
    pub fn disassemble(&self, addr: u16, count: usize) -> Vec<String> {
        self.debugger
            .disassemble(addr, count)
            .into_iter()
            .map(|row| row.text)
            .collect()
    }

    pub fn status(&self) -> Result<JsValue, JsValue> {
        to_js(&WasmStatus::of(&self.debugger))
    }

    /// Resets registers and interrupt state; memory is kept.
    pub fn reset(&mut self) {
        self.debugger.reset();
    }

    /// Consumes the handle.
    pub fn destroy(self) {}
}
