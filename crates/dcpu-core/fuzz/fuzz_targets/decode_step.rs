#![no_main]

use dcpu_core::{disassemble, DecodePolicy, Decoder, Machine, MachineConfig, NeverCancel, RunLimits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 7 {
        return;
    }

    let flags = data[0];
    let words: Vec<u16> = data[1..]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    let window = [words[0], words[1], words[2]];
    let _ = Decoder::new(flags & 1 != 0).decode(window);

    let config = MachineConfig {
        decode_policy: if flags & 2 != 0 {
            DecodePolicy::Strict
        } else {
            DecodePolicy::Permissive
        },
        debug_extensions: flags & 1 != 0,
        ..MachineConfig::default()
    };
    let mut machine = Machine::with_config(config);
    if machine.memory_mut().load(0, &words).is_err() {
        return;
    }
    if flags & 4 != 0 {
        let _ = machine.interrupt(words[0]);
    }
    let _ = machine.run(RunLimits::ticks(1024), &NeverCancel);
    let _ = disassemble(machine.memory(), 0, 16, flags & 1 != 0);
});
