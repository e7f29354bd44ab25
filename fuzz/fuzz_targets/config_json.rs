#![no_main]

use libfuzzer_sys::fuzz_target;
use raffle_ops::config::types::ConfigFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let parsed = serde_json::from_str::<ConfigFile>(input).is_ok();
        let applied = raffle_ops::fuzzing::apply_config_from_json(input);
        if applied.is_ok() {
            debug_assert!(parsed);
        }
    }
});
