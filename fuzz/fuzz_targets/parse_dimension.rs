#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(dimension) = raffle_ops::fuzzing::parse_dimension_input(input) {
            debug_assert!(!dimension.name.is_empty());
            debug_assert_eq!(dimension.value, dimension.value.trim());
        }
    }
});
