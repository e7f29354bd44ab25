#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((results, _points)) = raffle_ops::fuzzing::decode_metric_page_input(data) {
        debug_assert!(results <= data.len());
    }
});
