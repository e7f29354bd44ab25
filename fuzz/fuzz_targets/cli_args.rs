#![no_main]

use clap::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut args = vec!["raffle-ops".to_owned()];
        for token in input.split_whitespace().take(64) {
            args.push(token.to_owned());
        }
        if let Ok(cli) = raffle_ops::args::Cli::try_parse_from(&args) {
            if let raffle_ops::args::Command::Load(load) = cli.command {
                debug_assert!(load.users.get() > 0);
                debug_assert!(load.spawn_rate.get() > 0);
            }
        }
    }
});
