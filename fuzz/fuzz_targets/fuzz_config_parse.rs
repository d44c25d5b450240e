#![no_main]

use libfuzzer_sys::fuzz_target;

use lapse_ledger::LedgerConfig;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text as a config file: parsing either fails cleanly or
    // yields parameters that build a clock.
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = LedgerConfig::from_toml_str(text) {
        assert!(config.clock().is_ok());
    }
});
