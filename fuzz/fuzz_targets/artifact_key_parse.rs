//! Fuzz target for artifact key parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run artifact_key_parse

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }

    if let Ok(key) = std::str::from_utf8(data) {
        let _ = forecast_lifecycle::artifact::fuzz_parse_key(key);
    }
});
