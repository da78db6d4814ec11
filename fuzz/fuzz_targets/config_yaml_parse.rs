//! Fuzz target for configuration document parsing and validation.
//!
//! Arbitrary input is parsed as YAML and, when it parses, run through the
//! full static validator. Malformed documents must surface as errors or
//! report issues, never as panics.
//!
//! Run with:
//!   cargo +nightly fuzz run config_yaml_parse

#![no_main]

use forecast_lifecycle::validation::validate_yaml;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid OOM on very large inputs.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let _ = validate_yaml(content, "fuzz");
});
