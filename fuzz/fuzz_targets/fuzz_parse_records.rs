#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz record ingestion.
///
/// Feeds arbitrary UTF-8 strings to `parse_records_str`, which runs layout
/// detection and both the JSON Lines and JSON array readers.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = metaqual::parsers::parse_records_str(s);
    }
});
