#![no_main]
use libfuzzer_sys::fuzz_target;
use metaqual::quality::{Rubric, RubricDefinition};

/// Fuzz rubric loading: YAML parsing followed by compilation (regexes,
/// prerequisite resolution, weight checks).
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(definition) = RubricDefinition::from_yaml(s) {
            let _ = Rubric::from_definition(definition);
        }
    }
});
