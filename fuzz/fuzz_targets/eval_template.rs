#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let context = apl_databinding::context::Context::create_test_context();
        let value = apl_databinding::evaluator::evaluate(&context, s);
        let _ = value.serialize();
        let _ = value.as_string();
    }
});
