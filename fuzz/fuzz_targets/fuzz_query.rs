#![no_main]
use libfuzzer_sys::fuzz_target;

// P3: any string either round-trips through the parser or returns a
// ParseError -- it must never panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(query) = std::str::from_utf8(data) {
        let _ = scry::query::parse(query);
    }
});
