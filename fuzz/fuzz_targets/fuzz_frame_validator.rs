#![no_main]
use libfuzzer_sys::fuzz_target;
use weigh_core::{StabilityTracker, validate};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the validator; accepted frames feed the tracker.
    let mut tracker = StabilityTracker::new(2);
    if let Ok(reading) = validate(data) {
        let _ = tracker.observe(reading.weight);
        let _ = reading.weight.to_string();
    }
    for chunk in data.chunks(11) {
        if let Ok(reading) = validate(chunk) {
            let _ = tracker.observe(reading.weight);
        }
    }
});
