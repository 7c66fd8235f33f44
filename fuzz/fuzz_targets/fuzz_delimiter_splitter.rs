#![no_main]
use libfuzzer_sys::fuzz_target;
use weigh_hardware::DelimiterSplitter;

fuzz_target!(|data: &[u8]| {
    // Split at every byte boundary; frames must never contain the delimiter.
    let mut splitter = DelimiterSplitter::default().with_max_buffered(1024);
    for chunk in data.chunks(7) {
        splitter.push(chunk, |frame| {
            assert!(!frame.is_empty());
            assert!(!frame.windows(3).any(|w| w == [0x03, 0x04, 0x00]));
        });
    }
    assert!(splitter.pending() <= 1024);
});
