#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use tailguard_log_pipeline::LineParser;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let parser = LineParser::new();
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    // 같은 수집 시각이면 결과가 같아야 함
    let first = parser.parse_at(&line, at);
    let second = parser.parse_at(&line, at);
    assert_eq!(first, second);
});
