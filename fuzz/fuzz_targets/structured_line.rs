#![no_main]

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use tailguard_log_pipeline::{LineParser, ParseOutcome};

/// 퍼저용 구조화 로그 레코드
#[derive(Arbitrary, Debug)]
struct FuzzRecord {
    level: FuzzLevel,
    template: Option<String>,
    rendered: Option<String>,
    exception: Option<String>,
    source_context: Option<String>,
    timestamp: Option<String>,
}

#[derive(Arbitrary, Debug)]
enum FuzzLevel {
    Error,
    Fatal,
    Other(String),
}

impl FuzzLevel {
    fn as_str(&self) -> &str {
        match self {
            FuzzLevel::Error => "Error",
            FuzzLevel::Fatal => "Fatal",
            FuzzLevel::Other(s) => s,
        }
    }

    fn qualifies(&self) -> bool {
        matches!(self.as_str(), "Error" | "Fatal")
    }
}

impl FuzzRecord {
    /// 에러/치명 레벨이거나 예외가 있으면 알림 대상
    fn qualifies(&self) -> bool {
        self.level.qualifies() || self.exception.as_deref().is_some_and(|x| !x.is_empty())
    }
}

fuzz_target!(|record: FuzzRecord| {
    let mut object = serde_json::Map::new();
    object.insert("@l".into(), record.level.as_str().into());
    if let Some(v) = &record.template {
        object.insert("@mt".into(), v.as_str().into());
    }
    if let Some(v) = &record.rendered {
        object.insert("@m".into(), v.as_str().into());
    }
    if let Some(v) = &record.exception {
        object.insert("@x".into(), v.as_str().into());
    }
    if let Some(v) = &record.source_context {
        object.insert("SourceContext".into(), v.as_str().into());
    }
    if let Some(v) = &record.timestamp {
        object.insert("@t".into(), v.as_str().into());
    }
    let line = serde_json::Value::Object(object).to_string();

    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let outcome = LineParser::new().parse_at(&line, at);

    // 유효한 JSON 객체는 항상 구조화 형식으로 처리됨
    match outcome {
        ParseOutcome::Event(event) => {
            assert!(record.qualifies());
            assert_eq!(event.level, record.level.as_str());
        }
        ParseOutcome::Skipped(_) => assert!(!record.qualifies()),
    }
});
