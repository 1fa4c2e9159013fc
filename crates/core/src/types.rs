//! 도메인 타입 -- 분석 결과와 심각도
//!
//! 파이프라인 코어는 [`AnalysisResult`]를 해석하지 않고 알림 채널로 그대로 전달합니다.
//! 필드는 알림 채널 구현이 메시지를 구성하는 데 필요한 정보입니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 심각도 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Info < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 정보성 이벤트
    #[default]
    Info,
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 -- 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" | "informational" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// 분석 결과 (verdict)
///
/// 분석기가 생성하고 알림 채널이 소비합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 알림 전송 여부
    pub should_alert: bool,
    /// 분석기가 판단한 심각도
    #[serde(default)]
    pub severity: Severity,
    /// 요약
    #[serde(default)]
    pub summary: String,
    /// 권장 조치
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    /// 결과를 생성한 분석기 이름
    #[serde(default)]
    pub analyzer: String,
}

impl AnalysisResult {
    /// 알림이 필요한 분석 결과를 생성합니다.
    pub fn alert(severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            should_alert: true,
            severity,
            summary: summary.into(),
            suggested_fix: None,
            analyzer: String::new(),
        }
    }

    /// 알림이 필요 없는 분석 결과를 생성합니다.
    pub fn no_alert(severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            should_alert: false,
            ..Self::alert(severity, summary)
        }
    }

    /// 권장 조치를 설정합니다.
    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    /// 분석기 이름을 설정합니다.
    pub fn with_analyzer(mut self, name: impl Into<String>) -> Self {
        self.analyzer = name.into();
        self
    }
}
