//! 웹훅 알림 채널
//!
//! 알림을 HTTP POST로 전송합니다. 두 가지 페이로드 형식을 지원합니다.
//!
//! - [`WebhookFormat::Discord`]: Discord embed (심각도별 색상, 필드, 스택 트레이스 발췌)
//! - [`WebhookFormat::Json`]: 이벤트와 분석 결과를 담은 JSON 객체
//!
//! 2xx 이외의 응답은 전송 실패입니다.

use std::fmt;
use std::str::FromStr;

use reqwest::Client;
use serde::Serialize;
use tailguard_core::error::SinkError;
use tailguard_core::event::LogEvent;
use tailguard_core::pipeline::AlertSink;
use tailguard_core::types::{AnalysisResult, Severity};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::LogPipelineError;

/// 스택 트레이스 발췌 최대 길이 (문자)
pub const STACK_TRACE_EXCERPT: usize = 1000;

/// 심각도별 embed 색상 (10진수)
pub mod colors {
    /// Critical - red
    pub const CRITICAL: u32 = 15158332; // #E74C3C
    /// High - orange
    pub const HIGH: u32 = 15105570; // #E67E22
    /// Medium - yellow
    pub const MEDIUM: u32 = 16776960; // #FFFF00
    /// Low - blue
    pub const LOW: u32 = 3447003; // #3498DB
    /// Info - green
    pub const INFO: u32 = 3066993; // #2ECC71
}

/// 웹훅 페이로드 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WebhookFormat {
    /// Discord embed 메시지
    #[default]
    Discord,
    /// 일반 JSON 객체
    Json,
}

impl FromStr for WebhookFormat {
    type Err = LogPipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discord" => Ok(Self::Discord),
            "json" => Ok(Self::Json),
            other => Err(LogPipelineError::Config {
                field: "alerts.webhook.format".to_owned(),
                reason: format!("unknown format '{other}'"),
            }),
        }
    }
}

impl fmt::Display for WebhookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discord => f.write_str("discord"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Discord webhook message payload
#[derive(Debug, Serialize)]
struct DiscordMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
    color: u32,
    fields: Vec<DiscordEmbedField>,
    timestamp: String,
    footer: DiscordFooter,
}

#[derive(Debug, Serialize)]
struct DiscordEmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct DiscordFooter {
    text: String,
}

/// JSON 형식 페이로드
#[derive(Debug, Serialize)]
struct JsonAlert<'a> {
    event: &'a LogEvent,
    analysis: &'a AnalysisResult,
    fingerprint: String,
}

/// 웹훅 알림 채널
#[derive(Debug, Clone)]
pub struct WebhookSink {
    url: String,
    format: WebhookFormat,
    username: Option<String>,
    client: Client,
}

impl WebhookSink {
    /// 새 웹훅 채널을 생성합니다.
    pub fn new(url: impl Into<String>, format: WebhookFormat) -> Result<Self, LogPipelineError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(LogPipelineError::Config {
                field: "alerts.webhook.url".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        let client = Client::builder()
            .user_agent(concat!("tailguard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url,
            format,
            username: None,
            client,
        })
    }

    /// Discord 메시지의 발신자 이름을 설정합니다. 빈 문자열이면 웹훅 기본값 사용.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        self.username = (!username.is_empty()).then_some(username);
        self
    }

    /// 웹훅 URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 페이로드 형식
    pub fn format(&self) -> WebhookFormat {
        self.format
    }

    /// 전송할 페이로드를 생성합니다.
    pub fn payload(
        &self,
        event: &LogEvent,
        analysis: &AnalysisResult,
    ) -> Result<serde_json::Value, SinkError> {
        let value = match self.format {
            WebhookFormat::Discord => serde_json::to_value(self.discord_message(event, analysis)),
            WebhookFormat::Json => serde_json::to_value(JsonAlert {
                event,
                analysis,
                fingerprint: event.fingerprint(),
            }),
        };
        value.map_err(|e| SinkError::Payload(e.to_string()))
    }

    fn discord_message(&self, event: &LogEvent, analysis: &AnalysisResult) -> DiscordMessage {
        let mut fields = vec![
            DiscordEmbedField {
                name: "Source".to_owned(),
                value: format!("`{}`", event.source),
                inline: true,
            },
            DiscordEmbedField {
                name: "Level".to_owned(),
                value: event.level.clone(),
                inline: true,
            },
            DiscordEmbedField {
                name: "Severity".to_owned(),
                value: analysis.severity.to_string().to_uppercase(),
                inline: true,
            },
            DiscordEmbedField {
                name: "Message".to_owned(),
                value: non_empty(excerpt(&event.message, STACK_TRACE_EXCERPT)),
                inline: false,
            },
        ];

        if let Some(fix) = analysis.suggested_fix.as_deref().filter(|f| !f.is_empty()) {
            fields.push(DiscordEmbedField {
                name: "Suggested fix".to_owned(),
                value: excerpt(fix, STACK_TRACE_EXCERPT),
                inline: false,
            });
        }

        if event.has_stack_trace() {
            fields.push(DiscordEmbedField {
                name: "Stack trace".to_owned(),
                value: format!("```\n{}\n```", excerpt(&event.stack_trace, STACK_TRACE_EXCERPT)),
                inline: false,
            });
        }

        let description = if analysis.summary.is_empty() {
            event.message.clone()
        } else {
            analysis.summary.clone()
        };

        DiscordMessage {
            username: self.username.clone(),
            embeds: vec![DiscordEmbed {
                title: format!(
                    "[{}] {}",
                    analysis.severity.to_string().to_uppercase(),
                    event.source
                ),
                description: excerpt(&description, 4000),
                color: severity_color(analysis.severity),
                fields,
                timestamp: event.timestamp.to_rfc3339(),
                footer: DiscordFooter {
                    text: format!("fingerprint {}", event.fingerprint()),
                },
            }],
        }
    }

    async fn post(&self, payload: &serde_json::Value) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| SinkError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body: excerpt(&body, 200),
            });
        }

        debug!(format = %self.format, status = status.as_u16(), "webhook alert sent");
        Ok(())
    }
}

impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(
        &self,
        event: &LogEvent,
        analysis: &AnalysisResult,
        cancel: &CancellationToken,
    ) -> Result<(), SinkError> {
        let payload = self.payload(event, analysis)?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SinkError::Cancelled),
            result = self.post(&payload) => result,
        }
    }
}

/// 심각도를 embed 색상으로 변환합니다.
pub fn severity_color(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => colors::CRITICAL,
        Severity::High => colors::HIGH,
        Severity::Medium => colors::MEDIUM,
        Severity::Low => colors::LOW,
        Severity::Info => colors::INFO,
    }
}

/// 문자 단위로 잘라냅니다. 잘렸으면 `...`를 붙입니다.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

fn non_empty(value: String) -> String {
    if value.is_empty() {
        "-".to_owned()
    } else {
        value
    }
}
