//! 파일 테일러 -- 감시 대상 파일에 새로 추가된 라인을 순서대로 읽어 [`LogEvent`]로 변환합니다.
//!
//! `tail -f`와 유사하게 동작합니다.
//!
//! - 시작 시 파일 끝으로 이동하므로 기존 내용은 처리하지 않습니다.
//! - 파일이 없을 때만 빈 파일을 생성합니다. 기존 파일은 읽기 전용으로 엽니다.
//! - 새 내용이 없으면 `poll_interval` 동안 대기합니다 (취소 토큰에 즉시 반응).
//! - 개행으로 끝나지 않은 마지막 라인은 개행이 도착할 때까지 보류합니다.
//!
//! # 로테이션 감지
//! - 파일 크기가 현재 오프셋보다 작아짐 (truncation)
//! - inode 변경 (logrotate 등, Unix 전용)
//!
//! 감지되면 `reopen_on_truncate` 설정에 따라 새 파일을 처음부터 다시 읽거나
//! 치명적 에러로 종료합니다. 파일이 사라진 경우도 같습니다: 재열기가 켜져 있으면
//! 다시 생길 때까지 기다리고, 꺼져 있으면 에러로 종료합니다.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tailguard_core::config::WatcherConfig;
use tailguard_core::event::LogEvent;
use tailguard_core::metrics as m;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::LogPipelineError;
use crate::parser::{LineParser, ParseOutcome};

/// 테일러 설정
#[derive(Debug, Clone)]
pub struct TailerConfig {
    /// 감시할 파일 경로
    pub path: PathBuf,
    /// 새 내용이 없을 때 대기 간격
    pub poll_interval: Duration,
    /// 최대 라인 길이 (바이트, 개행 제외)
    pub max_line_length: usize,
    /// 잘림/교체 감지 시 처음부터 다시 읽을지 여부
    pub reopen_on_truncate: bool,
}

impl TailerConfig {
    /// 기본값으로 설정을 생성합니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_core(&WatcherConfig::default()).with_path(path)
    }

    /// core 설정에서 테일러 설정을 생성합니다.
    pub fn from_core(core: &WatcherConfig) -> Self {
        Self {
            path: PathBuf::from(&core.path),
            poll_interval: core.poll_interval(),
            max_line_length: core.max_line_length,
            reopen_on_truncate: core.reopen_on_truncate,
        }
    }

    /// 경로를 변경합니다.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// 대기 간격을 변경합니다.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 최대 라인 길이를 변경합니다.
    pub fn with_max_line_length(mut self, len: usize) -> Self {
        self.max_line_length = len;
        self
    }

    /// 잘림 감지 시 동작을 변경합니다.
    pub fn with_reopen_on_truncate(mut self, reopen: bool) -> Self {
        self.reopen_on_truncate = reopen;
        self
    }
}

/// 열린 파일의 읽기 위치
struct Cursor {
    reader: BufReader<File>,
    /// 리더에서 꺼낸 바이트 위치 (보류 중인 부분 라인 포함)
    consumed: u64,
    inode: Option<u64>,
}

impl Cursor {
    async fn open(path: &Path, from_end: bool) -> std::io::Result<Self> {
        let mut file = File::open(path).await?;
        let metadata = file.metadata().await?;
        let consumed = if from_end {
            file.seek(SeekFrom::End(0)).await?
        } else {
            0
        };

        Ok(Self {
            reader: BufReader::new(file),
            consumed,
            inode: inode_of(&metadata),
        })
    }
}

#[cfg(unix)]
fn inode_of(metadata: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.ino())
}

#[cfg(not(unix))]
fn inode_of(_metadata: &std::fs::Metadata) -> Option<u64> {
    None
}

/// 한 번의 읽기 결과
enum ReadLine {
    Line(String),
    /// 완성된 라인 없음 (EOF)
    Pending,
}

/// 파일 테일러
///
/// [`next_event`](Self::next_event)를 반복 호출하여 이벤트를 하나씩 꺼냅니다.
/// 이벤트는 파일에 기록된 순서대로 반환됩니다.
pub struct LogTailer {
    config: TailerConfig,
    parser: LineParser,
    cancel: CancellationToken,
    cursor: Cursor,
    /// 개행 전까지 누적된 바이트
    partial: Vec<u8>,
    /// 최대 길이를 넘은 라인의 나머지를 버리는 중
    discarding: bool,
    finished: bool,
    lines_read: u64,
    events_emitted: u64,
}

impl LogTailer {
    /// 파일을 열고 끝으로 이동합니다. 파일이 없으면 빈 파일을 생성합니다.
    ///
    /// 이미 있는 파일에는 쓰기 권한이 필요하지 않습니다.
    pub async fn open(
        config: TailerConfig,
        cancel: CancellationToken,
    ) -> Result<Self, LogPipelineError> {
        let shown = config.path.display().to_string();

        match tokio::fs::metadata(&config.path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 동시에 생성된 경우를 위해 create_new 대신 create (truncate 없음)
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&config.path)
                    .await
                    .map_err(|e| LogPipelineError::tail(&shown, format!("create failed: {e}")))?;
                debug!(path = %shown, "watched file created");
            }
            Err(e) => return Err(LogPipelineError::tail(&shown, format!("stat failed: {e}"))),
        }

        let cursor = Cursor::open(&config.path, true)
            .await
            .map_err(|e| LogPipelineError::tail(&shown, format!("open failed: {e}")))?;

        info!(
            path = %shown,
            offset = cursor.consumed,
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            "tailer opened"
        );

        Ok(Self {
            config,
            parser: LineParser::new(),
            cancel,
            cursor,
            partial: Vec::new(),
            discarding: false,
            finished: false,
            lines_read: 0,
            events_emitted: 0,
        })
    }

    /// 다음 이벤트를 기다립니다.
    ///
    /// - `Ok(Some(event))`: 새 이벤트
    /// - `Ok(None)`: 취소되어 종료
    /// - `Err(_)`: 파일을 더 이상 읽을 수 없음 (이후 호출은 `Ok(None)`)
    ///
    /// 취소 안전(cancel safe)합니다. 반환 전에 future를 버려도 읽던 바이트는 보존됩니다.
    pub async fn next_event(&mut self) -> Result<Option<LogEvent>, LogPipelineError> {
        loop {
            if self.finished || self.cancel.is_cancelled() {
                self.finished = true;
                return Ok(None);
            }

            let step = match self.read_line().await {
                Ok(step) => step,
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            };

            match step {
                ReadLine::Line(line) => {
                    if let Some(event) = self.handle_line(&line) {
                        return Ok(Some(event));
                    }
                }
                ReadLine::Pending => {
                    match self.check_rotation().await {
                        Ok(true) => continue,
                        Ok(false) => {}
                        Err(e) => {
                            self.finished = true;
                            return Err(e);
                        }
                    }

                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            debug!(path = %self.config.path.display(), "tailer cancelled");
                            self.finished = true;
                            return Ok(None);
                        }
                        () = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> Option<LogEvent> {
        self.lines_read += 1;
        metrics::counter!(m::TAILER_LINES_READ_TOTAL).increment(1);

        match self.parser.parse(line) {
            ParseOutcome::Event(event) => {
                self.events_emitted += 1;
                metrics::counter!(m::PARSER_EVENTS_TOTAL).increment(1);
                Some(event)
            }
            ParseOutcome::Skipped(reason) => {
                trace!(%reason, "line skipped");
                metrics::counter!(m::PARSER_LINES_SKIPPED_TOTAL, m::LABEL_REASON => reason.as_str())
                    .increment(1);
                None
            }
        }
    }

    /// 완성된 라인을 하나 읽습니다.
    ///
    /// 보류 버퍼는 `max_line_length + 1` 바이트(`\r` 포함)를 넘지 않습니다.
    /// 한도를 넘은 라인은 개행이 나올 때까지 읽어서 버립니다.
    async fn read_line(&mut self) -> Result<ReadLine, LogPipelineError> {
        let limit = self.config.max_line_length;

        loop {
            let available = match self.cursor.reader.fill_buf().await {
                Ok(buf) => buf,
                Err(e) => {
                    return Err(LogPipelineError::tail(
                        self.config.path.display().to_string(),
                        e,
                    ));
                }
            };
            if available.is_empty() {
                return Ok(ReadLine::Pending);
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let taken = newline.map_or(available.len(), |i| i + 1);
            let body = &available[..newline.unwrap_or(taken)];

            if !self.discarding {
                if self.partial.len() + body.len() > limit + 1 {
                    warn!(
                        path = %self.config.path.display(),
                        max = limit,
                        "line exceeds max length, discarding"
                    );
                    self.partial.clear();
                    self.discarding = true;
                } else {
                    self.partial.extend_from_slice(body);
                }
            }

            self.cursor.reader.consume(taken);
            self.cursor.consumed += taken as u64;

            if newline.is_none() {
                continue;
            }

            if self.discarding {
                self.discarding = false;
                continue;
            }

            let mut raw = std::mem::take(&mut self.partial);
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }

            if raw.len() > limit {
                warn!(
                    path = %self.config.path.display(),
                    bytes = raw.len(),
                    max = limit,
                    "line exceeds max length, discarding"
                );
                continue;
            }

            return Ok(ReadLine::Line(String::from_utf8_lossy(&raw).into_owned()));
        }
    }

    /// EOF에서 파일 잘림/교체 여부를 확인합니다. 다시 열었으면 `true`.
    async fn check_rotation(&mut self) -> Result<bool, LogPipelineError> {
        let metadata = match tokio::fs::metadata(&self.config.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if !self.config.reopen_on_truncate {
                    return Err(LogPipelineError::tail(
                        self.config.path.display().to_string(),
                        "file removed",
                    ));
                }
                // 로테이션 도중: 새 파일이 생길 때까지 기존 핸들 유지
                debug!(path = %self.config.path.display(), "watched file missing, waiting");
                return Ok(false);
            }
            Err(e) => return Err(self.read_error(e)),
        };

        let truncated = metadata.len() < self.offset();
        let replaced = match (self.cursor.inode, inode_of(&metadata)) {
            (Some(old), Some(new)) => old != new,
            _ => false,
        };

        if !truncated && !replaced {
            return Ok(false);
        }

        let shown = self.config.path.display().to_string();
        if !self.config.reopen_on_truncate {
            let reason = if replaced {
                "file replaced"
            } else {
                "file truncated"
            };
            return Err(LogPipelineError::tail(shown, reason));
        }

        warn!(
            path = %shown,
            truncated,
            replaced,
            previous_offset = self.offset(),
            "file rotated, reopening from start"
        );

        self.cursor = match Cursor::open(&self.config.path, false).await {
            Ok(cursor) => cursor,
            // 확인 직후 사라짐: 다음 폴링에서 재시도
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(LogPipelineError::tail(shown, format!("reopen failed: {e}"))),
        };
        self.partial.clear();
        self.discarding = false;
        metrics::counter!(m::TAILER_REOPENS_TOTAL).increment(1);

        Ok(true)
    }

    fn read_error(&self, e: std::io::Error) -> LogPipelineError {
        LogPipelineError::tail(self.config.path.display().to_string(), e)
    }

    /// 감시 대상 경로
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// 현재 읽기 오프셋 (바이트)
    pub fn offset(&self) -> u64 {
        self.cursor.consumed
    }

    /// 지금까지 읽은 완성된 라인 수 (버려진 라인 포함, 초과 길이 라인 제외)
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// 지금까지 생성한 이벤트 수
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted
    }

    /// 종료 여부 (취소 또는 치명적 에러)
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl std::fmt::Debug for LogTailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogTailer")
            .field("path", &self.config.path)
            .field("offset", &self.offset())
            .field("lines_read", &self.lines_read)
            .field("events_emitted", &self.events_emitted)
            .field("finished", &self.finished)
            .finish()
    }
}
