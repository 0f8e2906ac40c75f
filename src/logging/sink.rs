use super::config::LogLevel;
use anyhow::{anyhow, Context as _, Result};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// 未显式指定日志器名称的事件归入该名称
pub const DEFAULT_LOGGER: &str = "onekey";

pub(crate) const FIELD_LOGGER: &str = "logger";
pub(crate) const FIELD_MODULE: &str = "log_module";
pub(crate) const FIELD_FUNCTION: &str = "log_function";
pub(crate) const FIELD_LINE: &str = "log_line";
pub(crate) const FIELD_CRITICAL: &str = "critical";

/// 单条日志记录
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub name: String,
    pub level: LogLevel,
    pub timestamp: DateTime<Local>,
    pub module: String,
    pub function: Option<String>,
    pub line: u32,
    pub message: String,
}

impl LogRecord {
    /// 文件行格式：
    /// `[时间] | [名称:级别] | [模块.函数:行号] - 消息`
    pub fn file_line(&self) -> String {
        let location = match &self.function {
            Some(function) => format!("{}.{}:{}", self.module, function, self.line),
            None => format!("{}:{}", self.module, self.line),
        };
        format!(
            "[{}] | [{}:{}] | [{}] - {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.name,
            self.level,
            location,
            self.message
        )
    }

    /// 控制台只输出按级别着色的消息
    pub fn console_line(&self) -> String {
        format!("{}\n", self.level.console_style().paint(self.message.as_str()))
    }
}

struct NamedTarget {
    level: LogLevel,
    file: Option<NonBlocking>,
}

/// 具名日志输出表
///
/// 每个名称对应一个输出阈值和可选的文件写入器；记录只会写入与其名称匹配的文件。
pub struct LogSink {
    log_dir: PathBuf,
    console: bool,
    targets: RwLock<HashMap<String, NamedTarget>>,
    guards: Mutex<Vec<WorkerGuard>>,
}

impl LogSink {
    pub fn new(log_dir: impl Into<PathBuf>, console: bool) -> Self {
        Self {
            log_dir: log_dir.into(),
            console,
            targets: RwLock::new(HashMap::new()),
            guards: Mutex::new(Vec::new()),
        }
    }

    pub fn log_file_path(&self, name: &str) -> PathBuf {
        self.log_dir.join(format!("{name}.log"))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.targets
            .read()
            .map(|targets| targets.contains_key(name))
            .unwrap_or(false)
    }

    /// 配置具名输出，同一名称只配置一次
    ///
    /// 返回 `true` 表示本次为首次配置。
    pub fn register(&self, name: &str, debug_mode: bool, to_file: bool) -> Result<bool> {
        let mut targets = self
            .targets
            .write()
            .map_err(|_| anyhow!("日志输出表锁已损坏"))?;
        if targets.contains_key(name) {
            return Ok(false);
        }

        let file = if to_file {
            Some(self.open_file(name)?)
        } else {
            None
        };
        targets.insert(
            name.to_string(),
            NamedTarget {
                level: LogLevel::threshold(debug_mode),
                file,
            },
        );
        Ok(true)
    }

    fn open_file(&self, name: &str) -> Result<NonBlocking> {
        fs::create_dir_all(&self.log_dir)
            .with_context(|| format!("无法创建日志目录: {:?}", self.log_dir))?;

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(name)
            .filename_suffix("log")
            .build(&self.log_dir)
            .with_context(|| format!("无法创建日志文件: {:?}", self.log_file_path(name)))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        match self.guards.lock() {
            Ok(mut guards) => guards.push(guard),
            Err(poisoned) => poisoned.into_inner().push(guard),
        }
        Ok(writer)
    }

    /// 按名称路由一条记录
    pub fn dispatch(&self, record: &LogRecord) {
        let Ok(targets) = self.targets.read() else {
            return;
        };
        let Some(target) = targets.get(&record.name) else {
            return;
        };
        if record.level < target.level {
            return;
        }

        if self.console {
            let _ = io::stderr().lock().write_all(record.console_line().as_bytes());
        }
        if let Some(file) = &target.file {
            let mut writer = file.clone();
            let _ = writer.write_all(record.file_line().as_bytes());
        }
    }

    /// 刷新并关闭所有文件写入器
    ///
    /// 释放 worker guard 会等待后台线程写完已排队的记录；之后的文件写入将被丢弃。
    pub fn flush(&self) {
        let guards = match self.guards.lock() {
            Ok(mut guards) => std::mem::take(&mut *guards),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        drop(guards);
    }
}

/// 将 `tracing` 事件转换为 [`LogRecord`] 并交给 [`LogSink`]
pub struct NamedLogLayer {
    sink: Arc<LogSink>,
}

impl NamedLogLayer {
    pub fn new(sink: Arc<LogSink>) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for NamedLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let record = visitor.into_record(event.metadata());
        self.sink.dispatch(&record);
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    logger: Option<String>,
    module: Option<String>,
    function: Option<String>,
    line: Option<u32>,
    critical: bool,
    extra: Vec<String>,
}

impl RecordVisitor {
    fn set(&mut self, name: &str, value: String) {
        match name {
            "message" => self.message = Some(value),
            FIELD_LOGGER => self.logger = Some(value),
            FIELD_MODULE => self.module = Some(value),
            FIELD_FUNCTION => {
                if !value.is_empty() {
                    self.function = Some(value);
                }
            }
            _ => self.extra.push(format!("{name}={value}")),
        }
    }

    fn into_record(self, metadata: &Metadata<'_>) -> LogRecord {
        let level = if self.critical {
            LogLevel::Critical
        } else {
            LogLevel::from(*metadata.level())
        };
        let module = self.module.unwrap_or_else(|| {
            short_module(metadata.module_path().unwrap_or_else(|| metadata.target())).to_string()
        });

        let mut message = self.message.unwrap_or_default();
        if !self.extra.is_empty() {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(&self.extra.join(" "));
        }

        LogRecord {
            name: self.logger.unwrap_or_else(|| DEFAULT_LOGGER.to_string()),
            level,
            timestamp: Local::now(),
            module,
            function: self.function,
            line: self.line.or(metadata.line()).unwrap_or(0),
            message,
        }
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == FIELD_LINE {
            self.line = u32::try_from(value).ok();
        } else {
            self.set(field.name(), value.to_string());
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == FIELD_CRITICAL {
            self.critical = value;
        } else {
            self.set(field.name(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.set(field.name(), format!("{value:?}"));
    }
}

/// `onekey::app::lifecycle` -> `lifecycle`
pub(crate) fn short_module(module_path: &str) -> &str {
    module_path.rsplit("::").next().unwrap_or(module_path)
}
