use nu_ansi_term::{Color, Style};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// 日志级别枚举（按严重程度递增排序）
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warning,
            Level::INFO => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

impl LogLevel {
    /// 具名日志器的控制台/文件输出阈值
    pub fn threshold(debug_mode: bool) -> Self {
        if debug_mode {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// 控制台着色样式
    pub fn console_style(self) -> Style {
        match self {
            LogLevel::Debug => Color::Blue.normal(),
            LogLevel::Info => Style::new().bold(),
            LogLevel::Warning => Color::Yellow.normal(),
            LogLevel::Error => Color::Red.normal(),
            LogLevel::Critical => Style::new().bold().on(Color::Red),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
