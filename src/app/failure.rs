//! 启动结果汇报
//!
//! 控制台可见时把错误打印出来并等待回车；控制台隐藏时只写一行 `error.log`。

use crate::core::{AppError, AppResult};
use crate::i18n::{MessageId, Strings};
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

/// 启动失败日志（工作目录下）
pub const ERROR_LOG_FILE: &str = "error.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 正常退出
    Success,
    /// Ctrl-C 退出，同样视为成功
    Interrupted,
    /// 启动失败
    Failed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success | Outcome::Interrupted => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::FAILURE,
        }
    }
}

/// 根据启动结果输出提示并给出退出结果
pub fn report_outcome<W: Write, R: BufRead>(
    result: AppResult<()>,
    show_console: bool,
    strings: &dyn Strings,
    out: &mut W,
    input: &mut R,
    error_log: &Path,
) -> Outcome {
    match result {
        Ok(()) => Outcome::Success,
        Err(AppError::Interrupted) => {
            if show_console {
                let _ = writeln!(out, "\n{}", strings.text(MessageId::MainExit, &[]));
            }
            Outcome::Interrupted
        }
        Err(e) => {
            report_startup_failure(&e, show_console, strings, out, input, error_log);
            Outcome::Failed
        }
    }
}

/// 汇报启动失败：交互式提示或写入失败日志，二者只取其一
pub fn report_startup_failure<W: Write, R: BufRead>(
    error: &AppError,
    show_console: bool,
    strings: &dyn Strings,
    out: &mut W,
    input: &mut R,
    error_log: &Path,
) {
    let error_text = error.to_string();
    tracing::error!(error = ?error, "启动失败");

    if show_console {
        let _ = writeln!(
            out,
            "{}",
            strings.text(MessageId::MainStartError, &[("error", &error_text)])
        );
        let _ = write!(out, "{}", strings.text(MessageId::MainPressEnter, &[]));
        let _ = out.flush();
        let mut line = String::new();
        let _ = input.read_line(&mut line);
    } else {
        let line = strings.text(MessageId::MainStartupFailed, &[("error", &error_text)]);
        if let Err(e) = fs::write(error_log, format!("{line}\n")) {
            tracing::error!(path = ?error_log, error = ?e, "写入启动失败日志失败");
        }
    }
}
