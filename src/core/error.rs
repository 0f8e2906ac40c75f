//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义启动流程中可能出现的错误；内部细节可通过 `anyhow` 透传。

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// 配置文件读取失败
    #[error("读取配置失败: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析失败
    #[error("解析配置失败: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// 窗口目标地址无效
    #[error("无效的窗口地址: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Tauri 运行时错误（构建应用、创建窗口等）
    #[error("Tauri 运行时错误: {0}")]
    Tauri(#[from] tauri::Error),

    /// 文件 I/O 错误
    #[error("文件 I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 用户中断（Ctrl-C）
    #[error("用户中断")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn config_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigRead {
            path: path.into(),
            source,
        }
    }
}
