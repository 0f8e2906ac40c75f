// 应用配置结构，启动时构造一次，之后以 Arc<AppConfig> 只读共享
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 默认 Web 服务端口
pub const DEFAULT_PORT: u16 = 5000;

/// 默认界面语言
pub const DEFAULT_LANGUAGE: &str = "zh-CN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub show_console: bool,
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default = "default_true")]
    pub logging_files: bool,
    #[serde(default = "default_language")]
    pub language: String,
    /// Web 静态资源目录，未设置时使用程序目录下的 `web`
    #[serde(default)]
    pub web_root: Option<PathBuf>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            show_console: true,
            debug_mode: false,
            logging_files: true,
            language: default_language(),
            web_root: None,
        }
    }
}

impl AppConfig {
    /// 本地 Web 服务地址（窗口加载的目标 URL）
    pub fn local_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}
