use super::config::LogLevel;
use super::sink::{short_module, LogSink, NamedLogLayer};
use std::panic::Location;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// 具名日志器发出的事件使用的 target
pub const NAMED_TARGET: &str = "onekey::logger";

/// 全局日志输出表
static GLOBAL_SINK: OnceLock<Arc<LogSink>> = OnceLock::new();

/// 日志调用位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub module: &'static str,
    pub function: Option<&'static str>,
    pub line: u32,
}

impl CallSite {
    /// 由 `log_call_site!` 生成，`function_path` 是函数内部辅助函数的类型名
    pub fn new(module_path: &'static str, function_path: &'static str, line: u32) -> Self {
        Self {
            module: short_module(module_path),
            function: Some(short_function(function_path)),
            line,
        }
    }

    /// 从 `#[track_caller]` 位置推导，只能拿到文件名和行号
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            module: file_module(location.file()),
            function: None,
            line: location.line(),
        }
    }
}

/// `onekey::app::Lifecycle::launch::{{closure}}::f` -> `launch`
fn short_function(path: &'static str) -> &'static str {
    let mut path = path.strip_suffix("::f").unwrap_or(path);
    while let Some(stripped) = path.strip_suffix("::{{closure}}") {
        path = stripped;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// `src/app/lifecycle.rs` -> `lifecycle`，`src/ui/mod.rs` -> `ui`
fn file_module(file: &'static str) -> &'static str {
    let mut parts = file.rsplit(['/', '\\']);
    let name = parts.next().unwrap_or(file);
    let stem = name.strip_suffix(".rs").unwrap_or(name);
    if stem == "mod" {
        parts.next().unwrap_or(stem)
    } else {
        stem
    }
}

/// 具名日志器句柄
///
/// 只负责给事件打上名称和调用位置；输出目标由 [`LogSink`] 按名称配置。
#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
}

impl Logger {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log(&self, level: LogLevel, site: CallSite, message: &str) {
        let name: &str = &self.name;
        let function = site.function.unwrap_or("");
        match level {
            LogLevel::Debug => tracing::debug!(
                target: NAMED_TARGET,
                logger = name,
                log_module = site.module,
                log_function = function,
                log_line = site.line,
                "{}",
                message
            ),
            LogLevel::Info => tracing::info!(
                target: NAMED_TARGET,
                logger = name,
                log_module = site.module,
                log_function = function,
                log_line = site.line,
                "{}",
                message
            ),
            LogLevel::Warning => tracing::warn!(
                target: NAMED_TARGET,
                logger = name,
                log_module = site.module,
                log_function = function,
                log_line = site.line,
                "{}",
                message
            ),
            LogLevel::Error => tracing::error!(
                target: NAMED_TARGET,
                logger = name,
                log_module = site.module,
                log_function = function,
                log_line = site.line,
                "{}",
                message
            ),
            LogLevel::Critical => tracing::error!(
                target: NAMED_TARGET,
                logger = name,
                log_module = site.module,
                log_function = function,
                log_line = site.line,
                critical = true,
                "{}",
                message
            ),
        }
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, CallSite::caller(), message.as_ref());
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, CallSite::caller(), message.as_ref());
    }

    #[track_caller]
    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, CallSite::caller(), message.as_ref());
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, CallSite::caller(), message.as_ref());
    }

    #[track_caller]
    pub fn critical(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Critical, CallSite::caller(), message.as_ref());
    }
}

/// 初始化全局日志输出表并安装订阅器
///
/// 只有第一次调用生效，之后返回同一个输出表。
pub fn init_log_sink(log_dir: impl Into<PathBuf>, console: bool) -> Arc<LogSink> {
    let log_dir = log_dir.into();
    GLOBAL_SINK
        .get_or_init(|| {
            let sink = Arc::new(LogSink::new(log_dir, console));
            install_subscriber(Arc::clone(&sink));
            sink
        })
        .clone()
}

fn install_subscriber(sink: Arc<LogSink>) {
    let result = Registry::default()
        .with(create_env_filter())
        .with(NamedLogLayer::new(sink))
        .try_init();
    if let Err(e) = result {
        // 日志系统初始化失败时使用 eprintln!（因为 tracing 还不可用）
        eprintln!("WARNING: Failed to initialize logging system: {e}");
    }
}

/// 应用代码全部放行，由具名日志器各自的阈值过滤；第三方库只保留 WARN 以上
fn create_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("onekey=trace,hyper=warn,tauri=warn,tao=warn,wry=warn")
    })
}

fn default_log_dir() -> PathBuf {
    crate::utils::config::log_dir(&crate::utils::config::app_root_dir())
}

/// 创建具名日志器
///
/// 同一名称只配置一次：控制台输出（`debug_mode` 时为 DEBUG，否则 INFO），
/// `to_file` 时额外写入 `<log-dir>/<name>.log`。
pub fn new_logger(name: &str, debug_mode: bool, to_file: bool) -> Logger {
    let sink = init_log_sink(default_log_dir(), true);
    if let Err(e) = sink.register(name, debug_mode, to_file) {
        eprintln!("WARNING: Failed to configure logger {name}: {e:#}");
    }
    Logger::new(name)
}

/// 刷新全局日志输出表（退出前调用）
pub fn flush_logs() {
    if let Some(sink) = GLOBAL_SINK.get() {
        sink.flush();
    }
}
