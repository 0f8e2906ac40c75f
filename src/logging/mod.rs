//! Onekey 日志系统模块
//!
//! 基于 `tracing` 的具名日志器：
//! - 每个名称最多配置一次控制台输出和可选的 `<log-dir>/<name>.log` 文件
//! - 文件只接收带有对应名称的记录
//! - 文件写入走 `tracing-appender` 的非阻塞通道，退出前由 [`flush_logs`] 刷新

pub mod config;
pub mod logger;
pub mod sink;

pub use config::LogLevel;
pub use logger::{flush_logs, init_log_sink, new_logger, CallSite, Logger};
pub use sink::{LogRecord, LogSink, NamedLogLayer, DEFAULT_LOGGER};

/// 生成带调用函数名的 [`CallSite`]
#[macro_export]
macro_rules! log_call_site {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::logging::CallSite::new(module_path!(), type_name_of(f), line!())
    }};
}

/// 便捷宏：通过具名日志器记录调试信息
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log($crate::logging::LogLevel::Debug, $crate::log_call_site!(), &format!($($arg)+))
    };
}

/// 便捷宏：通过具名日志器记录信息
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log($crate::logging::LogLevel::Info, $crate::log_call_site!(), &format!($($arg)+))
    };
}

/// 便捷宏：通过具名日志器记录警告
#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log($crate::logging::LogLevel::Warning, $crate::log_call_site!(), &format!($($arg)+))
    };
}

/// 便捷宏：通过具名日志器记录错误
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log($crate::logging::LogLevel::Error, $crate::log_call_site!(), &format!($($arg)+))
    };
}

/// 便捷宏：通过具名日志器记录严重错误
#[macro_export]
macro_rules! log_critical {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log($crate::logging::LogLevel::Critical, $crate::log_call_site!(), &format!($($arg)+))
    };
}
