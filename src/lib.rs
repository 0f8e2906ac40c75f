// lib.rs - Onekey 桌面外壳

pub mod app; // 启动编排与统一退出
pub mod core; // 核心基础设施层
pub mod i18n;
pub mod logging;
pub mod models;
pub mod services; // 内嵌 Web 服务
pub mod ui; // UI 管理层
pub mod utils;

pub use app::{run, Lifecycle, ShutdownCoordinator, ShutdownReason};
pub use core::{AppError, AppResult};
pub use i18n::{Catalog, MessageId, Strings};
pub use logging::{new_logger, LogLevel, Logger};
pub use models::AppConfig;
