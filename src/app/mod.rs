//! 应用生命周期：启动编排、统一退出、失败汇报

pub mod failure;
pub mod lifecycle;
pub mod shutdown;

pub use failure::{report_outcome, Outcome, ERROR_LOG_FILE};
pub use lifecycle::{run, Lifecycle};
pub use shutdown::{ShutdownCoordinator, ShutdownReason};
