//! 统一退出路径
//!
//! 窗口确认关闭、托盘退出、Ctrl-C 都走 [`ShutdownCoordinator`]：
//! 第一次请求生效，广播取消信号，在宽限期内等待后台任务结束，刷新日志，最后统一退出。

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// 默认宽限期
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// 统一退出回调，参数为进程退出码
pub type ExitHook = Box<dyn Fn(i32) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户确认关闭窗口
    WindowClosed,
    /// 托盘菜单退出
    TrayExit,
    /// Ctrl-C
    Interrupted,
}

impl ShutdownReason {
    pub fn exit_code(self) -> i32 {
        0
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShutdownReason::WindowClosed => "window_closed",
            ShutdownReason::TrayExit => "tray_exit",
            ShutdownReason::Interrupted => "interrupted",
        }
    }
}

pub struct ShutdownCoordinator {
    token: CancellationToken,
    tracker: TaskTracker,
    requested: AtomicBool,
    reason: Mutex<Option<ShutdownReason>>,
    grace: Duration,
    exit_hook: OnceLock<ExitHook>,
}

impl ShutdownCoordinator {
    pub fn new(grace: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            requested: AtomicBool::new(false),
            reason: Mutex::new(None),
            grace,
            exit_hook: OnceLock::new(),
        }
    }

    /// 取消信号（服务器和托盘循环监听）
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        match self.reason.lock() {
            Ok(reason) => *reason,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// 设置统一退出回调，只有第一次设置生效
    pub fn set_exit_hook(&self, hook: ExitHook) -> bool {
        self.exit_hook.set(hook).is_ok()
    }

    /// 登记需要在退出前等待的后台任务
    pub fn track_future<F>(&self, future: F) -> impl Future<Output = F::Output> + Send + 'static
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.track_future(future)
    }

    /// 在 Tauri 异步运行时上启动受跟踪的后台任务
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tauri::async_runtime::spawn(self.track_future(future));
    }

    /// 标记退出请求；返回 false 表示已有更早的请求
    fn mark(&self, reason: ShutdownReason) -> bool {
        if self
            .requested
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(reason = reason.as_str(), "已有退出请求，忽略");
            return false;
        }
        match self.reason.lock() {
            Ok(mut slot) => *slot = Some(reason),
            Err(poisoned) => *poisoned.into_inner() = Some(reason),
        }
        true
    }

    /// 执行完整的退出流程并等待其完成
    pub async fn shutdown(&self, reason: ShutdownReason) -> bool {
        if !self.mark(reason) {
            return false;
        }
        tracing::info!(reason = reason.as_str(), "开始退出");

        self.token.cancel();
        self.tracker.close();
        if tokio::time::timeout(self.grace, self.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                grace_ms = self.grace.as_millis() as u64,
                pending = self.tracker.len(),
                "后台任务未在宽限期内结束"
            );
        }

        tracing::info!(reason = reason.as_str(), "退出流程完成");
        crate::logging::flush_logs();

        match self.exit_hook.get() {
            Some(hook) => hook(reason.exit_code()),
            None => tracing::debug!("尚未设置退出回调，由启动流程处理退出"),
        }
        true
    }

    /// 从任意线程发起退出（不阻塞调用方）
    pub fn request(self: &Arc<Self>, reason: ShutdownReason) {
        if self.is_requested() {
            tracing::debug!(reason = reason.as_str(), "已有退出请求，忽略");
            return;
        }
        let coordinator = Arc::clone(self);
        tauri::async_runtime::spawn(async move {
            coordinator.shutdown(reason).await;
        });
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}
