use crate::app::shutdown::{ShutdownCoordinator, ShutdownReason};
use crate::core::AppResult;
use crate::i18n::{MessageId, Strings};
use crate::models::AppConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tauri::{AppHandle, Manager, Runtime, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use url::Url;

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const WINDOW_TITLE: &str = "Onekey";
pub const WINDOW_WIDTH: f64 = 1600.0;
pub const WINDOW_HEIGHT: f64 = 900.0;

/// 主窗口参数
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOptions {
    pub title: String,
    pub url: Url,
    pub width: f64,
    pub height: f64,
}

impl WindowOptions {
    pub fn for_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            title: WINDOW_TITLE.to_string(),
            url: Url::parse(&config.local_url())?,
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
        })
    }
}

/// 创建主窗口（必须在主线程调用）
pub fn create_main_window<R: Runtime, M: Manager<R>>(
    manager: &M,
    options: &WindowOptions,
) -> AppResult<WebviewWindow<R>> {
    let window = WebviewWindowBuilder::new(
        manager,
        MAIN_WINDOW_LABEL,
        WebviewUrl::External(options.url.clone()),
    )
    .title(&options.title)
    .inner_size(options.width, options.height)
    .center()
    .visible(true)
    .focused(true)
    .build()?;

    tracing::info!(url = %options.url, "主窗口已创建");
    Ok(window)
}

/// 显示并聚焦主窗口（必须在主线程调用）
pub fn show_main_window<R: Runtime>(app: &AppHandle<R>) {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) {
        restore_window_state(&window);
    } else {
        tracing::warn!("尝试显示时未找到主窗口");
    }
}

/// 从任意线程请求显示主窗口
pub fn dispatch_show_main_window<R: Runtime>(app: &AppHandle<R>) {
    let handle = app.clone();
    if let Err(e) = app.run_on_main_thread(move || show_main_window(&handle)) {
        tracing::error!(error = ?e, "调度显示窗口失败");
    }
}

/// 恢复窗口状态（跨平台支持）
fn restore_window_state<R: Runtime>(window: &WebviewWindow<R>) {
    tracing::debug!(
        is_visible = ?window.is_visible(),
        is_minimized = ?window.is_minimized(),
        "恢复窗口状态"
    );

    if let Err(e) = window.show() {
        tracing::error!(error = ?e, "显示窗口失败");
    }
    if let Err(e) = window.unminimize() {
        tracing::error!(error = ?e, "取消最小化窗口失败");
    }
    if let Err(e) = window.set_focus() {
        tracing::error!(error = ?e, "设置窗口焦点失败");
    }

    #[cfg(target_os = "macos")]
    #[allow(deprecated)]
    {
        use cocoa::appkit::NSApplication;
        use cocoa::base::nil;
        use objc::runtime::YES;

        unsafe {
            let ns_app = NSApplication::sharedApplication(nil);
            ns_app.activateIgnoringOtherApps_(YES);
        }
        tracing::debug!("macOS 应用已激活");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// 保持窗口打开
    Veto,
    /// 走统一退出路径
    Shutdown,
}

pub fn decide_close(confirmed: bool) -> CloseDecision {
    if confirmed {
        CloseDecision::Shutdown
    } else {
        CloseDecision::Veto
    }
}

/// 是/否确认对话框
///
/// 不阻塞调用线程，用户作答后调用 `on_answer`。
pub trait ConfirmDialog: Send + Sync {
    fn confirm(&self, title: &str, message: &str, on_answer: Box<dyn FnOnce(bool) + Send>);
}

pub struct TauriConfirmDialog<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriConfirmDialog<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> ConfirmDialog for TauriConfirmDialog<R> {
    fn confirm(&self, title: &str, message: &str, on_answer: Box<dyn FnOnce(bool) + Send>) {
        self.app
            .dialog()
            .message(message)
            .title(title)
            .kind(MessageDialogKind::Warning)
            .buttons(MessageDialogButtons::YesNo)
            .show(move |answer| on_answer(answer));
    }
}

/// 窗口关闭确认
///
/// 同一时间只弹出一个确认框，等待作答期间和确认退出之后的重复关闭请求都被忽略。
pub struct CloseGuard {
    dialog: Arc<dyn ConfirmDialog>,
    coordinator: Arc<ShutdownCoordinator>,
    title: String,
    prompt: String,
    pending: Arc<AtomicBool>,
}

impl CloseGuard {
    pub fn new(
        dialog: Arc<dyn ConfirmDialog>,
        coordinator: Arc<ShutdownCoordinator>,
        strings: &dyn Strings,
    ) -> Self {
        Self {
            dialog,
            coordinator,
            title: strings.text(MessageId::WindowCloseTitle, &[]),
            prompt: strings.text(MessageId::WindowClosePrompt, &[]),
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 处理一次关闭请求，返回是否弹出了确认框
    pub fn on_close_requested(&self) -> bool {
        if self.pending.swap(true, Ordering::SeqCst) {
            tracing::debug!("关闭确认框已在显示或正在退出，忽略重复请求");
            return false;
        }

        tracing::info!("窗口关闭请求 - 等待用户确认");
        let pending = Arc::clone(&self.pending);
        let coordinator = Arc::clone(&self.coordinator);
        self.dialog.confirm(
            &self.title,
            &self.prompt,
            Box::new(move |confirmed| match decide_close(confirmed) {
                CloseDecision::Veto => {
                    tracing::info!("用户取消关闭");
                    pending.store(false, Ordering::SeqCst);
                }
                // 退出期间保持 pending，不再弹出新的确认框
                CloseDecision::Shutdown => {
                    tracing::info!("用户确认关闭");
                    coordinator.request(ShutdownReason::WindowClosed);
                }
            }),
        );
        true
    }
}

/// 拦截主窗口的原生关闭，改为弹出确认框
pub fn install_close_guard<R: Runtime>(window: &WebviewWindow<R>, guard: CloseGuard) {
    window.on_window_event(move |event| {
        if let tauri::WindowEvent::CloseRequested { api, .. } = event {
            api.prevent_close();
            guard.on_close_requested();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Catalog, Locale};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    type Answer = Box<dyn FnOnce(bool) + Send>;

    /// `answer` 为 None 时保留回调，由测试稍后作答
    struct FakeDialog {
        answer: Option<bool>,
        shown: Mutex<Vec<(String, String)>>,
        held: Mutex<Option<Answer>>,
    }

    impl FakeDialog {
        fn new(answer: Option<bool>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                shown: Mutex::new(Vec::new()),
                held: Mutex::new(None),
            })
        }

        fn shown(&self) -> usize {
            self.shown.lock().unwrap().len()
        }

        fn answer_held(&self, confirmed: bool) {
            let callback = self.held.lock().unwrap().take().unwrap();
            callback(confirmed);
        }
    }

    impl ConfirmDialog for FakeDialog {
        fn confirm(&self, title: &str, message: &str, on_answer: Answer) {
            self.shown
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
            match self.answer {
                Some(confirmed) => on_answer(confirmed),
                None => *self.held.lock().unwrap() = Some(on_answer),
            }
        }
    }

    fn guard(dialog: Arc<FakeDialog>, coordinator: Arc<ShutdownCoordinator>) -> CloseGuard {
        CloseGuard::new(dialog, coordinator, &Catalog::new(Locale::ZhCn))
    }

    #[test]
    fn decide_close_maps_answers() {
        assert_eq!(decide_close(true), CloseDecision::Shutdown);
        assert_eq!(decide_close(false), CloseDecision::Veto);
    }

    #[test]
    fn window_options_point_at_local_server() {
        let config = AppConfig {
            port: 5123,
            ..AppConfig::default()
        };
        let options = WindowOptions::for_config(&config).unwrap();
        assert_eq!(options.url.as_str(), "http://localhost:5123/");
        assert_eq!(options.title, "Onekey");
        assert_eq!((options.width, options.height), (1600.0, 900.0));
    }

    #[test]
    fn declined_close_is_vetoed() {
        let dialog = FakeDialog::new(Some(false));
        let coordinator = Arc::new(ShutdownCoordinator::default());
        let guard = guard(Arc::clone(&dialog), Arc::clone(&coordinator));

        assert!(guard.on_close_requested());
        assert!(!coordinator.is_requested());
        assert_eq!(
            dialog.shown.lock().unwrap()[0],
            ("Onekey".to_string(), "是否关闭Onekey".to_string())
        );

        // 取消后可以再次请求关闭
        assert!(guard.on_close_requested());
        assert_eq!(dialog.shown(), 2);
    }

    #[test]
    fn confirmed_close_requests_shutdown() {
        let dialog = FakeDialog::new(Some(true));
        let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_millis(10)));
        let exited = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&exited);
        coordinator.set_exit_hook(Box::new(move |_| flag.store(true, Ordering::SeqCst)));

        let guard = guard(dialog, Arc::clone(&coordinator));
        assert!(guard.on_close_requested());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !exited.load(Ordering::SeqCst) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(exited.load(Ordering::SeqCst));
        assert_eq!(coordinator.reason(), Some(ShutdownReason::WindowClosed));
    }

    #[test]
    fn only_one_dialog_at_a_time() {
        let dialog = FakeDialog::new(None);
        let coordinator = Arc::new(ShutdownCoordinator::default());
        let guard = guard(Arc::clone(&dialog), Arc::clone(&coordinator));

        assert!(guard.on_close_requested());
        assert!(!guard.on_close_requested());
        assert_eq!(dialog.shown(), 1);

        dialog.answer_held(false);
        assert!(!coordinator.is_requested());
        assert!(guard.on_close_requested());
        assert_eq!(dialog.shown(), 2);
    }

    #[test]
    fn close_requests_after_confirmation_are_ignored() {
        let dialog = FakeDialog::new(None);
        let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_millis(10)));
        let guard = guard(Arc::clone(&dialog), Arc::clone(&coordinator));

        assert!(guard.on_close_requested());
        dialog.answer_held(true);

        // 退出排空期间再次点击关闭
        assert!(!guard.on_close_requested());
        assert_eq!(dialog.shown(), 1);
    }
}
