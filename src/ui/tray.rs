//! 系统托盘
//!
//! 托盘菜单事件通过通道交给独立的后台线程处理；托盘不可用时应用照常运行。

use super::icon::IconImage;
use crate::app::shutdown::{ShutdownCoordinator, ShutdownReason};
use crate::i18n::{MessageId, Strings};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tauri::{
    menu::{IsMenuItem, Menu, MenuItem, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Runtime,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const TRAY_ID: &str = "onekey-tray";
pub const TRAY_THREAD_NAME: &str = "onekey-tray";

pub const TRAY_MENU_SHOW_WINDOW: &str = "tray_show_window";
pub const TRAY_MENU_SHOW_CONSOLE: &str = "tray_show_console";
pub const TRAY_MENU_EXIT: &str = "tray_exit";

/// 托盘线程检查取消信号的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayMenuAction {
    ShowWindow,
    ShowConsole,
    Exit,
}

pub fn action_from_menu_id(menu_id: &str) -> Option<TrayMenuAction> {
    match menu_id {
        TRAY_MENU_SHOW_WINDOW => Some(TrayMenuAction::ShowWindow),
        TRAY_MENU_SHOW_CONSOLE => Some(TrayMenuAction::ShowConsole),
        TRAY_MENU_EXIT => Some(TrayMenuAction::Exit),
        _ => None,
    }
}

/// 托盘菜单项和图标
#[derive(Debug, Clone)]
pub struct TrayState {
    pub items: Vec<(&'static str, String)>,
    pub icon: IconImage,
}

impl TrayState {
    pub fn build(strings: &dyn Strings, icon: IconImage) -> Self {
        let items = [
            (TRAY_MENU_SHOW_WINDOW, MessageId::TrayShowWindow),
            (TRAY_MENU_SHOW_CONSOLE, MessageId::TrayShowConsole),
            (TRAY_MENU_EXIT, MessageId::TrayExit),
        ]
        .into_iter()
        .map(|(id, message)| (id, strings.text(message, &[])))
        .collect();
        Self { items, icon }
    }
}

#[derive(Debug, Error)]
pub enum TrayError {
    #[error("托盘后端不可用: {0}")]
    Unavailable(String),

    #[error("创建托盘失败: {0}")]
    Install(String),
}

/// 托盘后端
pub trait TrayBackend {
    /// 检测当前环境能否创建托盘
    fn detect(&self) -> Result<(), TrayError>;

    /// 创建原生托盘，菜单事件通过 `actions` 发出
    fn install(&self, state: &TrayState, actions: Sender<TrayMenuAction>) -> Result<(), TrayError>;
}

/// 托盘菜单动作的执行者
pub trait TrayActions: Send + 'static {
    fn show_window(&self);
    fn show_console(&self);
    fn exit(&self);
}

/// 启动托盘，返回是否成功
///
/// 后端不可用、创建失败或创建过程 panic 都只返回 false，不影响主流程。
pub fn start_tray<B, A>(
    backend: &B,
    state: TrayState,
    actions: A,
    token: CancellationToken,
) -> bool
where
    B: TrayBackend + ?Sized,
    A: TrayActions,
{
    if let Err(e) = backend.detect() {
        tracing::warn!(error = %e, "系统托盘不可用，跳过");
        return false;
    }

    let (tx, rx) = mpsc::channel();
    match panic::catch_unwind(AssertUnwindSafe(|| backend.install(&state, tx))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "系统托盘创建失败，跳过");
            return false;
        }
        Err(payload) => {
            tracing::warn!(panic = %panic_message(payload.as_ref()), "系统托盘创建时崩溃，跳过");
            return false;
        }
    }

    let spawned = thread::Builder::new()
        .name(TRAY_THREAD_NAME.to_string())
        .spawn(move || {
            let _state = state;
            run_tray_loop(rx, actions, token);
        });
    match spawned {
        // 托盘线程不 join，随进程结束
        Ok(_) => {
            tracing::debug!("托盘线程已启动");
            true
        }
        Err(e) => {
            tracing::warn!(error = ?e, "托盘线程启动失败");
            false
        }
    }
}

/// 托盘事件循环
///
/// 收到退出菜单、取消信号或通道关闭时结束。
pub fn run_tray_loop<A: TrayActions>(
    rx: Receiver<TrayMenuAction>,
    actions: A,
    token: CancellationToken,
) {
    while !token.is_cancelled() {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(TrayMenuAction::ShowWindow) => {
                tracing::info!("从托盘显示窗口");
                actions.show_window();
            }
            Ok(TrayMenuAction::ShowConsole) => {
                tracing::info!("从托盘显示控制台");
                actions.show_console();
            }
            Ok(TrayMenuAction::Exit) => {
                tracing::info!("从托盘退出应用");
                actions.exit();
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("托盘线程结束");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 基于 Tauri tray-icon 的托盘后端
///
/// `install` 必须在主线程调用（Tauri setup 钩子内）。
pub struct TauriTrayBackend<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriTrayBackend<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> TrayBackend for TauriTrayBackend<R> {
    fn detect(&self) -> Result<(), TrayError> {
        // Linux 托盘依赖 StatusNotifier/AppIndicator，它们都走会话 D-Bus
        #[cfg(target_os = "linux")]
        {
            if std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_none() {
                return Err(TrayError::Unavailable(
                    "DBUS_SESSION_BUS_ADDRESS 未设置".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn install(&self, state: &TrayState, actions: Sender<TrayMenuAction>) -> Result<(), TrayError> {
        let install_err = |e: tauri::Error| TrayError::Install(e.to_string());

        let mut items = Vec::with_capacity(state.items.len());
        for (id, label) in &state.items {
            items.push(
                MenuItem::with_id(&self.app, *id, label, true, None::<&str>)
                    .map_err(install_err)?,
            );
        }
        let separator = PredefinedMenuItem::separator(&self.app).map_err(install_err)?;

        let mut entries: Vec<&dyn IsMenuItem<R>> = Vec::with_capacity(items.len() + 1);
        for item in &items {
            if item.id().as_ref() == TRAY_MENU_EXIT {
                entries.push(&separator);
            }
            entries.push(item);
        }
        let menu = Menu::with_items(&self.app, &entries).map_err(install_err)?;

        let click_actions = actions.clone();
        let _tray = TrayIconBuilder::with_id(TRAY_ID)
            .icon(state.icon.clone().into_tauri())
            .tooltip("Onekey")
            .menu(&menu)
            .show_menu_on_left_click(false)
            .on_menu_event(move |_app, event| {
                tracing::debug!(event_id = ?event.id, "托盘菜单事件");
                if let Some(action) = action_from_menu_id(event.id().as_ref()) {
                    let _ = actions.send(action);
                }
            })
            .on_tray_icon_event(move |_tray, event| {
                if let TrayIconEvent::Click {
                    button: MouseButton::Left,
                    button_state: MouseButtonState::Up,
                    ..
                } = event
                {
                    tracing::debug!("托盘图标左键点击");
                    let _ = click_actions.send(TrayMenuAction::ShowWindow);
                }
            })
            .build(&self.app)
            .map_err(install_err)?;

        Ok(())
    }
}

/// 托盘菜单动作在应用中的实际效果
pub struct ShellTrayActions<R: Runtime> {
    app: AppHandle<R>,
    coordinator: Arc<ShutdownCoordinator>,
}

impl<R: Runtime> ShellTrayActions<R> {
    pub fn new(app: AppHandle<R>, coordinator: Arc<ShutdownCoordinator>) -> Self {
        Self { app, coordinator }
    }
}

impl<R: Runtime> TrayActions for ShellTrayActions<R> {
    fn show_window(&self) {
        super::window::dispatch_show_main_window(&self.app);
    }

    fn show_console(&self) {
        crate::utils::console::show_console();
    }

    fn exit(&self) {
        self.coordinator.request(ShutdownReason::TrayExit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Catalog, Locale};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Default)]
    struct FakeBackend {
        unavailable: bool,
        fail_install: bool,
        panic_on_install: bool,
        installed: AtomicBool,
        sender: Mutex<Option<Sender<TrayMenuAction>>>,
    }

    impl TrayBackend for FakeBackend {
        fn detect(&self) -> Result<(), TrayError> {
            if self.unavailable {
                Err(TrayError::Unavailable("no tray".to_string()))
            } else {
                Ok(())
            }
        }

        fn install(
            &self,
            state: &TrayState,
            actions: Sender<TrayMenuAction>,
        ) -> Result<(), TrayError> {
            assert_eq!(state.items.len(), 3);
            if self.panic_on_install {
                panic!("libappindicator missing");
            }
            if self.fail_install {
                return Err(TrayError::Install("boom".to_string()));
            }
            self.installed.store(true, Ordering::SeqCst);
            *self.sender.lock().unwrap() = Some(actions);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingActions {
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl RecordingActions {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TrayActions for RecordingActions {
        fn show_window(&self) {
            self.calls.lock().unwrap().push("show_window");
        }

        fn show_console(&self) {
            self.calls.lock().unwrap().push("show_console");
        }

        fn exit(&self) {
            self.calls.lock().unwrap().push("exit");
        }
    }

    fn state() -> TrayState {
        TrayState::build(&Catalog::new(Locale::ZhCn), IconImage::fallback())
    }

    fn wait_for(actions: &RecordingActions, count: usize) -> Vec<&'static str> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while actions.calls().len() < count && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        actions.calls()
    }

    #[test]
    fn action_from_menu_id_maps_known_ids() {
        assert_eq!(
            action_from_menu_id(TRAY_MENU_SHOW_WINDOW),
            Some(TrayMenuAction::ShowWindow)
        );
        assert_eq!(
            action_from_menu_id(TRAY_MENU_SHOW_CONSOLE),
            Some(TrayMenuAction::ShowConsole)
        );
        assert_eq!(action_from_menu_id(TRAY_MENU_EXIT), Some(TrayMenuAction::Exit));
        assert_eq!(action_from_menu_id("unknown"), None);
    }

    #[test]
    fn tray_state_uses_localized_labels_in_order() {
        let state = TrayState::build(&Catalog::new(Locale::EnUs), IconImage::fallback());
        let ids: Vec<_> = state.items.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            [TRAY_MENU_SHOW_WINDOW, TRAY_MENU_SHOW_CONSOLE, TRAY_MENU_EXIT]
        );
        assert_eq!(state.items[2].1, "Exit");
    }

    #[test]
    fn unavailable_backend_returns_false() {
        let backend = FakeBackend {
            unavailable: true,
            ..Default::default()
        };
        let started = start_tray(
            &backend,
            state(),
            RecordingActions::default(),
            CancellationToken::new(),
        );
        assert!(!started);
        assert!(!backend.installed.load(Ordering::SeqCst));
    }

    #[test]
    fn install_error_returns_false() {
        let backend = FakeBackend {
            fail_install: true,
            ..Default::default()
        };
        assert!(!start_tray(
            &backend,
            state(),
            RecordingActions::default(),
            CancellationToken::new()
        ));
    }

    #[test]
    fn install_panic_is_contained() {
        let backend = FakeBackend {
            panic_on_install: true,
            ..Default::default()
        };
        assert!(!start_tray(
            &backend,
            state(),
            RecordingActions::default(),
            CancellationToken::new()
        ));
    }

    #[test]
    fn menu_actions_run_on_tray_thread_until_exit() {
        let backend = FakeBackend::default();
        let actions = RecordingActions::default();
        assert!(start_tray(
            &backend,
            state(),
            actions.clone(),
            CancellationToken::new()
        ));

        let sender = backend.sender.lock().unwrap().clone().unwrap();
        sender.send(TrayMenuAction::ShowWindow).unwrap();
        sender.send(TrayMenuAction::ShowConsole).unwrap();
        sender.send(TrayMenuAction::Exit).unwrap();

        assert_eq!(
            wait_for(&actions, 3),
            ["show_window", "show_console", "exit"]
        );

        // 退出后线程不再处理事件
        let _ = sender.send(TrayMenuAction::ShowWindow);
        thread::sleep(Duration::from_millis(200));
        assert_eq!(actions.calls().len(), 3);
    }

    #[test]
    fn loop_stops_on_cancellation() {
        let (_tx, rx) = mpsc::channel();
        let token = CancellationToken::new();
        let actions = RecordingActions::default();
        let loop_token = token.clone();
        let handle = thread::spawn(move || run_tray_loop(rx, actions, loop_token));

        token.cancel();
        handle.join().unwrap();
    }

    #[test]
    fn loop_stops_when_channel_closes() {
        let (tx, rx) = mpsc::channel::<TrayMenuAction>();
        drop(tx);
        run_tray_loop(rx, RecordingActions::default(), CancellationToken::new());
    }
}
