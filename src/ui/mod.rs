//! UI 管理层：托盘、主窗口、图标

pub mod icon;
pub mod tray;
pub mod window;

pub use icon::{load_icon, IconImage};
pub use tray::{start_tray, ShellTrayActions, TauriTrayBackend, TrayActions, TrayBackend, TrayState};
pub use window::{
    create_main_window, dispatch_show_main_window, install_close_guard, CloseGuard,
    TauriConfirmDialog, WindowOptions,
};
