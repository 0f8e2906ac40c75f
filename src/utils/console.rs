//! 控制台窗口显示/隐藏
//!
//! 只对 Windows 下进程自带的控制台窗口生效；其它平台或没有控制台时返回错误，
//! 由 [`hide_console`] / [`show_console`] 吞掉并记录 debug 日志。

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("进程没有附加控制台窗口")]
    NoConsole,

    #[error("当前平台不支持控制台窗口切换")]
    Unsupported,
}

#[cfg(target_os = "windows")]
pub fn set_console_visible(visible: bool) -> Result<(), ConsoleError> {
    use windows::Win32::System::Console::GetConsoleWindow;
    use windows::Win32::UI::WindowsAndMessaging::{ShowWindow, SW_HIDE, SW_SHOWNORMAL};

    let hwnd = unsafe { GetConsoleWindow() };
    if hwnd.0.is_null() {
        return Err(ConsoleError::NoConsole);
    }
    let command = if visible { SW_SHOWNORMAL } else { SW_HIDE };
    // 返回值是窗口之前的可见状态，不代表成功与否
    let _ = unsafe { ShowWindow(hwnd, command) };
    Ok(())
}

#[cfg(not(target_os = "windows"))]
pub fn set_console_visible(_visible: bool) -> Result<(), ConsoleError> {
    Err(ConsoleError::Unsupported)
}

/// 隐藏控制台（尽力而为）
pub fn hide_console() {
    if let Err(e) = set_console_visible(false) {
        tracing::debug!(error = %e, "隐藏控制台失败");
    }
}

/// 显示控制台（尽力而为）
pub fn show_console() {
    if let Err(e) = set_console_visible(true) {
        tracing::debug!(error = %e, "显示控制台失败");
    }
}
