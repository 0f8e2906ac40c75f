//! 本地化文本
//!
//! 所有面向用户的文本都通过 [`Strings`] 按消息 ID 查询，模板中的 `{name}`
//! 占位符由调用方提供的命名参数填充。

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    MainStarting,
    MainTrayCreated,
    MainExit,
    MainStartError,
    MainPressEnter,
    MainStartupFailed,
    ErrorLoadIcon,
    TrayShowWindow,
    TrayShowConsole,
    TrayExit,
    WindowCloseTitle,
    WindowClosePrompt,
}

impl MessageId {
    pub fn key(self) -> &'static str {
        match self {
            MessageId::MainStarting => "main.starting",
            MessageId::MainTrayCreated => "main.tray_created",
            MessageId::MainExit => "main.exit",
            MessageId::MainStartError => "main.start_error",
            MessageId::MainPressEnter => "main.press_enter",
            MessageId::MainStartupFailed => "main.startup_failed",
            MessageId::ErrorLoadIcon => "error.load_icon",
            MessageId::TrayShowWindow => "tray.show_window",
            MessageId::TrayShowConsole => "tray.show_console",
            MessageId::TrayExit => "tray.exit",
            MessageId::WindowCloseTitle => "window.close_title",
            MessageId::WindowClosePrompt => "window.close_prompt",
        }
    }
}

/// 文本资源提供者
pub trait Strings: Send + Sync {
    /// 查询未填充参数的模板
    fn template(&self, id: MessageId) -> &str;

    /// 查询并填充命名参数
    fn text(&self, id: MessageId, params: &[(&str, &str)]) -> String {
        render(self.template(id), params)
    }
}

/// 用命名参数替换模板中的 `{name}` 占位符，未提供的占位符原样保留
pub fn render(template: &str, params: &[(&str, &str)]) -> String {
    let mut output = template.to_string();
    for (name, value) in params {
        output = output.replace(&format!("{{{name}}}"), value);
    }
    output
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    ZhCn,
    EnUs,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::ZhCn => "zh-CN",
            Locale::EnUs => "en-US",
        }
    }

    /// 归一化语言标签：`zh*` -> zh-CN，`en*` -> en-US，其他返回 None
    pub fn normalize(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return None;
        }
        if lowered.starts_with("zh") {
            return Some(Locale::ZhCn);
        }
        if lowered.starts_with("en") {
            return Some(Locale::EnUs);
        }
        None
    }
}

/// 内置中英文文本表
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// 按配置中的语言标签创建，无法识别时使用默认语言
    pub fn for_language(language: &str) -> Self {
        let locale = Locale::normalize(language)
            .or_else(|| Locale::normalize(DEFAULT_LOCALE))
            .unwrap_or(Locale::ZhCn);
        Self::new(locale)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

impl Strings for Catalog {
    fn template(&self, id: MessageId) -> &str {
        match self.locale {
            Locale::ZhCn => zh_cn(id),
            Locale::EnUs => en_us(id),
        }
    }
}

fn zh_cn(id: MessageId) -> &'static str {
    match id {
        MessageId::MainStarting => "正在启动 Onekey……",
        MessageId::MainTrayCreated => "系统托盘已创建",
        MessageId::MainExit => "程序已退出",
        MessageId::MainStartError => "启动失败: {error}",
        MessageId::MainPressEnter => "按回车键退出……",
        MessageId::MainStartupFailed => "Onekey 启动失败: {error}",
        MessageId::ErrorLoadIcon => "加载托盘图标失败: {error}",
        MessageId::TrayShowWindow => "显示窗口",
        MessageId::TrayShowConsole => "显示控制台",
        MessageId::TrayExit => "退出",
        MessageId::WindowCloseTitle => "Onekey",
        MessageId::WindowClosePrompt => "是否关闭Onekey",
    }
}

fn en_us(id: MessageId) -> &'static str {
    match id {
        MessageId::MainStarting => "Starting Onekey...",
        MessageId::MainTrayCreated => "System tray created",
        MessageId::MainExit => "Program exited",
        MessageId::MainStartError => "Startup error: {error}",
        MessageId::MainPressEnter => "Press Enter to exit...",
        MessageId::MainStartupFailed => "Onekey failed to start: {error}",
        MessageId::ErrorLoadIcon => "Failed to load tray icon: {error}",
        MessageId::TrayShowWindow => "Show Window",
        MessageId::TrayShowConsole => "Show Console",
        MessageId::TrayExit => "Exit",
        MessageId::WindowCloseTitle => "Onekey",
        MessageId::WindowClosePrompt => "Close Onekey?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_IDS: [MessageId; 12] = [
        MessageId::MainStarting,
        MessageId::MainTrayCreated,
        MessageId::MainExit,
        MessageId::MainStartError,
        MessageId::MainPressEnter,
        MessageId::MainStartupFailed,
        MessageId::ErrorLoadIcon,
        MessageId::TrayShowWindow,
        MessageId::TrayShowConsole,
        MessageId::TrayExit,
        MessageId::WindowCloseTitle,
        MessageId::WindowClosePrompt,
    ];

    #[test]
    fn normalize_maps_language_families() {
        assert_eq!(Locale::normalize("zh"), Some(Locale::ZhCn));
        assert_eq!(Locale::normalize("zh_TW.UTF-8"), Some(Locale::ZhCn));
        assert_eq!(Locale::normalize(" EN-gb "), Some(Locale::EnUs));
        assert_eq!(Locale::normalize("fr-FR"), None);
        assert_eq!(Locale::normalize(""), None);
    }

    #[test]
    fn unknown_language_falls_back_to_default() {
        assert_eq!(Catalog::for_language("de").locale(), Locale::ZhCn);
        assert_eq!(Catalog::for_language("en").locale(), Locale::EnUs);
    }

    #[test]
    fn render_fills_named_params() {
        let text = render("启动失败: {error} ({code})", &[("error", "端口被占用"), ("code", "98")]);
        assert_eq!(text, "启动失败: 端口被占用 (98)");
    }

    #[test]
    fn render_keeps_unknown_placeholders() {
        assert_eq!(render("{missing}", &[("error", "x")]), "{missing}");
    }

    #[test]
    fn every_message_has_text_in_every_locale() {
        for locale in [Locale::ZhCn, Locale::EnUs] {
            let catalog = Catalog::new(locale);
            for id in ALL_IDS {
                assert!(
                    !catalog.template(id).is_empty(),
                    "{} 缺少 {} 文本",
                    locale.as_str(),
                    id.key()
                );
            }
        }
    }

    #[test]
    fn error_templates_carry_error_param() {
        let catalog = Catalog::new(Locale::EnUs);
        let text = catalog.text(MessageId::MainStartupFailed, &[("error", "M")]);
        assert!(text.contains('M'));
    }
}
