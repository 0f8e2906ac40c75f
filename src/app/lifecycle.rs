// 应用启动流程
//
// 读取配置 -> 控制台处理 -> 托盘 -> 主窗口 -> 关闭确认 -> 事件循环（后台启动 Web 服务）。
// 任何一步失败都交给 failure 模块汇报。

use super::failure::{report_outcome, ERROR_LOG_FILE};
use super::shutdown::{ShutdownCoordinator, ShutdownReason};
use crate::core::{AppError, AppResult};
use crate::i18n::{Catalog, MessageId, Strings};
use crate::logging::{init_log_sink, new_logger, Logger, DEFAULT_LOGGER};
use crate::models::AppConfig;
use crate::services::web::{run_server, StaticSite};
use crate::ui::{
    create_main_window, install_close_guard, load_icon, start_tray, CloseGuard, ShellTrayActions,
    TauriConfirmDialog, TauriTrayBackend, TrayBackend, TrayState, WindowOptions,
};
use crate::utils::config::{app_root_dir, icon_path, load_app_config, log_dir, web_root};
use crate::{log_critical, log_debug, log_error, log_info, log_warning};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tauri::{App, RunEvent, Runtime};

/// 启动横幅下方分隔线的宽度
const BANNER_RULE_WIDTH: usize = 50;

/// 程序入口：启动应用并把结果转换为退出码
pub fn run() -> ExitCode {
    let root = app_root_dir();
    let config = Arc::new(load_app_config(&root));
    let strings: Arc<dyn Strings> = Arc::new(Catalog::for_language(&config.language));

    init_log_sink(log_dir(&root), config.show_console);
    let logger = new_logger(DEFAULT_LOGGER, config.debug_mode, config.logging_files);

    let lifecycle = Lifecycle::new(root, Arc::clone(&config), Arc::clone(&strings), logger);
    let result = lifecycle.launch();

    let outcome = report_outcome(
        result,
        config.show_console,
        strings.as_ref(),
        &mut io::stdout().lock(),
        &mut io::stdin().lock(),
        Path::new(ERROR_LOG_FILE),
    );
    crate::logging::flush_logs();
    ExitCode::from(outcome)
}

/// 启动横幅（横幅 + 分隔线）
pub fn startup_banner(strings: &dyn Strings) -> String {
    format!(
        "{}\n{}",
        strings.text(MessageId::MainStarting, &[]),
        "=".repeat(BANNER_RULE_WIDTH)
    )
}

/// 事件循环结束后的结果：Ctrl-C 触发的退出统一视为中断
pub fn finish(result: AppResult<()>, reason: Option<ShutdownReason>) -> AppResult<()> {
    if reason == Some(ShutdownReason::Interrupted) {
        return Err(AppError::Interrupted);
    }
    result
}

pub struct Lifecycle {
    root: PathBuf,
    config: Arc<AppConfig>,
    strings: Arc<dyn Strings>,
    coordinator: Arc<ShutdownCoordinator>,
    logger: Logger,
}

impl Lifecycle {
    pub fn new(
        root: PathBuf,
        config: Arc<AppConfig>,
        strings: Arc<dyn Strings>,
        logger: Logger,
    ) -> Self {
        Self {
            root,
            config,
            strings,
            coordinator: Arc::new(ShutdownCoordinator::default()),
            logger,
        }
    }

    /// 执行完整启动流程并运行事件循环，直到应用退出
    pub fn launch(&self) -> AppResult<()> {
        let result = self.launch_inner();
        finish(result, self.coordinator.reason())
    }

    fn launch_inner(&self) -> AppResult<()> {
        if self.config.show_console {
            println!("{}", startup_banner(self.strings.as_ref()));
        } else {
            crate::utils::console::hide_console();
        }
        log_info!(
            self.logger,
            "启动 Onekey，端口 {}，根目录 {:?}",
            self.config.port,
            self.root
        );

        self.watch_interrupt();

        let shell = ShellSetup {
            root: self.root.clone(),
            config: Arc::clone(&self.config),
            strings: Arc::clone(&self.strings),
            coordinator: Arc::clone(&self.coordinator),
            logger: self.logger.clone(),
        };
        let failure = SetupFailure::default();
        let setup_failure = failure.clone();
        let app = tauri::Builder::default()
            .plugin(tauri_plugin_dialog::init())
            .setup(move |app| {
                // setup 返回 Err 会让 Tauri 直接 panic，这里记下错误后主动退出事件循环
                let tray = TauriTrayBackend::new(app.handle().clone());
                let logger = shell.logger.clone();
                if let Err(e) = shell.run(app, &tray) {
                    if !matches!(e, AppError::Interrupted) {
                        log_critical!(logger, "启动步骤失败: {}", e);
                    }
                    setup_failure.record(e);
                    app.handle().exit(1);
                }
                Ok(())
            })
            .build(tauri::generate_context!())?;

        let code = app.run_return(|_handle, event| {
            if let RunEvent::ExitRequested { code: None, api, .. } = event {
                // 窗口关闭只能走确认框，这里不允许隐式退出
                api.prevent_exit();
            }
        });
        log_debug!(self.logger, "事件循环结束，退出码 {}", code);
        failure.into_result()
    }

    /// Ctrl-C 走统一退出路径
    fn watch_interrupt(&self) {
        let coordinator = Arc::clone(&self.coordinator);
        tauri::async_runtime::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("收到中断信号");
                coordinator.request(ShutdownReason::Interrupted);
            }
        });
    }
}

/// setup 钩子内的启动错误，事件循环结束后取回
#[derive(Clone, Default)]
struct SetupFailure(Arc<Mutex<Option<AppError>>>);

impl SetupFailure {
    /// 只保留第一个错误
    fn record(&self, error: AppError) {
        let mut slot = match self.0.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    fn into_result(self) -> AppResult<()> {
        let mut slot = match self.0.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        match slot.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Tauri setup 钩子中执行的部分（主线程）
struct ShellSetup {
    root: PathBuf,
    config: Arc<AppConfig>,
    strings: Arc<dyn Strings>,
    coordinator: Arc<ShutdownCoordinator>,
    logger: Logger,
}

impl ShellSetup {
    fn run<R, B>(self, app: &mut App<R>, tray: &B) -> AppResult<()>
    where
        R: Runtime,
        B: TrayBackend + ?Sized,
    {
        let handle = app.handle().clone();
        let exit_handle = handle.clone();
        self.coordinator
            .set_exit_hook(Box::new(move |code| exit_handle.exit(code)));
        if self.coordinator.is_requested() {
            return Err(AppError::Interrupted);
        }

        let show_console = self.config.show_console;
        let icon = load_icon(
            &icon_path(&self.root),
            self.strings.as_ref(),
            show_console,
        );
        let tray_started = start_tray(
            tray,
            TrayState::build(self.strings.as_ref(), icon),
            ShellTrayActions::new(handle.clone(), Arc::clone(&self.coordinator)),
            self.coordinator.token(),
        );
        if tray_started {
            if show_console {
                println!("{}", self.strings.text(MessageId::MainTrayCreated, &[]));
            }
            log_info!(self.logger, "系统托盘已创建");
        } else {
            log_warning!(self.logger, "系统托盘不可用，仅显示主窗口");
        }

        let options = WindowOptions::for_config(&self.config)?;
        let window = create_main_window(&handle, &options)?;

        let dialog = Arc::new(TauriConfirmDialog::new(handle.clone()));
        install_close_guard(
            &window,
            CloseGuard::new(dialog, Arc::clone(&self.coordinator), self.strings.as_ref()),
        );

        let site = Arc::new(StaticSite::new(web_root(&self.root, &self.config)));
        let config = Arc::clone(&self.config);
        let token = self.coordinator.token();
        let grace = self.coordinator.grace();
        let logger = self.logger.clone();
        self.coordinator.spawn(async move {
            if let Err(e) = run_server(config, site, token, grace).await {
                log_error!(logger, "Web 服务运行失败: {:#}", e);
            }
        });

        Ok(())
    }
}
