use crate::core::{AppError, AppResult};
use crate::models::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// 配置文件名
pub const CONFIG_FILE: &str = "config.json";

/// 程序根目录（可执行文件所在目录），获取失败时退回当前工作目录
pub fn app_root_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 配置文件路径
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// 日志目录
pub fn log_dir(root: &Path) -> PathBuf {
    root.join("logs")
}

/// 托盘图标路径
pub fn icon_path(root: &Path) -> PathBuf {
    root.join("icon.jpg")
}

/// Web 静态资源目录
pub fn web_root(root: &Path, config: &AppConfig) -> PathBuf {
    match &config.web_root {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => root.join(path),
        None => root.join("web"),
    }
}

/// 读取配置（若文件不存在返回 Ok(None)）
pub fn read_app_config(path: &Path) -> AppResult<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| AppError::config_read(path, e))?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}

/// 写入配置
pub fn write_app_config(path: &Path, config: &AppConfig) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

/// 加载配置，启动期间从不失败
///
/// - 文件不存在：使用默认配置，并尽力写回磁盘供用户修改
/// - 文件损坏：在 stderr 提示后使用默认配置
pub fn load_app_config(root: &Path) -> AppConfig {
    let path = config_path(root);
    match read_app_config(&path) {
        Ok(Some(config)) => config,
        Ok(None) => {
            let config = AppConfig::default();
            if let Err(e) = write_app_config(&path, &config) {
                // 日志系统此时尚未初始化
                eprintln!("WARNING: Failed to write default config: {e}");
            }
            config
        }
        Err(e) => {
            eprintln!("WARNING: Failed to load config, using defaults: {e}");
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_missing_config_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let result = read_app_config(&temp_dir.path().join(CONFIG_FILE)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_writes_defaults_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_app_config(temp_dir.path());
        assert_eq!(config, AppConfig::default());

        let written = read_app_config(&config_path(temp_dir.path()))
            .unwrap()
            .expect("默认配置应已写回磁盘");
        assert_eq!(written, config);
    }

    #[test]
    fn load_falls_back_on_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(config_path(temp_dir.path()), "{ not json").unwrap();

        assert!(read_app_config(&config_path(temp_dir.path())).is_err());
        assert_eq!(load_app_config(temp_dir.path()), AppConfig::default());
    }

    #[test]
    fn round_trip_keeps_user_values() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig {
            port: 9000,
            show_console: false,
            ..Default::default()
        };
        write_app_config(&config_path(temp_dir.path()), &config).unwrap();
        assert_eq!(load_app_config(temp_dir.path()), config);
    }

    #[test]
    fn web_root_resolution() {
        let root = Path::new("/opt/onekey");
        let mut config = AppConfig::default();
        assert_eq!(web_root(root, &config), root.join("web"));

        config.web_root = Some(PathBuf::from("dist"));
        assert_eq!(web_root(root, &config), root.join("dist"));
    }
}
