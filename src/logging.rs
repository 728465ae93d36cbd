//! 日志模块 - 控制台日志和可选的文件日志

use crate::config::{load_section, save_section};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// 有效的日志级别
pub const VALID_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// 是否启用日志记录
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 日志级别: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_level")]
    pub level: String,
    /// 日志文件路径，为空时只输出到控制台
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_enabled() -> bool {
    true
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            level: default_level(),
            file: None,
        }
    }
}

impl LogConfig {
    /// 从配置文件加载日志配置
    pub fn load(config_dir: &Path) -> Self {
        load_section(config_dir, "log").unwrap_or_default()
    }

    /// 保存日志配置
    pub fn save(&self, config_dir: &Path) -> io::Result<()> {
        save_section(config_dir, "log", self)
    }

    /// 设置日志级别，级别无效时返回错误
    pub fn set_level(&mut self, level: &str) -> Result<(), String> {
        let level = level.to_lowercase();
        if VALID_LEVELS.contains(&level.as_str()) {
            self.level = level;
            Ok(())
        } else {
            Err(format!("无效的日志级别: {}", level))
        }
    }

    /// 将配置的日志级别转换为 tracing Level
    pub fn tracing_level(&self) -> tracing::Level {
        match self.level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}

/// 初始化日志系统
///
/// 返回的 guard 需要保持到进程结束，否则文件日志可能丢失尾部内容。
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    if !config.enabled {
        // 日志已禁用，只初始化一个空的 subscriber
        let _ = tracing::subscriber::set_global_default(tracing_subscriber::registry());
        return None;
    }

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_env_filter(config, rust_log.as_deref());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let (file_layer, guard) = match config.file.as_deref().and_then(split_log_path) {
        Some((dir, name)) => {
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);

    guard
}

/// RUST_LOG 有效时完全使用它，否则使用配置的级别
fn build_env_filter(config: &LogConfig, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(config.tracing_level().into()))
}

/// 拆分日志文件路径为 (目录, 文件名)
fn split_log_path(path: &Path) -> Option<(PathBuf, PathBuf)> {
    let name = path.file_name()?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, PathBuf::from(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tracing_level() {
        let mut config = LogConfig::default();
        assert_eq!(config.tracing_level(), tracing::Level::WARN);

        config.level = "DEBUG".to_string();
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);

        config.level = "bogus".to_string();
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_set_level() {
        let mut config = LogConfig::default();
        assert!(config.set_level("Trace").is_ok());
        assert_eq!(config.level, "trace");
        assert!(config.set_level("verbose").is_err());
        assert_eq!(config.level, "trace");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            enabled: false,
            level: "error".to_string(),
            file: Some(PathBuf::from("/tmp/icopack.log")),
        };
        config.save(dir.path()).unwrap();
        assert_eq!(LogConfig::load(dir.path()), config);
    }

    #[test]
    fn test_rust_log_overrides_configured_level() {
        use tracing_subscriber::filter::LevelFilter;

        let config = LogConfig::default();
        assert_eq!(
            build_env_filter(&config, Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            build_env_filter(&config, None).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            build_env_filter(&config, Some("  ")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_split_log_path() {
        assert_eq!(
            split_log_path(Path::new("icopack.log")),
            Some((PathBuf::from("."), PathBuf::from("icopack.log")))
        );
        assert_eq!(
            split_log_path(Path::new("logs/app.log")),
            Some((PathBuf::from("logs"), PathBuf::from("app.log")))
        );
        assert_eq!(split_log_path(Path::new("/")), None);
    }
}
