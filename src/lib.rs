use std::path::PathBuf;

pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod source;

pub use self::core::{ConvertInput, IcoPacker, IconDir, ImageSize, ProberKind};
pub use error::{IcoError, ProbeError};
pub use source::{Blob, BufferSource, FileSource, ImageSource};

/// 覆盖配置目录的环境变量
pub const CONFIG_DIR_ENV: &str = "ICOPACK_CONFIG_DIR";

/// 获取配置目录：环境变量优先，其次是系统配置目录下的 icopack
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .map(|p| p.join("icopack"))
        .unwrap_or_else(|| PathBuf::from(".icopack"))
}

// 只需要一个目录，不引入 dirs 依赖
pub mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
        } else {
            // Linux：遵循 XDG_CONFIG_HOME
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".config"))
                })
        }
    }
}
