//! 应用配置模块
//!
//! 所有配置保存在配置目录下的 `config.json` 中，每类配置占一个顶层字段，
//! 保存时只覆盖自己的字段。

use crate::core::{ProberKind, DEFAULT_BPP};
use crate::source::blob::ICO_MEDIA_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

const CONFIG_FILE: &str = "config.json";

/// 读取配置文件中的某个字段，文件缺失或损坏时返回 None
pub(crate) fn load_section<T: DeserializeOwned>(config_dir: &Path, key: &str) -> Option<T> {
    let content = fs::read_to_string(config_dir.join(CONFIG_FILE)).ok()?;
    let config = serde_json::from_str::<serde_json::Value>(&content).ok()?;
    serde_json::from_value(config.get(key)?.clone()).ok()
}

/// 更新配置文件中的某个字段，保留其他字段
pub(crate) fn save_section<T: Serialize>(config_dir: &Path, key: &str, value: &T) -> io::Result<()> {
    fs::create_dir_all(config_dir)?;
    let config_file = config_dir.join(CONFIG_FILE);

    // 读取现有配置
    let mut config: serde_json::Value = if config_file.exists() {
        let content = fs::read_to_string(&config_file)?;
        serde_json::from_str(&content).unwrap_or_else(|_| serde_json::json!({}))
    } else {
        serde_json::json!({})
    };
    if !config.is_object() {
        config = serde_json::json!({});
    }

    config[key] = serde_json::to_value(value)?;

    fs::write(&config_file, serde_json::to_string_pretty(&config)?)
}

/// 打包配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackConfig {
    /// 输入未指定位深时使用的值
    #[serde(default = "default_bpp")]
    pub default_bpp: u16,
    /// 尺寸探测器
    #[serde(default)]
    pub prober: ProberKind,
    /// 是否并发读取和探测输入
    #[serde(default = "default_concurrent")]
    pub concurrent: bool,
    /// 输出 Blob 的媒体类型
    #[serde(default = "default_media_type")]
    pub media_type: String,
}

fn default_bpp() -> u16 {
    DEFAULT_BPP
}

fn default_concurrent() -> bool {
    true
}

fn default_media_type() -> String {
    ICO_MEDIA_TYPE.to_string()
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            default_bpp: default_bpp(),
            prober: ProberKind::default(),
            concurrent: default_concurrent(),
            media_type: default_media_type(),
        }
    }
}

impl PackConfig {
    /// 从配置文件加载打包配置
    pub fn load(config_dir: &Path) -> Self {
        load_section(config_dir, "pack").unwrap_or_default()
    }

    /// 保存打包配置
    pub fn save(&self, config_dir: &Path) -> io::Result<()> {
        save_section(config_dir, "pack", self)
    }
}
