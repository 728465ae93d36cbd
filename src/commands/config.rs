//! 配置相关命令

use crate::config::PackConfig;
use crate::core::ProberKind;
use crate::logging::LogConfig;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 配置修改项，None 表示不修改
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub default_bpp: Option<u16>,
    pub prober: Option<ProberKind>,
    pub concurrent: Option<bool>,
    pub media_type: Option<String>,
    pub log_enabled: Option<bool>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.default_bpp.is_none()
            && self.prober.is_none()
            && self.concurrent.is_none()
            && self.media_type.is_none()
            && self.log_enabled.is_none()
            && self.log_level.is_none()
            && self.log_file.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub pack: PackConfig,
    pub log: LogConfig,
}

/// 获取当前配置
pub fn get_config(config_dir: &Path) -> ConfigView {
    ConfigView {
        pack: PackConfig::load(config_dir),
        log: LogConfig::load(config_dir),
    }
}

/// 修改配置并保存
pub fn set_config(config_dir: &Path, update: ConfigUpdate) -> Result<ConfigView> {
    let mut pack = PackConfig::load(config_dir);
    let mut log = LogConfig::load(config_dir);

    if let Some(bpp) = update.default_bpp {
        if bpp == 0 {
            return Err(anyhow!("位深不能为 0"));
        }
        pack.default_bpp = bpp;
    }
    if let Some(p) = update.prober {
        pack.prober = p;
    }
    if let Some(c) = update.concurrent {
        pack.concurrent = c;
    }
    if let Some(m) = update.media_type {
        pack.media_type = m;
    }
    if let Some(e) = update.log_enabled {
        log.enabled = e;
    }
    if let Some(l) = update.log_level {
        log.set_level(&l).map_err(|e| anyhow!(e))?;
    }
    if let Some(f) = update.log_file {
        // 空路径表示关闭文件日志
        log.file = if f.as_os_str().is_empty() { None } else { Some(f) };
    }

    pack.save(config_dir)
        .with_context(|| format!("保存配置失败: {:?}", config_dir))?;
    log.save(config_dir)
        .with_context(|| format!("保存配置失败: {:?}", config_dir))?;

    Ok(ConfigView { pack, log })
}
