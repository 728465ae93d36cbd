//! 图片尺寸探测

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;

/// 图片像素尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 尺寸探测接口
pub trait DimensionProber: Send + Sync {
    fn probe(&self, data: &[u8]) -> Result<ImageSize, ProbeError>;

    /// 获取探测器名称（用于日志）
    fn name(&self) -> &str;
}

/// 只解析 PNG 签名和 IHDR，不解码像素
#[derive(Debug, Default, Clone, Copy)]
pub struct PngHeaderProber;

impl DimensionProber for PngHeaderProber {
    fn probe(&self, data: &[u8]) -> Result<ImageSize, ProbeError> {
        let reader = png::Decoder::new(Cursor::new(data)).read_info()?;
        let info = reader.info();
        non_empty(info.width, info.height)
    }

    fn name(&self) -> &str {
        "png"
    }
}

/// 按内容识别格式的通用探测器，接受 image 支持的任意格式
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProber;

impl DimensionProber for ImageProber {
    fn probe(&self, data: &[u8]) -> Result<ImageSize, ProbeError> {
        let (width, height) = image::io::Reader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_dimensions()?;
        non_empty(width, height)
    }

    fn name(&self) -> &str {
        "image"
    }
}

fn non_empty(width: u32, height: u32) -> Result<ImageSize, ProbeError> {
    if width == 0 || height == 0 {
        return Err(ProbeError::EmptyImage { width, height });
    }
    Ok(ImageSize::new(width, height))
}

/// 探测器类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProberKind {
    #[default]
    Png,
    Image,
}

impl ProberKind {
    pub fn build(self) -> Arc<dyn DimensionProber> {
        match self {
            ProberKind::Png => Arc::new(PngHeaderProber),
            ProberKind::Image => Arc::new(ImageProber),
        }
    }
}

impl std::fmt::Display for ProberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProberKind::Png => write!(f, "png"),
            ProberKind::Image => write!(f, "image"),
        }
    }
}
