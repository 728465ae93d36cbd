//! 错误类型定义

use std::io;
use thiserror::Error;

/// 尺寸探测错误
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("PNG 解码失败: {0}")]
    Png(#[from] png::DecodingError),

    #[error("图片解码失败: {0}")]
    Image(#[from] image::ImageError),

    #[error("无法识别图片格式: {0}")]
    Format(#[from] io::Error),

    /// 解码器返回了 0 宽或 0 高
    #[error("图片尺寸无效: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

/// ICO 打包错误
#[derive(Debug, Error)]
pub enum IcoError {
    /// ICONDIR 的 count 字段只有 16 位
    #[error("文件数量过多: {count}（最多 65535 个）")]
    TooManyFiles { count: usize },

    #[error("第 {index} 张图片尺寸无效: {width}x{height}（宽高必须在 1-255 之间）")]
    InvalidSize { index: usize, width: u32, height: u32 },

    #[error("第 {index} 张图片无法解码")]
    InvalidImage {
        index: usize,
        #[source]
        source: ProbeError,
    },

    #[error("读取第 {index} 张图片失败")]
    Read {
        index: usize,
        #[source]
        source: io::Error,
    },

    /// 偏移或长度超出 ICO 目录项的 32 位字段
    #[error("第 {index} 张图片的偏移超出 32 位范围")]
    OffsetOverflow { index: usize },

    #[error("ICO 文件格式错误: {0}")]
    MalformedIco(String),
}

pub type Result<T> = std::result::Result<T, IcoError>;
