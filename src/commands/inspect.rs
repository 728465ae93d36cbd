//! 查看 ICO 文件目录

use crate::core::IconDir;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
/// BITMAPINFOHEADER 的 biSize
const BITMAPINFOHEADER_LEN: u32 = 40;

/// 根据负载开头判断图片格式
fn payload_format(payload: &[u8]) -> &'static str {
    if payload.starts_with(&PNG_SIGNATURE) {
        "png"
    } else if payload.starts_with(&BITMAPINFOHEADER_LEN.to_le_bytes()) {
        "bmp"
    } else {
        "unknown"
    }
}

/// 单个目录项信息
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub index: usize,
    /// 实际像素宽度（目录项中的 0 换算为 256）
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub size: u32,
    pub offset: u32,
    /// "png"、"bmp" 或 "unknown"
    pub format: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub file_size: usize,
    pub count: usize,
    pub entries: Vec<EntryInfo>,
}

impl std::fmt::Display for InspectReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} 张图片, {} 字节", self.count, self.file_size)?;
        for e in &self.entries {
            writeln!(
                f,
                "  #{:<3} {:>3}x{:<3} {:>2}bpp  {:<4} size={} offset={}",
                e.index, e.width, e.height, e.bits_per_pixel, e.format, e.size, e.offset
            )?;
        }
        Ok(())
    }
}

/// 解析内存中的 ICO 数据
pub fn inspect_bytes(data: &[u8]) -> Result<InspectReport> {
    let dir = IconDir::parse(data)?;

    let entries = dir
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let format = dir.payload(index).map(payload_format).unwrap_or("unknown");
            EntryInfo {
                index,
                width: entry.pixel_width(),
                height: entry.pixel_height(),
                bits_per_pixel: entry.bits_per_pixel,
                size: entry.size,
                offset: entry.offset,
                format,
            }
        })
        .collect();

    Ok(InspectReport {
        file_size: data.len(),
        count: dir.len(),
        entries,
    })
}

/// 读取并解析 ICO 文件
pub async fn inspect(path: &Path) -> Result<InspectReport> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("读取文件失败: {:?}", path))?;
    inspect_bytes(&data).with_context(|| format!("解析失败: {:?}", path))
}
