//! ICO 容器结构：ICONDIR 头 + ICONDIRENTRY 目录项
//!
//! 所有多字节字段均为小端序。

use crate::error::{IcoError, Result};
use serde::Serialize;

/// ICONDIR 头长度
pub const HEADER_LEN: usize = 6;
/// 单个 ICONDIRENTRY 长度
pub const ENTRY_LEN: usize = 16;
/// count 字段为 u16
pub const MAX_ENTRIES: usize = u16::MAX as usize;
/// 资源类型：1 = 图标
pub const RESOURCE_TYPE_ICON: u16 = 1;

/// 目录区（头 + 全部目录项）的长度，也就是第一张图片的偏移
pub fn directory_len(count: usize) -> usize {
    HEADER_LEN + ENTRY_LEN * count
}

/// ICONDIR 头
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IconDirHeader {
    pub reserved: u16,
    pub resource_type: u16,
    pub count: u16,
}

impl IconDirHeader {
    pub fn icon(count: u16) -> Self {
        Self {
            reserved: 0,
            resource_type: RESOURCE_TYPE_ICON,
            count,
        }
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.reserved.to_le_bytes());
        buf.extend_from_slice(&self.resource_type.to_le_bytes());
        buf.extend_from_slice(&self.count.to_le_bytes());
    }

    fn read(data: &[u8]) -> Self {
        Self {
            reserved: read_u16(data, 0),
            resource_type: read_u16(data, 2),
            count: read_u16(data, 4),
        }
    }
}

/// ICONDIRENTRY 目录项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IconDirEntry {
    /// 0 表示 256
    pub width: u8,
    /// 0 表示 256
    pub height: u8,
    pub color_count: u8,
    pub reserved: u8,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub size: u32,
    pub offset: u32,
}

impl IconDirEntry {
    /// PNG 负载的目录项：无调色板，1 个色彩平面
    pub fn png(width: u8, height: u8, bits_per_pixel: u16, size: u32, offset: u32) -> Self {
        Self {
            width,
            height,
            color_count: 0,
            reserved: 0,
            planes: 1,
            bits_per_pixel,
            size,
            offset,
        }
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.width);
        buf.push(self.height);
        buf.push(self.color_count);
        buf.push(self.reserved);
        buf.extend_from_slice(&self.planes.to_le_bytes());
        buf.extend_from_slice(&self.bits_per_pixel.to_le_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        buf.extend_from_slice(&self.offset.to_le_bytes());
    }

    fn read(data: &[u8]) -> Self {
        Self {
            width: data[0],
            height: data[1],
            color_count: data[2],
            reserved: data[3],
            planes: read_u16(data, 4),
            bits_per_pixel: read_u16(data, 6),
            size: read_u32(data, 8),
            offset: read_u32(data, 12),
        }
    }

    /// 实际像素宽度（0 按 256 处理）
    pub fn pixel_width(&self) -> u32 {
        if self.width == 0 {
            256
        } else {
            self.width as u32
        }
    }

    /// 实际像素高度（0 按 256 处理）
    pub fn pixel_height(&self) -> u32 {
        if self.height == 0 {
            256
        } else {
            self.height as u32
        }
    }

    /// 负载在文件中的范围，32 位平台上溢出时返回 None
    fn range(&self) -> Option<std::ops::Range<usize>> {
        let start = self.offset as usize;
        let end = start.checked_add(self.size as usize)?;
        Some(start..end)
    }
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// 解析后的 ICO 目录，借用原始字节
#[derive(Debug, Clone)]
pub struct IconDir<'a> {
    pub header: IconDirHeader,
    pub entries: Vec<IconDirEntry>,
    data: &'a [u8],
}

impl<'a> IconDir<'a> {
    /// 解析 ICO 头和目录项，并校验每个负载都落在缓冲区内
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(IcoError::MalformedIco(format!(
                "文件过短: {} 字节",
                data.len()
            )));
        }

        let header = IconDirHeader::read(data);
        if header.reserved != 0 {
            return Err(IcoError::MalformedIco(format!(
                "保留字段不为 0: {}",
                header.reserved
            )));
        }
        if header.resource_type != RESOURCE_TYPE_ICON {
            return Err(IcoError::MalformedIco(format!(
                "不是图标文件，资源类型: {}",
                header.resource_type
            )));
        }

        let count = header.count as usize;
        let dir_len = directory_len(count);
        if data.len() < dir_len {
            return Err(IcoError::MalformedIco(format!(
                "目录区不完整: 需要 {} 字节，实际 {} 字节",
                dir_len,
                data.len()
            )));
        }

        let entries: Vec<IconDirEntry> = data[HEADER_LEN..dir_len]
            .chunks_exact(ENTRY_LEN)
            .map(IconDirEntry::read)
            .collect();

        for (i, entry) in entries.iter().enumerate() {
            let in_bounds = entry.range().is_some_and(|r| r.end <= data.len());
            if !in_bounds {
                return Err(IcoError::MalformedIco(format!(
                    "第 {} 项数据越界: offset={}, size={}, 文件长度={}",
                    i,
                    entry.offset,
                    entry.size,
                    data.len()
                )));
            }
        }

        Ok(Self {
            header,
            entries,
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 第 `index` 项的原始负载
    pub fn payload(&self, index: usize) -> Option<&'a [u8]> {
        // parse 已校验所有范围
        let range = self.entries.get(index)?.range()?;
        self.data.get(range)
    }
}
