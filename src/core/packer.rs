//! PNG -> ICO 打包器
//!
//! 输出布局：ICONDIR(6) + ICONDIRENTRY(16 × n) + 按输入顺序拼接的 PNG 原始数据。
//! PNG 数据不做任何重新编码。

use super::layout::{directory_len, IconDirEntry, IconDirHeader, MAX_ENTRIES};
use super::probe::{DimensionProber, ImageSize, PngHeaderProber};
use crate::error::{IcoError, Result};
use crate::source::{Blob, ImageSource};
use bytes::Bytes;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

/// 未指定时的位深
pub const DEFAULT_BPP: u16 = 32;

/// 一次转换中的单个输入
pub struct ConvertInput {
    pub png: Box<dyn ImageSource>,
    /// 写入目录项的位深，None 时使用打包器默认值
    pub bpp: Option<u16>,
    /// 跳过尺寸校验，宽高按 0 写入（ICO 约定 0 表示 256）
    pub ignore_size: bool,
    /// 调用方已知的像素尺寸，提供时不再探测
    pub size: Option<ImageSize>,
}

impl ConvertInput {
    pub fn new(png: impl ImageSource + 'static) -> Self {
        Self {
            png: Box::new(png),
            bpp: None,
            ignore_size: false,
            size: None,
        }
    }

    pub fn with_bpp(mut self, bpp: u16) -> Self {
        self.bpp = Some(bpp);
        self
    }

    pub fn with_ignore_size(mut self, b: bool) -> Self {
        self.ignore_size = b;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(ImageSize::new(width, height));
        self
    }
}

impl std::fmt::Debug for ConvertInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertInput")
            .field("png", &self.png.name())
            .field("bpp", &self.bpp)
            .field("ignore_size", &self.ignore_size)
            .field("size", &self.size)
            .finish()
    }
}

/// 已读取并校验过的单张图片
struct ResolvedImage {
    width: u8,
    height: u8,
    bpp: u16,
    data: Bytes,
}

/// ICO 打包器
///
/// 不持有任何跨调用的可变状态，同一个实例可以并发调用 `convert`。
#[derive(Clone)]
pub struct IcoPacker {
    prober: Arc<dyn DimensionProber>,
    default_bpp: u16,
    concurrent: bool,
}

impl Default for IcoPacker {
    fn default() -> Self {
        Self {
            prober: Arc::new(PngHeaderProber),
            default_bpp: DEFAULT_BPP,
            concurrent: true,
        }
    }
}

impl IcoPacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prober(mut self, prober: Arc<dyn DimensionProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_default_bpp(mut self, bpp: u16) -> Self {
        self.default_bpp = bpp;
        self
    }

    /// 是否并发读取和探测各输入
    pub fn with_concurrent(mut self, b: bool) -> Self {
        self.concurrent = b;
        self
    }

    /// 将输入列表打包为 ICO 字节
    ///
    /// 所有校验在分配输出缓冲区之前完成，失败时不会返回部分结果。
    pub async fn convert(&self, inputs: &[ConvertInput]) -> Result<Vec<u8>> {
        if inputs.len() > MAX_ENTRIES {
            return Err(IcoError::TooManyFiles {
                count: inputs.len(),
            });
        }

        let images = if self.concurrent {
            try_join_all(
                inputs
                    .iter()
                    .enumerate()
                    .map(|(index, input)| self.resolve(index, input)),
            )
            .await?
        } else {
            let mut images = Vec::with_capacity(inputs.len());
            for (index, input) in inputs.iter().enumerate() {
                images.push(self.resolve(index, input).await?);
            }
            images
        };

        assemble(&images)
    }

    /// 与 `convert` 相同，结果包装为指定媒体类型的 Blob
    pub async fn convert_to_blob(
        &self,
        inputs: &[ConvertInput],
        media_type: impl Into<String>,
    ) -> Result<Blob> {
        let data = self.convert(inputs).await?;
        Ok(Blob::new(data, media_type))
    }

    async fn resolve(&self, index: usize, input: &ConvertInput) -> Result<ResolvedImage> {
        let bpp = input.bpp.unwrap_or(self.default_bpp);
        let data = input
            .png
            .read_bytes()
            .await
            .map_err(|source| IcoError::Read { index, source })?;

        let (width, height) = if input.ignore_size {
            (0, 0)
        } else {
            let size = match input.size {
                Some(size) => size,
                None => self
                    .prober
                    .probe(&data)
                    .map_err(|source| IcoError::InvalidImage { index, source })?,
            };
            ico_dimensions(index, size)?
        };

        debug!(
            "第 {} 张图片: {} {}x{} {}bpp {} 字节",
            index,
            input.png.name(),
            width,
            height,
            bpp,
            data.len()
        );

        Ok(ResolvedImage {
            width,
            height,
            bpp,
            data,
        })
    }
}

/// 校验尺寸在 1-255 之间并转换为目录项字段
fn ico_dimensions(index: usize, size: ImageSize) -> Result<(u8, u8)> {
    match (u8::try_from(size.width), u8::try_from(size.height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(IcoError::InvalidSize {
            index,
            width: size.width,
            height: size.height,
        }),
    }
}

/// 根据各负载长度计算 (offset, size)，并返回文件总长度
fn plan_offsets(lengths: &[usize]) -> Result<(Vec<(u32, u32)>, usize)> {
    let mut offset = directory_len(lengths.len());
    let mut placements = Vec::with_capacity(lengths.len());

    for (index, &len) in lengths.iter().enumerate() {
        let start = u32::try_from(offset).map_err(|_| IcoError::OffsetOverflow { index })?;
        let size = u32::try_from(len).map_err(|_| IcoError::OffsetOverflow { index })?;
        placements.push((start, size));
        offset += len;
    }

    Ok((placements, offset))
}

fn assemble(images: &[ResolvedImage]) -> Result<Vec<u8>> {
    let count = u16::try_from(images.len()).map_err(|_| IcoError::TooManyFiles {
        count: images.len(),
    })?;

    let lengths: Vec<usize> = images.iter().map(|image| image.data.len()).collect();
    let (placements, total) = plan_offsets(&lengths)?;

    let mut buf = Vec::with_capacity(total);
    IconDirHeader::icon(count).write_to(&mut buf);
    for (image, &(offset, size)) in images.iter().zip(&placements) {
        IconDirEntry::png(image.width, image.height, image.bpp, size, offset).write_to(&mut buf);
    }
    for image in images {
        buf.extend_from_slice(&image.data);
    }
    debug_assert_eq!(buf.len(), total);

    debug!("ICO 打包完成: {} 张图片, {} 字节", count, total);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::IconDir;
    use crate::core::probe::tests::encode_png;
    use crate::core::probe::ImageProber;
    use crate::source::{BufferSource, FileSource};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::io;

    fn item(data: &'static [u8], width: u32, height: u32) -> ConvertInput {
        ConvertInput::new(BufferSource::from(data)).with_size(width, height)
    }

    /// 读取即失败的来源
    struct BrokenSource;

    #[async_trait]
    impl ImageSource for BrokenSource {
        async fn read_bytes(&self) -> io::Result<Bytes> {
            Err(io::Error::new(io::ErrorKind::Other, "broken"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_two_item_layout() {
        let inputs = vec![item(&[1, 2, 3], 32, 48), item(&[9, 8, 7, 6], 32, 32)];
        let out = IcoPacker::new().convert(&inputs).await.unwrap();

        assert_eq!(out.len(), 6 + 16 * 2 + 3 + 4);
        assert_eq!(&out[..6], &[0, 0, 1, 0, 2, 0]);

        let dir = IconDir::parse(&out).unwrap();
        assert_eq!(dir.entries[0], IconDirEntry::png(32, 48, 32, 3, 38));
        assert_eq!(dir.entries[1], IconDirEntry::png(32, 32, 32, 4, 41));
        assert_eq!(&out[38..41], &[1, 2, 3]);
        assert_eq!(&out[41..45], &[9, 8, 7, 6]);
    }

    #[tokio::test]
    async fn test_empty_input_is_header_only() {
        let out = IcoPacker::new().convert(&[]).await.unwrap();
        assert_eq!(out, vec![0, 0, 1, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_offsets_are_contiguous_and_payloads_identical() {
        let payloads: Vec<Vec<u8>> = (1..=5u8).map(|n| vec![n; n as usize * 7]).collect();
        let inputs: Vec<ConvertInput> = payloads
            .iter()
            .map(|p| ConvertInput::new(BufferSource::from(p.clone())).with_size(16, 16))
            .collect();

        let out = IcoPacker::new().convert(&inputs).await.unwrap();
        let total: usize = payloads.iter().map(Vec::len).sum();
        assert_eq!(out.len(), 6 + 16 * payloads.len() + total);

        let dir = IconDir::parse(&out).unwrap();
        assert_eq!(dir.entries[0].offset as usize, directory_len(5));
        for pair in dir.entries.windows(2) {
            assert_eq!(pair[0].offset + pair[0].size, pair[1].offset);
        }
        for (i, payload) in payloads.iter().enumerate() {
            assert_eq!(dir.payload(i).unwrap(), payload.as_slice());
        }
    }

    #[tokio::test]
    async fn test_size_boundaries() {
        let packer = IcoPacker::new();

        for (w, h) in [(1, 1), (255, 255), (1, 255)] {
            assert!(packer.convert(&[item(&[0], w, h)]).await.is_ok());
        }

        for (w, h) in [(0, 16), (16, 0), (256, 16), (16, 256)] {
            let err = packer.convert(&[item(&[0], w, h)]).await.unwrap_err();
            assert!(
                matches!(err, IcoError::InvalidSize { index: 0, width, height } if width == w && height == h),
                "{}x{} 应当失败",
                w,
                h
            );
        }
    }

    #[tokio::test]
    async fn test_ignore_size_encodes_zero() {
        let inputs = vec![item(&[1, 2], 512, 300).with_ignore_size(true)];
        let out = IcoPacker::new().convert(&inputs).await.unwrap();

        let dir = IconDir::parse(&out).unwrap();
        assert_eq!(dir.entries[0].width, 0);
        assert_eq!(dir.entries[0].height, 0);
        assert_eq!(dir.entries[0].pixel_width(), 256);
    }

    #[tokio::test]
    async fn test_ignore_size_skips_probe() {
        // 负载不是合法 PNG，但 ignore_size 时不探测
        let inputs = vec![ConvertInput::new(BufferSource::from(b"not a png".to_vec())).with_ignore_size(true)];
        assert!(IcoPacker::new().convert(&inputs).await.is_ok());
    }

    #[tokio::test]
    async fn test_bpp_default_and_override() {
        let inputs = vec![
            item(&[1], 16, 16),
            item(&[2], 16, 16).with_bpp(8),
        ];
        let out = IcoPacker::new()
            .with_default_bpp(24)
            .convert(&inputs)
            .await
            .unwrap();

        let dir = IconDir::parse(&out).unwrap();
        assert_eq!(dir.entries[0].bits_per_pixel, 24);
        assert_eq!(dir.entries[1].bits_per_pixel, 8);
        assert_eq!(dir.entries[0].planes, 1);
        assert_eq!(dir.entries[0].color_count, 0);
    }

    #[tokio::test]
    async fn test_probes_real_png() {
        let small = encode_png(16, 16);
        let wide = encode_png(64, 32);
        let inputs = vec![
            ConvertInput::new(BufferSource::from(small.clone())),
            ConvertInput::new(Blob::new(wide.clone(), "image/png")),
        ];

        for packer in [
            IcoPacker::new(),
            IcoPacker::new().with_prober(Arc::new(ImageProber)),
        ] {
            let out = packer.convert(&inputs).await.unwrap();
            let dir = IconDir::parse(&out).unwrap();
            assert_eq!((dir.entries[0].width, dir.entries[0].height), (16, 16));
            assert_eq!((dir.entries[1].width, dir.entries[1].height), (64, 32));
            assert_eq!(dir.payload(0).unwrap(), small.as_slice());
            assert_eq!(dir.payload(1).unwrap(), wide.as_slice());
        }
    }

    #[tokio::test]
    async fn test_oversized_png_is_invalid_size() {
        let inputs = vec![ConvertInput::new(BufferSource::from(encode_png(256, 16)))];
        let err = IcoPacker::new().convert(&inputs).await.unwrap_err();
        assert!(matches!(
            err,
            IcoError::InvalidSize {
                width: 256,
                height: 16,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_invalid_image() {
        let inputs = vec![
            item(&[1], 16, 16),
            ConvertInput::new(BufferSource::from(vec![1u8, 2, 3])),
        ];
        let err = IcoPacker::new()
            .with_concurrent(false)
            .convert(&inputs)
            .await
            .unwrap_err();
        assert!(matches!(err, IcoError::InvalidImage { index: 1, .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn test_read_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![ConvertInput::new(FileSource::new(dir.path().join("none.png")))];
        let err = IcoPacker::new().convert(&inputs).await.unwrap_err();
        assert!(matches!(err, IcoError::Read { index: 0, .. }));
    }

    #[tokio::test]
    async fn test_sequential_matches_concurrent() {
        let inputs: Vec<ConvertInput> = (1..=10u32)
            .map(|n| ConvertInput::new(BufferSource::from(encode_png(n, n + 1))))
            .collect();

        let a = IcoPacker::new().convert(&inputs).await.unwrap();
        let b = IcoPacker::new()
            .with_concurrent(false)
            .convert(&inputs)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_capacity_boundary() {
        let packer = IcoPacker::new().with_concurrent(false);

        let inputs: Vec<ConvertInput> = (0..MAX_ENTRIES).map(|_| item(&[0xAB], 1, 1)).collect();
        let out = packer.convert(&inputs).await.unwrap();
        assert_eq!(&out[4..6], &[0xFF, 0xFF]);
        assert_eq!(out.len(), 6 + 16 * MAX_ENTRIES + MAX_ENTRIES);

        // 超出上限时在读取任何输入之前失败
        let inputs: Vec<ConvertInput> = (0..=MAX_ENTRIES)
            .map(|_| ConvertInput::new(BrokenSource))
            .collect();
        let err = packer.convert(&inputs).await.unwrap_err();
        assert!(matches!(err, IcoError::TooManyFiles { count } if count == MAX_ENTRIES + 1));
    }

    #[tokio::test]
    async fn test_convert_to_blob() {
        let inputs = vec![item(&[1, 2, 3], 32, 48)];
        let packer = IcoPacker::new();
        let blob = packer
            .convert_to_blob(&inputs, crate::source::blob::ICO_MEDIA_TYPE)
            .await
            .unwrap();
        let bytes = packer.convert(&inputs).await.unwrap();

        assert_eq!(blob.media_type(), "image/x-icon");
        assert_eq!(&blob.data()[..], bytes.as_slice());
    }

    #[test]
    fn test_plan_offsets() {
        let (placements, total) = plan_offsets(&[3, 4]).unwrap();
        assert_eq!(placements, vec![(38, 3), (41, 4)]);
        assert_eq!(total, 45);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_plan_offsets_overflow() {
        let huge = u32::MAX as usize;
        // 第一项长度合法，但第二项的偏移超出 u32
        assert!(matches!(
            plan_offsets(&[huge - 30, 1]),
            Err(IcoError::OffsetOverflow { index: 1 })
        ));
        assert!(matches!(
            plan_offsets(&[huge + 1]),
            Err(IcoError::OffsetOverflow { index: 0 })
        ));
    }
}
