//! 打包命令

use crate::config::PackConfig;
use crate::core::{ConvertInput, IcoPacker, ProberKind};
use crate::source::FileSource;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 打包请求
#[derive(Debug, Clone, Default)]
pub struct PackRequest {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// 覆盖所有输入的位深
    pub bpp: Option<u16>,
    pub ignore_size: bool,
    /// 覆盖配置中的探测器
    pub prober: Option<ProberKind>,
    /// 强制顺序处理
    pub sequential: bool,
}

/// 打包结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackReport {
    pub output: PathBuf,
    pub images: usize,
    pub bytes: usize,
    pub media_type: String,
}

/// 将多个 PNG 文件打包为 ICO 文件
pub async fn pack(request: &PackRequest, config: &PackConfig) -> Result<PackReport> {
    let packer = IcoPacker::new()
        .with_prober(request.prober.unwrap_or(config.prober).build())
        .with_default_bpp(config.default_bpp)
        .with_concurrent(config.concurrent && !request.sequential);

    let inputs: Vec<ConvertInput> = request
        .inputs
        .iter()
        .map(|path| {
            let input = ConvertInput::new(FileSource::new(path)).with_ignore_size(request.ignore_size);
            match request.bpp {
                Some(bpp) => input.with_bpp(bpp),
                None => input,
            }
        })
        .collect();

    let blob = packer
        .convert_to_blob(&inputs, config.media_type.as_str())
        .await
        .with_context(|| format!("打包失败: {:?}", request.output))?;

    write_atomic(&request.output, blob.data()).await?;

    tracing::info!(
        "已生成 {:?}: {} 张图片, {} 字节, {}",
        request.output,
        inputs.len(),
        blob.len(),
        blob.media_type()
    );

    Ok(PackReport {
        output: request.output.clone(),
        images: inputs.len(),
        bytes: blob.len(),
        media_type: blob.media_type().to_string(),
    })
}

/// 先写入临时文件再重命名，失败时删除临时文件
async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("无法创建目录: {:?}", parent))?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp_path = scopeguard::guard(PathBuf::from(temp), |p| {
        let _ = std::fs::remove_file(&p);
    });

    fs::write(&*temp_path, data)
        .await
        .with_context(|| format!("写入失败: {:?}", *temp_path))?;
    fs::rename(&*temp_path, path)
        .await
        .with_context(|| format!("重命名失败: {:?}", path))?;

    // 重命名成功，临时文件已不存在
    let _ = scopeguard::ScopeGuard::into_inner(temp_path);
    Ok(())
}
