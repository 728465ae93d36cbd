use super::ImageSource;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 磁盘文件来源
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", Self::normalize_path(&path));
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 规范化路径分隔符（统一使用 /）
    fn normalize_path(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }
}

#[async_trait]
impl ImageSource for FileSource {
    async fn read_bytes(&self) -> io::Result<Bytes> {
        let data = fs::read(&self.path).await?;
        Ok(Bytes::from(data))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
