pub mod blob;
pub mod buffer;
pub mod file;

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::sync::Arc;

pub use blob::Blob;
pub use buffer::BufferSource;
pub use file::FileSource;

/// 图片数据来源抽象
///
/// 打包器只通过 `read_bytes` 读取负载，不关心数据来自内存缓冲区、Blob 还是磁盘文件。
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// 读取完整负载
    async fn read_bytes(&self) -> io::Result<Bytes>;

    /// 获取来源名称（用于日志）
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ImageSource + ?Sized> ImageSource for Arc<T> {
    async fn read_bytes(&self) -> io::Result<Bytes> {
        (**self).read_bytes().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: ImageSource + ?Sized> ImageSource for Box<T> {
    async fn read_bytes(&self) -> io::Result<Bytes> {
        (**self).read_bytes().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
