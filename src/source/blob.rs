use super::ImageSource;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;

/// ICO 文件的标准媒体类型
pub const ICO_MEDIA_TYPE: &str = "image/x-icon";

/// 不透明的二进制数据块，附带媒体类型
///
/// 既可以作为打包输入，也是 `convert_to_blob` 的输出。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    media_type: String,
    name: String,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        let data = data.into();
        let media_type = media_type.into();
        let name = format!("blob:{}:{}B", media_type, data.len());
        Self {
            data,
            media_type,
            name,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

#[async_trait]
impl ImageSource for Blob {
    async fn read_bytes(&self) -> io::Result<Bytes> {
        Ok(self.data.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
