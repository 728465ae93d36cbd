use super::ImageSource;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;

/// 内存缓冲区来源
#[derive(Debug, Clone)]
pub struct BufferSource {
    data: Bytes,
    name: String,
}

impl BufferSource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let name = format!("buffer:{}B", data.len());
        Self { data, name }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for BufferSource {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&'static [u8]> for BufferSource {
    fn from(data: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(data))
    }
}

#[async_trait]
impl ImageSource for BufferSource {
    async fn read_bytes(&self) -> io::Result<Bytes> {
        // Bytes 克隆只增加引用计数
        Ok(self.data.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
