//! 采集结果
//!
//! 一张静态画面加上它所使用的答题卡模板，创建后不可变。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local};
use std::sync::Arc;

/// 编码后的图片数据
///
/// 内部使用 `Arc` 共享字节，克隆开销与图片大小无关。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime: String,
    bytes: Arc<[u8]>,
}

impl ImagePayload {
    pub fn new(mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// PNG 图片（画布导出的默认格式）
    pub fn png(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new("image/png", bytes)
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 编码为 `data:<mime>;base64,<payload>` 形式
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// 一次成功的采集
#[derive(Debug, Clone)]
pub struct Capture {
    image: ImagePayload,
    template_id: String,
    captured_at: DateTime<Local>,
}

impl Capture {
    pub fn new(image: ImagePayload, template_id: impl Into<String>) -> Self {
        Self {
            image,
            template_id: template_id.into(),
            captured_at: Local::now(),
        }
    }

    pub fn image(&self) -> &ImagePayload {
        &self.image
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }
}
