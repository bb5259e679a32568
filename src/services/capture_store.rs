//! 采集记录 - 业务能力层
//!
//! 只追加、不删除。位置从0开始递增，插入顺序 = 采集顺序 = 提交顺序。

use crate::error::{AppResult, StoreError};
use crate::models::Capture;

/// 采集记录
#[derive(Debug, Default)]
pub struct CaptureStore {
    captures: Vec<Capture>,
}

impl CaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一张采集，返回其位置
    pub fn append(&mut self, capture: Capture) -> usize {
        self.captures.push(capture);
        self.captures.len() - 1
    }

    pub fn count(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// 按位置读取
    pub fn at(&self, position: usize) -> AppResult<&Capture> {
        self.captures.get(position).ok_or_else(|| {
            StoreError::OutOfRange {
                position,
                len: self.captures.len(),
            }
            .into()
        })
    }
}
