//! 答题卡上下文
//!
//! 封装"我正在处理第几张答题卡"这一信息

use std::fmt::Display;

/// 答题卡上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetCtx {
    /// 在采集记录中的位置（从0开始）
    pub position: usize,

    /// 模板标识
    pub template_id: String,
}

impl SheetCtx {
    pub fn new(position: usize, template_id: impl Into<String>) -> Self {
        Self {
            position,
            template_id: template_id.into(),
        }
    }

    /// 界面上显示的编号（从1开始）
    pub fn number(&self) -> usize {
        self.position + 1
    }
}

impl Display for SheetCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[答题卡 {} 模板#{}]", self.number(), self.template_id)
    }
}
