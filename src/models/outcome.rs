//! 提交结果
//!
//! 每张采集恰好产生一个 `SubmissionOutcome`。

use crate::error::SubmitError;
use serde::{Deserialize, Serialize};

/// 得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
    pub percentage: f64,
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({}%)", self.correct, self.total, self.percentage)
    }
}

/// 识别服务接受后的评分结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub scan_id: u64,
    pub student_name: String,
    pub score: Score,
}

impl ScanResult {
    /// 结果详情页路由
    pub fn detail_route(&self) -> String {
        format!("/result/{}", self.scan_id)
    }
}

/// 单次提交的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// 识别成功并已评分
    Accepted(ScanResult),
    /// 服务端未识别到有效答题卡
    Rejected { reason: String },
    /// 网络或服务端处理失败
    TransportError { cause: String },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted(_))
    }

    /// 转换为失败信息，成功时返回 `None`
    pub fn failure(&self) -> Option<SubmitError> {
        match self {
            SubmissionOutcome::Accepted(_) => None,
            SubmissionOutcome::Rejected { reason } => Some(SubmitError::NoSheetDetected {
                reason: reason.clone(),
            }),
            SubmissionOutcome::TransportError { cause } => Some(SubmitError::Transport {
                cause: cause.clone(),
            }),
        }
    }
}

/// 批次统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub accepted: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// 记录一个结果
    pub fn record(&mut self, outcome: &SubmissionOutcome) {
        self.total += 1;
        if outcome.is_accepted() {
            self.accepted += 1;
        } else {
            self.failed += 1;
        }
    }
}
