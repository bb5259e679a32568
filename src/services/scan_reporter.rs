//! 扫描结果展示 - 业务能力层
//!
//! `ScanObserver` 是调度器与界面之间的唯一接口：计数、预览、结果卡片、提示音、跳转。

use crate::error::{AppError, SubmitError};
use crate::models::{BatchSummary, Capture, ScanResult, SheetCtx};
use crate::utils::truncate_text;
use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::{error, info, warn};

/// 扫描事件观察者
///
/// 所有方法都有空实现，只需覆盖关心的事件。
pub trait ScanObserver: Send + Sync {
    /// 一张答题卡已存入采集记录（计数 +1，插入预览）
    fn on_sheet_captured(&self, _sheet: &SheetCtx, _capture: &Capture, _count: usize) {}

    /// 识别服务接受了一张答题卡（结果卡片 + 提示音）
    fn on_scan_accepted(&self, _sheet: &SheetCtx, _result: &ScanResult) {}

    /// 连续扫描中某一帧未被接受（不入库）
    fn on_frame_rejected(&self, _error: &SubmitError) {}

    /// 批量提交中某一张失败
    fn on_sheet_failed(&self, _sheet: &SheetCtx, _error: &SubmitError) {}

    /// 结束批次的请求被拒绝（例如空批次）
    fn on_finish_rejected(&self, _error: &AppError) {}

    /// 批次完成，跳转到首页
    fn on_batch_finished(&self, _home_route: &str, _summary: &BatchSummary) {}

    /// 会话级致命错误
    fn on_session_error(&self, _error: &AppError) {}
}

/// 控制台 + 结果文件输出
///
/// 职责：
/// - 用日志展示每个扫描事件
/// - 将每张答题卡的评分结果追加到结果文件
pub struct ConsoleReporter {
    result_file_path: String,
}

impl ConsoleReporter {
    /// 评分结果追加到 `path`
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            result_file_path: path.into(),
        }
    }

    fn append_line(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.result_file_path)?;

        writeln!(
            file,
            "{} | {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            line
        )?;

        Ok(())
    }

    fn record(&self, line: String) {
        if let Err(e) = self.append_line(&line) {
            warn!("写入结果文件失败 ({}): {}", self.result_file_path, e);
        }
    }
}

impl ScanObserver for ConsoleReporter {
    fn on_sheet_captured(&self, sheet: &SheetCtx, capture: &Capture, count: usize) {
        info!(
            "{} 📸 {} 已采集 ({} 字节, {})，当前共 {} 张",
            sheet,
            capture.captured_at().format("%H:%M:%S"),
            capture.image().len(),
            capture.image().mime(),
            count
        );
    }

    fn on_scan_accepted(&self, sheet: &SheetCtx, result: &ScanResult) {
        info!("{} ✓ 扫描结果 #{}", sheet, result.scan_id);
        info!("{} 学生: {}", sheet, result.student_name);
        info!("{} 得分: {}", sheet, result.score);
        info!("{} 详情: {}", sheet, result.detail_route());
        info!("🔔 识别成功");

        self.record(format!(
            "答题卡 {} | 扫描 #{} | {} | {} | {}",
            sheet.number(),
            result.scan_id,
            result.student_name,
            result.score,
            result.detail_route()
        ));
    }

    fn on_frame_rejected(&self, error: &SubmitError) {
        match error {
            SubmitError::NoSheetDetected { reason } => {
                info!("未识别到答题卡: {}", truncate_text(reason, 80));
            }
            SubmitError::Transport { cause } => {
                warn!("⚠️ 识别服务请求失败: {}", truncate_text(cause, 120));
            }
        }
    }

    fn on_sheet_failed(&self, sheet: &SheetCtx, error: &SubmitError) {
        error!("{} ❌ 处理失败: {}", sheet, error);
        self.record(format!("答题卡 {} | 失败 | {}", sheet.number(), error));
    }

    fn on_finish_rejected(&self, error: &AppError) {
        warn!("⚠️ {}", error);
    }

    fn on_batch_finished(&self, home_route: &str, summary: &BatchSummary) {
        info!(
            "✅ 批次完成: 成功 {}/{}，返回首页 {}",
            summary.accepted, summary.total, home_route
        );
    }

    fn on_session_error(&self, error: &AppError) {
        error!("❌ 摄像头错误: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Score;

    #[test]
    fn test_results_are_appended_per_sheet() {
        let path = std::env::temp_dir().join(format!("sheet_scan_results_{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let reporter = ConsoleReporter::with_path(path.to_string_lossy().to_string());

        let result = ScanResult {
            scan_id: 3,
            student_name: "Mei".to_string(),
            score: Score {
                correct: 9,
                total: 20,
                percentage: 45.0,
            },
        };
        reporter.on_scan_accepted(&SheetCtx::new(0, "standard_20"), &result);
        reporter.on_sheet_failed(
            &SheetCtx::new(1, "standard_20"),
            &SubmitError::Transport {
                cause: "timeout".to_string(),
            },
        );

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("答题卡 1 | 扫描 #3 | Mei | 9/20 (45%) | /result/3"));
        assert!(lines[1].contains("答题卡 2 | 失败"));
        let _ = std::fs::remove_file(&path);
    }
}
