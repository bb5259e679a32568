use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::models::BatchSummary;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n答题卡扫描日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}模式", config.scan_mode);
    info!("🌐 识别服务: {}", config.server_base_url);
    info!("📋 答题卡模板: {}", config.template);
    if config.scan_mode.is_continuous() {
        info!(
            "⏱️ 轮询间隔: {}ms, 冷却时间: {}ms",
            config.poll_interval_ms, config.cooldown_ms
        );
    }
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `total`: 待提交的答题卡数量
pub fn log_batch_start(total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始逐张提交，共 {} 张答题卡", total);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 批次统计
/// - `result_file`: 评分结果记录文件
pub fn print_final_stats(summary: &BatchSummary, result_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.accepted, summary.total);
    info!("❌ 失败: {}", summary.failed);
    info!("{}", "=".repeat(60));
    info!("\n评分结果已保存至: {}", result_file);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("答题卡识别失败原因很长", 4), "答题卡识...");
    }
}
