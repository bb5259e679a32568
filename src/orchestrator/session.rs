//! 扫描会话 - 编排层
//!
//! ## 职责
//!
//! 会话的生命周期以"打开摄像头"开始、以"释放摄像头"结束。
//!
//! 1. **打开设备**：失败即为致命错误，会话不会进入任何采集状态
//! 2. **手动批量**：响应操作员指令逐张拍摄，结束时交给 `SequentialSubmitter`
//! 3. **连续自动**：固定间隔轮询调度器，同时等待在途提交的结果
//! 4. **结束清理**：停止轮询、丢弃在途结果、释放设备（所有退出路径都会执行）

use crate::clients::SubmissionClient;
use crate::config::Config;
use crate::error::{AppError, AppResult, BatchError};
use crate::infrastructure::{CaptureConstraints, CaptureDevice, DeviceLease, Resolution};
use crate::models::BatchSummary;
use crate::orchestrator::sequential_submitter::SequentialSubmitter;
use crate::services::{CaptureStore, ScanObserver};
use crate::workflow::{ScanMode, ScanScheduler, SchedulerState};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 操作员指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// 拍摄一张（手动模式）
    Capture,
    /// 结束批次
    Finish,
    /// 直接退出
    Quit,
}

impl OperatorCommand {
    /// 解析一行输入，空行视为拍摄
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "c" | "capture" => Some(OperatorCommand::Capture),
            "f" | "finish" => Some(OperatorCommand::Finish),
            "q" | "quit" | "exit" => Some(OperatorCommand::Quit),
            _ => None,
        }
    }
}

/// 会话如何结束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// 批次完成并已跳转首页
    Finished(BatchSummary),
    /// 操作员退出，未结束批次
    Quit,
}

/// 会话参数
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub mode: ScanMode,
    pub template_id: String,
    pub poll_interval: Duration,
    pub cooldown: Duration,
    pub constraints: CaptureConstraints,
    pub home_route: String,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.scan_mode,
            template_id: config.template.clone(),
            poll_interval: config.poll_interval(),
            cooldown: config.cooldown(),
            constraints: CaptureConstraints::rear(Resolution::new(
                config.preferred_width,
                config.preferred_height,
            )),
            home_route: config.home_route.clone(),
        }
    }
}

/// 扫描会话
#[derive(Debug)]
pub struct Session {
    scheduler: ScanScheduler,
    poll_interval: Duration,
    home_route: String,
}

impl Session {
    /// 打开摄像头并创建会话
    pub async fn open(
        device: Arc<dyn CaptureDevice>,
        client: Arc<dyn SubmissionClient>,
        observer: Arc<dyn ScanObserver>,
        settings: SessionSettings,
    ) -> AppResult<Self> {
        let lease = match DeviceLease::acquire(device, &settings.constraints).await {
            Ok(lease) => lease,
            Err(e) => {
                observer.on_session_error(&e);
                return Err(e);
            }
        };

        let scheduler = ScanScheduler::new(
            settings.mode,
            settings.template_id,
            settings.cooldown,
            lease,
            client,
            observer,
        );

        Ok(Self {
            scheduler,
            poll_interval: settings.poll_interval,
            home_route: settings.home_route,
        })
    }

    pub fn scheduler(&self) -> &ScanScheduler {
        &self.scheduler
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn store(&self) -> &CaptureStore {
        self.scheduler.store()
    }

    /// 是否可以结束批次（至少有一张答题卡）
    pub fn can_finish(&self) -> bool {
        !self.scheduler.store().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.scheduler.is_closed()
    }

    /// 手动拍摄一张
    pub async fn trigger_capture(&mut self) -> AppResult<usize> {
        self.scheduler.trigger().await
    }

    /// 手动批量模式主循环
    pub async fn run_manual<S>(&mut self, mut commands: S) -> AppResult<SessionEnd>
    where
        S: Stream<Item = OperatorCommand> + Unpin,
    {
        while let Some(command) = commands.next().await {
            match command {
                OperatorCommand::Capture => match self.trigger_capture().await {
                    Ok(_) => {}
                    Err(e) if e.is_fatal() => return Err(self.abort(e)),
                    Err(e) => warn!("⚠️ 拍摄失败: {}", e),
                },
                OperatorCommand::Finish => match self.finish_batch().await {
                    Ok(summary) => return Ok(SessionEnd::Finished(summary)),
                    Err(AppError::Batch(BatchError::EmptyBatch)) => {}
                    Err(e) => return Err(self.abort(e)),
                },
                OperatorCommand::Quit => break,
            }
        }

        self.teardown();
        Ok(SessionEnd::Quit)
    }

    /// 结束手动批次：先停止拍摄，再逐张提交
    pub async fn finish_batch(&mut self) -> AppResult<BatchSummary> {
        if self.scheduler.mode() != ScanMode::Manual {
            return Err(BatchError::WrongMode {
                actual: self.scheduler.mode().to_string(),
            }
            .into());
        }
        if self.scheduler.is_closed() {
            return Err(BatchError::AlreadyFinished.into());
        }
        self.ensure_not_empty()?;

        self.scheduler.shutdown();

        let submitter = SequentialSubmitter::new(self.scheduler.client(), self.scheduler.observer());
        let summary = submitter.run(self.scheduler.store()).await;

        self.scheduler
            .observer()
            .on_batch_finished(&self.home_route, &summary);
        Ok(summary)
    }

    /// 连续自动模式主循环
    pub async fn run_continuous<S>(&mut self, mut commands: S) -> AppResult<SessionEnd>
    where
        S: Stream<Item = OperatorCommand> + Unpin,
    {
        if self.scheduler.mode() != ScanMode::Continuous {
            return Err(BatchError::WrongMode {
                actual: self.scheduler.mode().to_string(),
            }
            .into());
        }

        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("🔍 自动扫描已开始，每 {:?} 检查一次画面", self.poll_interval);

        let end = loop {
            tokio::select! {
                command = commands.next() => match command {
                    Some(OperatorCommand::Finish) => match self.finish_continuous() {
                        Ok(summary) => break SessionEnd::Finished(summary),
                        Err(_) => continue,
                    },
                    Some(OperatorCommand::Capture) => debug!("连续模式下忽略手动拍摄指令"),
                    Some(OperatorCommand::Quit) | None => break SessionEnd::Quit,
                },
                _ = ticker.tick() => {
                    if let Err(e) = self.scheduler.on_tick(Instant::now()).await {
                        return Err(self.abort(e));
                    }
                }
                settled = self.scheduler.settle() => {
                    debug!("提交完成: {:?}", settled);
                }
            }
        };

        self.teardown();
        Ok(end)
    }

    /// 结束连续扫描：已识别的答题卡都已提交过，只需停止并跳转
    fn finish_continuous(&mut self) -> AppResult<BatchSummary> {
        self.ensure_not_empty()?;

        self.teardown();

        let count = self.scheduler.store().count();
        let summary = BatchSummary {
            total: count,
            accepted: count,
            failed: 0,
        };
        self.scheduler
            .observer()
            .on_batch_finished(&self.home_route, &summary);
        Ok(summary)
    }

    fn ensure_not_empty(&self) -> AppResult<()> {
        if self.can_finish() {
            return Ok(());
        }
        let error = AppError::from(BatchError::EmptyBatch);
        self.scheduler.observer().on_finish_rejected(&error);
        Err(error)
    }

    /// 致命错误：上报并结束会话
    fn abort(&mut self, error: AppError) -> AppError {
        self.scheduler.observer().on_session_error(&error);
        self.teardown();
        error
    }

    /// 停止调度并释放摄像头（可重复调用）
    pub fn teardown(&mut self) {
        if !self.scheduler.is_closed() {
            info!("🛑 会话结束，已采集 {} 张答题卡", self.store().count());
        }
        self.scheduler.shutdown();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operator_commands() {
        assert_eq!(OperatorCommand::parse(""), Some(OperatorCommand::Capture));
        assert_eq!(OperatorCommand::parse(" C "), Some(OperatorCommand::Capture));
        assert_eq!(OperatorCommand::parse("finish"), Some(OperatorCommand::Finish));
        assert_eq!(OperatorCommand::parse("Q"), Some(OperatorCommand::Quit));
        assert_eq!(OperatorCommand::parse("upload"), None);
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            scan_mode: ScanMode::Manual,
            preferred_width: 1920,
            preferred_height: 1080,
            ..Config::default()
        };
        let settings = SessionSettings::from_config(&config);

        assert_eq!(settings.mode, ScanMode::Manual);
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.constraints.preferred, Resolution::new(1920, 1080));
        assert_eq!(
            settings.constraints.facing,
            crate::infrastructure::FacingMode::Environment
        );
    }
}
