//! 扫描调度器 - 流程层
//!
//! 核心职责：决定何时截图、何时提交，保证同一时刻最多只有一个提交在途
//!
//! 状态流转：
//! 1. `Idle` → `Capturing`（手动触发，或连续模式的轮询通过双重检查）
//! 2. `Capturing` → `AwaitingResult`（连续模式：截图后立即提交）
//! 3. `AwaitingResult` → `Cooldown`（识别成功）或 `Idle`（未识别/请求失败）
//!
//! 手动模式截图后直接入库并回到 `Idle`，提交留给批量提交器。

use crate::clients::SubmissionClient;
use crate::error::{AppResult, BatchError, SubmitError};
use crate::infrastructure::DeviceLease;
use crate::models::{Capture, ScanResult, SheetCtx, SubmissionOutcome};
use crate::services::{CaptureStore, ScanObserver};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// 扫描模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// 手动批量：操作员逐张拍摄，结束时统一提交
    Manual,
    /// 连续自动：定时截图，识别成功的答题卡立即计入
    Continuous,
}

impl ScanMode {
    pub fn is_continuous(self) -> bool {
        self == ScanMode::Continuous
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" | "batch" => Ok(ScanMode::Manual),
            "continuous" | "auto" => Ok(ScanMode::Continuous),
            other => Err(format!("未知扫描模式: {}", other)),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Manual => write!(f, "手动批量"),
            ScanMode::Continuous => write!(f, "连续自动"),
        }
    }
}

/// 对外可见的调度状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Capturing,
    AwaitingResult,
    Cooldown,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Idle => "空闲",
            SchedulerState::Capturing => "截图中",
            SchedulerState::AwaitingResult => "等待识别结果",
            SchedulerState::Cooldown => "冷却中",
        };
        f.write_str(name)
    }
}

/// 内部状态：在途提交只存在于 `AwaitingResult` 中
enum Slot {
    Idle,
    Capturing,
    AwaitingResult {
        attempt: u64,
        task: JoinHandle<(Capture, SubmissionOutcome)>,
    },
    Cooldown {
        accepted_at: Instant,
    },
}

/// 截图期间把状态置为 `Capturing`，离开作用域（包括被取消）时回到 `Idle`
struct CapturingGuard<'a> {
    slot: &'a mut Slot,
}

impl<'a> CapturingGuard<'a> {
    fn enter(slot: &'a mut Slot) -> Self {
        *slot = Slot::Capturing;
        Self { slot }
    }
}

impl Drop for CapturingGuard<'_> {
    fn drop(&mut self) {
        *self.slot = Slot::Idle;
    }
}

/// 一次轮询的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickDecision {
    /// 已截图并发出提交
    Submitted { attempt: u64 },
    /// 上一轮尚未结束，本次轮询被忽略
    Busy(SchedulerState),
    /// 距离上次识别成功还在冷却窗口内
    CoolingDown { remaining: Duration },
    /// 当前没有可用画面，本次跳过
    FrameUnavailable,
    /// 手动模式不响应轮询
    NotContinuous,
    /// 会话已结束
    SessionClosed,
}

/// 在途提交完成后的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    /// 已入库
    Accepted {
        attempt: u64,
        position: usize,
        result: ScanResult,
    },
    /// 已丢弃
    Discarded { attempt: u64, error: SubmitError },
}

/// 扫描调度器
///
/// - 持有会话内唯一的调度状态和采集记录
/// - 持有摄像头租约，会话结束后不会再截图
/// - 不关心批量提交（交给 SequentialSubmitter）
pub struct ScanScheduler {
    mode: ScanMode,
    template_id: String,
    cooldown: Duration,
    lease: DeviceLease,
    client: Arc<dyn SubmissionClient>,
    observer: Arc<dyn ScanObserver>,
    store: CaptureStore,
    slot: Slot,
    attempts: u64,
    last_accepted: Option<Instant>,
}

impl ScanScheduler {
    pub fn new(
        mode: ScanMode,
        template_id: impl Into<String>,
        cooldown: Duration,
        lease: DeviceLease,
        client: Arc<dyn SubmissionClient>,
        observer: Arc<dyn ScanObserver>,
    ) -> Self {
        Self {
            mode,
            template_id: template_id.into(),
            cooldown,
            lease,
            client,
            observer,
            store: CaptureStore::new(),
            slot: Slot::Idle,
            attempts: 0,
            last_accepted: None,
        }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn state(&self) -> SchedulerState {
        match self.slot {
            Slot::Idle => SchedulerState::Idle,
            Slot::Capturing => SchedulerState::Capturing,
            Slot::AwaitingResult { .. } => SchedulerState::AwaitingResult,
            Slot::Cooldown { .. } => SchedulerState::Cooldown,
        }
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }

    pub fn client(&self) -> Arc<dyn SubmissionClient> {
        Arc::clone(&self.client)
    }

    pub fn observer(&self) -> Arc<dyn ScanObserver> {
        Arc::clone(&self.observer)
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    /// 切换后续采集使用的模板（已采集的答题卡不受影响）
    pub fn set_template(&mut self, template_id: impl Into<String>) {
        self.template_id = template_id.into();
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }

    pub fn is_closed(&self) -> bool {
        self.lease.is_released()
    }

    /// 手动模式：拍摄一张并入库，返回其位置
    pub async fn trigger(&mut self) -> AppResult<usize> {
        if self.mode != ScanMode::Manual {
            return Err(BatchError::WrongMode {
                actual: self.mode.to_string(),
            }
            .into());
        }
        let snapshot = {
            let _capturing = CapturingGuard::enter(&mut self.slot);
            self.lease.snapshot().await
        };

        let capture = Capture::new(snapshot?, self.template_id.clone());
        let position = self.store.append(capture.clone());
        let sheet = SheetCtx::new(position, capture.template_id());

        self.observer
            .on_sheet_captured(&sheet, &capture, self.store.count());

        Ok(position)
    }

    /// 连续模式：处理一次轮询
    ///
    /// 只有在 `Idle` 且距离上次识别成功超过冷却时间时才会截图提交。
    /// 只有设备级致命错误会返回 `Err`。
    pub async fn on_tick(&mut self, now: Instant) -> AppResult<TickDecision> {
        if self.mode != ScanMode::Continuous {
            return Ok(TickDecision::NotContinuous);
        }
        if self.lease.is_released() {
            return Ok(TickDecision::SessionClosed);
        }

        match self.slot {
            Slot::Capturing | Slot::AwaitingResult { .. } => {
                return Ok(TickDecision::Busy(self.state()));
            }
            Slot::Cooldown { accepted_at } => {
                let elapsed = now.saturating_duration_since(accepted_at);
                if elapsed <= self.cooldown {
                    return Ok(TickDecision::CoolingDown {
                        remaining: self.cooldown - elapsed,
                    });
                }
                self.slot = Slot::Idle;
            }
            Slot::Idle => {}
        }

        let snapshot = {
            let _capturing = CapturingGuard::enter(&mut self.slot);
            self.lease.snapshot().await
        };
        let image = match snapshot {
            Ok(image) => image,
            Err(e) => {
                if e.is_fatal() {
                    return Err(e);
                }
                debug!("本次轮询跳过: {}", e);
                return Ok(TickDecision::FrameUnavailable);
            }
        };

        self.attempts += 1;
        let attempt = self.attempts;
        let capture = Capture::new(image, self.template_id.clone());
        let client = Arc::clone(&self.client);

        debug!("第 {} 次采集，提交识别中...", attempt);

        let task = tokio::spawn(async move {
            let outcome = client.submit(&capture).await;
            (capture, outcome)
        });
        self.slot = Slot::AwaitingResult { attempt, task };

        Ok(TickDecision::Submitted { attempt })
    }

    /// 等待在途提交完成并应用结果
    ///
    /// 没有在途提交时永远挂起，可以直接放进 `select!`。
    /// 取消安全：被取消时在途提交保持不变。
    pub async fn settle(&mut self) -> Settled {
        let Slot::AwaitingResult { attempt, task } = &mut self.slot else {
            return std::future::pending().await;
        };
        let attempt = *attempt;

        match task.await {
            Ok((capture, outcome)) => self.apply_outcome(attempt, capture, outcome, Instant::now()),
            Err(e) => {
                self.slot = Slot::Idle;
                let error = SubmitError::Transport {
                    cause: format!("提交任务异常终止: {}", e),
                };
                self.observer.on_frame_rejected(&error);
                Settled::Discarded { attempt, error }
            }
        }
    }

    fn apply_outcome(
        &mut self,
        attempt: u64,
        capture: Capture,
        outcome: SubmissionOutcome,
        now: Instant,
    ) -> Settled {
        let error = match outcome {
            SubmissionOutcome::Accepted(result) => {
                let position = self.store.append(capture.clone());
                let sheet = SheetCtx::new(position, capture.template_id());
                self.last_accepted = Some(now);
                self.slot = Slot::Cooldown { accepted_at: now };

                info!("{} ✓ 识别成功 (第 {} 次采集)", sheet, attempt);
                self.observer
                    .on_sheet_captured(&sheet, &capture, self.store.count());
                self.observer.on_scan_accepted(&sheet, &result);

                return Settled::Accepted {
                    attempt,
                    position,
                    result,
                };
            }
            SubmissionOutcome::Rejected { reason } => SubmitError::NoSheetDetected { reason },
            SubmissionOutcome::TransportError { cause } => SubmitError::Transport { cause },
        };

        self.slot = Slot::Idle;
        self.observer.on_frame_rejected(&error);
        Settled::Discarded { attempt, error }
    }

    /// 结束调度：丢弃在途提交并释放摄像头
    ///
    /// 在途请求会在后台完成，但结果不会再被应用或展示。
    pub fn shutdown(&mut self) {
        if let Slot::AwaitingResult { attempt, .. } = &self.slot {
            warn!("会话结束，第 {} 次采集的识别结果将被丢弃", attempt);
        }
        self.slot = Slot::Idle;
        self.lease.release();
    }
}

impl fmt::Debug for ScanScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanScheduler")
            .field("mode", &self.mode)
            .field("state", &self.state())
            .field("template_id", &self.template_id)
            .field("captures", &self.store.count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
