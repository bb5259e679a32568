//! # Sheet Scan Submit
//!
//! 答题卡摄像头扫描程序：拍摄答题卡并提交给识别服务评分
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（摄像头），只暴露能力
//! - `DeviceLease` - 唯一的设备持有者，提供 snapshot() 能力，释放后不可再用
//! - `DirectoryCamera` - 以目录中最新图片作为画面的摄像头实现
//!
//! ### ② 客户端与业务能力层（Clients / Services）
//! - `clients/` - `RecognitionClient` 调用 `POST /process_camera_image`
//! - `services/` - `CaptureStore` 采集记录，`ConsoleReporter` 结果展示
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - `ScanScheduler` 决定"这一刻能不能拍"
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 扫描会话，管理设备生命周期
//! - `orchestrator/sequential_submitter` - 手动批次的逐张提交
//! - `orchestrator/app` - 应用入口
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CaptureDevice, DeviceLease, DirectoryCamera};
pub use models::{BatchSummary, Capture, ScanResult, SubmissionOutcome};
pub use orchestrator::{App, OperatorCommand, Session, SessionEnd, SessionSettings};
pub use workflow::{ScanMode, ScanScheduler, SchedulerState};
