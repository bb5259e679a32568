//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责会话生命周期和批次调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、统计）
//! - 把标准输入和 Ctrl-C 转换为操作员指令
//!
//! ### `session` - 扫描会话
//! - 持有摄像头租约和调度器
//! - 手动批量：拍摄、结束批次
//! - 连续自动：轮询、等待在途结果、结束扫描
//!
//! ### `sequential_submitter` - 批量提交器
//! - 按采集顺序逐张提交
//! - 单张失败不中断后续提交
//!
//! ## 层次关系
//!
//! ```text
//! app (指令输入 + 统计)
//!     ↓
//! session (处理一个扫描会话)
//!     ↓                    ↘
//! workflow::ScanScheduler   sequential_submitter (结束手动批次)
//!     ↓
//! services (能力层：采集记录 / 结果展示)
//!     ↓
//! infrastructure (基础设施：摄像头租约) + clients (识别服务)
//! ```

pub mod app;
pub mod sequential_submitter;
pub mod session;

pub use app::App;
pub use sequential_submitter::{drain, SequentialSubmitter, SheetOutcome};
pub use session::{OperatorCommand, Session, SessionEnd, SessionSettings};
