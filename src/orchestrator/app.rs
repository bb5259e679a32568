//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、初始化日志文件、打开摄像头、创建识别客户端
//! 2. **指令输入**：把标准输入和 Ctrl-C 转换为操作员指令流
//! 3. **模式分派**：按配置进入手动批量或连续自动模式
//! 4. **最终统计**：批次结束后输出统计信息

use crate::clients::RecognitionClient;
use crate::config::Config;
use crate::infrastructure::DirectoryCamera;
use crate::orchestrator::session::{OperatorCommand, Session, SessionEnd, SessionSettings};
use crate::services::ConsoleReporter;
use crate::utils::logging::{init_log_file, log_startup, print_final_stats};
use crate::workflow::ScanMode;
use anyhow::Result;
use futures::channel::mpsc::{self, UnboundedReceiver};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    session: Session,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        init_log_file(&config.output_log_file)?;
        log_startup(&config);

        if config.known_template().is_none() {
            warn!(
                "⚠️ 未知的答题卡模板 '{}'，将原样提交给识别服务",
                config.template
            );
        }

        let device = Arc::new(DirectoryCamera::new(&config.camera_dir));
        let client = Arc::new(RecognitionClient::new(&config)?);
        let observer = Arc::new(ConsoleReporter::with_path(&config.result_file));

        info!("📷 正在打开摄像头: {}", config.camera_dir);
        let session =
            Session::open(device, client, observer, SessionSettings::from_config(&config)).await?;

        Ok(Self { config, session })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        let commands = operator_commands();

        let end = match self.config.scan_mode {
            ScanMode::Manual => {
                info!("✋ 回车拍摄一张，输入 f 结束批次并提交，输入 q 退出");
                self.session.run_manual(commands).await?
            }
            ScanMode::Continuous => {
                info!("🔁 将答题卡放到镜头前即可自动识别，输入 f 结束，输入 q 退出");
                self.session.run_continuous(commands).await?
            }
        };

        match end {
            SessionEnd::Finished(summary) => {
                print_final_stats(&summary, &self.config.result_file);
            }
            SessionEnd::Quit => {
                warn!(
                    "⚠️ 未结束批次即退出，已采集 {} 张答题卡",
                    self.session.store().count()
                );
            }
        }

        Ok(())
    }
}

/// 操作员指令流：标准输入逐行解析，Ctrl-C 视为退出
fn operator_commands() -> UnboundedReceiver<OperatorCommand> {
    let (tx, rx) = mpsc::unbounded();

    let stdin_tx = tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match OperatorCommand::parse(&line) {
                    Some(command) => {
                        if stdin_tx.unbounded_send(command).is_err() {
                            break;
                        }
                    }
                    None => warn!("无法识别的指令: {}", line.trim()),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("读取标准输入失败: {}", e);
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.unbounded_send(OperatorCommand::Quit);
        }
    });

    rx
}
