//! 批量提交器 - 编排层
//!
//! ## 职责
//!
//! 手动批量模式结束时，把采集记录中的答题卡逐张提交给识别服务。
//!
//! ## 顺序保证
//!
//! 第 `i+1` 张只有在第 `i` 张的结果返回之后才会发出，展示的结果和扫描编号
//! 因此与采集顺序一致。单张失败不会中断后续提交。

use crate::clients::SubmissionClient;
use crate::models::{BatchSummary, SheetCtx, SubmissionOutcome};
use crate::services::{CaptureStore, ScanObserver};
use crate::utils::logging::log_batch_start;
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// 单张答题卡的提交结果
#[derive(Debug, Clone, PartialEq)]
pub struct SheetOutcome {
    pub sheet: SheetCtx,
    pub outcome: SubmissionOutcome,
}

/// 按位置逐张提交采集记录
///
/// 返回惰性、有限的结果流：只有在拉取下一项时才会发出下一次提交。
pub fn drain<'a>(
    store: &'a CaptureStore,
    client: &'a dyn SubmissionClient,
) -> impl Stream<Item = SheetOutcome> + 'a {
    stream::unfold(0usize, move |position| async move {
        let Ok(capture) = store.at(position) else {
            return None;
        };
        let sheet = SheetCtx::new(position, capture.template_id());

        debug!("{} 📤 正在提交 ({}/{})", sheet, sheet.number(), store.count());
        let outcome = client.submit(capture).await;

        Some((SheetOutcome { sheet, outcome }, position + 1))
    })
}

/// 批量提交器
pub struct SequentialSubmitter {
    client: Arc<dyn SubmissionClient>,
    observer: Arc<dyn ScanObserver>,
}

impl SequentialSubmitter {
    pub fn new(client: Arc<dyn SubmissionClient>, observer: Arc<dyn ScanObserver>) -> Self {
        Self { client, observer }
    }

    /// 提交全部答题卡，逐张上报结果
    pub async fn run(&self, store: &CaptureStore) -> BatchSummary {
        log_batch_start(store.count());

        let mut summary = BatchSummary::default();
        let mut outcomes = Box::pin(drain(store, self.client.as_ref()));

        while let Some(SheetOutcome { sheet, outcome }) = outcomes.next().await {
            summary.record(&outcome);

            match &outcome {
                SubmissionOutcome::Accepted(result) => {
                    info!("{} ✓ 提交成功", sheet);
                    self.observer.on_scan_accepted(&sheet, result);
                }
                _ => {
                    if let Some(error) = outcome.failure() {
                        self.observer.on_sheet_failed(&sheet, &error);
                    }
                }
            }
        }

        summary
    }
}
