//! 批量条目处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个导入流程的入口，负责批量条目的处理和进度汇报。
//!
//! ## 核心功能
//!
//! 1. **顺序处理**：严格逐条处理，条目之间从不并发
//! 2. **频率控制**：条目之间固定暂停 1 秒，尊重远端 API 的隐含限制
//! 3. **进度汇报**：每次阶段转换同步触发进度回调
//! 4. **协作式取消**：取消标志只在阶段边界轮询，从不打断进行中的请求
//! 5. **全局统计**：累计成功/失败数量和耗时，批次总是返回结果值
//!
//! ## 设计特点
//!
//! - **每个批次一个实例**：取消标志由实例持有，不使用全局状态
//! - **从不抛出**：任何条目失败都记录进结果，不会中断批次；
//!   批次提前结束的唯一方式是显式取消
//! - **向下委托**：委托 item_processor 处理单个条目

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::NoteFetcher;
use crate::config::Config;
use crate::models::{BatchResult, SourceItem};
use crate::services::locator::SourceLocator;
use crate::services::storage::ContentStore;
use crate::workflow::{ProgressCallback, ProgressEvent};

/// 条目间的固定暂停（秒）
const INTER_ITEM_DELAY_SECS: u64 = 1;

/// 取消句柄
///
/// 可以克隆后交给进度回调或其他任务，在批次运行中发出取消请求
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// 批量处理器
pub struct BatchProcessor<F, S, L> {
    pub(crate) client: F,
    pub(crate) store: S,
    pub(crate) locator: L,
    pub(crate) config: Config,
    cancel: Arc<AtomicBool>,
    on_progress: Option<ProgressCallback>,
}

impl<F, S, L> BatchProcessor<F, S, L>
where
    F: NoteFetcher,
    S: ContentStore,
    L: SourceLocator,
{
    pub fn new(client: F, store: S, locator: L, config: Config) -> Self {
        Self {
            client,
            store,
            locator,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            on_progress: None,
        }
    }

    /// 设置进度回调
    ///
    /// 回调在每次阶段转换和批次开始/结束时同步调用；
    /// 回调中的 panic 不会被核心捕获
    pub fn with_progress_callback(
        mut self,
        callback: impl Fn(&ProgressEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// 请求取消
    ///
    /// 取消是建议性的：进行中的网络请求不会被中断，
    /// 但观察到标志后不再开始新的阶段或条目
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// 清除取消标志
    pub fn reset(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.cancel.clone())
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub(crate) fn emit(&self, event: &ProgressEvent) {
        if let Some(callback) = &self.on_progress {
            callback(event);
        }
    }

    /// 处理一批条目
    ///
    /// 严格按输入顺序逐条处理；结果顺序与输入一致。
    /// 本方法从不失败：条目级错误都被记录为失败结果
    pub async fn process_batch(&self, items: &[SourceItem]) -> BatchResult {
        let started_at = Local::now();
        let start = Instant::now();
        let total = items.len();

        log_batch_start(total);
        self.emit(&ProgressEvent::batch_started(total));

        let mut results = Vec::with_capacity(total);
        let mut success_count = 0;
        let mut failure_count = 0;

        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                sleep(Duration::from_secs(INTER_ITEM_DELAY_SECS)).await;
            }
            // 暂停之后再检查，暂停期间发出的取消请求也不会让新条目开始
            if self.is_cancelled() {
                warn!("🛑 检测到取消请求，停止处理剩余条目");
                break;
            }

            let result = self
                .process_single_item(item, index, total, success_count, failure_count)
                .await;
            if result.success {
                success_count += 1;
            } else {
                failure_count += 1;
            }
            results.push(result);
        }

        let batch = BatchResult {
            total_items: total,
            success_count,
            failure_count,
            results,
            started_at,
            finished_at: Local::now(),
            elapsed: start.elapsed(),
        };

        self.emit(&ProgressEvent::batch_finished(
            total,
            success_count,
            failure_count,
        ));
        log_batch_complete(&batch);
        batch
    }
}

/// 生成批次结果的文字摘要
///
/// 总计/成功/失败、整秒耗时、失败条目列表，
/// 以及成功条目的评审/评论提取总数
pub fn generate_result_summary(result: &BatchResult) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    out.push_str(&format!("{}\n批量导入结果\n{}\n", rule, rule));
    out.push_str(&format!(
        "总计: {} | 成功: {} | 失败: {}\n",
        result.total_items, result.success_count, result.failure_count
    ));
    out.push_str(&format!("用时: {} 秒\n", result.elapsed.as_secs()));

    let review_total: usize = result
        .results
        .iter()
        .filter(|r| r.success)
        .filter_map(|r| r.review_count)
        .sum();
    let comment_total: usize = result
        .results
        .iter()
        .filter(|r| r.success)
        .filter_map(|r| r.comment_count)
        .sum();
    out.push_str(&format!(
        "提取评审 {} 条, 评论 {} 条\n",
        review_total, comment_total
    ));

    let failed: Vec<_> = result.results.iter().filter(|r| !r.success).collect();
    if !failed.is_empty() {
        out.push_str("失败条目:\n");
        for item in failed {
            out.push_str(&format!(
                "  - {}: {}\n",
                item.title,
                item.error.as_deref().unwrap_or("未知原因")
            ));
        }
    }

    out.push_str(&rule);
    out.push('\n');
    out
}

// ========== 日志辅助函数 ==========

fn log_batch_start(total: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始批量导入，共 {} 个条目", total);
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(batch: &BatchResult) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次完成: 成功 {}/{}，失败 {}，用时 {} 秒",
        batch.success_count,
        batch.total_items,
        batch.failure_count,
        batch.elapsed.as_secs()
    );
    info!("{}", "─".repeat(60));
}
