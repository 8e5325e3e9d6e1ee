//! 单个条目处理器 - 编排层
//!
//! ## 职责
//!
//! 驱动一个条目走完固定的阶段序列，是条目级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **阶段推进**：查找链接 → 验证 → 提取ID → 两次获取 → 处理 → 保存
//! 2. **进度汇报**：每个阶段转换触发一次进度事件
//! 3. **取消检查**：每个要发起 I/O 的阶段之前轮询取消标志
//! 4. **错误收口**：任何阶段的失败只捕获一次，转成该条目的
//!    失败结果和 Failed 进度事件（失败计数在事件中立即加一）
//!
//! 每个阶段函数返回 Result，编排器对其模式匹配，
//! 不依赖展开式的异常传播。

use tracing::{error, info, warn};

use crate::api::{bucket_notes, extract_forum_id, NoteFetcher};
use crate::error::{ImportError, ImportResult};
use crate::logger::truncate_text;
use crate::models::{
    PaperWithReviews, ProcessedPaper, SaveMode, SingleItemResult, SourceItem,
};
use crate::orchestrator::batch_processor::BatchProcessor;
use crate::services::locator::SourceLocator;
use crate::services::processing::{process_paper, ProcessOptions};
use crate::services::report::{generate_plain_report, generate_rich_report};
use crate::services::retry::{execute_with_retry, forum_url_rules, validate_input};
use crate::services::storage::ContentStore;
use crate::workflow::{ProcessingStage, ProgressEvent};

/// 阶段序列成功走完的产出
struct ItemOutcome {
    paper: ProcessedPaper,
    saved_as: SaveMode,
}

impl<F, S, L> BatchProcessor<F, S, L>
where
    F: NoteFetcher,
    S: ContentStore,
    L: SourceLocator,
{
    /// 处理单个条目
    ///
    /// # 参数
    /// - `item`: 待处理条目
    /// - `index`: 条目索引（从 0 开始）
    /// - `total`: 条目总数
    /// - `success_so_far` / `failure_so_far`: 进入本条目前的累计计数
    ///
    /// # 返回
    /// 总是返回结果值；条目级错误被收进结果，从不向上传播
    pub async fn process_single_item(
        &self,
        item: &SourceItem,
        index: usize,
        total: usize,
        success_so_far: usize,
        failure_so_far: usize,
    ) -> SingleItemResult {
        info!(
            "[条目 {}/{}] 开始处理: {}",
            index + 1,
            total,
            truncate_text(&item.title, 60)
        );

        match self
            .run_item_stages(item, index, total, success_so_far, failure_so_far)
            .await
        {
            Ok(outcome) => {
                self.emit_stage(
                    ProcessingStage::Completed,
                    index,
                    total,
                    &item.title,
                    success_so_far + 1,
                    failure_so_far,
                );
                info!(
                    "[条目 {}/{}] ✅ 处理完成 (评审 {} 条, 评论 {} 条, 保存为 {})",
                    index + 1,
                    total,
                    outcome.paper.statistics.review_count,
                    outcome.paper.statistics.comment_count,
                    outcome.saved_as.label()
                );
                SingleItemResult {
                    item_key: item.key.clone(),
                    title: item.title.clone(),
                    success: true,
                    error: None,
                    review_count: Some(outcome.paper.statistics.review_count),
                    comment_count: Some(outcome.paper.statistics.comment_count),
                    saved_as: Some(outcome.saved_as),
                    tree_statistics: outcome.paper.tree.as_ref().map(|t| t.statistics),
                }
            }
            Err(err) => {
                self.emit_stage(
                    ProcessingStage::Failed,
                    index,
                    total,
                    &item.title,
                    success_so_far,
                    failure_so_far + 1,
                );
                error!("[条目 {}/{}] ❌ 处理失败: {}", index + 1, total, err);
                SingleItemResult::failed(item, err.to_string())
            }
        }
    }

    /// 按固定顺序执行各阶段
    async fn run_item_stages(
        &self,
        item: &SourceItem,
        index: usize,
        total: usize,
        success_so_far: usize,
        failure_so_far: usize,
    ) -> ImportResult<ItemOutcome> {
        let emit = |stage: ProcessingStage| {
            self.emit_stage(stage, index, total, &item.title, success_so_far, failure_so_far)
        };

        // 阶段 1: 查找链接
        emit(ProcessingStage::FindingUrl);
        let url = self
            .locator
            .find_thread_url(item)
            .ok_or_else(|| ImportError::validation("forum-url", "条目中未找到 OpenReview 链接"))?;
        if self.config.verbose_logging {
            info!("[条目 {}/{}] 链接: {}", index + 1, total, url);
        }

        // 阶段 2: 验证链接
        emit(ProcessingStage::ValidatingUrl);
        validate_input(&url, &forum_url_rules())?;

        // 阶段 3: 提取论坛ID
        emit(ProcessingStage::ExtractingForumId);
        let forum_id = extract_forum_id(&url)
            .ok_or_else(|| ImportError::parsing(format!("无法从链接中提取论坛ID: {}", url)))?;

        // 阶段 4: 获取主论文（带重试）
        self.check_cancelled()?;
        emit(ProcessingStage::FetchingPaper);
        let root = execute_with_retry(
            || self.client.fetch_root_note(&forum_id),
            self.config.max_retries,
            |attempt, err| {
                warn!(
                    "[条目 {}/{}] ⚠️ 获取论文失败，第 {} 次重试 (原因: {})",
                    index + 1,
                    total,
                    attempt,
                    err
                );
            },
        )
        .await?;

        // 阶段 5: 获取全部讨论记录（带重试）
        self.check_cancelled()?;
        emit(ProcessingStage::FetchingNotes);
        let all_notes = execute_with_retry(
            || self.client.fetch_all_notes(&forum_id),
            self.config.max_retries,
            |attempt, err| {
                warn!(
                    "[条目 {}/{}] ⚠️ 获取讨论记录失败，第 {} 次重试 (原因: {})",
                    index + 1,
                    total,
                    attempt,
                    err
                );
            },
        )
        .await?;
        info!(
            "[条目 {}/{}] ✓ 共获取 {} 条记录",
            index + 1,
            total,
            all_notes.len()
        );

        // 阶段 6: 处理数据
        emit(ProcessingStage::ProcessingData);
        let (reviews, comments) = bucket_notes(&root, &all_notes);
        let fetched = PaperWithReviews {
            root,
            reviews,
            comments,
        };
        let paper = process_paper(
            &fetched,
            Some(&all_notes),
            &ProcessOptions {
                anonymize: self.config.anonymize_reviewers,
            },
        );

        // 阶段 7: 保存内容（只有处理完全成功后才会执行）
        self.check_cancelled()?;
        emit(ProcessingStage::SavingContent);
        let saved_as = match self.config.save_mode {
            SaveMode::Note => {
                let html = generate_rich_report(&paper);
                self.store
                    .save_as_note(item, &html, &paper, true)
                    .await
                    .map_err(ImportError::classify_host)?;
                SaveMode::Note
            }
            SaveMode::Attachment => {
                let text = generate_plain_report(&paper);
                self.store
                    .save_as_attachment(item, &text, &paper)
                    .await
                    .map_err(ImportError::classify_host)?;
                SaveMode::Attachment
            }
        };

        Ok(ItemOutcome { paper, saved_as })
    }

    fn check_cancelled(&self) -> ImportResult<()> {
        if self.is_cancelled() {
            Err(ImportError::UserCancelled)
        } else {
            Ok(())
        }
    }

    fn emit_stage(
        &self,
        stage: ProcessingStage,
        index: usize,
        total: usize,
        title: &str,
        success_count: usize,
        failure_count: usize,
    ) {
        let event =
            ProgressEvent::stage_transition(index, total, title, stage, success_count, failure_count);
        if self.config.verbose_logging {
            info!(
                "[条目 {}/{}] {} ({}%)",
                index + 1,
                total,
                stage.label(),
                event.item_progress
            );
        }
        self.emit(&event);
    }
}
