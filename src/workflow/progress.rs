use crate::workflow::stage::ProcessingStage;

/// 进度事件
///
/// 每次阶段转换和批次开始/结束时同步调用回调；
/// 回调方不应从回调中 panic，核心不会捕获
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// 条目索引（从 0 开始）
    pub item_index: usize,
    pub total_items: usize,
    pub title: String,
    pub stage: ProcessingStage,
    /// 条目内进度（0-100 固定检查点）
    pub item_progress: u8,
    /// 整体进度（0-100）
    pub overall_progress: f64,
    pub success_count: usize,
    pub failure_count: usize,
}

/// 进度回调类型
pub type ProgressCallback = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

impl ProgressEvent {
    pub fn stage_transition(
        item_index: usize,
        total_items: usize,
        title: &str,
        stage: ProcessingStage,
        success_count: usize,
        failure_count: usize,
    ) -> Self {
        let item_progress = stage.checkpoint();
        Self {
            item_index,
            total_items,
            title: title.to_string(),
            stage,
            item_progress,
            overall_progress: overall_progress(item_index, item_progress, total_items),
            success_count,
            failure_count,
        }
    }

    /// 批次开始事件
    pub fn batch_started(total_items: usize) -> Self {
        Self {
            item_index: 0,
            total_items,
            title: String::new(),
            stage: ProcessingStage::FindingUrl,
            item_progress: 0,
            overall_progress: 0.0,
            success_count: 0,
            failure_count: 0,
        }
    }

    /// 批次结束事件
    pub fn batch_finished(total_items: usize, success_count: usize, failure_count: usize) -> Self {
        let completed = success_count + failure_count;
        Self {
            item_index: completed.saturating_sub(1),
            total_items,
            title: String::new(),
            stage: ProcessingStage::Completed,
            item_progress: 100,
            overall_progress: if total_items == 0 {
                0.0
            } else {
                (completed as f64 / total_items as f64).clamp(0.0, 1.0) * 100.0
            },
            success_count,
            failure_count,
        }
    }
}

/// 整体进度公式
///
/// `clamp01((已完成条目数 + 当前条目进度/100) / 总数) * 100`，
/// 总数为 0 时定义为 0
pub fn overall_progress(completed_items: usize, item_progress: u8, total_items: usize) -> f64 {
    if total_items == 0 {
        return 0.0;
    }
    let fraction = (completed_items as f64 + item_progress as f64 / 100.0) / total_items as f64;
    fraction.clamp(0.0, 1.0) * 100.0
}
