use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::models::item::SourceItem;
use crate::models::tree::TreeStatistics;

/// 报告的保存方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// 富文本笔记
    Note,
    /// 纯文本附件
    Attachment,
}

impl SaveMode {
    pub fn label(&self) -> &'static str {
        match self {
            SaveMode::Note => "note",
            SaveMode::Attachment => "attachment",
        }
    }
}

impl FromStr for SaveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "note" => Ok(SaveMode::Note),
            "attachment" => Ok(SaveMode::Attachment),
            other => Err(format!("未知的保存方式: {}", other)),
        }
    }
}

/// 单个条目的处理结果
///
/// 条目处理结束时创建，追加进批次结果后不再修改
#[derive(Debug, Clone)]
pub struct SingleItemResult {
    pub item_key: String,
    pub title: String,
    pub success: bool,
    pub error: Option<String>,
    pub review_count: Option<usize>,
    pub comment_count: Option<usize>,
    pub saved_as: Option<SaveMode>,
    pub tree_statistics: Option<TreeStatistics>,
}

impl SingleItemResult {
    pub fn failed(item: &SourceItem, error: String) -> Self {
        Self {
            item_key: item.key.clone(),
            title: item.title.clone(),
            success: false,
            error: Some(error),
            review_count: None,
            comment_count: None,
            saved_as: None,
            tree_statistics: None,
        }
    }
}

/// 批次处理结果
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub total_items: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<SingleItemResult>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
}
