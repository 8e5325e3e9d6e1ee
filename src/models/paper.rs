use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use crate::models::note::RawNote;
use crate::models::tree::ConversationTree;

/// 一次获取的结果：主论文 + 按内容形状粗分的评审与评论
#[derive(Debug, Clone)]
pub struct PaperWithReviews {
    pub root: RawNote,
    pub reviews: Vec<RawNote>,
    pub comments: Vec<RawNote>,
}

/// 处理后的评审
///
/// 保留原始 RawNote 以便追溯；rating/confidence 同时保留
/// 原始字符串和解析出的前导整数
#[derive(Debug, Clone)]
pub struct ProcessedReview {
    pub reviewer: String,
    pub rating: Option<u32>,
    pub confidence: Option<u32>,
    pub rating_text: Option<String>,
    pub confidence_text: Option<String>,
    pub summary: Option<String>,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub questions: Option<String>,
    pub soundness: Option<String>,
    pub presentation: Option<String>,
    pub contribution: Option<String>,
    pub raw: RawNote,
}

/// 处理后的评论
#[derive(Debug, Clone)]
pub struct ProcessedComment {
    pub author: String,
    pub title: Option<String>,
    pub content: String,
    pub reply_to: Option<String>,
    pub raw: RawNote,
}

/// 论文汇总统计
///
/// 平均值只统计解析成功的数值，空集合为 None 而不是 0；
/// 评分分布以解析出的整数为键，不使用原始字符串
#[derive(Debug, Clone)]
pub struct PaperStatistics {
    pub review_count: usize,
    pub comment_count: usize,
    pub average_rating: Option<f64>,
    pub average_confidence: Option<f64>,
    pub rating_distribution: BTreeMap<u32, usize>,
    pub extracted_at: DateTime<Local>,
}

/// 处理后的论文聚合结果
///
/// 每次成功获取创建一次，之后不可变，供渲染器和存储协作方消费
#[derive(Debug, Clone)]
pub struct ProcessedPaper {
    pub id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub authors: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub venue: Option<String>,
    pub reviews: Vec<ProcessedReview>,
    pub comments: Vec<ProcessedComment>,
    pub tree: Option<ConversationTree>,
    pub statistics: PaperStatistics,
}
