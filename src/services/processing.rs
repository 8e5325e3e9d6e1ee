//! 数据处理器
//!
//! ## 职责
//!
//! 把无序的扁平 note 列表转换为规范化的报告结构：
//!
//! 1. **对话树构建**：按 replyto 字段把 notes 连成以主论文为根的树
//! 2. **字段投影**：从开放键值映射中提取评审/评论的类型化字段
//! 3. **统计计算**：评分均值、置信度均值、评分分布、各类型计数
//! 4. **匿名化**：可选地把评审人签名替换为固定标签
//!
//! ## 数值语义
//!
//! 评分字符串形如 `"6: Marginally above threshold"`，只解析前导整数；
//! 没有前导数字的值（如 `"N/A"`）产生 None 而不是错误。
//! 均值只统计解析成功的值，空集合的均值是 None，从不为 0 或 NaN。

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Local};

use crate::models::note::NoteKind;
use crate::models::tree::{ConversationTree, TreeNode, TreeStatistics};
use crate::models::{
    PaperStatistics, PaperWithReviews, ProcessedComment, ProcessedPaper, ProcessedReview, RawNote,
};

/// 匿名化使用的固定标签（有损的单向替换，无法还原）
pub const ANONYMOUS_LABEL: &str = "Anonymous Reviewer";

/// 处理选项
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    pub anonymize: bool,
}

/// 解析字符串的前导整数
///
/// `"6: Marginally above threshold"` → 6；`"10"` → 10；`"N/A"` → None
pub fn parse_leading_int(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// 把评审 note 投影为类型化结构
pub fn process_review(raw: &RawNote) -> ProcessedReview {
    let rating_text = raw.content_text("rating");
    let confidence_text = raw.content_text("confidence");

    ProcessedReview {
        reviewer: raw.signature().to_string(),
        rating: rating_text.as_deref().and_then(parse_leading_int),
        confidence: confidence_text.as_deref().and_then(parse_leading_int),
        rating_text,
        confidence_text,
        summary: raw.content_text("summary"),
        strengths: raw.content_text("strengths"),
        weaknesses: raw.content_text("weaknesses"),
        questions: raw.content_text("questions"),
        soundness: raw.content_text("soundness"),
        presentation: raw.content_text("presentation"),
        contribution: raw.content_text("contribution"),
        raw: raw.clone(),
    }
}

/// 把评论 note 投影为类型化结构
pub fn process_comment(raw: &RawNote) -> ProcessedComment {
    ProcessedComment {
        author: raw.signature().to_string(),
        title: raw.content_text("title"),
        content: raw.content_text("comment").unwrap_or_default(),
        reply_to: raw.replyto.clone(),
        raw: raw.clone(),
    }
}

/// 构建对话树
///
/// 按ID索引全部 notes，把每个非根 note 挂到它声明的父节点下；
/// 父节点不在集合中的孤儿节点直接挂到根下（宽容策略，保留而不报错）。
/// 各类型计数在连接完成后对全部 notes 一次遍历算出并缓存。
pub fn build_conversation_tree(root: &RawNote, all_notes: &[RawNote]) -> ConversationTree {
    let mut known: HashSet<&str> = all_notes.iter().map(|n| n.id.as_str()).collect();
    known.insert(root.id.as_str());

    let mut children: HashMap<String, Vec<RawNote>> = HashMap::new();
    for note in all_notes {
        if note.id == root.id {
            continue;
        }
        let parent = match &note.replyto {
            Some(p) if known.contains(p.as_str()) => p.clone(),
            // 孤儿节点：声明的父节点不存在，挂到根下
            _ => root.id.clone(),
        };
        children.entry(parent).or_default().push(note.clone());
    }

    let root_node = assemble_node(root.clone(), &mut children, 0);
    let statistics = compute_tree_statistics(root, all_notes);

    ConversationTree {
        root: root_node,
        statistics,
    }
}

/// 递归组装子树
///
/// 排序策略沿用原始输出格式：根的直接子节点里决议/元评审排最前，
/// 其余按时间从新到旧；更深层按时间从旧到新（自然对话顺序）
fn assemble_node(
    note: RawNote,
    children: &mut HashMap<String, Vec<RawNote>>,
    level: usize,
) -> TreeNode {
    let mut kids = children.remove(&note.id).unwrap_or_default();
    if level == 0 {
        kids.sort_by_key(|n| Reverse(n.cdate.unwrap_or(0)));
        let (mut ordered, rest): (Vec<_>, Vec<_>) = kids
            .into_iter()
            .partition(|n| matches!(n.kind(), NoteKind::Decision | NoteKind::MetaReview));
        ordered.extend(rest);
        kids = ordered;
    } else {
        kids.sort_by_key(|n| n.cdate.unwrap_or(0));
    }

    let child_nodes = kids
        .into_iter()
        .map(|kid| assemble_node(kid, children, level + 1))
        .collect();

    TreeNode {
        note,
        children: child_nodes,
    }
}

fn compute_tree_statistics(root: &RawNote, all_notes: &[RawNote]) -> TreeStatistics {
    let mut stats = TreeStatistics {
        total_notes: all_notes.len(),
        ..Default::default()
    };

    for note in all_notes {
        match note.kind() {
            NoteKind::OfficialReview => stats.reviews += 1,
            NoteKind::AuthorResponse => stats.author_responses += 1,
            NoteKind::Decision => stats.decisions += 1,
            NoteKind::MetaReview => stats.meta_reviews += 1,
            NoteKind::Comment => {
                if note.id != root.id {
                    stats.comments += 1;
                }
            }
            // 无法识别的记录只计入总数，与评审/评论的分桶口径保持一致
            NoteKind::Paper | NoteKind::Other => {}
        }
    }

    stats
}

/// 处理论文聚合结果
///
/// 映射全部评审和评论，计算汇总统计；提供 `all_notes` 时
/// 额外构建对话树并附加
pub fn process_paper(
    fetched: &PaperWithReviews,
    all_notes: Option<&[RawNote]>,
    options: &ProcessOptions,
) -> ProcessedPaper {
    process_paper_at(fetched, all_notes, options, Local::now())
}

/// 同 process_paper，但注入提取时间（测试确定性用）
pub fn process_paper_at(
    fetched: &PaperWithReviews,
    all_notes: Option<&[RawNote]>,
    options: &ProcessOptions,
    extracted_at: DateTime<Local>,
) -> ProcessedPaper {
    let root = &fetched.root;

    let mut reviews: Vec<ProcessedReview> = fetched.reviews.iter().map(process_review).collect();
    let mut comments: Vec<ProcessedComment> =
        fetched.comments.iter().map(process_comment).collect();

    if options.anonymize {
        for review in &mut reviews {
            review.reviewer = anonymize_author(&review.reviewer);
        }
        for comment in &mut comments {
            comment.author = anonymize_author(&comment.author);
        }
    }

    let statistics = compute_statistics(&reviews, &comments, extracted_at);
    let tree = all_notes.map(|notes| build_conversation_tree(root, notes));

    ProcessedPaper {
        id: root.id.clone(),
        title: root.content_text("title").unwrap_or_else(|| "Untitled".to_string()),
        abstract_text: root.content_text("abstract"),
        authors: root.content_list("authors"),
        keywords: root.content_list("keywords"),
        venue: root.content_text("venue"),
        reviews,
        comments,
        tree,
        statistics,
    }
}

fn compute_statistics(
    reviews: &[ProcessedReview],
    comments: &[ProcessedComment],
    extracted_at: DateTime<Local>,
) -> PaperStatistics {
    let ratings: Vec<u32> = reviews.iter().filter_map(|r| r.rating).collect();
    let confidences: Vec<u32> = reviews.iter().filter_map(|r| r.confidence).collect();

    let mut rating_distribution: BTreeMap<u32, usize> = BTreeMap::new();
    for rating in &ratings {
        *rating_distribution.entry(*rating).or_insert(0) += 1;
    }

    PaperStatistics {
        review_count: reviews.len(),
        comment_count: comments.len(),
        average_rating: average(&ratings),
        average_confidence: average(&confidences),
        rating_distribution,
        extracted_at,
    }
}

/// 算术平均值，空集合返回 None
fn average(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64)
}

/// 匿名化作者签名
///
/// 已带匿名标记（评审角色记号）的签名原样保留，其余整体替换为固定标签
pub fn anonymize_author(author: &str) -> String {
    if author.contains("Reviewer") || author.contains("Anonymous") {
        author.to_string()
    } else {
        ANONYMOUS_LABEL.to_string()
    }
}
