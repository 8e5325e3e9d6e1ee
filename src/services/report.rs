//! 报告渲染器
//!
//! 两种确定性的输出编码：富文本（HTML 标记）和纯文本。
//! 渲染无副作用；任何可选字段缺失时只省略它自己的小节，
//! 不崩溃也不留占位符。

use crate::logger::truncate_text;
use crate::models::tree::TreeNode;
use crate::models::{ProcessedPaper, ProcessedReview};

/// HTML 转义
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// 生成富文本（HTML）报告
pub fn generate_rich_report(paper: &ProcessedPaper) -> String {
    let mut out = String::new();
    out.push_str("<div class=\"openreview-report\">\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape_html(&paper.title)));

    if let Some(authors) = &paper.authors {
        out.push_str(&format!(
            "<p><strong>作者:</strong> {}</p>\n",
            escape_html(&authors.join(", "))
        ));
    }
    if let Some(venue) = &paper.venue {
        out.push_str(&format!("<p><strong>会议:</strong> {}</p>\n", escape_html(venue)));
    }
    if let Some(keywords) = &paper.keywords {
        out.push_str(&format!(
            "<p><strong>关键词:</strong> {}</p>\n",
            escape_html(&keywords.join(", "))
        ));
    }
    if let Some(abstract_text) = &paper.abstract_text {
        out.push_str("<h2>摘要</h2>\n");
        out.push_str(&format!("<p>{}</p>\n", escape_html(abstract_text)));
    }

    // 统计信息
    let stats = &paper.statistics;
    out.push_str("<h2>统计信息</h2>\n<ul>\n");
    out.push_str(&format!("<li>评审数量: {}</li>\n", stats.review_count));
    out.push_str(&format!("<li>评论数量: {}</li>\n", stats.comment_count));
    if let Some(avg) = stats.average_rating {
        out.push_str(&format!("<li>平均评分: {:.2}</li>\n", avg));
    }
    if let Some(avg) = stats.average_confidence {
        out.push_str(&format!("<li>平均置信度: {:.2}</li>\n", avg));
    }
    if !stats.rating_distribution.is_empty() {
        out.push_str(&format!(
            "<li>评分分布: {}</li>\n",
            format_distribution(&stats.rating_distribution)
        ));
    }
    out.push_str("</ul>\n");

    if !paper.reviews.is_empty() {
        out.push_str("<h2>评审意见</h2>\n");
        for (i, review) in paper.reviews.iter().enumerate() {
            out.push_str(&format!(
                "<h3>评审 {}: {}</h3>\n<ul>\n",
                i + 1,
                escape_html(&review.reviewer)
            ));
            push_review_field_html(&mut out, "评分", review.rating_text.as_deref());
            push_review_field_html(&mut out, "置信度", review.confidence_text.as_deref());
            push_review_field_html(&mut out, "总结", review.summary.as_deref());
            push_review_field_html(&mut out, "优点", review.strengths.as_deref());
            push_review_field_html(&mut out, "缺点", review.weaknesses.as_deref());
            push_review_field_html(&mut out, "问题", review.questions.as_deref());
            push_review_field_html(&mut out, "技术严谨性", review.soundness.as_deref());
            push_review_field_html(&mut out, "表达", review.presentation.as_deref());
            push_review_field_html(&mut out, "贡献", review.contribution.as_deref());
            out.push_str("</ul>\n");
        }
    }

    if !paper.comments.is_empty() {
        out.push_str("<h2>评论</h2>\n");
        for comment in &paper.comments {
            out.push_str(&format!("<h3>{}</h3>\n", escape_html(&comment.author)));
            if let Some(title) = &comment.title {
                out.push_str(&format!("<p><em>{}</em></p>\n", escape_html(title)));
            }
            out.push_str(&format!("<p>{}</p>\n", escape_html(&comment.content)));
        }
    }

    if let Some(tree) = &paper.tree {
        out.push_str("<h2>对话结构</h2>\n");
        out.push_str("<ul>\n");
        render_tree_node_html(&mut out, &tree.root);
        out.push_str("</ul>\n");
    }

    out.push_str(&format!(
        "<p><em>提取时间: {}</em></p>\n",
        paper.statistics.extracted_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str("</div>\n");
    out
}

fn push_review_field_html(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push_str(&format!(
            "<li><strong>{}:</strong> {}</li>\n",
            label,
            escape_html(value)
        ));
    }
}

fn render_tree_node_html(out: &mut String, node: &TreeNode) {
    let mut line = format!("[{}] {}", node.note.kind().label(), escape_html(node.note.signature()));
    if let Some(preview) = note_preview(&node.note) {
        line.push_str(&format!(": {}", escape_html(&preview)));
    }
    out.push_str(&format!("<li>{}", line));
    if !node.children.is_empty() {
        out.push_str("\n<ul>\n");
        for child in &node.children {
            render_tree_node_html(out, child);
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</li>\n");
}

/// 生成纯文本报告
pub fn generate_plain_report(paper: &ProcessedPaper) -> String {
    let rule = "=".repeat(50);
    let thin_rule = "-".repeat(50);
    let mut out = String::new();

    out.push_str(&format!("{}\nOpenReview 评审报告\n{}\n\n", rule, rule));
    out.push_str(&format!("论文: {}\n", paper.title));
    if let Some(authors) = &paper.authors {
        out.push_str(&format!("作者: {}\n", authors.join(", ")));
    }
    if let Some(venue) = &paper.venue {
        out.push_str(&format!("会议: {}\n", venue));
    }
    if let Some(keywords) = &paper.keywords {
        out.push_str(&format!("关键词: {}\n", keywords.join(", ")));
    }
    if let Some(abstract_text) = &paper.abstract_text {
        out.push_str(&format!("\n摘要:\n{}\n", abstract_text));
    }

    let stats = &paper.statistics;
    out.push_str(&format!("\n{}\n统计信息\n{}\n", thin_rule, thin_rule));
    out.push_str(&format!("评审数量: {}\n", stats.review_count));
    out.push_str(&format!("评论数量: {}\n", stats.comment_count));
    if let Some(avg) = stats.average_rating {
        out.push_str(&format!("平均评分: {:.2}\n", avg));
    }
    if let Some(avg) = stats.average_confidence {
        out.push_str(&format!("平均置信度: {:.2}\n", avg));
    }
    if !stats.rating_distribution.is_empty() {
        out.push_str(&format!(
            "评分分布: {}\n",
            format_distribution(&stats.rating_distribution)
        ));
    }

    if !paper.reviews.is_empty() {
        out.push_str(&format!("\n{}\n评审意见\n{}\n", thin_rule, thin_rule));
        for (i, review) in paper.reviews.iter().enumerate() {
            out.push_str(&format!("\n[评审 {}] {}\n", i + 1, review.reviewer));
            push_review_field_plain(&mut out, "评分", review.rating_text.as_deref());
            push_review_field_plain(&mut out, "置信度", review.confidence_text.as_deref());
            push_review_field_plain(&mut out, "总结", review.summary.as_deref());
            push_review_field_plain(&mut out, "优点", review.strengths.as_deref());
            push_review_field_plain(&mut out, "缺点", review.weaknesses.as_deref());
            push_review_field_plain(&mut out, "问题", review.questions.as_deref());
            push_review_field_plain(&mut out, "技术严谨性", review.soundness.as_deref());
            push_review_field_plain(&mut out, "表达", review.presentation.as_deref());
            push_review_field_plain(&mut out, "贡献", review.contribution.as_deref());
        }
    }

    if !paper.comments.is_empty() {
        out.push_str(&format!("\n{}\n评论\n{}\n", thin_rule, thin_rule));
        for (i, comment) in paper.comments.iter().enumerate() {
            out.push_str(&format!("\n[评论 {}] {}\n", i + 1, comment.author));
            if let Some(title) = &comment.title {
                out.push_str(&format!("标题: {}\n", title));
            }
            out.push_str(&format!("内容: {}\n", comment.content));
        }
    }

    if let Some(tree) = &paper.tree {
        out.push_str(&format!("\n{}\n对话树\n{}\n\n", thin_rule, thin_rule));
        render_tree_node_plain(&mut out, &tree.root, 0);
    }

    out.push_str(&format!(
        "\n提取时间: {}\n",
        paper.statistics.extracted_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out
}

fn push_review_field_plain(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push_str(&format!("{}: {}\n", label, value));
    }
}

fn render_tree_node_plain(out: &mut String, node: &TreeNode, level: usize) {
    let indent = "  ".repeat(level);
    let arrow = if level == 0 { "" } else { "↳ " };
    out.push_str(&format!(
        "{}{}[{}] {}\n",
        indent,
        arrow,
        node.note.kind().label(),
        node.note.signature()
    ));
    if let Some(preview) = note_preview(&node.note) {
        out.push_str(&format!("{}  内容: {}\n", indent, preview));
    }
    for child in &node.children {
        render_tree_node_plain(out, child, level + 1);
    }
}

/// 节点内容预览：依次取 title / comment / review 的前 100 个字符
fn note_preview(note: &crate::models::RawNote) -> Option<String> {
    let text = note
        .content_text("title")
        .or_else(|| note.content_text("comment"))
        .or_else(|| note.content_text("review"))?;
    Some(truncate_text(&text, 100))
}

fn format_distribution(distribution: &std::collections::BTreeMap<u32, usize>) -> String {
    distribution
        .iter()
        .map(|(rating, count)| format!("{}分×{}", rating, count))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::paper::PaperWithReviews;
    use crate::services::processing::{process_paper_at, ProcessOptions};
    use chrono::{Local, TimeZone};
    use serde_json::json;

    fn fixture_paper(with_abstract: bool, with_summary: bool) -> ProcessedPaper {
        let mut content = json!({
            "title": {"value": "A <Great> Paper"},
            "authors": {"value": ["Alice"]},
            "abstract": {"value": "The abstract."}
        });
        if !with_abstract {
            content.as_object_mut().unwrap().remove("abstract");
        }

        let root = crate::models::RawNote {
            id: "p1".to_string(),
            forum: None,
            replyto: None,
            signatures: vec!["Conf/Authors".to_string()],
            cdate: Some(100),
            content: content.as_object().cloned().unwrap(),
        };

        let mut review_content = json!({
            "rating": {"value": "6: above threshold"},
            "summary": {"value": "Nice work."}
        });
        if !with_summary {
            review_content.as_object_mut().unwrap().remove("summary");
        }
        let review = crate::models::RawNote {
            id: "r1".to_string(),
            forum: None,
            replyto: Some("p1".to_string()),
            signatures: vec!["Conf/Reviewer_ab".to_string()],
            cdate: Some(200),
            content: review_content.as_object().cloned().unwrap(),
        };

        let fetched = PaperWithReviews {
            root,
            reviews: vec![review],
            comments: vec![],
        };
        let at = Local.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        process_paper_at(&fetched, None, &ProcessOptions::default(), at)
    }

    #[test]
    fn test_rich_report_escapes_html() {
        let paper = fixture_paper(true, true);
        let html = generate_rich_report(&paper);
        assert!(html.contains("A &lt;Great&gt; Paper"));
        assert!(!html.contains("<Great>"));
    }

    #[test]
    fn test_rich_report_contains_sections() {
        let paper = fixture_paper(true, true);
        let html = generate_rich_report(&paper);
        assert!(html.contains("<h2>摘要</h2>"));
        assert!(html.contains("<h2>统计信息</h2>"));
        assert!(html.contains("<h2>评审意见</h2>"));
        assert!(html.contains("评分:</strong> 6: above threshold"));
    }

    #[test]
    fn test_absent_fields_suppress_their_sections() {
        let paper = fixture_paper(false, false);
        let html = generate_rich_report(&paper);
        assert!(!html.contains("摘要"));
        assert!(!html.contains("总结"));

        let text = generate_plain_report(&paper);
        assert!(!text.contains("摘要:"));
        assert!(!text.contains("总结:"));
        // 评审小节本身还在
        assert!(text.contains("[评审 1]"));
    }

    #[test]
    fn test_plain_report_empty_reviews_omit_section() {
        let mut paper = fixture_paper(true, true);
        paper.reviews.clear();
        let text = generate_plain_report(&paper);
        assert!(!text.contains("评审意见"));
        assert!(text.contains("评审数量: 1")); // 统计来自构建时，不随手动清空变化
    }
}
