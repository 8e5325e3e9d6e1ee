//! 来源链接查找
//!
//! 给定宿主条目，依次检查条目自身的链接字段、附件链接、
//! 笔记正文中的自由文本，返回第一个 OpenReview 论坛链接。

use regex::Regex;

use crate::models::SourceItem;

/// OpenReview 链接模式
const URL_PATTERN: &str = r"https?://(?:www\.)?openreview\.net/(?:forum|pdf)\?[^\s\x22'<>)]+";

/// 来源链接查找能力
pub trait SourceLocator {
    /// 返回条目对应的讨论串链接，找不到时返回 None
    fn find_thread_url(&self, item: &SourceItem) -> Option<String>;
}

/// 默认实现：条目链接 → 附件链接 → 笔记正文
#[derive(Debug, Default)]
pub struct DefaultLocator;

impl SourceLocator for DefaultLocator {
    fn find_thread_url(&self, item: &SourceItem) -> Option<String> {
        let re = Regex::new(URL_PATTERN).ok()?;

        if let Some(url) = &item.url {
            if let Some(m) = re.find(url) {
                return Some(m.as_str().to_string());
            }
        }
        for url in &item.attachment_urls {
            if let Some(m) = re.find(url) {
                return Some(m.as_str().to_string());
            }
        }
        for text in &item.note_texts {
            if let Some(m) = re.find(text) {
                return Some(m.as_str().to_string());
            }
        }
        None
    }
}
