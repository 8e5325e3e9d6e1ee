/// 宿主条目的投影
///
/// 来源链接查找协作方依次检查条目自身的链接、附件链接
/// 和笔记正文中的链接
#[derive(Debug, Clone, Default)]
pub struct SourceItem {
    pub key: String,
    pub title: String,
    pub url: Option<String>,
    pub attachment_urls: Vec<String>,
    pub note_texts: Vec<String>,
}

impl SourceItem {
    /// 仅从链接构造条目（命令行入口使用）
    pub fn from_url(key: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            key: key.into(),
            title: url.clone(),
            url: Some(url),
            attachment_urls: Vec::new(),
            note_texts: Vec::new(),
        }
    }
}
