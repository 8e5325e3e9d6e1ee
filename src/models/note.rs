use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OpenReview 原始 note 记录
///
/// 同一结构承载讨论串中的所有记录：主论文、评审、决议、评论、回复。
/// content 是开放的键值映射，API v2 中每个字段形如 `{"value": ...}`。
/// 获取后不可变，由数据处理器一次性消费。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNote {
    pub id: String,
    #[serde(default)]
    pub forum: Option<String>,
    #[serde(default)]
    pub replyto: Option<String>,
    #[serde(default)]
    pub signatures: Vec<String>,
    /// 创建时间（毫秒时间戳）
    #[serde(default)]
    pub cdate: Option<i64>,
    #[serde(default)]
    pub content: Map<String, Value>,
}

impl RawNote {
    /// 第一个签名，缺失时返回 "Unknown"
    pub fn signature(&self) -> &str {
        self.signatures.first().map(|s| s.as_str()).unwrap_or("Unknown")
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.content.contains_key(key)
    }

    /// 读取 content 字段的文本值
    ///
    /// 兼容 API v2 的 `{"value": ...}` 包装和 v1 的裸值
    pub fn content_text(&self, key: &str) -> Option<String> {
        let value = self.content.get(key)?;
        let inner = value.get("value").unwrap_or(value);
        match inner {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// 读取 content 字段的字符串列表值（如 authors、keywords）
    pub fn content_list(&self, key: &str) -> Option<Vec<String>> {
        let value = self.content.get(key)?;
        let inner = value.get("value").unwrap_or(value);
        let array = inner.as_array()?;
        Some(
            array
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
        )
    }

    /// 根据 content 键的组合判断记录类型
    pub fn kind(&self) -> NoteKind {
        if self.content.is_empty() {
            return NoteKind::Other;
        }

        if self.has_key("title") && self.has_key("authors") && self.has_key("abstract") {
            NoteKind::Paper
        } else if self.has_key("decision") {
            NoteKind::Decision
        } else if self.has_key("metareview") {
            NoteKind::MetaReview
        } else if self.has_key("review") || self.has_key("rating") {
            NoteKind::OfficialReview
        } else if self.has_key("title") && self.has_key("comment") {
            let title = self.content_text("title").unwrap_or_default().to_lowercase();
            if title.contains("author") || title.contains("response") {
                NoteKind::AuthorResponse
            } else {
                NoteKind::Comment
            }
        } else if self.has_key("comment") {
            NoteKind::Comment
        } else {
            NoteKind::Other
        }
    }
}

/// 记录类型
///
/// 无法识别的记录归为 Other，原始键值映射仍然保留在 RawNote 中
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Paper,
    Decision,
    MetaReview,
    OfficialReview,
    AuthorResponse,
    Comment,
    Other,
}

impl NoteKind {
    pub fn label(&self) -> &'static str {
        match self {
            NoteKind::Paper => "Paper",
            NoteKind::Decision => "Decision",
            NoteKind::MetaReview => "Meta Review",
            NoteKind::OfficialReview => "Official Review",
            NoteKind::AuthorResponse => "Author Response",
            NoteKind::Comment => "Comment",
            NoteKind::Other => "Other",
        }
    }
}
