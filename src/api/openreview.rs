//! OpenReview API 客户端
//!
//! 负责与 OpenReview API v2 的交互：按论坛ID获取主论文和全部 notes。
//! 失败统一归类为 ImportError，供重试执行器判断是否重试。

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::api::NoteFetcher;
use crate::config::Config;
use crate::error::{ImportError, ImportResult};
use crate::models::note::NoteKind;
use crate::models::{PaperWithReviews, RawNote};

/// OpenReview API 客户端
pub struct OpenReviewClient {
    http: reqwest::Client,
    base_url: String,
}

/// notes 端点的响应体
#[derive(Debug, Deserialize)]
struct NotesResponse {
    #[serde(default)]
    notes: Vec<RawNote>,
}

impl OpenReviewClient {
    /// 创建新的客户端，超时从配置读取
    pub fn new(config: &Config) -> ImportResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ImportError::network(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 获取主论文 note
    ///
    /// # 参数
    /// - `forum_id`: 论坛ID
    pub async fn fetch_root_note(&self, forum_id: &str) -> ImportResult<RawNote> {
        let url = format!("{}/notes?id={}", self.base_url, forum_id);
        debug!("获取主论文: {}", url);

        let mut notes = self.get_notes(&url).await?;
        if notes.is_empty() {
            return Err(ImportError::parsing(format!(
                "未找到论坛ID对应的论文: {}",
                forum_id
            )));
        }
        Ok(notes.remove(0))
    }

    /// 获取讨论串下的全部 notes（论文 + 评审 + 评论 + 决议）
    pub async fn fetch_all_notes(&self, forum_id: &str) -> ImportResult<Vec<RawNote>> {
        let url = format!("{}/notes?forum={}", self.base_url, forum_id);
        debug!("获取全部 notes: {}", url);

        self.get_notes(&url).await
    }

    /// 获取论文及其评审与评论（组合调用）
    pub async fn fetch_paper_with_reviews(&self, forum_id: &str) -> ImportResult<PaperWithReviews> {
        let root = self.fetch_root_note(forum_id).await?;
        let all_notes = self.fetch_all_notes(forum_id).await?;
        let (reviews, comments) = bucket_notes(&root, &all_notes);
        Ok(PaperWithReviews {
            root,
            reviews,
            comments,
        })
    }

    async fn get_notes(&self, url: &str) -> ImportResult<Vec<RawNote>> {
        let response = self.http.get(url).send().await.map_err(ImportError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::from_status(
                status.as_u16(),
                format!("HTTP error ({}), status: {}", url, status.as_u16()),
            ));
        }

        let body: NotesResponse = response.json().await.map_err(ImportError::from)?;
        Ok(body.notes)
    }
}

impl NoteFetcher for OpenReviewClient {
    async fn fetch_root_note(&self, forum_id: &str) -> ImportResult<RawNote> {
        OpenReviewClient::fetch_root_note(self, forum_id).await
    }

    async fn fetch_all_notes(&self, forum_id: &str) -> ImportResult<Vec<RawNote>> {
        OpenReviewClient::fetch_all_notes(self, forum_id).await
    }
}

/// 按内容形状把 notes 粗分为评审和评论
///
/// 带 rating/review 字段的是评审；带自由文本 comment 的是评论
/// （含作者回复）；主论文、决议、元评审不进入这两类
pub fn bucket_notes(root: &RawNote, all_notes: &[RawNote]) -> (Vec<RawNote>, Vec<RawNote>) {
    let mut reviews = Vec::new();
    let mut comments = Vec::new();

    for note in all_notes {
        if note.id == root.id {
            continue;
        }
        match note.kind() {
            NoteKind::OfficialReview => reviews.push(note.clone()),
            NoteKind::Comment | NoteKind::AuthorResponse => comments.push(note.clone()),
            _ => {}
        }
    }

    (reviews, comments)
}

/// 从链接中提取论坛ID
///
/// 支持 `/forum?id=X` 和 `/pdf?id=X` 两种路径；
/// 链接无效或缺少 id 参数时返回 None，从不报错
pub fn extract_forum_id(url: &str) -> Option<String> {
    let re = Regex::new(r"^https?://[^/\s]+/(?:forum|pdf)\?([^#\s]+)").ok()?;
    let caps = re.captures(url.trim())?;
    let query = caps.get(1)?.as_str();

    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("id=") {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
