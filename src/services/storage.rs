//! 持久化协作方
//!
//! 核心只依赖 ContentStore 接口；宿主存储的失败以原始错误抛出，
//! 由编排层在边界处归一化为 HostOperation 错误。
//!
//! 文件存储实现先写临时文件再重命名，保证不会留下半成品报告，
//! 所以核心不需要补偿删除逻辑。

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::{ProcessedPaper, SourceItem};
use crate::services::report::escape_html;

/// 报告持久化能力
#[allow(async_fn_in_trait)]
pub trait ContentStore {
    /// 以富文本笔记形式保存
    ///
    /// `markup_pre_encoded` 表示 content 已经是最终标记，
    /// 为 false 时实现方需要先转义
    async fn save_as_note(
        &self,
        item: &SourceItem,
        content: &str,
        paper: &ProcessedPaper,
        markup_pre_encoded: bool,
    ) -> Result<()>;

    /// 以纯文本附件形式保存
    async fn save_as_attachment(
        &self,
        item: &SourceItem,
        text: &str,
        paper: &ProcessedPaper,
    ) -> Result<()>;
}

/// 文件系统存储
///
/// 每个条目写成 `{key}.html` 或 `{key}.txt`
#[derive(Debug, Clone)]
pub struct FileStore {
    output_dir: PathBuf,
}

impl FileStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 原子写入：先写临时文件再重命名
    async fn write_atomic(&self, file_name: &str, content: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", self.output_dir.display()))?;

        let path = self.output_dir.join(file_name);
        let tmp_path = self.output_dir.join(format!("{}.tmp", file_name));

        tokio::fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("无法写入临时文件: {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("无法写入文件: {}", path.display()))?;

        debug!("报告已写入: {}", path.display());
        Ok(())
    }
}

impl ContentStore for FileStore {
    async fn save_as_note(
        &self,
        item: &SourceItem,
        content: &str,
        _paper: &ProcessedPaper,
        markup_pre_encoded: bool,
    ) -> Result<()> {
        let body = if markup_pre_encoded {
            content.to_string()
        } else {
            escape_html(content)
        };
        let file_name = format!("{}.html", sanitize_file_name(&item.key));
        self.write_atomic(&file_name, &body).await
    }

    async fn save_as_attachment(
        &self,
        item: &SourceItem,
        text: &str,
        _paper: &ProcessedPaper,
    ) -> Result<()> {
        let file_name = format!("{}.txt", sanitize_file_name(&item.key));
        self.write_atomic(&file_name, text).await
    }
}

/// 把条目键转成安全的文件名
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
