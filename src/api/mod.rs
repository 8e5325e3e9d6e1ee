pub mod openreview;

pub use openreview::{bucket_notes, extract_forum_id, OpenReviewClient};

use crate::error::ImportResult;
use crate::models::RawNote;

/// 远端获取能力
///
/// 编排层只依赖这个接口，测试用内存实现替换真实客户端
#[allow(async_fn_in_trait)]
pub trait NoteFetcher {
    async fn fetch_root_note(&self, forum_id: &str) -> ImportResult<RawNote>;
    async fn fetch_all_notes(&self, forum_id: &str) -> ImportResult<Vec<RawNote>>;
}
