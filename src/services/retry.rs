//! 重试执行器与输入验证
//!
//! 包装任意可失败的异步操作：失败后按分类结果判断是否可重试，
//! 可重试则按固定退避表等待后再次调用，否则立即传播分类错误。

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::{ImportError, ImportResult};

/// 固定退避表（秒）：1s、2s、4s，之后每次都是 4s
const BACKOFF_SCHEDULE_SECS: [u64; 3] = [1, 2, 4];

/// 带重试地执行异步操作
///
/// 总尝试次数为 `max_retries + 1`（首次 + 重试）。每次等待前先调用
/// `on_retry(attempt_number, &error)`，attempt_number 从 1 开始，
/// 便于调用方向外汇报进度。
///
/// # 参数
/// - `operation`: 待执行的操作，每次重试重新调用
/// - `max_retries`: 最大重试次数
/// - `on_retry`: 重试回调
pub async fn execute_with_retry<T, F, Fut>(
    mut operation: F,
    max_retries: usize,
    mut on_retry: impl FnMut(usize, &ImportError),
) -> ImportResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ImportResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if !err.retryable() || attempt > max_retries {
                    return Err(err);
                }
                on_retry(attempt, &err);
                let delay = BACKOFF_SCHEDULE_SECS[(attempt - 1).min(BACKOFF_SCHEDULE_SECS.len() - 1)];
                sleep(Duration::from_secs(delay)).await;
            }
        }
    }
}

/// 命名的验证规则：谓词 + 人类可读的消息
pub struct ValidationRule {
    pub name: &'static str,
    pub message: &'static str,
    pub check: fn(&str) -> bool,
}

/// 依次评估所有规则，第一条失败的规则产生验证错误
pub fn validate_input(value: &str, rules: &[ValidationRule]) -> ImportResult<()> {
    for rule in rules {
        if !(rule.check)(value) {
            return Err(ImportError::validation(rule.name, rule.message));
        }
    }
    Ok(())
}

/// OpenReview 论坛链接的验证规则
///
/// 必填 → 链接形状 → 包含 OpenReview 域名标记和论坛路径标记
pub fn forum_url_rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule {
            name: "required",
            message: "链接不能为空",
            check: |v| !v.trim().is_empty(),
        },
        ValidationRule {
            name: "url-shape",
            message: "不是合法的 http(s) 链接",
            check: |v| v.starts_with("http://") || v.starts_with("https://"),
        },
        ValidationRule {
            name: "openreview-forum",
            message: "不是 OpenReview 论坛链接",
            check: |v| v.contains("openreview.net") && (v.contains("forum") || v.contains("id=")),
        },
    ]
}
