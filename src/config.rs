use crate::models::SaveMode;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// OpenReview API 基础地址
    pub api_base_url: String,
    /// 网络请求最大重试次数（不含首次尝试）
    pub max_retries: usize,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否匿名化评审人签名
    pub anonymize_reviewers: bool,
    /// 报告保存方式（note=富文本笔记 / attachment=纯文本附件）
    pub save_mode: SaveMode,
    /// 报告输出目录
    pub output_dir: String,
    /// 待处理的论坛链接列表
    pub forum_urls: Vec<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api2.openreview.net".to_string(),
            max_retries: 3,
            request_timeout_secs: 30,
            anonymize_reviewers: false,
            save_mode: SaveMode::Note,
            output_dir: "reports".to_string(),
            forum_urls: Vec::new(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("OPENREVIEW_API_BASE_URL").unwrap_or(default.api_base_url),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retries),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            anonymize_reviewers: std::env::var("ANONYMIZE_REVIEWERS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.anonymize_reviewers),
            save_mode: std::env::var("SAVE_MODE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.save_mode),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            forum_urls: std::env::var("FORUM_URLS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or(default.forum_urls),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}
