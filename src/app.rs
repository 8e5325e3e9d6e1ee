//! 应用装配层
//!
//! 把配置、API 客户端、链接查找器、文件存储和批量处理器装配起来，
//! 跑一个批次并输出摘要。

use anyhow::Result;
use tracing::{info, warn};

use crate::api::OpenReviewClient;
use crate::config::Config;
use crate::models::SourceItem;
use crate::orchestrator::{generate_result_summary, BatchProcessor};
use crate::services::{DefaultLocator, FileStore};
use crate::workflow::ProcessingStage;

/// 应用主结构
pub struct App {
    config: Config,
    items: Vec<SourceItem>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        log_startup(&config);

        let items = config
            .forum_urls
            .iter()
            .enumerate()
            .map(|(i, url)| SourceItem::from_url(format!("item-{}", i + 1), url))
            .collect();

        Self { config, items }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        if self.items.is_empty() {
            warn!("⚠️ 没有待处理的论坛链接（设置 FORUM_URLS 环境变量），程序结束");
            return Ok(());
        }

        let client = OpenReviewClient::new(&self.config)?;
        let store = FileStore::new(&self.config.output_dir);
        let processor =
            BatchProcessor::new(client, store, DefaultLocator, self.config.clone())
                .with_progress_callback(|event| {
                    if matches!(
                        event.stage,
                        ProcessingStage::Completed | ProcessingStage::Failed
                    ) {
                        info!(
                            "📊 整体进度 {:.1}% (成功 {}, 失败 {})",
                            event.overall_progress, event.success_count, event.failure_count
                        );
                    }
                });

        let result = processor.process_batch(&self.items).await;

        for line in generate_result_summary(&result).lines() {
            info!("{}", line);
        }
        info!("报告已保存至目录: {}", self.config.output_dir);

        Ok(())
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - OpenReview 评审导入");
    info!("📡 API 地址: {}", config.api_base_url);
    info!(
        "🔁 最大重试: {} 次, 请求超时: {} 秒",
        config.max_retries, config.request_timeout_secs
    );
    info!("💾 保存方式: {}", config.save_mode.label());
    info!("{}", "=".repeat(60));
}
