//! # OpenReview Import
//!
//! 一个批量抓取 OpenReview 讨论串并生成评审报告的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `api/` - OpenReview REST 客户端，唯一发起网络请求的地方
//! - `error` / `logger` / `config` - 错误分类、日志、环境变量配置
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单篇论文
//! - `locator` - 从条目中定位 OpenReview 链接
//! - `processing` - 评分解析、匿名化、对话树构建、统计
//! - `report` - HTML / 纯文本报告生成
//! - `retry` - 指数退避重试与输入校验
//! - `storage` - 报告落盘能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个条目"的阶段序列和进度模型
//! - `ProcessingStage` - 阶段枚举及进度检查点
//! - `ProgressEvent` - 进度事件与整体进度计算
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量条目处理器，管理节奏和取消
//! - `orchestrator/item_processor` - 单个条目处理器，驱动阶段序列
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod workflow;

// 重新导出常用类型
pub use api::{extract_forum_id, NoteFetcher, OpenReviewClient};
pub use app::App;
pub use config::Config;
pub use error::{ImportError, ImportResult};
pub use models::{BatchResult, ProcessedPaper, RawNote, SaveMode, SingleItemResult, SourceItem};
pub use orchestrator::{generate_result_summary, BatchProcessor, StopHandle};
pub use services::{ContentStore, DefaultLocator, FileStore, SourceLocator};
pub use workflow::{ProcessingStage, ProgressEvent};
