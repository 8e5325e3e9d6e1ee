//! 条目处理流程的构件 - 流程层
//!
//! 定义"一个条目"的阶段序列、进度检查点和整体进度计算，
//! 由编排层驱动执行

pub mod progress;
pub mod stage;

pub use progress::{overall_progress, ProgressCallback, ProgressEvent};
pub use stage::ProcessingStage;
