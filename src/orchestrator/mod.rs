pub mod batch_processor;
pub mod item_processor;

pub use batch_processor::{generate_result_summary, BatchProcessor, StopHandle};
