pub mod locator;
pub mod processing;
pub mod report;
pub mod retry;
pub mod storage;

pub use locator::{DefaultLocator, SourceLocator};
pub use processing::{build_conversation_tree, process_comment, process_paper, process_review, ProcessOptions};
pub use report::{generate_plain_report, generate_rich_report};
pub use retry::{execute_with_retry, forum_url_rules, validate_input, ValidationRule};
pub use storage::{ContentStore, FileStore};
