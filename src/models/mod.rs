pub mod item;
pub mod note;
pub mod paper;
pub mod result;
pub mod tree;

pub use item::SourceItem;
pub use note::{NoteKind, RawNote};
pub use paper::{PaperStatistics, PaperWithReviews, ProcessedComment, ProcessedPaper, ProcessedReview};
pub use result::{BatchResult, SaveMode, SingleItemResult};
pub use tree::{ConversationTree, TreeNode, TreeStatistics};
