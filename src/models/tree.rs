use serde::Serialize;

use crate::models::note::RawNote;

/// 对话树节点
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub note: RawNote,
    pub children: Vec<TreeNode>,
}

/// 对话树统计
///
/// 构建树时一次性计算并缓存，之后不再变化
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStatistics {
    pub total_notes: usize,
    pub reviews: usize,
    pub comments: usize,
    pub author_responses: usize,
    pub decisions: usize,
    pub meta_reviews: usize,
}

/// 以主论文为根的对话树
///
/// 每个非根节点通过 replyto 字段挂到父节点下；
/// 声明的父节点不在集合中的孤儿节点直接挂到根下。
#[derive(Debug, Clone)]
pub struct ConversationTree {
    pub root: TreeNode,
    pub statistics: TreeStatistics,
}

impl ConversationTree {
    /// 根节点的直接子节点数量
    pub fn root_child_count(&self) -> usize {
        self.root.children.len()
    }
}
