/// 单个条目的处理阶段
///
/// 固定顺序，任何阶段都可能直接进入 Failed，没有阶段会被重复进入：
/// FindingUrl → ValidatingUrl → ExtractingForumId → FetchingPaper →
/// FetchingNotes → ProcessingData → SavingContent → Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    FindingUrl,
    ValidatingUrl,
    ExtractingForumId,
    FetchingPaper,
    FetchingNotes,
    ProcessingData,
    SavingContent,
    Completed,
    Failed,
}

impl ProcessingStage {
    /// 阶段标签（用于日志和进度回调）
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingStage::FindingUrl => "查找链接",
            ProcessingStage::ValidatingUrl => "验证链接",
            ProcessingStage::ExtractingForumId => "提取论坛ID",
            ProcessingStage::FetchingPaper => "获取论文",
            ProcessingStage::FetchingNotes => "获取讨论记录",
            ProcessingStage::ProcessingData => "处理数据",
            ProcessingStage::SavingContent => "保存内容",
            ProcessingStage::Completed => "完成",
            ProcessingStage::Failed => "失败",
        }
    }

    /// 条目内进度检查点（0-100）
    pub fn checkpoint(&self) -> u8 {
        match self {
            ProcessingStage::FindingUrl => 0,
            ProcessingStage::ValidatingUrl => 10,
            ProcessingStage::ExtractingForumId => 20,
            ProcessingStage::FetchingPaper => 30,
            ProcessingStage::FetchingNotes => 50,
            ProcessingStage::ProcessingData => 70,
            ProcessingStage::SavingContent => 90,
            ProcessingStage::Completed => 100,
            ProcessingStage::Failed => 100,
        }
    }
}
