//! 批量导入流程的集成测试
//!
//! 用内存实现替换远端客户端和存储，离线验证批次编排、
//! 进度事件和取消行为；真实网络测试默认忽略。

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use openreview_import::api::NoteFetcher;
use openreview_import::config::Config;
use openreview_import::error::{ImportError, ImportResult};
use openreview_import::models::{ProcessedPaper, RawNote, SaveMode, SourceItem};
use openreview_import::orchestrator::{generate_result_summary, BatchProcessor};
use openreview_import::services::{ContentStore, DefaultLocator};
use openreview_import::workflow::{ProcessingStage, ProgressEvent};

// ========== 内存实现 ==========

/// 内存版远端客户端
struct MockFetcher {
    /// 论坛ID -> 该讨论串的全部记录（第一条是主论文）
    forums: HashMap<String, Vec<RawNote>>,
    /// 获取时直接失败的论坛ID
    failing: HashSet<String>,
}

impl MockFetcher {
    fn new() -> Self {
        Self {
            forums: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    fn with_forum(mut self, forum_id: &str, notes: Vec<RawNote>) -> Self {
        self.forums.insert(forum_id.to_string(), notes);
        self
    }

    fn with_failing(mut self, forum_id: &str) -> Self {
        self.failing.insert(forum_id.to_string());
        self
    }
}

impl NoteFetcher for MockFetcher {
    async fn fetch_root_note(&self, forum_id: &str) -> ImportResult<RawNote> {
        if self.failing.contains(forum_id) {
            return Err(ImportError::from_status(404, "论坛不存在"));
        }
        self.forums
            .get(forum_id)
            .and_then(|notes| notes.first().cloned())
            .ok_or_else(|| ImportError::parsing(format!("未知论坛: {}", forum_id)))
    }

    async fn fetch_all_notes(&self, forum_id: &str) -> ImportResult<Vec<RawNote>> {
        if self.failing.contains(forum_id) {
            return Err(ImportError::from_status(404, "论坛不存在"));
        }
        self.forums
            .get(forum_id)
            .cloned()
            .ok_or_else(|| ImportError::parsing(format!("未知论坛: {}", forum_id)))
    }
}

/// 内存版存储，记录每次保存的条目键和形式
#[derive(Clone, Default)]
struct MockStore {
    saved: Arc<Mutex<Vec<(String, SaveMode)>>>,
}

impl MockStore {
    fn saved_keys(&self) -> Vec<(String, SaveMode)> {
        self.saved.lock().unwrap().clone()
    }
}

impl ContentStore for MockStore {
    async fn save_as_note(
        &self,
        item: &SourceItem,
        _content: &str,
        _paper: &ProcessedPaper,
        _markup_pre_encoded: bool,
    ) -> anyhow::Result<()> {
        self.saved
            .lock()
            .unwrap()
            .push((item.key.clone(), SaveMode::Note));
        Ok(())
    }

    async fn save_as_attachment(
        &self,
        item: &SourceItem,
        _text: &str,
        _paper: &ProcessedPaper,
    ) -> anyhow::Result<()> {
        self.saved
            .lock()
            .unwrap()
            .push((item.key.clone(), SaveMode::Attachment));
        Ok(())
    }
}

/// 拒绝一切写入的存储，模拟宿主文档库的应用级失败
struct FailingStore;

impl ContentStore for FailingStore {
    async fn save_as_note(
        &self,
        _item: &SourceItem,
        _content: &str,
        _paper: &ProcessedPaper,
        _markup_pre_encoded: bool,
    ) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("存储配额已满，写入被拒绝"))
    }

    async fn save_as_attachment(
        &self,
        _item: &SourceItem,
        _text: &str,
        _paper: &ProcessedPaper,
    ) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("存储配额已满，写入被拒绝"))
    }
}

// ========== 测试数据 ==========

fn note(id: &str, replyto: Option<&str>, signature: &str, cdate: i64, content: Value) -> RawNote {
    RawNote {
        id: id.to_string(),
        forum: None,
        replyto: replyto.map(|s| s.to_string()),
        signatures: vec![signature.to_string()],
        cdate: Some(cdate),
        content: content.as_object().cloned().unwrap(),
    }
}

/// 一个主论文 + 两条评审 + 一条公开评论
fn forum_fixture(forum_id: &str) -> Vec<RawNote> {
    vec![
        note(
            forum_id,
            None,
            "Conf/Authors",
            1000,
            json!({
                "title": {"value": format!("论文 {}", forum_id)},
                "authors": {"value": ["作者甲", "作者乙"]},
                "abstract": {"value": "摘要内容"},
                "keywords": {"value": ["machine learning"]}
            }),
        ),
        note(
            "r1",
            Some(forum_id),
            "Conf/Reviewer_abc",
            2000,
            json!({
                "rating": {"value": "6: 略高于接收线"},
                "summary": {"value": "总结"},
                "confidence": {"value": "4"}
            }),
        ),
        note(
            "r2",
            Some(forum_id),
            "Conf/Reviewer_xyz",
            3000,
            json!({
                "rating": {"value": "8"},
                "summary": {"value": "总结2"}
            }),
        ),
        note(
            "c1",
            Some(forum_id),
            "~Some_User1",
            4000,
            json!({
                "title": {"value": "Public comment"},
                "comment": {"value": "公开评论内容"}
            }),
        ),
    ]
}

fn test_config() -> Config {
    Config {
        verbose_logging: false,
        ..Config::default()
    }
}

fn items(forum_ids: &[&str]) -> Vec<SourceItem> {
    forum_ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            SourceItem::from_url(
                format!("item-{}", i + 1),
                format!("https://openreview.net/forum?id={}", id),
            )
        })
        .collect()
}

// ========== 离线批次测试 ==========

#[tokio::test(start_paused = true)]
async fn test_batch_all_success() {
    let fetcher = MockFetcher::new()
        .with_forum("paper1", forum_fixture("paper1"))
        .with_forum("paper2", forum_fixture("paper2"));
    let store = MockStore::default();
    let processor = BatchProcessor::new(fetcher, store.clone(), DefaultLocator, test_config());

    let result = processor.process_batch(&items(&["paper1", "paper2"])).await;

    assert_eq!(result.total_items, 2);
    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 0);
    assert_eq!(result.results.len(), 2);

    // 结果顺序与输入一致
    assert_eq!(result.results[0].item_key, "item-1");
    assert_eq!(result.results[1].item_key, "item-2");
    for item in &result.results {
        assert!(item.success);
        assert_eq!(item.review_count, Some(2));
        assert_eq!(item.comment_count, Some(1));
        assert_eq!(item.saved_as, Some(SaveMode::Note));
        let stats = item.tree_statistics.expect("成功条目应带对话树统计");
        assert_eq!(stats.total_notes, 4);
        assert_eq!(stats.reviews, 2);
        assert_eq!(stats.comments, 1);
    }

    let saved = store.saved_keys();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0], ("item-1".to_string(), SaveMode::Note));
}

#[tokio::test(start_paused = true)]
async fn test_batch_continues_after_item_failure() {
    let fetcher = MockFetcher::new()
        .with_forum("paper1", forum_fixture("paper1"))
        .with_failing("missing")
        .with_forum("paper3", forum_fixture("paper3"));
    let store = MockStore::default();
    let processor = BatchProcessor::new(fetcher, store.clone(), DefaultLocator, test_config());

    let result = processor
        .process_batch(&items(&["paper1", "missing", "paper3"]))
        .await;

    assert_eq!(result.total_items, 3);
    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 1);

    let failed = &result.results[1];
    assert!(!failed.success);
    assert!(failed.error.as_deref().unwrap().contains("404"));
    assert!(failed.saved_as.is_none());

    // 失败条目不触发保存
    assert_eq!(store.saved_keys().len(), 2);

    let summary = generate_result_summary(&result);
    assert!(summary.contains("总计: 3 | 成功: 2 | 失败: 1"));
    assert!(summary.contains("失败条目:"));
    assert!(summary.contains("id=missing"));
}

#[tokio::test(start_paused = true)]
async fn test_attachment_save_mode() {
    let fetcher = MockFetcher::new().with_forum("paper1", forum_fixture("paper1"));
    let store = MockStore::default();
    let config = Config {
        save_mode: SaveMode::Attachment,
        ..test_config()
    };
    let processor = BatchProcessor::new(fetcher, store.clone(), DefaultLocator, config);

    let result = processor.process_batch(&items(&["paper1"])).await;

    assert_eq!(result.success_count, 1);
    assert_eq!(result.results[0].saved_as, Some(SaveMode::Attachment));
    assert_eq!(
        store.saved_keys(),
        vec![("item-1".to_string(), SaveMode::Attachment)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_remaining_items() {
    let mut fetcher = MockFetcher::new();
    for id in ["p1", "p2", "p3", "p4", "p5"] {
        fetcher = fetcher.with_forum(id, forum_fixture(id));
    }
    let store = MockStore::default();
    let processor = BatchProcessor::new(fetcher, store, DefaultLocator, test_config());

    // 第 2 个条目完成后从进度回调里发出取消请求
    let handle = processor.stop_handle();
    let processor = processor.with_progress_callback(move |event: &ProgressEvent| {
        if event.item_index == 1 && matches!(event.stage, ProcessingStage::Completed) {
            handle.stop();
        }
    });

    let result = processor
        .process_batch(&items(&["p1", "p2", "p3", "p4", "p5"]))
        .await;

    // 已完成的保留，剩余的不再开始
    assert_eq!(result.total_items, 5);
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_inter_item_pause() {
    let mut fetcher = MockFetcher::new();
    for id in ["p1", "p2", "p3", "p4", "p5"] {
        fetcher = fetcher.with_forum(id, forum_fixture(id));
    }
    let processor =
        BatchProcessor::new(fetcher, MockStore::default(), DefaultLocator, test_config());

    // 取消请求落在第 2、3 个条目之间的暂停期间
    let handle = processor.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.stop();
    });

    let result = processor
        .process_batch(&items(&["p1", "p2", "p3", "p4", "p5"]))
        .await;

    // 暂停期间发出的取消也不会让第 3 个条目开始
    assert_eq!(result.total_items, 5);
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_store_rejection_reported_as_host_operation() {
    let fetcher = MockFetcher::new().with_forum("paper1", forum_fixture("paper1"));
    let processor = BatchProcessor::new(fetcher, FailingStore, DefaultLocator, test_config());

    let result = processor.process_batch(&items(&["paper1"])).await;

    assert_eq!(result.failure_count, 1);
    let error = result.results[0].error.as_deref().unwrap();
    // 存储实现的应用级拒绝归为存储操作失败，而不是未知错误
    assert!(error.starts_with("存储操作失败"), "{}", error);
    assert!(error.contains("存储配额已满"));
}

#[tokio::test(start_paused = true)]
async fn test_progress_events_ordered() {
    let fetcher = MockFetcher::new().with_forum("paper1", forum_fixture("paper1"));
    let store = MockStore::default();
    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let processor = BatchProcessor::new(fetcher, store, DefaultLocator, test_config())
        .with_progress_callback(move |event: &ProgressEvent| {
            sink.lock().unwrap().push(event.clone());
        });

    processor.process_batch(&items(&["paper1"])).await;

    let events = events.lock().unwrap();
    let stages: Vec<ProcessingStage> = events
        .iter()
        .skip(1) // 跳过批次开始事件
        .map(|e| e.stage)
        .collect();
    assert_eq!(
        &stages[..stages.len() - 1],
        &[
            ProcessingStage::FindingUrl,
            ProcessingStage::ValidatingUrl,
            ProcessingStage::ExtractingForumId,
            ProcessingStage::FetchingPaper,
            ProcessingStage::FetchingNotes,
            ProcessingStage::ProcessingData,
            ProcessingStage::SavingContent,
            ProcessingStage::Completed,
        ]
    );

    // 条目内进度单调不减
    let checkpoints: Vec<u8> = events.iter().skip(1).map(|e| e.item_progress).collect();
    for pair in checkpoints.windows(2) {
        assert!(pair[0] <= pair[1]);
    }

    // 完成事件里成功计数已经加一
    let completed = events
        .iter()
        .find(|e| matches!(e.stage, ProcessingStage::Completed) && !e.title.is_empty())
        .unwrap();
    assert_eq!(completed.success_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_item_without_openreview_url_fails_validation() {
    let fetcher = MockFetcher::new();
    let store = MockStore::default();
    let processor = BatchProcessor::new(fetcher, store, DefaultLocator, test_config());

    let item = SourceItem {
        key: "item-1".to_string(),
        title: "没有链接的条目".to_string(),
        url: Some("https://example.com/not-a-forum".to_string()),
        attachment_urls: Vec::new(),
        note_texts: Vec::new(),
    };

    let result = processor.process_batch(&[item]).await;
    assert_eq!(result.failure_count, 1);
    assert!(result.results[0].error.is_some());
}

// ========== 真实网络测试 ==========

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_fetch_real_forum() {
    use openreview_import::api::{extract_forum_id, OpenReviewClient};
    use openreview_import::logger;

    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::from_env();

    let url = std::env::var("TEST_FORUM_URL").expect("请设置 TEST_FORUM_URL 环境变量");
    let forum_id = extract_forum_id(&url).expect("无法从链接中提取论坛ID");

    let client = OpenReviewClient::new(&config).expect("创建客户端失败");
    let root = client.fetch_root_note(&forum_id).await.expect("获取主论文失败");
    println!("论文标题: {:?}", root.content_text("title"));

    let notes = client.fetch_all_notes(&forum_id).await.expect("获取讨论记录失败");
    println!("共 {} 条记录", notes.len());
    assert!(!notes.is_empty());
}
