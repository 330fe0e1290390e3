//! Collector to worker flow over in-memory adapters: fan out a request,
//! feed the queued tasks back as SQS records, and check that the collection
//! converges to completed with one article document per task.

use async_trait::async_trait;
use aws_lambda_events::sqs::SqsEvent;
use common::article::{articles_key, Article, ArticleDocument};
use common::gdelt::Fetched;
use common::status::{CallPhase, CollectionPhase, CollectionStatus};
use common::task::Task;
use functions::adapters::{ArticleSource, ObjectStore, TaskQueue};
use functions::{collector, worker};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    fn document<T: serde::de::DeserializeOwned>(&self, key: &str) -> T {
        let objects = self.objects.lock().unwrap();
        let raw = objects.get(key).unwrap_or_else(|| panic!("missing {key}"));
        serde_json::from_slice(raw).unwrap()
    }

    fn keys_under(&self, prefix: &str) -> Vec<String> {
        let objects = self.objects.lock().unwrap();
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> eyre::Result<Option<Vec<u8>>> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> eyre::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryQueue {
    sent: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    async fn send(&self, body: String) -> eyre::Result<()> {
        self.sent.lock().unwrap().push(body);
        Ok(())
    }

    async fn delete(&self, receipt_handle: &str) -> eyre::Result<()> {
        self.deleted.lock().unwrap().push(receipt_handle.to_string());
        Ok(())
    }
}

/// One article per fetch, so total articles equals total tasks.
struct OnePerFetch;

#[async_trait]
impl ArticleSource for OnePerFetch {
    async fn fetch(&self, task: &Task) -> Fetched {
        let article = Article {
            title: "No title".into(),
            url: format!("https://news.test/{}", task.label()),
            url_mobile: String::new(),
            date: None,
            year: task.year,
            month: task.month,
            socialimage: String::new(),
            source_country: "Germany".into(),
            source_domain: "news.test".into(),
            language: "eng".into(),
            region: task.region,
            query: task.query.clone(),
        };

        Fetched {
            articles: vec![article],
            url: format!("https://api.test/{}", task.label()),
        }
    }
}

fn drain_into_event(queue: &MemoryQueue) -> SqsEvent {
    let records: Vec<_> = queue
        .sent
        .lock()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(index, body)| {
            json!({
                "body": body,
                "receiptHandle": format!("receipt-{index}"),
            })
        })
        .collect();

    serde_json::from_value(json!({ "Records": records })).unwrap()
}

#[tokio::test]
async fn collection_converges_to_completed() {
    let store = MemoryStore::default();
    let queue = MemoryQueue::default();

    let request = json!({
        "query": "renewable energy",
        "max_articles_per_month": 3,
        "years_back": 0,
        "regions": ["europe", "oceania"],
    });

    let response = collector::handle(request, &store, &queue, "bucket").await;
    assert_eq!(response.status_code, 200);

    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    let total = body["total_tasks"].as_u64().unwrap();
    assert_eq!(total, 2, "one month, two regions");
    assert_eq!(body["queued_tasks"], total);

    let status_key = body["status_key"].as_str().unwrap().to_string();
    let before: CollectionStatus = store.document(&status_key);
    assert_eq!(before.status, CollectionPhase::Running);

    let event = drain_into_event(&queue);
    let worker_response = worker::handle(event, &store, &queue, &OnePerFetch).await;

    let worker_body: serde_json::Value = serde_json::from_str(&worker_response.body).unwrap();
    assert_eq!(worker_body["success_count"], total);
    assert_eq!(worker_body["failure_count"], 0);

    // Every queued task left exactly one article document behind
    let tasks: Vec<Task> = queue
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|body| serde_json::from_str(body).unwrap())
        .collect();

    for task in &tasks {
        let key = articles_key(&task.collection_id, task.year, task.month, task.region);
        let document: ArticleDocument = store.document(&key);
        assert_eq!(document.article_count, 1);
        assert_eq!(document.query, "renewable energy");
    }

    let call_keys = store.keys_under("status/api/");
    assert_eq!(call_keys.len(), tasks.len());
    for key in &call_keys {
        let call: common::status::ApiCallStatus = store.document(key);
        assert_eq!(call.status, CallPhase::Completed);
        assert_eq!(call.articles_found, 1);
    }

    let after: CollectionStatus = store.document(&status_key);
    assert_eq!(after.status, CollectionPhase::Completed);
    assert_eq!(after.completed_tasks as u64, total);
    assert_eq!(after.total_articles, total);
    assert!(after.completed_at.is_some());

    assert_eq!(queue.deleted.lock().unwrap().len(), tasks.len());
}
