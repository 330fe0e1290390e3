use crate::adapters::{put_json, ArticleSource, ObjectStore, TaskQueue};
use aws_lambda_events::sqs::{SqsEvent, SqsMessage};
use common::article::ArticleDocument;
use common::response::Response;
use common::status::{status_key, ApiCallStatus, CollectionStatus};
use common::task::Task;
use eyre::{OptionExt, WrapErr};
use serde_json::json;

/// Drain a batch of task messages: fetch, persist, advance both status
/// documents, and delete each message that fully succeeded. Failed records
/// stay on the queue and reappear after the visibility timeout.
pub async fn handle(
    event: SqsEvent,
    store: &impl ObjectStore,
    queue: &impl TaskQueue,
    source: &impl ArticleSource,
) -> Response {
    if event.records.is_empty() {
        log::error!("no records found in event");
        return Response::error(400, "No records found in event");
    }

    log::info!("received event with {} records", event.records.len());

    let mut success_count = 0u32;
    let mut failure_count = 0u32;

    for record in &event.records {
        match process_record(record, store, source).await {
            Ok(()) => {
                success_count += 1;
                delete_message(queue, record).await;
            }
            Err(error) => {
                failure_count += 1;
                log::error!("task failed: {error:#}");
            }
        }
    }

    log::info!("processing completed: {success_count} successes, {failure_count} failures");

    Response::ok(&json!({
        "message": "Processing completed",
        "success_count": success_count,
        "failure_count": failure_count,
    }))
}

/// Deletion failures are only logged: the message reappears later and the
/// work is redone, which is safe since documents are idempotent per task.
async fn delete_message(queue: &impl TaskQueue, record: &SqsMessage) {
    let Some(receipt_handle) = record.receipt_handle.as_deref() else {
        log::warn!("processed message carries no receipt handle");
        return;
    };

    if let Err(error) = queue.delete(receipt_handle).await {
        log::warn!("could not delete processed message: {error:#}");
    }
}

async fn process_record(
    record: &SqsMessage,
    store: &impl ObjectStore,
    source: &impl ArticleSource,
) -> eyre::Result<()> {
    let body = record.body.as_deref().ok_or_eyre("message has no body")?;
    let task: Task = serde_json::from_str(body).wrap_err("message body is not a task")?;

    log::info!(
        "processing task {} for collection {}",
        task.label(),
        task.collection_id
    );

    let mut call = ApiCallStatus::begin(&task);

    put_json(store, &call.key(), &call)
        .await
        .wrap_err("could not create the api call status")?;

    let fetched = source.fetch(&task).await;
    let document = ArticleDocument::new(&task, &call.api_call_id, fetched.articles, &fetched.url);

    if let Err(error) = put_json(store, &document.key(), &document).await {
        call.fail("Failed to save articles");

        if let Err(status_error) = put_json(store, &call.key(), &call).await {
            log::error!("could not record the failed api call: {status_error:#}");
        }

        return Err(error).wrap_err("could not save articles");
    }

    log::info!(
        "saved {} articles for {}",
        document.article_count,
        task.label()
    );

    call.complete(document.article_count);

    put_json(store, &call.key(), &call)
        .await
        .wrap_err("could not update the api call status")?;

    advance_collection(store, &task, u64::from(document.article_count)).await
}

/// Read-modify-write: two workers landing at the same instant can drop a
/// count. Batch size 1 keeps the window small.
async fn advance_collection(
    store: &impl ObjectStore,
    task: &Task,
    articles_added: u64,
) -> eyre::Result<()> {
    let key = status_key(&task.query, &task.collection_id);

    let mut status = match store
        .get(&key)
        .await
        .wrap_err("could not read the collection status")?
    {
        Some(raw) => serde_json::from_slice::<CollectionStatus>(&raw)
            .wrap_err("collection status document is corrupt")?,
        None => {
            log::info!(
                "creating new status file for collection {}",
                task.collection_id
            );
            CollectionStatus::recovered(task)
        }
    };

    status.absorb_completed_task(articles_added);

    put_json(store, &key, &status)
        .await
        .wrap_err("could not update the collection status")?;

    log::info!(
        "collection {}: {}/{} tasks, {} articles",
        status.collection_id,
        status.completed_tasks,
        status.total_tasks,
        status.total_articles
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::article::Article;
    use common::gdelt::Fetched;
    use common::region::Region;
    use common::status::{CallPhase, CollectionPhase};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        refuse_put_prefix: Option<&'static str>,
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

        fn seed<T: serde::Serialize>(&self, key: &str, value: &T) {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), serde_json::to_vec(value).unwrap());
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn get(&self, key: &str) -> eyre::Result<Option<Vec<u8>>> {
            Ok(self.objects.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, body: Vec<u8>) -> eyre::Result<()> {
            if let Some(prefix) = self.refuse_put_prefix {
                if key.starts_with(prefix) {
                    eyre::bail!("store refused {key}");
                }
            }

            self.objects.lock().unwrap().insert(key.to_string(), body);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryQueue {
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TaskQueue for MemoryQueue {
        async fn send(&self, _body: String) -> eyre::Result<()> {
            Ok(())
        }

        async fn delete(&self, receipt_handle: &str) -> eyre::Result<()> {
            self.deleted.lock().unwrap().push(receipt_handle.to_string());
            Ok(())
        }
    }

    struct StubSource {
        articles_per_fetch: usize,
    }

    #[async_trait]
    impl ArticleSource for StubSource {
        async fn fetch(&self, task: &Task) -> Fetched {
            let articles = (0..self.articles_per_fetch)
                .map(|index| Article {
                    title: format!("Article {index}"),
                    url: format!("https://news.test/{index}"),
                    url_mobile: String::new(),
                    date: Some("2024-03-01 08:00:00".into()),
                    year: task.year,
                    month: task.month,
                    socialimage: String::new(),
                    source_country: "Australia".into(),
                    source_domain: "news.test".into(),
                    language: "eng".into(),
                    region: task.region,
                    query: task.query.clone(),
                })
                .collect();

            Fetched {
                articles,
                url: format!("https://api.test/{}", task.label()),
            }
        }
    }

    fn task() -> Task {
        Task {
            collection_id: "c-1".into(),
            query: "ai".into(),
            region: Region::Europe,
            max_articles: 5,
            year: 2024,
            month: 3,
        }
    }

    fn event_for(tasks: &[Task]) -> SqsEvent {
        let records: Vec<_> = tasks
            .iter()
            .enumerate()
            .map(|(index, task)| {
                json!({
                    "body": serde_json::to_string(task).unwrap(),
                    "receiptHandle": format!("receipt-{index}"),
                })
            })
            .collect();

        serde_json::from_value(json!({ "Records": records })).unwrap()
    }

    fn body_of(response: &Response) -> serde_json::Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[tokio::test]
    async fn empty_event_is_a_400() {
        let store = MemoryStore::default();
        let queue = MemoryQueue::default();
        let source = StubSource {
            articles_per_fetch: 0,
        };

        let response = handle(event_for(&[]), &store, &queue, &source).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_of(&response)["error"], "No records found in event");
    }

    #[tokio::test]
    async fn processes_a_task_end_to_end() {
        let store = MemoryStore::default();
        let queue = MemoryQueue::default();
        let source = StubSource {
            articles_per_fetch: 2,
        };

        let seeded = CollectionStatus::initialize("c-1", "ai", 1);
        store.seed(&seeded.key(), &seeded);

        let response = handle(event_for(&[task()]), &store, &queue, &source).await;

        let body = body_of(&response);
        assert_eq!(body["success_count"], 1);
        assert_eq!(body["failure_count"], 0);

        let document: ArticleDocument = store.document("collections/c-1/2024/03/europe.json");
        assert_eq!(document.article_count, 2);
        assert_eq!(document.metadata.max_articles_requested, 5);
        assert!(document.metadata.url_constructed.starts_with("https://api.test/"));

        let call_keys = store.keys_under("status/api/");
        assert_eq!(call_keys.len(), 1);
        let call: ApiCallStatus = store.document(&call_keys[0]);
        assert_eq!(call.status, CallPhase::Completed);
        assert_eq!(call.articles_found, 2);
        assert!(call.end_time.is_some());

        let status: CollectionStatus = store.document("status/ai_c-1.json");
        assert_eq!(status.status, CollectionPhase::Completed);
        assert_eq!(status.completed_tasks, 1);
        assert_eq!(status.total_articles, 2);
        assert!(status.completed_at.is_some());

        assert_eq!(*queue.deleted.lock().unwrap(), vec!["receipt-0".to_string()]);
    }

    #[tokio::test]
    async fn zero_articles_still_count_as_success() {
        let store = MemoryStore::default();
        let queue = MemoryQueue::default();
        let source = StubSource {
            articles_per_fetch: 0,
        };

        let mut seeded = CollectionStatus::initialize("c-1", "ai", 2);
        seeded.mark_running();
        store.seed(&seeded.key(), &seeded);

        let response = handle(event_for(&[task()]), &store, &queue, &source).await;

        assert_eq!(body_of(&response)["success_count"], 1);

        let document: ArticleDocument = store.document("collections/c-1/2024/03/europe.json");
        assert_eq!(document.article_count, 0);
        assert_eq!(document.status, "completed");

        let status: CollectionStatus = store.document("status/ai_c-1.json");
        assert_eq!(status.status, CollectionPhase::Running);
        assert_eq!(status.completed_tasks, 1);
        assert_eq!(status.total_articles, 0);
    }

    #[tokio::test]
    async fn save_failure_fails_the_record_and_keeps_the_message() {
        let store = MemoryStore {
            refuse_put_prefix: Some("collections/"),
            ..Default::default()
        };
        let queue = MemoryQueue::default();
        let source = StubSource {
            articles_per_fetch: 1,
        };

        let response = handle(event_for(&[task()]), &store, &queue, &source).await;

        let body = body_of(&response);
        assert_eq!(body["success_count"], 0);
        assert_eq!(body["failure_count"], 1);
        assert!(queue.deleted.lock().unwrap().is_empty());

        let call_keys = store.keys_under("status/api/");
        assert_eq!(call_keys.len(), 1);
        let call: ApiCallStatus = store.document(&call_keys[0]);
        assert_eq!(call.status, CallPhase::Failed);
        assert_eq!(call.error_message.as_deref(), Some("Failed to save articles"));
    }

    #[tokio::test]
    async fn malformed_body_fails_the_record() {
        let store = MemoryStore::default();
        let queue = MemoryQueue::default();
        let source = StubSource {
            articles_per_fetch: 0,
        };

        let event: SqsEvent = serde_json::from_value(json!({
            "Records": [{ "body": "not a task", "receiptHandle": "receipt-0" }]
        }))
        .unwrap();

        let response = handle(event, &store, &queue, &source).await;

        assert_eq!(body_of(&response)["failure_count"], 1);
        assert!(store.objects.lock().unwrap().is_empty());
        assert!(queue.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_collection_status_is_recreated() {
        let store = MemoryStore::default();
        let queue = MemoryQueue::default();
        let source = StubSource {
            articles_per_fetch: 3,
        };

        let response = handle(event_for(&[task()]), &store, &queue, &source).await;

        assert_eq!(body_of(&response)["success_count"], 1);

        let status: CollectionStatus = store.document("status/ai_c-1.json");
        assert_eq!(status.status, CollectionPhase::Processing);
        assert_eq!(status.total_tasks, 0);
        assert_eq!(status.completed_tasks, 1);
        assert_eq!(status.total_articles, 3);
        assert!(status.completed_at.is_none());
    }
}
