use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use common::gdelt::{Fetched, GdeltClient};
use common::task::Task;
use eyre::WrapErr;

/// Object storage the functions persist documents to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// `None` when the key does not exist.
    async fn get(&self, key: &str) -> eyre::Result<Option<Vec<u8>>>;

    async fn put(&self, key: &str, body: Vec<u8>) -> eyre::Result<()>;
}

/// Task channel between the collector and the workers.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn send(&self, body: String) -> eyre::Result<()>;

    async fn delete(&self, receipt_handle: &str) -> eyre::Result<()>;
}

/// Upstream article source, one fetch per task.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch(&self, task: &Task) -> Fetched;
}

/// Environment lookup with a readable failure for missing configuration.
pub fn required_env(name: &str) -> eyre::Result<String> {
    std::env::var(name).wrap_err(format!("{name} is missing from the environment"))
}

pub(crate) async fn put_json<T: serde::Serialize>(
    store: &impl ObjectStore,
    key: &str,
    value: &T,
) -> eyre::Result<()> {
    let body = serde_json::to_vec(value).wrap_err("could not serialize document")?;
    store.put(key, body).await
}

pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    pub fn new(config: &aws_config::SdkConfig, bucket: String) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> eyre::Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let data = output
                    .body
                    .collect()
                    .await
                    .wrap_err("could not read object body")?;

                Ok(Some(data.into_bytes().to_vec()))
            }
            Err(error) => {
                let error = error.into_service_error();

                if error.is_no_such_key() {
                    return Ok(None);
                }

                Err(error).wrap_err(format!("could not get s3://{}/{key}", self.bucket))
            }
        }
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> eyre::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .wrap_err(format!("could not put s3://{}/{key}", self.bucket))?;

        Ok(())
    }
}

pub struct SqsTaskQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsTaskQueue {
    pub fn new(config: &aws_config::SdkConfig, queue_url: String) -> Self {
        Self {
            client: aws_sdk_sqs::Client::new(config),
            queue_url,
        }
    }
}

#[async_trait]
impl TaskQueue for SqsTaskQueue {
    async fn send(&self, body: String) -> eyre::Result<()> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .wrap_err("could not send task to the queue")?;

        Ok(())
    }

    async fn delete(&self, receipt_handle: &str) -> eyre::Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .wrap_err("could not delete message from the queue")?;

        Ok(())
    }
}

#[derive(Default)]
pub struct GdeltSource {
    client: GdeltClient,
}

impl GdeltSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleSource for GdeltSource {
    async fn fetch(&self, task: &Task) -> Fetched {
        self.client.fetch(task).await
    }
}
