use aws_config::BehaviorVersion;
use functions::adapters::{required_env, S3Store, SqsTaskQueue};
use functions::collector;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bucket = required_env("S3_BUCKET_NAME")?;
    let queue_url = required_env("SQS_QUEUE_URL")?;

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = S3Store::new(&config, bucket.clone());
    let queue = SqsTaskQueue::new(&config, queue_url);

    let store_ref = &store;
    let queue_ref = &queue;
    let bucket_ref = bucket.as_str();

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<_, Error>(collector::handle(event.payload, store_ref, queue_ref, bucket_ref).await)
    }))
    .await
}
