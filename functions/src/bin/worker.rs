use aws_config::BehaviorVersion;
use aws_lambda_events::sqs::SqsEvent;
use functions::adapters::{required_env, GdeltSource, S3Store, SqsTaskQueue};
use functions::worker;
use lambda_runtime::{service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bucket = required_env("S3_BUCKET_NAME")?;
    let queue_url = required_env("SQS_QUEUE_URL")?;

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = S3Store::new(&config, bucket);
    let queue = SqsTaskQueue::new(&config, queue_url);
    let source = GdeltSource::new();

    let store_ref = &store;
    let queue_ref = &queue;
    let source_ref = &source;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        Ok::<_, Error>(worker::handle(event.payload, store_ref, queue_ref, source_ref).await)
    }))
    .await
}
