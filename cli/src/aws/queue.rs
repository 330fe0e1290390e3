use crate::config::Settings;
use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::types::QueueAttributeName;
use eyre::{OptionExt, WrapErr};

/// Task queue endpoints the rest of the deployment hangs off
#[derive(Clone, Debug)]
pub(crate) struct ProvisionedQueue {
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) arn: String,
}

/// Look the queue up by name and create it only when absent
///
/// An existing queue is reused as is, even when its attributes differ from
/// the configured ones
pub(crate) async fn ensure(
    client: &aws_sdk_sqs::Client,
    settings: &Settings,
) -> eyre::Result<ProvisionedQueue> {
    let name = settings.queue_name.clone();

    let url = match lookup(client, &name).await? {
        Some(url) => {
            log::info!("Queue {name} already exists");
            url
        }
        None => {
            create(client, &name, settings).await?;

            lookup(client, &name)
                .await?
                .ok_or_eyre("The queue is still missing right after creation")?
        }
    };

    let arn = queue_arn(client, &url).await?;

    Ok(ProvisionedQueue { name, url, arn })
}

async fn lookup(client: &aws_sdk_sqs::Client, name: &str) -> eyre::Result<Option<String>> {
    let result = client.get_queue_url().queue_name(name).send().await;

    match result {
        Ok(output) => Ok(Some(
            output
                .queue_url()
                .ok_or_eyre("The queue lookup returned no URL")?
                .to_string(),
        )),
        Err(error) => {
            if let SdkError::ServiceError(service) = &error {
                if service.err().is_queue_does_not_exist() {
                    return Ok(None);
                }
            }

            Err(error).wrap_err(format!("Could not look up the queue {name}"))
        }
    }
}

async fn create(
    client: &aws_sdk_sqs::Client,
    name: &str,
    settings: &Settings,
) -> eyre::Result<()> {
    log::info!("Creating queue {name}");

    client
        .create_queue()
        .queue_name(name)
        .attributes(
            QueueAttributeName::VisibilityTimeout,
            settings.visibility_timeout.to_string(),
        )
        .attributes(
            QueueAttributeName::MessageRetentionPeriod,
            settings.retention_period.to_string(),
        )
        .send()
        .await
        .wrap_err(format!("Could not create the queue {name}"))?;

    Ok(())
}

async fn queue_arn(client: &aws_sdk_sqs::Client, url: &str) -> eyre::Result<String> {
    let output = client
        .get_queue_attributes()
        .queue_url(url)
        .attribute_names(QueueAttributeName::QueueArn)
        .send()
        .await
        .wrap_err("Could not read the queue attributes")?;

    output
        .attributes()
        .and_then(|attributes| attributes.get(&QueueAttributeName::QueueArn))
        .cloned()
        .ok_or_eyre("The queue has no ARN attribute")
}
