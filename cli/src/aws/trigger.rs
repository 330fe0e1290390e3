use crate::aws::queue::ProvisionedQueue;
use crate::config::{DeployEnv, Settings};
use common::retry::RetryPolicy;
use eyre::{OptionExt, WrapErr};
use std::time::Duration;

/// How replacing the queue trigger ended
pub(crate) enum TriggerOutcome {
    /// The event source mapping is in place
    Created { uuid: String },

    /// All attempts failed, the printed command creates it by hand
    Manual { command: String },
}

/// Drop whatever mappings the worker currently has and create a fresh one
/// with a batch size of one
///
/// Creation is retried, and running out of attempts is not fatal: the
/// deployment continues and the operator gets the equivalent command instead
pub(crate) async fn replace(
    client: &aws_sdk_lambda::Client,
    settings: &Settings,
    env: &DeployEnv,
    queue: &ProvisionedQueue,
) -> eyre::Result<TriggerOutcome> {
    remove_existing(client, &env.worker_function, settings.trigger_settle_delay).await?;

    let policy = RetryPolicy::fixed(settings.trigger_attempts, settings.trigger_retry_delay);

    let created = policy
        .run("create event source mapping", || create(client, env, queue))
        .await;

    match created {
        Ok(uuid) => {
            log::info!("Created event source mapping {uuid}");
            Ok(TriggerOutcome::Created { uuid })
        }
        Err(error) => {
            log::warn!("Could not create the event source mapping: {error:#}");

            Ok(TriggerOutcome::Manual {
                command: manual_command(env, queue),
            })
        }
    }
}

/// The exact command an operator can paste when automatic creation failed
pub(crate) fn manual_command(env: &DeployEnv, queue: &ProvisionedQueue) -> String {
    format!(
        "aws lambda create-event-source-mapping \
         --function-name {} --event-source-arn {} --batch-size 1 --region {}",
        env.worker_function, queue.arn, env.region
    )
}

/// Delete every mapping attached to the worker, pausing after each deletion
/// so the queue is not consumed from two mappings at once
async fn remove_existing(
    client: &aws_sdk_lambda::Client,
    function: &str,
    settle_delay: Duration,
) -> eyre::Result<()> {
    let uuids = list_mappings(client, function).await?;

    if uuids.is_empty() {
        log::info!("No existing event source mappings for {function}");
        return Ok(());
    }

    for uuid in uuids {
        log::info!("Deleting event source mapping {uuid}");

        client
            .delete_event_source_mapping()
            .uuid(&uuid)
            .send()
            .await
            .wrap_err(format!("Could not delete the event source mapping {uuid}"))?;

        tokio::time::sleep(settle_delay).await;
    }

    Ok(())
}

async fn list_mappings(
    client: &aws_sdk_lambda::Client,
    function: &str,
) -> eyre::Result<Vec<String>> {
    let mut uuids = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let listing = client
            .list_event_source_mappings()
            .function_name(function)
            .set_marker(marker)
            .send()
            .await
            .wrap_err("Could not list the event source mappings")?;

        uuids.extend(
            listing
                .event_source_mappings()
                .iter()
                .filter_map(|mapping| mapping.uuid().map(str::to_string)),
        );

        marker = listing.next_marker().map(str::to_string);

        if marker.is_none() {
            break;
        }
    }

    Ok(uuids)
}

async fn create(
    client: &aws_sdk_lambda::Client,
    env: &DeployEnv,
    queue: &ProvisionedQueue,
) -> eyre::Result<String> {
    let output = client
        .create_event_source_mapping()
        .function_name(&env.worker_function)
        .event_source_arn(&queue.arn)
        .batch_size(1)
        .enabled(true)
        .send()
        .await
        .wrap_err("The mapping creation was rejected")?;

    output
        .uuid()
        .map(str::to_string)
        .ok_or_eyre("The mapping was created without a UUID")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env() -> DeployEnv {
        let vars: HashMap<String, String> = [
            ("AWS_ACCOUNT_ID", "123456789012"),
            ("AWS_REGION", "eu-west-1"),
            ("S3_BUCKET_NAME", "articles"),
            ("COLLECTOR_FUNCTION_NAME", "gdelt-collector"),
            ("WORKER_FUNCTION_NAME", "gdelt-worker"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

        DeployEnv::from_vars(&vars).unwrap()
    }

    #[test]
    fn manual_command_matches_the_automatic_parameters() {
        let queue = ProvisionedQueue {
            name: "gdelt-task-queue".to_string(),
            url: "https://sqs.eu-west-1.amazonaws.com/123456789012/gdelt-task-queue".to_string(),
            arn: "arn:aws:sqs:eu-west-1:123456789012:gdelt-task-queue".to_string(),
        };

        let command = manual_command(&env(), &queue);

        assert_eq!(
            command,
            "aws lambda create-event-source-mapping \
             --function-name gdelt-worker \
             --event-source-arn arn:aws:sqs:eu-west-1:123456789012:gdelt-task-queue \
             --batch-size 1 --region eu-west-1"
        );
    }
}
