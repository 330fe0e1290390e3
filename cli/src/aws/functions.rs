use crate::aws::queue::ProvisionedQueue;
use crate::config::{DeployEnv, FunctionSettings};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, LastUpdateStatus};
use eyre::WrapErr;
use std::collections::HashMap;
use std::time::Duration;

/// Environment both functions run with
///
/// DEPLOY_REGION carries the region because Lambda reserves AWS_REGION for
/// its own runtime
pub(crate) fn function_environment(
    env: &DeployEnv,
    queue: &ProvisionedQueue,
) -> HashMap<String, String> {
    HashMap::from([
        ("S3_BUCKET_NAME".to_string(), env.bucket.clone()),
        ("SQS_QUEUE_URL".to_string(), queue.url.clone()),
        ("QUEUE_NAME".to_string(), queue.name.clone()),
        (
            "WORKER_FUNCTION_NAME".to_string(),
            env.worker_function.clone(),
        ),
        ("DEPLOY_REGION".to_string(), env.region.clone()),
    ])
}

/// Push the configuration first and the code second
///
/// Returns the code digest reported by Lambda, for later verification
pub(crate) async fn update(
    client: &aws_sdk_lambda::Client,
    name: &str,
    settings: FunctionSettings,
    role_arn: &str,
    environment: &HashMap<String, String>,
    archive: &[u8],
) -> eyre::Result<String> {
    log::info!("Updating the configuration of {name}");

    client
        .update_function_configuration()
        .function_name(name)
        .timeout(settings.timeout)
        .memory_size(settings.memory)
        .role(role_arn)
        .environment(
            Environment::builder()
                .set_variables(Some(environment.clone()))
                .build(),
        )
        .send()
        .await
        .wrap_err(format!("Could not update the configuration of {name}"))?;

    await_settled(client, name).await?;

    log::info!("Updating the code of {name}");

    let output = client
        .update_function_code()
        .function_name(name)
        .zip_file(Blob::new(archive.to_vec()))
        .send()
        .await
        .wrap_err(format!("Could not update the code of {name}"))?;

    Ok(output.code_sha256().unwrap_or_default().to_string())
}

/// Lambda rejects a code push while the configuration update is still
/// propagating, so wait until the function leaves InProgress
async fn await_settled(client: &aws_sdk_lambda::Client, name: &str) -> eyre::Result<()> {
    for _ in 0..30 {
        let output = client
            .get_function_configuration()
            .function_name(name)
            .send()
            .await
            .wrap_err(format!("Could not read the state of {name}"))?;

        match output.last_update_status() {
            Some(LastUpdateStatus::InProgress) => {
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
            _ => return Ok(()),
        }
    }

    log::warn!("{name} is still updating after the settle window, pushing the code anyway");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeployEnv;
    use std::collections::HashMap;

    #[test]
    fn environment_covers_what_the_functions_read() {
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

        let env = DeployEnv::from_vars(&vars).unwrap();

        let queue = ProvisionedQueue {
            name: "gdelt-task-queue".to_string(),
            url: "https://sqs.eu-west-1.amazonaws.com/123456789012/gdelt-task-queue".to_string(),
            arn: "arn:aws:sqs:eu-west-1:123456789012:gdelt-task-queue".to_string(),
        };

        let environment = function_environment(&env, &queue);

        assert_eq!(environment["S3_BUCKET_NAME"], "articles");
        assert_eq!(environment["SQS_QUEUE_URL"], queue.url);
        assert_eq!(environment["QUEUE_NAME"], "gdelt-task-queue");
        assert_eq!(environment["WORKER_FUNCTION_NAME"], "gdelt-worker");
        assert_eq!(environment["DEPLOY_REGION"], "eu-west-1");
        assert!(!environment.contains_key("AWS_REGION"));
    }
}
