use crate::aws::queue::ProvisionedQueue;
use crate::config::DeployEnv;
use crate::progress;
use aws_sdk_lambda::types::{LastUpdateStatus, State};
use base64::Engine;

/// Check that the worker still has a mapping for the provisioned queue
///
/// Verification never fails the deployment, it only warns
pub(crate) async fn mapping(
    client: &aws_sdk_lambda::Client,
    env: &DeployEnv,
    queue: &ProvisionedQueue,
) {
    let listing = match client
        .list_event_source_mappings()
        .function_name(&env.worker_function)
        .send()
        .await
    {
        Ok(listing) => listing,
        Err(error) => {
            progress::warn_line("Could not list the event source mappings to verify the trigger");
            log::warn!("{error:#?}");
            return;
        }
    };

    let found = listing
        .event_source_mappings()
        .iter()
        .find(|mapping| mapping.event_source_arn() == Some(queue.arn.as_str()));

    match found {
        Some(mapping) => {
            let state = mapping.state().unwrap_or("unknown");
            log::info!("The queue trigger is {state}");

            if state != "Enabled" && state != "Creating" && state != "Enabling" {
                progress::warn_line(&format!("The queue trigger is in state {state}"));
            }
        }
        None => {
            progress::warn_line(&format!(
                "No event source mapping from {} to {}",
                queue.name, env.worker_function
            ));
        }
    }
}

/// Check one function after its update: active, settled, and running the
/// archive that was just uploaded
pub(crate) async fn function(client: &aws_sdk_lambda::Client, name: &str, local_sha256_hex: &str) {
    let output = match client
        .get_function_configuration()
        .function_name(name)
        .send()
        .await
    {
        Ok(output) => output,
        Err(error) => {
            progress::warn_line(&format!("Could not read the state of {name} to verify it"));
            log::warn!("{error:#?}");
            return;
        }
    };

    match output.state() {
        Some(State::Active) => {}
        Some(state) => progress::warn_line(&format!("{name} is in state {}", state.as_str())),
        None => progress::warn_line(&format!("{name} reported no state")),
    }

    if let Some(LastUpdateStatus::Failed) = output.last_update_status() {
        let reason = output.last_update_status_reason().unwrap_or("no reason given");
        progress::warn_line(&format!("The last update of {name} failed: {reason}"));
    }

    match output.code_sha256().and_then(remote_sha_to_hex) {
        Some(remote) if remote == local_sha256_hex => {
            log::info!("{name} runs the uploaded archive");
        }
        Some(remote) => {
            progress::warn_line(&format!(
                "{name} reports code digest {remote}, expected {local_sha256_hex}"
            ));
        }
        None => {
            progress::warn_line(&format!("{name} reported no readable code digest"));
        }
    }
}

/// Lambda reports the digest as base64 of the raw bytes, local hashing
/// yields lowercase hex
fn remote_sha_to_hex(code_sha256: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(code_sha256)
        .ok()?;

    Some(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_remote_digest_to_hex() {
        assert_eq!(remote_sha_to_hex("q80="), Some("abcd".to_string()));
    }

    #[test]
    fn rejects_digests_that_are_not_base64() {
        assert_eq!(remote_sha_to_hex("not base64!!!"), None);
    }

    #[test]
    fn matches_a_real_archive_digest() {
        let digest = sha256::digest(b"fake binary".as_slice());
        let encoded = base64::engine::general_purpose::STANDARD.encode(
            (0..digest.len())
                .step_by(2)
                .map(|i| u8::from_str_radix(&digest[i..i + 2], 16).unwrap())
                .collect::<Vec<u8>>(),
        );

        assert_eq!(remote_sha_to_hex(&encoded), Some(digest));
    }
}
