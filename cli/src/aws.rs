pub(crate) mod functions;
pub(crate) mod queue;
pub(crate) mod trigger;
pub(crate) mod verify;

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Shared SDK configuration pinned to the configured deployment region
pub(crate) async fn sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
