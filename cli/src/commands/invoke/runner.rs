use crate::aws;
use crate::commands::invoke::InvokeCommand;
use crate::config::DeployEnv;
use crate::error::Error;
use crate::progress;
use crate::runner::Runner;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use common::response::Response;
use eyre::{eyre, OptionExt, WrapErr};
use serde_json::Value;

pub(crate) struct InvokeRunner {
    pub(crate) command: InvokeCommand,
}

impl Runner for InvokeRunner {
    /// Invoke the collector synchronously and report the fan-out it queued
    async fn run(&mut self) -> Result<(), Error> {
        let env = DeployEnv::resolve()?;
        let config = aws::sdk_config(&env.region).await;
        let lambda = aws_sdk_lambda::Client::new(&config);

        progress::stage_line("Invoking", &env.collector_function);

        let payload = self.payload();

        let output = lambda
            .invoke()
            .function_name(&env.collector_function)
            .invocation_type(InvocationType::RequestResponse)
            .payload(Blob::new(
                serde_json::to_vec(&payload).wrap_err("Could not encode the request")?,
            ))
            .send()
            .await
            .wrap_err("Could not invoke the collector function")?;

        if let Some(error) = output.function_error() {
            return Err(self.error(
                Some("The collector crashed"),
                Some(error),
                None,
            ));
        }

        let raw = output
            .payload()
            .ok_or_eyre("The collector returned no payload")?;

        let response: Response = serde_json::from_slice(raw.as_ref())
            .wrap_err("The collector response is not in the expected shape")?;

        let body = response.parsed_body();

        if response.status_code != 200 {
            let message = body["error"].as_str().unwrap_or("no error message");
            return Err(eyre!("The collector refused the request: {message}").into());
        }

        self.report(&env, &body);
        Ok(())
    }
}

impl InvokeRunner {
    /// Only what the user set goes over the wire, the collector fills in
    /// its own defaults for the rest
    fn payload(&self) -> Value {
        let mut payload = serde_json::Map::new();

        payload.insert(
            "query".to_string(),
            Value::String(self.command.query.clone()),
        );

        if let Some(max_articles) = self.command.max_articles {
            payload.insert("max_articles_per_month".to_string(), max_articles.into());
        }

        if let Some(years_back) = self.command.years_back {
            payload.insert("years_back".to_string(), years_back.into());
        }

        if !self.command.regions.is_empty() {
            payload.insert(
                "regions".to_string(),
                self.command
                    .regions
                    .iter()
                    .map(|region| region.as_str())
                    .collect::<Vec<_>>()
                    .into(),
            );
        }

        Value::Object(payload)
    }

    fn report(&self, env: &DeployEnv, body: &Value) {
        let collection_id = body["collection_id"].as_str().unwrap_or("unknown");

        progress::stage_line("Started", &format!("collection {collection_id}"));

        println!(
            "    Queued {} of {} tasks",
            body["queued_tasks"], body["total_tasks"]
        );

        if let Some(status_key) = body["status_key"].as_str() {
            println!("    Status document s3://{}/{}", env.bucket, status_key);
        }

        if let Some(expected) = body["expected_files"].as_str() {
            println!("    Articles will appear as {expected}");
        }

        println!(
            "{}",
            console::style(format!(
                "Watch the progress with \"gdelt status {collection_id}\""
            ))
            .dim()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::region::Region;

    fn command(regions: Vec<Region>) -> InvokeCommand {
        InvokeCommand {
            query: "climate change".to_string(),
            max_articles: None,
            years_back: Some(1),
            regions,
        }
    }

    #[test]
    fn payload_carries_only_what_was_set() {
        let runner = InvokeRunner {
            command: command(vec![]),
        };

        let payload = runner.payload();

        assert_eq!(payload["query"], "climate change");
        assert_eq!(payload["years_back"], 1);
        assert!(payload.get("max_articles_per_month").is_none());
        assert!(payload.get("regions").is_none());
    }

    #[test]
    fn regions_are_sent_in_wire_format() {
        let runner = InvokeRunner {
            command: command(vec![Region::NorthAmerica, Region::Oceania]),
        };

        let payload = runner.payload();

        assert_eq!(
            payload["regions"],
            serde_json::json!(["north_america", "oceania"])
        );
    }
}
