use crate::aws;
use crate::commands::status::StatusCommand;
use crate::config::DeployEnv;
use crate::error::Error;
use crate::progress;
use crate::runner::Runner;
use common::status::{CollectionStatus, API_STATUS_PREFIX, STATUS_PREFIX};
use eyre::WrapErr;
use tabled::settings::{peaker::Priority, style::Style, Settings, Width};
use tabled::{Table, Tabled};
use terminal_size::{terminal_size, Width as TerminalWidth};

pub(crate) struct StatusRunner {
    pub(crate) command: StatusCommand,
}

#[derive(Tabled)]
struct CollectionRow {
    #[tabled(rename = "Collection")]
    collection: String,
    #[tabled(rename = "Query")]
    query: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Tasks")]
    tasks: String,
    #[tabled(rename = "Articles")]
    articles: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl Runner for StatusRunner {
    /// Read the status documents from the bucket and render them
    async fn run(&mut self) -> Result<(), Error> {
        let env = DeployEnv::resolve()?;
        let config = aws::sdk_config(&env.region).await;
        let s3 = aws_sdk_s3::Client::new(&config);

        let keys = list_status_keys(&s3, &env.bucket).await?;

        let fetches = keys
            .iter()
            .map(|key| fetch_status(&s3, &env.bucket, key));

        let mut statuses: Vec<CollectionStatus> = futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect();

        // RFC 3339 UTC stamps sort chronologically as strings
        statuses.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));

        match &self.command.collection_id {
            Some(wanted) => {
                let found = statuses.iter().find(|status| {
                    status.collection_id == *wanted || status.collection_id.starts_with(wanted)
                });

                match found {
                    Some(status) => print_detail(status),
                    None => {
                        return Err(self.error(
                            Some("Collection not found"),
                            Some("Run \"gdelt status\" to list the known collections"),
                            None,
                        ))
                    }
                }
            }
            None => print_table(&statuses),
        }

        Ok(())
    }
}

async fn list_status_keys(s3: &aws_sdk_s3::Client, bucket: &str) -> eyre::Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let listing = s3
            .list_objects_v2()
            .bucket(bucket)
            .prefix(STATUS_PREFIX)
            .set_continuation_token(token)
            .send()
            .await
            .wrap_err("Could not list the status documents")?;

        keys.extend(
            listing
                .contents()
                .iter()
                .filter_map(|object| object.key())
                .filter(|key| !key.starts_with(API_STATUS_PREFIX))
                .map(str::to_string),
        );

        token = listing.next_continuation_token().map(str::to_string);

        if token.is_none() {
            break;
        }
    }

    Ok(keys)
}

/// A document that fails to download or parse is skipped, not fatal
async fn fetch_status(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Option<CollectionStatus> {
    let output = match s3.get_object().bucket(bucket).key(key).send().await {
        Ok(output) => output,
        Err(error) => {
            log::warn!("Skipping {key}: {error}");
            return None;
        }
    };

    let bytes = match output.body.collect().await {
        Ok(data) => data.into_bytes(),
        Err(error) => {
            log::warn!("Skipping {key}: {error}");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(status) => Some(status),
        Err(error) => {
            log::warn!("Skipping {key}: {error}");
            None
        }
    }
}

fn print_table(statuses: &[CollectionStatus]) {
    if statuses.is_empty() {
        println!("{}", console::style("No collections yet").yellow().bold());
        return;
    }

    let rows = statuses.iter().map(|status| CollectionRow {
        collection: status.collection_id.clone(),
        query: status.query.clone(),
        status: status.status.as_str().to_string(),
        tasks: format!("{}/{}", status.completed_tasks, status.total_tasks),
        articles: status.total_articles.to_string(),
        updated: age(&status.last_updated),
    });

    let width = terminal_width();

    let settings = Settings::default()
        .with(Width::wrap(width).priority(Priority::max(true)))
        .with(Width::increase(width));

    let mut table = Table::new(rows);
    table.with(Style::modern()).with(settings);

    println!("{table}");
}

fn print_detail(status: &CollectionStatus) {
    progress::stage_line("Collection", &status.collection_id);

    println!("    Query         {}", status.query);
    println!("    Status        {}", status.status.as_str());
    println!(
        "    Tasks         {}/{}",
        status.completed_tasks, status.total_tasks
    );
    println!("    Articles      {}", status.total_articles);
    println!("    Started       {}", status.start_time);
    println!("    Last updated  {}", status.last_updated);

    if let Some(completed_at) = &status.completed_at {
        println!("    Completed     {completed_at}");
    }

    if let Some(error) = &status.error_message {
        println!("    {}         {error}", console::style("Error").red().bold());
    }
}

fn terminal_width() -> usize {
    terminal_size()
        .map(|(TerminalWidth(width), _)| width as usize)
        .unwrap_or(120)
}

/// How long ago the stamp was, or the stamp itself when it does not parse
fn age(stamp: &str) -> String {
    let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(stamp) else {
        return stamp.to_string();
    };

    let seconds = (chrono::Utc::now() - parsed.with_timezone(&chrono::Utc))
        .num_seconds()
        .max(0) as u64;

    rounded_age(seconds)
}

/// Sub-minute precision is noise in a table
fn rounded_age(mut seconds: u64) -> String {
    if seconds >= 60 {
        seconds -= seconds % 60;
    }

    format!(
        "{} ago",
        humantime::format_duration(std::time::Duration::from_secs(seconds))
    )
}
