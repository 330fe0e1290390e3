use crate::bundle::Role;
use crate::error::Error;
use eyre::WrapErr;
use rust_dotenv::dotenv::DotEnv;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub(crate) const CONFIG_FILE: &str = "gdelt.toml";

/// Deployment refuses to start while any of these is unset
pub(crate) const REQUIRED_VARS: [&str; 5] = [
    "AWS_ACCOUNT_ID",
    "AWS_REGION",
    "S3_BUCKET_NAME",
    "COLLECTOR_FUNCTION_NAME",
    "WORKER_FUNCTION_NAME",
];

const DEFAULT_QUEUE_NAME: &str = "gdelt-task-queue";
const DEFAULT_VISIBILITY_TIMEOUT_SECS: u32 = 900;
const DEFAULT_RETENTION_SECS: u32 = 86400;
const DEFAULT_TRIGGER_ATTEMPTS: u32 = 3;
const DEFAULT_TRIGGER_DELAY: Duration = Duration::from_secs(10);
const DEFAULT_ROLE_NAME: &str = "gdelt-lambda-role";
const DEFAULT_TARGET: &str = "x86_64-unknown-linux-musl";

const DEFAULT_COLLECTOR: FunctionSettings = FunctionSettings {
    timeout: 300,
    memory: 256,
};

const DEFAULT_WORKER: FunctionSettings = FunctionSettings {
    timeout: 900,
    memory: 512,
};

/// Account-specific settings, resolved from the process environment with a
/// `.env` file underneath it
#[derive(Clone, Debug)]
pub(crate) struct DeployEnv {
    pub(crate) account_id: String,
    pub(crate) region: String,
    pub(crate) bucket: String,
    pub(crate) collector_function: String,
    pub(crate) worker_function: String,
}

impl DeployEnv {
    pub(crate) fn resolve() -> eyre::Result<Self> {
        let mut vars = HashMap::new();

        if Path::new(".env").exists() {
            for (name, value) in DotEnv::new("").all_vars() {
                vars.insert(name.clone(), value.clone());
            }
        }

        // The process environment wins over the file
        for (name, value) in std::env::vars() {
            vars.insert(name, value);
        }

        Self::from_vars(&vars)
    }

    /// Validate before any remote call is made, naming every missing
    /// variable at once rather than failing on the first one
    pub(crate) fn from_vars(vars: &HashMap<String, String>) -> eyre::Result<Self> {
        let missing = REQUIRED_VARS
            .iter()
            .filter(|name| vars.get(**name).is_none_or(|value| value.trim().is_empty()))
            .copied()
            .collect::<Vec<_>>();

        if !missing.is_empty() {
            return Err(eyre::Report::new(Error::new(
                &format!("Missing required configuration: {}", missing.join(", ")),
                Some("Set the variables in the environment or in a .env file"),
            )));
        }

        let value = |name: &str| vars.get(name).cloned().unwrap_or_default();

        Ok(Self {
            account_id: value("AWS_ACCOUNT_ID"),
            region: value("AWS_REGION"),
            bucket: value("S3_BUCKET_NAME"),
            collector_function: value("COLLECTOR_FUNCTION_NAME"),
            worker_function: value("WORKER_FUNCTION_NAME"),
        })
    }

    pub(crate) fn function_name(&self, role: Role) -> &str {
        match role {
            Role::Collector => &self.collector_function,
            Role::Worker => &self.worker_function,
        }
    }

    pub(crate) fn role_arn(&self, role_name: &str) -> String {
        format!("arn:aws:iam::{}:role/{}", self.account_id, role_name)
    }
}

/// Per-function limits pushed to Lambda
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FunctionSettings {
    pub(crate) timeout: i32,
    pub(crate) memory: i32,
}

/// Tunables from `gdelt.toml`, resolved over built-in defaults
///
/// The file is optional and so is every key in it
#[derive(Clone, Debug)]
pub(crate) struct Settings {
    pub(crate) queue_name: String,
    pub(crate) visibility_timeout: u32,
    pub(crate) retention_period: u32,
    pub(crate) trigger_attempts: u32,
    pub(crate) trigger_retry_delay: Duration,
    pub(crate) trigger_settle_delay: Duration,
    pub(crate) role_name: String,
    pub(crate) collector: FunctionSettings,
    pub(crate) worker: FunctionSettings,
    pub(crate) target: String,
}

impl Settings {
    pub(crate) fn load() -> eyre::Result<Self> {
        let path = Path::new(CONFIG_FILE);

        if !path.exists() {
            return Self::from_file(FileConfig::default());
        }

        let raw = std::fs::read_to_string(path).wrap_err("Could not read gdelt.toml")?;
        let file = toml::from_str::<FileConfig>(&raw).wrap_err("Could not parse gdelt.toml")?;

        Self::from_file(file)
    }

    fn from_file(file: FileConfig) -> eyre::Result<Self> {
        Ok(Self {
            queue_name: file
                .queue
                .name
                .unwrap_or_else(|| DEFAULT_QUEUE_NAME.to_string()),
            visibility_timeout: file
                .queue
                .visibility_timeout_secs
                .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT_SECS),
            retention_period: file.queue.retention_secs.unwrap_or(DEFAULT_RETENTION_SECS),
            trigger_attempts: file
                .trigger
                .max_attempts
                .unwrap_or(DEFAULT_TRIGGER_ATTEMPTS),
            trigger_retry_delay: parse_delay(file.trigger.retry_delay.as_deref())?,
            trigger_settle_delay: parse_delay(file.trigger.settle_delay.as_deref())?,
            role_name: file
                .functions
                .role_name
                .unwrap_or_else(|| DEFAULT_ROLE_NAME.to_string()),
            collector: FunctionSettings {
                timeout: file
                    .functions
                    .collector
                    .timeout_secs
                    .unwrap_or(DEFAULT_COLLECTOR.timeout),
                memory: file
                    .functions
                    .collector
                    .memory_mb
                    .unwrap_or(DEFAULT_COLLECTOR.memory),
            },
            worker: FunctionSettings {
                timeout: file
                    .functions
                    .worker
                    .timeout_secs
                    .unwrap_or(DEFAULT_WORKER.timeout),
                memory: file
                    .functions
                    .worker
                    .memory_mb
                    .unwrap_or(DEFAULT_WORKER.memory),
            },
            target: file
                .package
                .target
                .unwrap_or_else(|| DEFAULT_TARGET.to_string()),
        })
    }

    pub(crate) fn function(&self, role: Role) -> FunctionSettings {
        match role {
            Role::Collector => self.collector,
            Role::Worker => self.worker,
        }
    }
}

/// Durations are written the human way, "10s" or "2m 30s"
fn parse_delay(value: Option<&str>) -> eyre::Result<Duration> {
    match value {
        Some(text) => humantime::parse_duration(text)
            .wrap_err(format!("Could not parse the duration {text:?} in gdelt.toml")),
        None => Ok(DEFAULT_TRIGGER_DELAY),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    queue: QueueFile,
    trigger: TriggerFile,
    functions: FunctionsFile,
    package: PackageFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QueueFile {
    name: Option<String>,
    visibility_timeout_secs: Option<u32>,
    retention_secs: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TriggerFile {
    max_attempts: Option<u32>,
    retry_delay: Option<String>,
    settle_delay: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FunctionsFile {
    role_name: Option<String>,
    collector: FunctionFile,
    worker: FunctionFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FunctionFile {
    timeout_secs: Option<i32>,
    memory_mb: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackageFile {
    target: Option<String>,
}
