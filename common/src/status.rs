use crate::region::Region;
use crate::task::Task;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix all progress documents live under.
pub const STATUS_PREFIX: &str = "status/";

/// Prefix of per-API-call documents, nested under [`STATUS_PREFIX`].
pub const API_STATUS_PREFIX: &str = "status/api/";

/// RFC 3339 timestamp for document fields.
pub fn now_stamp() -> String {
    Utc::now().to_rfc3339()
}

/// Lowercased query with spaces flattened to underscores, used in status keys.
pub fn query_slug(query: &str) -> String {
    query.to_lowercase().replace(' ', "_")
}

/// `status/{query_slug}_{collection_id}.json`
pub fn status_key(query: &str, collection_id: &str) -> String {
    format!("status/{}_{}.json", query_slug(query), collection_id)
}

/// `status/api/{api_call_id}.json`
pub fn api_status_key(api_call_id: &str) -> String {
    format!("status/api/{api_call_id}.json")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPhase {
    Initializing,
    Running,
    Processing,
    Completed,
    Error,
}

impl CollectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionPhase::Initializing => "initializing",
            CollectionPhase::Running => "running",
            CollectionPhase::Processing => "processing",
            CollectionPhase::Completed => "completed",
            CollectionPhase::Error => "error",
        }
    }
}

impl std::fmt::Display for CollectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    Processing,
    Completed,
    Failed,
}

/// Progress document for a whole collection.
///
/// Written by the collector before fan-out, then advanced by workers one
/// completed task at a time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionStatus {
    pub collection_id: String,
    pub query: String,
    pub status: CollectionPhase,

    #[serde(default)]
    pub total_tasks: u32,

    #[serde(default)]
    pub completed_tasks: u32,

    #[serde(default)]
    pub total_articles: u64,

    #[serde(default)]
    pub start_time: String,

    #[serde(default)]
    pub last_updated: String,

    /// Api call ids observed for the collection.
    #[serde(default)]
    pub collections: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CollectionStatus {
    /// Status written before any task is queued.
    pub fn initialize(collection_id: &str, query: &str, total_tasks: u32) -> Self {
        let now = now_stamp();

        Self {
            collection_id: collection_id.to_string(),
            query: query.to_string(),
            status: CollectionPhase::Initializing,
            total_tasks,
            completed_tasks: 0,
            total_articles: 0,
            start_time: now.clone(),
            last_updated: now,
            collections: Vec::new(),
            completed_at: None,
            error_message: None,
        }
    }

    /// Stand-in for a status document that went missing, rebuilt from a task.
    ///
    /// Total stays zero, so the collection can never flip to completed off a
    /// recovered document alone.
    pub fn recovered(task: &Task) -> Self {
        let now = now_stamp();

        Self {
            collection_id: task.collection_id.clone(),
            query: task.query.clone(),
            status: CollectionPhase::Processing,
            total_tasks: 0,
            completed_tasks: 0,
            total_articles: 0,
            start_time: now.clone(),
            last_updated: now,
            collections: Vec::new(),
            completed_at: None,
            error_message: None,
        }
    }

    pub fn key(&self) -> String {
        status_key(&self.query, &self.collection_id)
    }

    pub fn mark_running(&mut self) {
        self.status = CollectionPhase::Running;
        self.touch();
    }

    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = CollectionPhase::Error;
        self.error_message = Some(message.into());
        self.touch();
    }

    /// Fold one finished task into the totals, flipping to completed when the
    /// last known task lands.
    pub fn absorb_completed_task(&mut self, articles_added: u64) {
        self.completed_tasks += 1;
        self.total_articles += articles_added;
        self.touch();

        if self.total_tasks > 0
            && self.completed_tasks >= self.total_tasks
            && self.status != CollectionPhase::Completed
        {
            self.status = CollectionPhase::Completed;
            self.completed_at = Some(now_stamp());
        }
    }

    fn touch(&mut self) {
        self.last_updated = now_stamp();
    }
}

/// Progress document for a single GDELT API call, one per task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiCallStatus {
    pub api_call_id: String,
    pub collection_id: String,
    pub query: String,
    pub region: Region,
    pub year: i32,
    pub month: u32,
    pub status: CallPhase,

    #[serde(default)]
    pub start_time: String,

    #[serde(default)]
    pub articles_found: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ApiCallStatus {
    pub fn begin(task: &Task) -> Self {
        Self {
            api_call_id: Uuid::new_v4().to_string(),
            collection_id: task.collection_id.clone(),
            query: task.query.clone(),
            region: task.region,
            year: task.year,
            month: task.month,
            status: CallPhase::Processing,
            start_time: now_stamp(),
            articles_found: 0,
            last_updated: None,
            end_time: None,
            error_message: None,
        }
    }

    pub fn key(&self) -> String {
        api_status_key(&self.api_call_id)
    }

    pub fn complete(&mut self, articles_found: u32) {
        self.status = CallPhase::Completed;
        self.articles_found = articles_found;
        self.last_updated = Some(now_stamp());
        self.end_time = Some(now_stamp());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = CallPhase::Failed;
        self.articles_found = 0;
        self.error_message = Some(message.into());
        self.last_updated = Some(now_stamp());
        self.end_time = Some(now_stamp());
    }
}
