use crate::region::Region;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MAX_ARTICLES: u32 = 20;
pub const DEFAULT_YEARS_BACK: u32 = 3;

/// One unit of work for the worker function: a single region in a single
/// calendar month.
///
/// This is the queue message body, snake_case JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub collection_id: String,
    pub query: String,
    pub region: Region,
    pub max_articles: u32,
    pub year: i32,
    pub month: u32,
}

impl Task {
    /// Human label used in log lines, e.g. `europe 2024-03`.
    pub fn label(&self) -> String {
        format!("{} {}-{:02}", self.region, self.year, self.month)
    }
}

/// Invocation payload of the collector function.
#[derive(Clone, Debug, Deserialize)]
pub struct CollectionRequest {
    #[serde(default)]
    pub query: String,

    #[serde(default = "default_max_articles")]
    pub max_articles_per_month: u32,

    #[serde(default = "default_years_back")]
    pub years_back: u32,

    #[serde(default = "all_regions")]
    pub regions: Vec<Region>,
}

fn default_max_articles() -> u32 {
    DEFAULT_MAX_ARTICLES
}

fn default_years_back() -> u32 {
    DEFAULT_YEARS_BACK
}

fn all_regions() -> Vec<Region> {
    Region::ALL.to_vec()
}

/// Fan-out plan for a collection request: a fresh collection id plus every
/// (month, region) task derived from it.
#[derive(Clone, Debug)]
pub struct CollectionPlan {
    pub collection_id: String,
    pub tasks: Vec<Task>,
}

impl CollectionPlan {
    pub fn new(request: &CollectionRequest, today: NaiveDate) -> Self {
        let collection_id = Uuid::new_v4().to_string();
        let tasks = expand(request, &collection_id, today);

        Self {
            collection_id,
            tasks,
        }
    }
}

/// Months covered by a collection, oldest first.
///
/// The window starts `years_back * 365` days before `today`, snapped to the
/// first of that month, and runs through the current month inclusive.
pub fn month_span(today: NaiveDate, years_back: u32) -> Vec<(i32, u32)> {
    let start = today - Duration::days(i64::from(years_back) * 365);
    let mut current = start.with_day(1).unwrap_or(start);
    let mut months = Vec::new();

    while current <= today {
        months.push((current.year(), current.month()));

        let (year, month) = match current.month() {
            12 => (current.year() + 1, 1),
            other => (current.year(), other + 1),
        };

        current = match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(next) => next,
            None => break,
        };
    }

    months
}

/// One task per (month, region) pair, months outermost so that workers walk
/// the timeline region by region.
pub fn expand(request: &CollectionRequest, collection_id: &str, today: NaiveDate) -> Vec<Task> {
    let mut tasks = Vec::new();

    for (year, month) in month_span(today, request.years_back) {
        for region in &request.regions {
            tasks.push(Task {
                collection_id: collection_id.to_string(),
                query: request.query.clone(),
                region: *region,
                max_articles: request.max_articles_per_month,
                year,
                month,
            });
        }
    }

    tasks
}
