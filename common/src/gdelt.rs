use crate::article::Article;
use crate::task::Task;
use chrono::NaiveDateTime;
use eyre::WrapErr;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::time::Duration;

pub const API_BASE: &str = "https://api.gdeltproject.org/api/v2/doc/doc";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything except `[A-Za-z0-9_.~-]` and `/` gets escaped, so spaces come
/// out as `%20` and parens as `%28`/`%29`.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Article entry as the DOC API returns it in `artlist` mode.
#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default = "missing_title")]
    title: String,

    #[serde(default)]
    url: String,

    #[serde(default)]
    url_mobile: String,

    #[serde(default)]
    seendate: String,

    #[serde(default)]
    socialimage: String,

    #[serde(default)]
    sourcecountry: String,

    #[serde(default)]
    domain: String,

    #[serde(default = "missing_language")]
    language: String,
}

fn missing_title() -> String {
    "No title".to_string()
}

fn missing_language() -> String {
    "eng".to_string()
}

#[derive(Debug, Default, Deserialize)]
struct ArticleListing {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

/// Outcome of one DOC API call: the parsed articles plus the URL that was
/// requested, which is kept in the persisted document for traceability.
#[derive(Clone, Debug)]
pub struct Fetched {
    pub articles: Vec<Article>,
    pub url: String,
}

/// Client for the GDELT DOC 2.0 API.
#[derive(Clone, Default)]
pub struct GdeltClient {
    client: reqwest::Client,
}

impl GdeltClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request URL for a task, with the region's source-country filter ANDed
    /// onto the user query and a whole-month datetime window.
    pub fn request_url(task: &Task) -> String {
        let full_query = format!("{} AND ({})", task.query, task.region.source_filter());
        let encoded = utf8_percent_encode(&full_query, QUERY_ENCODE);
        let date = format!("{}{:02}", task.year, task.month);

        format!(
            "{API_BASE}?query={encoded}&mode=artlist&maxrecords={}&format=json\
             &startdatetime={date}01000000&enddatetime={date}31235959&sort=datedesc",
            task.max_articles
        )
    }

    /// One API call for a task. Upstream trouble of any kind degrades to an
    /// empty article list, so a bad month never fails the task.
    pub async fn fetch(&self, task: &Task) -> Fetched {
        let url = Self::request_url(task);

        let articles = match self.articles(&url).await {
            Ok(raw) => convert(raw, task),
            Err(error) => {
                log::warn!("GDELT request failed for {}: {error:#}", task.label());
                Vec::new()
            }
        };

        log::info!("fetched {} articles for {}", articles.len(), task.label());

        Fetched { articles, url }
    }

    async fn articles(&self, url: &str) -> eyre::Result<Vec<RawArticle>> {
        let response = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .wrap_err("request did not complete")?;

        let status = response.status();

        if status != reqwest::StatusCode::OK {
            eyre::bail!("unexpected status {status}");
        }

        let listing: ArticleListing = response
            .json()
            .await
            .wrap_err("response is not an article listing")?;

        Ok(listing.articles)
    }
}

fn convert(raw: Vec<RawArticle>, task: &Task) -> Vec<Article> {
    raw.into_iter()
        .map(|article| Article {
            title: article.title,
            url: article.url,
            url_mobile: article.url_mobile,
            date: parse_seendate(&article.seendate),
            year: task.year,
            month: task.month,
            socialimage: article.socialimage,
            source_country: article.sourcecountry,
            source_domain: article.domain,
            language: article.language,
            region: task.region,
            query: task.query.clone(),
        })
        .collect()
}

/// `seendate` arrives as `YYYYMMDDHHMMSS`; anything else becomes `None`.
fn parse_seendate(seendate: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(seendate, "%Y%m%d%H%M%S")
        .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string())
        .ok()
}
