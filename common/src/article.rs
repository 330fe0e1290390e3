use crate::region::Region;
use crate::status::now_stamp;
use crate::task::Task;
use serde::{Deserialize, Serialize};

/// One GDELT article, trimmed to the fields the pipeline keeps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub url_mobile: String,

    /// `YYYY-MM-DD HH:MM:SS`, `null` when the upstream date was unparseable.
    pub date: Option<String>,

    pub year: i32,
    pub month: u32,
    pub socialimage: String,
    pub source_country: String,
    pub source_domain: String,
    pub language: String,
    pub region: Region,
    pub query: String,
}

/// Document persisted per finished task under [`articles_key`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArticleDocument {
    pub collection_id: String,
    pub api_call_id: String,
    pub query: String,
    pub region: Region,
    pub year: i32,
    pub month: u32,
    pub articles: Vec<Article>,
    pub article_count: u32,
    pub processed_at: String,
    pub status: String,
    pub metadata: DocumentMetadata,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub max_articles_requested: u32,
    pub articles_found: u32,
    pub url_constructed: String,
}

impl ArticleDocument {
    /// A document is written for every task, zero articles included, so a
    /// finished collection always has months x regions files.
    pub fn new(task: &Task, api_call_id: &str, articles: Vec<Article>, url: &str) -> Self {
        let article_count = articles.len() as u32;

        Self {
            collection_id: task.collection_id.clone(),
            api_call_id: api_call_id.to_string(),
            query: task.query.clone(),
            region: task.region,
            year: task.year,
            month: task.month,
            articles,
            article_count,
            processed_at: now_stamp(),
            status: "completed".to_string(),
            metadata: DocumentMetadata {
                max_articles_requested: task.max_articles,
                articles_found: article_count,
                url_constructed: url.to_string(),
            },
        }
    }

    pub fn key(&self) -> String {
        articles_key(&self.collection_id, self.year, self.month, self.region)
    }
}

/// `collections/{collection_id}/{year}/{month:02}/{region}.json`
pub fn articles_key(collection_id: &str, year: i32, month: u32, region: Region) -> String {
    format!("collections/{collection_id}/{year}/{month:02}/{region}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            collection_id: "c-1".into(),
            query: "ai".into(),
            region: Region::Oceania,
            max_articles: 20,
            year: 2024,
            month: 3,
        }
    }

    #[test]
    fn key_pads_the_month() {
        assert_eq!(
            articles_key("c-1", 2024, 3, Region::Oceania),
            "collections/c-1/2024/03/oceania.json"
        );
        assert_eq!(
            articles_key("c-1", 2024, 11, Region::NorthAmerica),
            "collections/c-1/2024/11/north_america.json"
        );
    }

    #[test]
    fn empty_fetch_still_produces_a_document() {
        let document = ArticleDocument::new(&task(), "a-1", Vec::new(), "https://example.test");

        assert_eq!(document.article_count, 0);
        assert_eq!(document.status, "completed");
        assert_eq!(document.metadata.articles_found, 0);
        assert_eq!(document.metadata.max_articles_requested, 20);
        assert_eq!(document.key(), "collections/c-1/2024/03/oceania.json");
    }
}
