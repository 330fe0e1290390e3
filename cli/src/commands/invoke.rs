mod runner;
use crate::runner::{Runnable, Runner};
use common::region::Region;
use runner::InvokeRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct InvokeCommand {
    /// Search query to collect articles for
    #[arg(short, long)]
    pub(crate) query: String,

    /// Maximum number of articles per month and region
    #[arg(long)]
    pub(crate) max_articles: Option<u32>,

    /// How many years back to cover
    #[arg(long)]
    pub(crate) years_back: Option<u32>,

    /// Regions to collect from, comma separated; all nine when omitted
    #[arg(long, value_delimiter = ',')]
    pub(crate) regions: Vec<Region>,
}

impl Runnable for InvokeCommand {
    fn runner(&self) -> impl Runner {
        InvokeRunner {
            command: self.clone(),
        }
    }
}
