mod runner;
use crate::runner::{Runnable, Runner};
use runner::StatusRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct StatusCommand {
    /// Collection id to show in detail; all collections when omitted
    pub(crate) collection_id: Option<String>,
}

impl Runnable for StatusCommand {
    fn runner(&self) -> impl Runner {
        StatusRunner {
            command: self.clone(),
        }
    }
}
