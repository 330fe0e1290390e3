mod runner;
use crate::runner::{Runnable, Runner};
use runner::PackageRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct PackageCommand {
    /// Target triple to build the function binaries for, overriding gdelt.toml
    #[arg(long)]
    pub(crate) target: Option<String>,
}

impl Runnable for PackageCommand {
    fn runner(&self) -> impl Runner {
        PackageRunner {
            command: self.clone(),
        }
    }
}
