mod runner;
use crate::runner::{Runnable, Runner};
use clap::ArgAction;
use runner::DeployRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct DeployCommand {
    /// Target triple to build the function binaries for, overriding gdelt.toml
    #[arg(long)]
    pub(crate) target: Option<String>,

    /// Keep the archives under dist/ instead of cleaning them up
    #[arg(long, action = ArgAction::SetTrue)]
    pub(crate) keep_archives: bool,
}

impl Runnable for DeployCommand {
    fn runner(&self) -> impl Runner {
        DeployRunner {
            command: self.clone(),
        }
    }
}
