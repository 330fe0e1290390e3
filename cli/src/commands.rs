pub mod deploy;
pub mod invoke;
pub mod package;
pub mod status;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the queue, wire the trigger, and ship both functions
    Deploy(deploy::DeployCommand),

    /// Build and compress the function bundles, without deployment
    Package(package::PackageCommand),

    /// Start a collection by invoking the collector function
    Invoke(invoke::InvokeCommand),

    /// Show the progress of collections from their status documents
    Status(status::StatusCommand),
}
