use crate::bundle::{Packager, Role};
use crate::commands::package::PackageCommand;
use crate::config::Settings;
use crate::error::Error;
use crate::progress::{Progress, ProgressStatus};
use crate::runner::Runner;

pub(crate) struct PackageRunner {
    pub(crate) command: PackageCommand,
}

impl Runner for PackageRunner {
    /// Build and compress both functions, leaving the archives under dist/
    async fn run(&mut self) -> Result<(), Error> {
        let mut settings = Settings::load()?;

        if let Some(target) = &self.command.target {
            settings.target = target.clone();
        }

        let packager = Packager::new(&settings.target);

        for role in Role::BOTH {
            let spinner = Progress::new(role.bin_name());

            match packager.package(role, &spinner).await {
                Ok(bundle) => {
                    spinner.finish(
                        "Packaged",
                        ProgressStatus::Success,
                        Some(&format!(
                            "{} (sha256 {})",
                            bundle.archive_path.display(),
                            &bundle.sha256_hex[..12]
                        )),
                    );
                }
                Err(error) => {
                    spinner.finish("Failed", ProgressStatus::Error, None);
                    return Err(error.into());
                }
            }
        }

        Ok(())
    }
}
