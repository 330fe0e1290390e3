use crate::aws;
use crate::aws::trigger::TriggerOutcome;
use crate::aws::{functions, queue, trigger, verify};
use crate::bundle::{Packager, Role};
use crate::commands::deploy::DeployCommand;
use crate::config::{DeployEnv, Settings};
use crate::error::Error;
use crate::progress::{self, DeployProgress, Progress, ProgressStatus};
use crate::runner::Runner;

pub(crate) struct DeployRunner {
    pub(crate) command: DeployCommand,
}

impl Runner for DeployRunner {
    /// Deploy the whole pipeline in one pass
    ///
    /// Configuration is resolved up front, so a missing variable fails the
    /// command before anything remote is touched
    async fn run(&mut self) -> Result<(), Error> {
        let env = DeployEnv::resolve()?;
        let mut settings = Settings::load()?;

        if let Some(target) = &self.command.target {
            settings.target = target.clone();
        }

        self.deploy(&env, &settings).await?;
        Ok(())
    }
}

impl DeployRunner {
    async fn deploy(&self, env: &DeployEnv, settings: &Settings) -> eyre::Result<()> {
        if settings.visibility_timeout < settings.worker.timeout as u32 {
            progress::warn_line(&format!(
                "The queue visibility timeout {}s is below the worker timeout {}s",
                settings.visibility_timeout, settings.worker.timeout
            ));
        }

        let config = aws::sdk_config(&env.region).await;
        let sqs = aws_sdk_sqs::Client::new(&config);
        let lambda = aws_sdk_lambda::Client::new(&config);

        let progress = DeployProgress::new(8);

        progress.begin("Provisioning", &format!("queue {}", settings.queue_name));
        let queue = queue::ensure(&sqs, settings).await?;
        progress.advance();

        progress.begin(
            "Connecting",
            &format!("{} to {}", queue.name, env.worker_function),
        );
        let outcome = trigger::replace(&lambda, settings, env, &queue).await?;

        if let TriggerOutcome::Created { .. } = &outcome {
            verify::mapping(&lambda, env, &queue).await;
        }

        progress.advance();

        let packager = Packager::new(&settings.target);
        let mut bundles = Vec::new();

        for role in Role::BOTH {
            progress.begin("Packaging", role.bin_name());
            let spinner = Progress::above(&progress.bar, role.bin_name());

            match packager.package(role, &spinner).await {
                Ok(bundle) => {
                    let path = bundle.archive_path.display().to_string();
                    spinner.finish("Packaged", ProgressStatus::Success, Some(&path));
                    bundles.push(bundle);
                }
                Err(error) => {
                    spinner.finish("Failed", ProgressStatus::Error, None);
                    return Err(error);
                }
            }

            progress.advance();
        }

        let environment = functions::function_environment(env, &queue);
        let role_arn = env.role_arn(&settings.role_name);

        for bundle in &bundles {
            let name = env.function_name(bundle.role);
            progress.begin("Updating", name);

            functions::update(
                &lambda,
                name,
                settings.function(bundle.role),
                &role_arn,
                &environment,
                &bundle.archive,
            )
            .await?;

            progress.advance();
        }

        progress.begin("Verifying", "the deployed state");

        for bundle in &bundles {
            verify::function(&lambda, env.function_name(bundle.role), &bundle.sha256_hex).await;
        }

        verify::mapping(&lambda, env, &queue).await;
        progress.advance();

        if !self.command.keep_archives {
            progress.begin("Cleaning", "dist");
            packager.cleanup().await?;
        }

        progress.advance();
        progress.finish();

        println!();
        progress::stage_line(
            "Finished",
            &format!("{} and {}", env.collector_function, env.worker_function),
        );
        println!("    Queue {}", queue.url);

        if let TriggerOutcome::Manual { command } = &outcome {
            progress::warn_line("The queue trigger was not created, run this to create it:");
            println!("    {command}");
        }

        println!(
            "{}",
            console::style("Start a collection with \"gdelt invoke --query <query>\"").dim()
        );

        Ok(())
    }
}
