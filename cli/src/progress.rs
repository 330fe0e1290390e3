use crate::logger;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{stdout, IsTerminal};

/// Cargo-like right-aligned stage label
pub(crate) fn pad(message: &str) -> String {
    format!("{message:>12}")
}

/// Print a finished stage line outside of any running progress bar
pub(crate) fn stage_line(stage: &str, subject: &str) {
    let msg = format!("{} {subject}", console::style(pad(stage)).green().bold());
    logger::multi_progress().println(&msg).ok();
}

/// Print a warning line in the same layout as stage lines
pub(crate) fn warn_line(subject: &str) {
    let msg = format!(
        "{} {subject}",
        console::style(pad("Warning")).yellow().bold()
    );
    logger::multi_progress().println(&msg).ok();
}

/// Overall bar across the fixed deployment stages
pub(crate) struct DeployProgress {
    pub(crate) bar: ProgressBar,
}

impl DeployProgress {
    pub(crate) fn new(total_stages: u64) -> Self {
        let bar = logger::multi_progress().add(ProgressBar::new(total_stages));

        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    format!(
                        "   {} [{{bar:30}}] {{pos}}/{{len}} {{wide_msg:.dim}}",
                        console::style("Deploying").cyan().bold()
                    )
                    .as_str(),
                )
                .unwrap()
                .progress_chars("=> "),
        );

        bar.set_position(0);

        Self { bar }
    }

    /// Announce a stage above the bar
    pub(crate) fn begin(&self, stage: &str, subject: &str) {
        let msg = format!("{} {subject}", console::style(pad(stage)).green().bold());

        // Terminal or CI/CD?
        if stdout().is_terminal() {
            self.bar.println(msg);
        } else {
            self.bar.suspend(|| {
                println!("{msg}");
            });
        }
    }

    pub(crate) fn advance(&self) {
        self.bar.inc(1);
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

pub(crate) enum ProgressStatus {
    Success,
    Error,
}

/// Spinner for one function bundle, fed with the compiler output
pub(crate) struct Progress {
    pub(crate) bar: ProgressBar,
    subject: String,
}

impl Progress {
    pub(crate) fn new(subject: &str) -> Self {
        let bar = logger::multi_progress().add(ProgressBar::new_spinner());
        bar.set_style(ProgressStyle::with_template("{msg}").unwrap());

        Self {
            bar,
            subject: subject.to_string(),
        }
    }

    /// Same spinner, but kept above the overall deployment bar
    pub(crate) fn above(anchor: &ProgressBar, subject: &str) -> Self {
        let bar = logger::multi_progress().insert_before(anchor, ProgressBar::new_spinner());
        bar.set_style(ProgressStyle::with_template("{msg}").unwrap());

        Self {
            bar,
            subject: subject.to_string(),
        }
    }

    /// Show the latest compiler line next to the subject
    pub(crate) fn building(&self, line: &str) {
        if line.is_empty() {
            self.bar.set_message(format!(
                "{} {}",
                console::style(pad("Building")).green().bold(),
                self.subject,
            ));
        } else {
            self.bar.set_message(format!(
                "{} {} {}",
                console::style(pad("Building")).green().bold(),
                self.subject,
                console::style(format!("({line})")).dim()
            ));
        }
    }

    pub(crate) fn finish(&self, stage: &str, status: ProgressStatus, message: Option<&str>) {
        let stage = console::style(pad(stage)).bold();
        let stage = match status {
            ProgressStatus::Success => stage.green(),
            ProgressStatus::Error => stage.red(),
        };
        let message = message.map(|m| format!(": {m}")).unwrap_or_default();
        self.bar
            .finish_with_message(format!("{} {}{}", stage, self.subject, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_cargo_width() {
        assert_eq!(pad("Queue"), "       Queue");
        assert_eq!(pad("Queue").len(), 12);
    }

    #[test]
    fn keeps_long_labels_intact() {
        assert_eq!(pad("Provisioning"), "Provisioning");
        assert_eq!(pad("Verification!"), "Verification!");
    }
}
