use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use std::sync::OnceLock;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

/// Install the logger, routed through the shared progress state so log lines
/// do not tear the progress bars
///
/// No logs are shown by default, only human-friendly messages; enable them
/// with "export RUST_LOG=info" in the terminal
pub(crate) fn init() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let logger =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"))
                .build();

        let level = logger.filter();
        let multi_progress = MultiProgress::new();

        LogWrapper::new(multi_progress.clone(), logger)
            .try_init()
            .unwrap();
        log::set_max_level(level);

        multi_progress
    })
}

/// The progress state every bar and printed line attaches to
pub(crate) fn multi_progress() -> &'static MultiProgress {
    init()
}
