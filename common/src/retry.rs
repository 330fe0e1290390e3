use std::future::Future;
use std::time::Duration;

/// Pause schedule between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delay {
    /// Same pause after every failed attempt.
    Fixed(Duration),

    /// Doubling pause starting at `base`, never above `cap`.
    Exponential { base: Duration, cap: Duration },
}

impl Delay {
    /// Pause taken after the given attempt, counting from 1.
    pub fn after_attempt(&self, attempt: u32) -> Duration {
        match self {
            Delay::Fixed(delay) => *delay,
            Delay::Exponential { base, cap } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(*cap)
            }
        }
    }
}

/// Bounded retry loop for fallible async operations.
///
/// Runs the operation up to `max_attempts` times, sleeping per the delay
/// schedule between attempts, and stops at the first success. After
/// exhaustion the last error is returned to the caller, which decides
/// whether that is fatal.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Delay,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay: Delay::Fixed(delay),
        }
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> eyre::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = eyre::Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = eyre::eyre!("{label}: no attempts were made");

        for attempt in 1..=attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    log::warn!("{label}: attempt {attempt}/{attempts} failed: {error:#}");
                    last_error = error;
                }
            }

            if attempt < attempts {
                let pause = self.delay.after_attempt(attempt);

                if !pause.is_zero() {
                    log::info!("{label}: retrying in {}s", pause.as_secs());
                    tokio::time::sleep(pause).await;
                }
            }
        }

        Err(last_error)
    }
}
