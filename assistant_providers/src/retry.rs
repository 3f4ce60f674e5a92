use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delay schedule between attempts.
///
/// `base_delays` are used in order, then `final_delay` is repeated
/// `final_retries` times. Total attempts = number of delays + 1.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub base_delays: Vec<Duration>,
    pub final_delay: Duration,
    pub final_retries: usize,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delays: vec![Duration::from_secs(1), Duration::from_secs(2)],
            final_delay: Duration::from_secs(4),
            final_retries: 1,
        }
    }
}

impl Backoff {
    /// Single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            base_delays: Vec::new(),
            final_delay: Duration::ZERO,
            final_retries: 0,
        }
    }

    fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        self.base_delays
            .iter()
            .copied()
            .chain(std::iter::repeat_n(self.final_delay, self.final_retries))
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        self.base_delays.len() + self.final_retries + 1
    }
}

/// Retry an async operation following `backoff`.
///
/// Errors for which `should_retry` is false are returned at once. Otherwise
/// returns the first success, or the error of the last attempt.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    mut operation: F,
    backoff: &Backoff,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let attempts = backoff.attempts();
    let mut delays = backoff.delays();

    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !should_retry(&e) => return Err(e),
            Err(e) => match delays.next() {
                Some(delay) => {
                    warn!(
                        "Request failed (attempt {attempt}/{attempts}): {e}. Retrying after {}ms...",
                        delay.as_millis()
                    );
                    sleep(delay).await;
                }
                None => return Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick(base: usize, final_retries: usize) -> Backoff {
        Backoff {
            base_delays: vec![Duration::from_millis(1); base],
            final_delay: Duration::from_millis(2),
            final_retries,
        }
    }

    #[tokio::test]
    async fn retry_succeeds_on_first_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), String>(())
                }
            },
            &quick(2, 2),
            |_| true,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_succeeds_after_failures() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if count < 3 {
                        Err(String::from("fail"))
                    } else {
                        Ok(())
                    }
                }
            },
            &quick(2, 2),
            |_| true,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_fails_after_all_attempts() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("fail {count}"))
                }
            },
            &quick(2, 2),
            |_| true,
        )
        .await;
        assert_eq!(result, Err(String::from("fail 5")));
        assert_eq!(attempts.load(Ordering::SeqCst), 5); // 1 + 2 base + 2 final
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if count == 1 {
                        Err(String::from("busy"))
                    } else {
                        Err(String::from("unauthorized"))
                    }
                }
            },
            &quick(2, 2),
            |e: &String| e == "busy",
        )
        .await;
        assert_eq!(result, Err(String::from("unauthorized")));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_backoff_means_single_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(String::from("fail"))
                }
            },
            &Backoff::none(),
            |_| true,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
