use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries an async operation with a growing delay between attempts
///
/// # Parameters
/// - `max_attempts`: Total number of runs, at least one
/// - `delay`: Pause taken after failed attempt `n` (1-based), before run `n + 1`
/// - `operation`: Closure receiving the 1-based attempt number
///
/// # Returns
/// Either the first successful result or the error of the last attempt
pub async fn with_backoff<F, Fut, T, E, D>(
    max_attempts: usize,
    delay: D,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    D: Fn(usize) -> Duration,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                let wait = delay(attempt);
                debug!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempt, max_attempts, err, wait
                );
                attempt += 1;
                tokio::time::sleep(wait).await;
            }
        }
    }
}

/// `attempt * step`: 1x after the first failure, 2x after the second, ...
pub fn linear_backoff(step: Duration) -> impl Fn(usize) -> Duration {
    move |attempt| step.saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[test]
    fn test_linear_backoff() {
        let delay = linear_backoff(Duration::from_millis(500));
        assert_eq!(delay(1), Duration::from_millis(500));
        assert_eq!(delay(2), Duration::from_millis(1000));
        assert_eq!(delay(3), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = Mutex::new(Vec::new());
        let start = Instant::now();

        let result: Result<&str, String> = with_backoff(
            5,
            linear_backoff(Duration::from_secs(1)),
            |attempt| {
                calls.lock().unwrap().push((attempt, start.elapsed()));
                async move {
                    if attempt < 3 {
                        Err(format!("boom {attempt}"))
                    } else {
                        Ok("done")
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        let calls = calls.into_inner().unwrap();
        let attempts: Vec<usize> = calls.iter().map(|(attempt, _)| *attempt).collect();
        assert_eq!(attempts, vec![1, 2, 3]);

        // Timer wheel resolution is a millisecond
        let expected = [0, 1000, 3000];
        for ((_, elapsed), expected_ms) in calls.iter().zip(expected) {
            let elapsed_ms = elapsed.as_millis() as u64;
            assert!(
                elapsed_ms >= expected_ms && elapsed_ms <= expected_ms + 5,
                "{elapsed_ms}ms vs {expected_ms}ms"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_when_exhausted() {
        let mut runs = 0;
        let result: Result<(), String> = with_backoff(
            3,
            |_| Duration::from_millis(10),
            |attempt| {
                runs += 1;
                async move { Err(format!("failure {attempt}")) }
            },
        )
        .await;

        assert_eq!(result.unwrap_err(), "failure 3");
        assert_eq!(runs, 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let mut runs = 0;
        let result: Result<(), String> = with_backoff(0, |_| Duration::ZERO, |_| {
            runs += 1;
            async { Err("nope".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(runs, 1);
    }
}
