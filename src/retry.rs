//! Exponential backoff with jitter for coordinator fan-out retries.
//!
//! Grounded in the teacher's `scrapers/binance_session.rs` `BackoffCalculator`
//! (xorshift64 jitter, multiplicative growth capped at a max delay),
//! generalized from "reconnect a websocket session" to "retry one HTTP call
//! to a worker/aggregator target" per spec.md's per-target retry policy.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub jitter_factor: f64,
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 100,
            max_ms: 30_000,
            multiplier: 2.0,
            jitter_factor: 0.3,
            max_attempts: 3,
        }
    }
}

/// Stateful backoff sequence. One instance is created per retried call, not
/// shared across calls — unlike the teacher's long-lived session reconnect
/// use, retry attempts here all belong to a single request's lifetime.
#[derive(Debug)]
pub struct BackoffCalculator {
    config: BackoffConfig,
    attempt: u32,
    rng_state: u64,
}

impl BackoffCalculator {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            attempt: 0,
            rng_state: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64 | 1)
                .unwrap_or(12345),
        }
    }

    #[inline]
    fn next_random(&mut self) -> f64 {
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 7;
        self.rng_state ^= self.rng_state << 17;
        (self.rng_state as f64) / (u64::MAX as f64)
    }

    pub fn next_backoff(&mut self) -> Duration {
        let base =
            (self.config.base_ms as f64) * self.config.multiplier.powi(self.attempt as i32);
        let capped = base.min(self.config.max_ms as f64);

        let jitter_range = capped * self.config.jitter_factor;
        let jitter = (self.next_random() * 2.0 - 1.0) * jitter_range;
        let final_ms = (capped + jitter).max(self.config.base_ms as f64);

        self.attempt += 1;
        Duration::from_millis(final_ms as u64)
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// True once the attempt that just ran (`self.attempt + 1`, since
    /// `self.attempt` only counts completed `next_backoff()` calls, one
    /// behind the attempt number currently being evaluated) has used up
    /// `max_attempts` — so a total of exactly `max_attempts` calls are made,
    /// not `max_attempts + 1`.
    pub fn attempts_exhausted(&self) -> bool {
        self.attempt + 1 >= self.config.max_attempts
    }
}

/// Outcome of exhausting (or not) a retry sequence for a single target.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Retries `call` up to `config.max_attempts` times with exponential backoff
/// and jitter between attempts. `call` returns `Ok(None)` for a retryable
/// failure (the caller has already logged it) and `Err` for a fatal one that
/// should abort the whole sequence immediately.
pub async fn retry_with_backoff<T, E, F, Fut>(
    config: BackoffConfig,
    mut call: F,
) -> Result<RetryOutcome<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<Option<T>, E>>,
{
    let mut backoff = BackoffCalculator::new(config);
    loop {
        let attempt = backoff.attempt() + 1;
        match call(attempt).await? {
            Some(value) => {
                return Ok(RetryOutcome::Succeeded { value, attempts: attempt });
            }
            None => {
                if backoff.attempts_exhausted() {
                    return Ok(RetryOutcome::Exhausted { attempts: attempt });
                }
                tokio::time::sleep(backoff.next_backoff()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_backoff_is_near_base_delay() {
        let mut calc = BackoffCalculator::new(BackoffConfig::default());
        let delay = calc.next_backoff();
        assert!(delay.as_millis() >= 70 && delay.as_millis() <= 130);
    }

    #[test]
    fn backoff_never_exceeds_max_plus_jitter() {
        let config = BackoffConfig {
            base_ms: 100,
            max_ms: 1_000,
            multiplier: 2.0,
            jitter_factor: 0.3,
            max_attempts: 20,
        };
        let mut calc = BackoffCalculator::new(config);
        for _ in 0..20 {
            let delay = calc.next_backoff();
            assert!(delay.as_millis() <= (config.max_ms as f64 * 1.3) as u128);
        }
    }

    #[tokio::test]
    async fn retry_succeeds_on_first_non_retryable_failure_response() {
        let config = BackoffConfig {
            base_ms: 1,
            max_ms: 2,
            multiplier: 2.0,
            jitter_factor: 0.1,
            max_attempts: 3,
        };
        let mut calls = 0u32;
        let outcome = retry_with_backoff::<_, anyhow::Error, _, _>(config, |_attempt| {
            calls += 1;
            async move {
                if calls < 2 {
                    Ok(None)
                } else {
                    Ok(Some("done"))
                }
            }
        })
        .await
        .unwrap();
        match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                assert_eq!(value, "done");
                assert_eq!(attempts, 2);
            }
            RetryOutcome::Exhausted { .. } => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn retry_exhausts_after_max_attempts() {
        let config = BackoffConfig {
            base_ms: 1,
            max_ms: 2,
            multiplier: 2.0,
            jitter_factor: 0.1,
            max_attempts: 3,
        };
        let outcome = retry_with_backoff::<(), anyhow::Error, _, _>(config, |_attempt| async {
            Ok(None)
        })
        .await
        .unwrap();
        match outcome {
            RetryOutcome::Exhausted { attempts } => assert_eq!(attempts, 3),
            RetryOutcome::Succeeded { .. } => panic!("expected exhaustion"),
        }
    }
}
