//! Retry policies for provider requests.
//!
//! A [`RetryPolicy`] bounds the number of attempts and chooses the pause between
//! them through a [`Backoff`]. Only errors that report
//! [`is_retryable`](BibfillError::is_retryable) are repeated. The default policy
//! for the primary provider is three attempts one second apart; switching a
//! provider to exponential backoff is a configuration change.
//!
//! ```toml
//! [retry]
//! max_attempts = 3
//! backoff = { type = "fixed", delay_ms = 1000 }
//! ```
//!
//! ```toml
//! [retry]
//! max_attempts = 5
//! backoff = { type = "exponential", initial_ms = 500, multiplier = 2.0, max_ms = 10000, jitter = true }
//! ```

use std::{future::Future, time::Duration};

use rand::Rng;

use super::*;

/// How long to wait between attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
  /// Retry immediately
  None,
  /// The same pause before every retry
  Fixed {
    /// Pause in milliseconds
    delay_ms: u64,
  },
  /// A pause that grows geometrically, capped at `max_ms`
  Exponential {
    /// Pause before the first retry, in milliseconds
    initial_ms: u64,
    /// Growth factor applied after each retry
    multiplier: f64,
    /// Upper bound for a single pause, in milliseconds
    max_ms:     u64,
    /// Stretch each pause by a random factor in `[1, 2]`
    #[serde(default)]
    jitter:     bool,
  },
}

impl Default for Backoff {
  fn default() -> Self { Self::Fixed { delay_ms: 1000 } }
}

impl Backoff {
  /// The pause after the `failures`-th failed attempt (starting at 1).
  pub fn delay(&self, failures: u32) -> Duration {
    match self {
      Backoff::None => Duration::ZERO,
      Backoff::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
      Backoff::Exponential { initial_ms, multiplier, max_ms, jitter } => {
        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = (*initial_ms as f64 * multiplier.powi(exponent)).min(*max_ms as f64);
        let millis =
          if *jitter { millis * (1.0 + rand::thread_rng().gen_range(0.0..=1.0)) } else { millis };
        Duration::from_micros((millis.max(0.0) * 1000.0).round() as u64)
      },
    }
  }
}

/// Bounded retry of a fallible async operation.
///
/// # Examples
///
/// ```
/// use bibfill::retry::{Backoff, RetryPolicy};
///
/// let policy = RetryPolicy::fixed(3, 1000);
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.backoff, Backoff::Fixed { delay_ms: 1000 });
///
/// let once = RetryPolicy::once();
/// assert_eq!(once.max_attempts, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
  /// Total number of attempts, the first one included. Zero behaves like one.
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  /// Pause between attempts
  #[serde(default)]
  pub backoff:      Backoff,
}

/// Attempts made by the default policy.
fn default_max_attempts() -> u32 { 3 }

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: default_max_attempts(), backoff: Backoff::default() }
  }
}

impl RetryPolicy {
  /// A single attempt, no retry.
  pub fn once() -> Self { Self { max_attempts: 1, backoff: Backoff::None } }

  /// `max_attempts` attempts with a constant pause of `delay_ms` between them.
  pub fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
    Self { max_attempts, backoff: Backoff::Fixed { delay_ms } }
  }

  /// Runs `operation` until it succeeds, fails permanently, or attempts run out.
  ///
  /// The closure receives the 1-based attempt number. The last error is returned
  /// when every attempt failed.
  pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T>
  where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>, {
    let max_attempts = self.max_attempts.max(1);
    let mut attempt = 1;

    loop {
      match operation(attempt).await {
        Ok(value) => {
          if attempt > 1 {
            debug!(attempt, "Request succeeded after retry");
          }
          return Ok(value);
        },
        Err(e) if e.is_retryable() && attempt < max_attempts => {
          let delay = self.backoff.delay(attempt);
          warn!(
            error = %e,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Request failed, retrying"
          );
          tokio::time::sleep(delay).await;
          attempt += 1;
        },
        Err(e) => {
          if e.is_retryable() {
            warn!(error = %e, attempts = attempt, "Request failed after all attempts");
          }
          return Err(e);
        },
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
  };

  use tokio_test::{assert_err, assert_ok};

  use super::*;

  fn transient() -> BibfillError {
    BibfillError::Status { provider: "test".into(), status: 503, body: String::new() }
  }

  #[tokio::test(start_paused = true)]
  async fn test_fixed_policy_gives_up_after_max_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let policy = RetryPolicy::fixed(3, 1000);
    let started = tokio::time::Instant::now();

    let result: Result<()> = policy
      .run(|_| {
        let calls = calls.clone();
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Err(transient())
        }
      })
      .await;

    assert!(matches!(result, Err(BibfillError::Status { status: 503, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Two pauses, none after the final attempt.
    assert_eq!(started.elapsed(), Duration::from_secs(2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_success_after_transient_failure() {
    let policy = RetryPolicy::fixed(3, 1000);
    let result = policy
      .run(|attempt| async move { if attempt < 2 { Err(transient()) } else { Ok(attempt) } })
      .await;
    assert_eq!(result.unwrap(), 2);
  }

  #[tokio::test]
  async fn test_permanent_error_is_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let policy = RetryPolicy::fixed(5, 0);

    let result: Result<()> = policy
      .run(|_| {
        let calls = calls.clone();
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Err(BibfillError::MissingCredentials("test".into()))
        }
      })
      .await;

    assert!(matches!(assert_err!(result), BibfillError::MissingCredentials(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_zero_attempts_still_runs_once() {
    let policy = RetryPolicy { max_attempts: 0, backoff: Backoff::None };
    let result = policy.run(|attempt| async move { Ok::<_, BibfillError>(attempt) }).await;
    assert_eq!(assert_ok!(result), 1);
  }

  #[test]
  fn test_exponential_delay_is_capped() {
    let backoff =
      Backoff::Exponential { initial_ms: 100, multiplier: 2.0, max_ms: 1000, jitter: false };
    assert_eq!(backoff.delay(1), Duration::from_millis(100));
    assert_eq!(backoff.delay(2), Duration::from_millis(200));
    assert_eq!(backoff.delay(4), Duration::from_millis(800));
    assert_eq!(backoff.delay(5), Duration::from_millis(1000));
    assert_eq!(backoff.delay(60), Duration::from_millis(1000));
  }

  #[test]
  fn test_jitter_stays_within_bounds() {
    let backoff =
      Backoff::Exponential { initial_ms: 100, multiplier: 1.0, max_ms: 100, jitter: true };
    for _ in 0..20 {
      let delay = backoff.delay(1);
      assert!(delay >= Duration::from_millis(100) && delay <= Duration::from_millis(200));
    }
  }

  #[test]
  fn test_policy_from_toml() {
    let policy: RetryPolicy = toml::from_str(
      r#"
      max_attempts = 4
      backoff = { type = "exponential", initial_ms = 250, multiplier = 3.0, max_ms = 5000 }
      "#,
    )
    .unwrap();
    assert_eq!(policy.max_attempts, 4);
    assert_eq!(policy.backoff, Backoff::Exponential {
      initial_ms: 250,
      multiplier: 3.0,
      max_ms:     5000,
      jitter:     false,
    });

    let default: RetryPolicy = toml::from_str("").unwrap();
    assert_eq!(default, RetryPolicy::fixed(3, 1000));
  }
}
