use std::time::Duration;

use log::{error, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::utils::error::{Error, Result};

const USER_AGENT: &str = concat!("geoviz3d/", env!("CARGO_PKG_VERSION"));

/// Builds the blocking client shared by the provider clients.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Turns non-success statuses into errors, keeping the `Retry-After` hint of
/// a 429 answer.
pub fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited {
            retry_after: retry_after(response.headers()),
        });
    }
    if !status.is_success() {
        return Err(Error::HttpStatus(status.as_u16()));
    }
    Ok(response)
}

/// The `Retry-After` delay in whole seconds. HTTP-date values are ignored.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Synchronous retry with exponential backoff.
///
/// The wait before attempt `n + 1` is `unit * factor^n`; a rate-limit answer
/// carrying a hint waits for the hint instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_factor: f64,
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: 2.0,
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.unit
            .mul_f64(self.backoff_factor.max(0.0).powi(attempt.min(16) as i32))
    }

    fn wait_for(&self, attempt: u32, err: &Error) -> Duration {
        match err {
            Error::RateLimited {
                retry_after: Some(hint),
            } => *hint,
            _ => self.backoff(attempt),
        }
    }

    /// Runs `op` until it succeeds, fails with a non-transient error or the
    /// attempt ceiling is reached.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => {
                    error!("{}: {}", label, err);
                    return Err(err);
                }
                Err(err) if attempt >= max_attempts => {
                    error!("{}: failed after {} attempts: {}", label, attempt, err);
                    return Err(Error::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    let wait = self.wait_for(attempt, &err);
                    warn!(
                        "{}: {} (attempt {}/{}), retrying in {:.2}s",
                        label,
                        err,
                        attempt,
                        max_attempts,
                        wait.as_secs_f64()
                    );
                    std::thread::sleep(wait);
                }
            }
        }
    }
}
