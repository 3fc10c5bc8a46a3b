use std::future::Future;
use std::io;
use std::time::Duration;

use crate::rotator::RotatorError;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Calls `connect` until it succeeds, sleeping `policy.delay` between
/// attempts. Only a refused connection is retried; any other error is
/// returned straight away.
pub async fn connect_with_retry<T, F, Fut>(
    endpoint: &str,
    policy: RetryPolicy,
    mut connect: F,
) -> Result<T, RotatorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match connect().await {
            Ok(conn) => return Ok(conn),
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                log::warn!(
                    "{} refused connection (attempt {}/{})",
                    endpoint,
                    attempt,
                    attempts
                );
                if attempt < attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
            Err(e) => return Err(RotatorError::Io(e)),
        }
    }

    Err(RotatorError::RetriesExhausted {
        endpoint: endpoint.to_string(),
        attempts,
    })
}
