//! Timeout helper.

use std::future::Future;
use std::time::Duration;

/// A deadline fired before the wrapped future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    pub millis: u64,
}

/// Wrap a fallible future with a timeout.
///
/// The error type decides how an elapsed deadline is reported.
pub async fn with_timeout<T, E>(
    duration: Duration,
    future: impl Future<Output = Result<T, E>>,
) -> Result<T, E>
where
    E: From<Elapsed>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(E::from(Elapsed {
            millis: duration.as_millis() as u64,
        })),
    }
}
