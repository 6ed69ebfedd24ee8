// Imagery service boundary
//   An ImageryService answers one CollectionQuery with the matching images:
//   requested collection, acquired inside the daylight window, overlapping the
//   region, holding the requested bands (and only those).
//   Every call goes through `with_retry`, which bounds each attempt by the
//   policy timeout and retries `Unavailable` with exponential backoff.

use crate::geo::{ProjectionError, RegionOfInterest};
use crate::raster::{CalibrationError, RasterError, RasterImage};
use crate::solar::DaylightWindow;
use futures::future::BoxFuture;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::*;

#[cfg(feature = "http")]
mod http;
mod local;
mod record;

#[cfg(feature = "http")]
pub use http::HttpImageryService;
pub use local::LocalCollection;
pub use record::{ImageRecord, QueryRequest, QueryResponse, RegionRequest};

#[derive(Debug)]
pub enum ServiceError {
    Unavailable(String),
    Rejected((u16, String)),
    Decode(String),
    Calibration(CalibrationError),
    Raster(RasterError),
    Projection(ProjectionError),
    Io(std::io::Error),
}

impl From<CalibrationError> for ServiceError {
    fn from(e: CalibrationError) -> Self {
        ServiceError::Calibration(e)
    }
}

impl From<RasterError> for ServiceError {
    fn from(e: RasterError) -> Self {
        ServiceError::Raster(e)
    }
}

impl From<ProjectionError> for ServiceError {
    fn from(e: ProjectionError) -> Self {
        ServiceError::Projection(e)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Io(e)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Decode(e.to_string())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for ServiceError {}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub collection: String,
    pub window: DaylightWindow,
    pub region: RegionOfInterest,
    pub bands: Vec<String>,
}

pub trait ImageryService: Send + Sync {
    fn query<'a>(
        &'a self,
        query: &'a CollectionQuery,
    ) -> BoxFuture<'a, ServiceResult<Vec<RasterImage>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry `attempt` (1-based): base_delay * 2^(attempt - 1)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// Runs `call` until it succeeds, fails with anything but `Unavailable`, or
/// runs out of retries. An attempt exceeding the timeout counts as `Unavailable`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> ServiceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(policy.timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Unavailable(format!(
                "no response within {:?}",
                policy.timeout
            ))),
        };
        match result {
            Err(ServiceError::Unavailable(reason)) if attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.backoff(attempt);
                warn!(
                    "Service unavailable ({reason}), retry {attempt}/{} in {delay:?}",
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}

pub async fn fetch_images<S: ImageryService + ?Sized>(
    service: &S,
    query: &CollectionQuery,
    policy: &RetryPolicy,
) -> ServiceResult<Vec<RasterImage>> {
    with_retry(policy, || service.query(query)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default()
            .with_timeout(Duration::from_millis(200))
            .with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn unavailable_is_retried() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(ServiceError::Unavailable("down".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn retries_run_out() {
        let calls = AtomicU32::new(0);
        let result: ServiceResult<()> = with_retry(&fast_policy().with_max_retries(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::Unavailable("down".into())) }
        })
        .await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejected_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: ServiceResult<()> = with_retry(&fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::Rejected((400, "bad query".into()))) }
        })
        .await;
        assert!(matches!(result, Err(ServiceError::Rejected((400, _)))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timeout_is_unavailable() {
        let policy = fast_policy()
            .with_timeout(Duration::from_millis(20))
            .with_max_retries(1);
        let calls = AtomicU32::new(0);
        let result: ServiceResult<()> = with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
            .boxed()
        })
        .await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
