pub mod browser;
pub mod page;
pub mod traits;
pub mod types;
pub mod vacasa;
pub mod vrbo;

#[cfg(test)]
pub mod testing;

pub use browser::{BrowserOptions, ChromeDriver};
pub use traits::Driver;
pub use types::{RawListing, RetryPolicy};

use tracing::warn;

use crate::error::ExtractError;
use crate::models::Source;

/// Read the listing page currently loaded in `driver` with the source's adapter
pub async fn extract(source: Source, driver: &dyn Driver) -> Result<RawListing, ExtractError> {
    match source {
        Source::Vrbo => vrbo::extract(driver).await,
        Source::Vacasa => vacasa::extract(driver).await,
    }
}

/// [`extract`], re-reading a page that hasn't rendered yet up to
/// `policy.max_retries` more times.
pub async fn extract_with_retry(
    source: Source,
    driver: &dyn Driver,
    policy: RetryPolicy,
    code: &str,
) -> Result<RawListing, ExtractError> {
    let mut attempt = 1;
    loop {
        match extract(source, driver).await {
            Ok(raw) => return Ok(raw),
            Err(e) if e.is_retryable() && attempt < policy.attempts() => {
                warn!(
                    "{} {}: attempt {}/{} failed, retrying in {:?}: {}",
                    source,
                    code,
                    attempt,
                    policy.attempts(),
                    policy.delay,
                    e
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use super::testing::FakeDriver;

    const NO_WAIT: RetryPolicy = RetryPolicy {
        max_retries: 3,
        delay: Duration::ZERO,
    };

    #[tokio::test]
    async fn recovers_once_page_renders() {
        let driver = FakeDriver::on_page(vrbo::tests::listing_page().unready_for(3));

        let raw = extract_with_retry(Source::Vrbo, &driver, NO_WAIT, "X1").await;
        assert!(raw.is_ok());
    }

    #[tokio::test]
    async fn gives_up_after_four_attempts() {
        let driver = FakeDriver::on_page(vrbo::tests::listing_page().unready_for(100));

        let err = extract_with_retry(Source::Vrbo, &driver, NO_WAIT, "X1").await.unwrap_err();
        assert!(err.is_retryable());
        // each failed attempt stops at its first evaluation
        assert_eq!(driver.evaluations.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn malformed_page_is_not_retried() {
        let page = vacasa::tests::unit_page().value(
            "window.__VACASA_UNIT__?.availability",
            serde_json::json!("sold out"),
        );
        let driver = FakeDriver::on_page(page);

        let err = extract_with_retry(Source::Vacasa, &driver, NO_WAIT, "77").await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(driver.evaluations.load(Ordering::SeqCst), 1);
    }
}
