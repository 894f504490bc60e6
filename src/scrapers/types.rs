use std::time::Duration;

use crate::models::ListingSnapshot;
use crate::reconcile::{AvailabilitySeries, PricingSeries};

/// Everything an adapter reads from one listing page
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub availability: AvailabilitySeries,
    /// `None` when the page publishes no nightly rates
    pub pricing: Option<PricingSeries>,
    pub snapshot: ListingSnapshot,
}

/// How often a page that hasn't rendered yet is read again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Fixed wait between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}
