//! Shared application state.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{Quota, RateLimiter};
use tracing::{info, warn};

use cadence_auth::Credentials;
use cadence_cache::TaskCache;
use cadence_core::Authenticator;
use cadence_db::Database;

use crate::config::ServerConfig;
use crate::services::{DependencyGraph, TaskService};

/// Rate limiter with one bucket per client address.
pub type ClientRateLimiter = RateLimiter<
    IpAddr,
    governor::state::keyed::DefaultKeyedStateStore<IpAddr>,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub credentials: Credentials,
    /// Resolves bearer tokens for the auth extractor.
    pub authenticator: Arc<dyn Authenticator>,
    pub tasks: TaskService,
    pub graph: DependencyGraph,
    /// Per-client rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<ClientRateLimiter>>,
}

impl AppState {
    pub fn new(
        db: Database,
        cache: TaskCache,
        credentials: Credentials,
        config: &ServerConfig,
    ) -> Self {
        Self {
            tasks: TaskService::new(db.clone(), cache.clone()),
            graph: DependencyGraph::new(db.clone(), cache),
            authenticator: Arc::new(credentials.clone()),
            credentials,
            rate_limiter: build_rate_limiter(config),
            db,
        }
    }
}

/// `rate_limit_requests` per `rate_limit_period`, refilled evenly across the
/// period, with the full count available as a burst.
fn rate_limit_quota(config: &ServerConfig) -> Option<Quota> {
    let burst = NonZeroU32::new(config.rate_limit_requests)?;
    Quota::with_period(config.rate_limit_period / burst.get()).map(|q| q.allow_burst(burst))
}

fn build_rate_limiter(config: &ServerConfig) -> Option<Arc<ClientRateLimiter>> {
    if !config.rate_limit_enabled {
        info!("Rate limiting disabled");
        return None;
    }

    match rate_limit_quota(config) {
        Some(quota) => {
            info!(
                requests = config.rate_limit_requests,
                period_secs = config.rate_limit_period.as_secs(),
                "Rate limiting enabled"
            );
            Some(Arc::new(RateLimiter::keyed(quota)))
        }
        None => {
            warn!("Rate limit period and request count must be non-zero, rate limiting disabled");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(requests: u32, period_secs: u64) -> ServerConfig {
        ServerConfig::default().with_rate_limit(requests, Duration::from_secs(period_secs))
    }

    #[test]
    fn test_quota_refills_evenly_across_period() {
        let quota = rate_limit_quota(&config(1000, 60)).unwrap();
        assert_eq!(quota.burst_size().get(), 1000);
        assert_eq!(quota.replenish_interval(), Duration::from_millis(60));
    }

    #[test]
    fn test_zero_requests_disables_limiter() {
        assert!(rate_limit_quota(&config(0, 60)).is_none());
        assert!(build_rate_limiter(&config(0, 60)).is_none());
        assert!(build_rate_limiter(&ServerConfig::default().without_rate_limit()).is_none());
    }

    #[test]
    fn test_clients_have_separate_buckets() {
        let limiter = build_rate_limiter(&config(1, 60)).unwrap();
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check_key(&a).is_ok());
        assert!(limiter.check_key(&a).is_err());
        assert!(limiter.check_key(&b).is_ok());
    }
}
