//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-client-IP limits on the evaluation API via tower_governor.

use crate::error::ApiError;
use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config with X-RateLimit-* headers enabled
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Apply the limiter at all
    pub enabled: bool,
    /// Seconds to replenish one request from the quota
    pub per_second: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // order-entry screens fire evaluations in bursts
        Self {
            enabled: true,
            per_second: 1,
            burst_size: 20,
        }
    }
}

impl RateLimitConfig {
    /// Tighter limits for deployments exposed beyond the clinical network
    pub fn strict() -> Self {
        Self {
            enabled: true,
            per_second: 2,
            burst_size: 5,
        }
    }
}

/// Build the governor config.
///
/// The service must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the peer IP
/// can be extracted.
pub fn create_governor_config(
    config: &RateLimitConfig,
) -> Result<Arc<DefaultGovernorConfig>, ApiError> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
        .ok_or_else(|| {
            ApiError::Startup(format!(
                "invalid rate limit: per_second={} burst_size={}",
                config.per_second, config.burst_size
            ))
        })
}
