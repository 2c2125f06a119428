//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::upstream::{UpstreamClient, UpstreamError};
use crate::util::rate_limit::ActionRateLimiter;
use crate::viewer::ViewerRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub upstream: UpstreamClient,
    pub viewers: Arc<ViewerRegistry>,
    pub action_limiter: ActionRateLimiter,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let config = Arc::new(config);

        // Initialize upstream client
        let upstream = UpstreamClient::new(&config)?;

        // Viewers poll through the same client
        let viewers = Arc::new(ViewerRegistry::new(
            Arc::new(upstream.clone()),
            config.poll_interval,
        ));

        let action_limiter = ActionRateLimiter::new(config.action_rate_limit);

        Ok(Self {
            config,
            upstream,
            viewers,
            action_limiter,
        })
    }
}
