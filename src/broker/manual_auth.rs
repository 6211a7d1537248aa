use std::env;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::broker::AuthStateSource;
use crate::feed::StateFeed;
use crate::types::auth_state::BrokerAuthState;

/// Auth source driven by whoever owns the broker session: push a new state with
/// [`ManualAuthSource::set`] whenever the session changes.
pub struct ManualAuthSource {
    feed: StateFeed<BrokerAuthState>,
}

impl ManualAuthSource {
    pub fn new() -> Self {
        Self {
            feed: StateFeed::latest_value(),
        }
    }

    pub fn with_initial(state: BrokerAuthState) -> Self {
        let source = Self::new();
        source.set(state);
        source
    }

    /// Authorized when the broker session token variable is present and non-empty.
    pub fn from_env(token_env: &str) -> Self {
        let state = match env::var(token_env) {
            Ok(token) if !token.trim().is_empty() => BrokerAuthState::Authorized,
            _ => BrokerAuthState::Unauthorized,
        };

        info!(%state, token_env, "initial broker auth state");

        Self::with_initial(state)
    }

    pub fn set(&self, state: BrokerAuthState) {
        self.feed.publish(state);
    }

    pub fn current(&self) -> Option<BrokerAuthState> {
        self.feed.latest()
    }

    pub fn subscriber_count(&self) -> usize {
        self.feed.subscriber_count()
    }
}

impl Default for ManualAuthSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStateSource for ManualAuthSource {
    fn subscribe(&self) -> UnboundedReceiver<BrokerAuthState> {
        self.feed.subscribe()
    }
}
