use std::sync::Arc;

use anyhow::Result;

use crate::{
    broker::manual_auth::ManualAuthSource,
    clock::{calendar::SessionCalendar, session_clock::SessionClock},
    config::MarketClockConfig,
    connectivity::tcp_probe::TcpProbeConnectivity,
    notify::{Notifier, json_lines::JsonLinesNotifier, log_notifier::LogNotifier},
    scenario::sinks::SinkKind,
};

/// Builds the concrete collaborators for a monitoring session from configuration.
pub struct Scenario;

impl Scenario {
    pub fn notifier(kind: SinkKind) -> Arc<dyn Notifier> {
        tracing::info!(sink = %kind, "creating notification sink");

        match kind {
            SinkKind::Log => Arc::new(LogNotifier::new()),
            SinkKind::Json => Arc::new(JsonLinesNotifier::stdout()),
        }
    }

    pub fn calendar(config: &MarketClockConfig) -> Result<Arc<dyn SessionCalendar>> {
        Ok(Arc::new(config.calendar()?))
    }

    pub fn clock(config: &MarketClockConfig) -> Result<Arc<SessionClock>> {
        let calendar = Self::calendar(config)?;
        let rule = config.notification_rule()?;

        Ok(Arc::new(SessionClock::new(calendar, rule, config.poll_interval())))
    }

    pub fn auth(config: &MarketClockConfig) -> Arc<ManualAuthSource> {
        Arc::new(ManualAuthSource::from_env(&config.auth.token_env))
    }

    pub fn connectivity(config: &MarketClockConfig) -> Arc<TcpProbeConnectivity> {
        tracing::info!(address = %config.connectivity.probe_address, "creating connectivity probe");

        Arc::new(TcpProbeConnectivity::new(
            config.connectivity.probe_address.clone(),
            config.probe_interval(),
            config.probe_timeout(),
        ))
    }
}
