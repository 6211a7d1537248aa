use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broker::AuthStateSource;
use crate::clock::MarketClockSource;
use crate::connectivity::ConnectivitySource;
use crate::connectivity::debouncer::{ConnectivityDebouncer, DEFAULT_QUIET_PERIOD};
use crate::coordinator::suppression_window::SuppressionWindow;
use crate::coordinator::{
    AUTH_REQUIRED_KEY, AUTH_REQUIRED_WINDOW, CONNECTIVITY_WINDOW, MARKET_SESSION_WINDOW,
    MARKET_THRESHOLD_WINDOW, NET_OFFLINE_KEY, NET_ONLINE_KEY,
};
use crate::events::MarketClockEvent;
use crate::notify::Notifier;
use crate::types::auth_state::BrokerAuthState;
use crate::types::connectivity_state::{ConnectivityState, ConnectivityTransition};
use crate::types::notification::Notification;
use crate::types::notification_rule::NotificationRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Stopped,
    Running,
}

/// Merges clock, auth and connectivity streams into notifications.
///
/// Market-timing events only pass while the broker is authorized and the debounced
/// connectivity is online; everything is rate limited per cause.
pub struct EventCoordinator {
    clock: Arc<dyn MarketClockSource>,
    auth: Arc<dyn AuthStateSource>,
    connectivity: Arc<dyn ConnectivitySource>,
    notifier: Arc<dyn Notifier>,
    rule: NotificationRule,
    quiet_period: Duration,
    suppression: Arc<SuppressionWindow>,
    run: Option<ActiveRun>,
}

struct ActiveRun {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EventCoordinator {
    pub fn new(
        clock: Arc<dyn MarketClockSource>,
        auth: Arc<dyn AuthStateSource>,
        connectivity: Arc<dyn ConnectivitySource>,
        notifier: Arc<dyn Notifier>,
        rule: NotificationRule,
    ) -> Self {
        Self {
            clock,
            auth,
            connectivity,
            notifier,
            rule,
            quiet_period: DEFAULT_QUIET_PERIOD,
            suppression: Arc::new(SuppressionWindow::new()),
            run: None,
        }
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn state(&self) -> CoordinatorState {
        match &self.run {
            Some(run) if !run.task.is_finished() => CoordinatorState::Running,
            _ => CoordinatorState::Stopped,
        }
    }

    /// Replaces any previous run: the old loop is cancelled and joined before the new
    /// one subscribes, so at most one loop is ever active.
    pub async fn start(&mut self) {
        self.stop().await;

        if let Err(error) = self.notifier.request_authorization_if_needed().await {
            warn!(?error, "notification permission priming failed; continuing");
        }

        let subscriptions = Subscriptions {
            clock: self.clock.subscribe(),
            auth: self.auth.subscribe(),
            connectivity: self.connectivity.subscribe(),
        };

        let run_loop = RunLoop {
            notifier: self.notifier.clone(),
            rule: self.rule.clone(),
            suppression: self.suppression.clone(),
            current_auth: BrokerAuthState::Authorized,
            debouncer: ConnectivityDebouncer::new(self.quiet_period, ConnectivityState::Online),
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop.run(subscriptions, cancel.clone()));

        self.run = Some(ActiveRun { cancel, task });
        info!(rule = ?self.rule, quiet_period = ?self.quiet_period, "event coordinator started");
    }

    /// Cancels the run loop, including any pending connectivity settle timer, and waits
    /// for it to exit.
    pub async fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };

        run.cancel.cancel();
        if let Err(error) = run.task.await {
            if error.is_panic() {
                error!(?error, "event coordinator run loop panicked");
            }
        }

        info!("event coordinator stopped");
    }
}

impl Drop for EventCoordinator {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            run.cancel.cancel();
        }
    }
}

impl fmt::Debug for EventCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCoordinator")
            .field("state", &self.state())
            .field("rule", &self.rule)
            .field("quiet_period", &self.quiet_period)
            .finish()
    }
}

struct Subscriptions {
    clock: UnboundedReceiver<MarketClockEvent>,
    auth: UnboundedReceiver<BrokerAuthState>,
    connectivity: UnboundedReceiver<ConnectivityState>,
}

/// State owned by the single consumer loop. Nothing outside the loop reads or writes
/// `current_auth` or the debouncer.
struct RunLoop {
    notifier: Arc<dyn Notifier>,
    rule: NotificationRule,
    suppression: Arc<SuppressionWindow>,
    current_auth: BrokerAuthState,
    debouncer: ConnectivityDebouncer,
}

impl RunLoop {
    async fn run(mut self, mut subscriptions: Subscriptions, cancel: CancellationToken) {
        let mut clock_open = true;
        let mut auth_open = true;
        let mut connectivity_open = true;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                state = subscriptions.auth.recv(), if auth_open => match state {
                    Some(state) => self.on_auth_state(state).await,
                    None => {
                        warn!("auth source closed");
                        auth_open = false;
                    }
                },

                reading = subscriptions.connectivity.recv(), if connectivity_open => match reading {
                    Some(reading) => self.on_connectivity_reading(reading),
                    None => {
                        warn!("connectivity source closed");
                        connectivity_open = false;
                    }
                },

                settled = self.debouncer.settled() => {
                    if let Some(transition) = settled {
                        self.on_connectivity_transition(transition).await;
                    }
                }

                event = subscriptions.clock.recv(), if clock_open => match event {
                    Some(event) => self.on_clock_event(event).await,
                    None => {
                        warn!("clock source closed");
                        clock_open = false;
                    }
                },
            }
        }

        self.debouncer.cancel();
        debug!("event coordinator run loop exited");
    }

    fn gate_open(&self) -> bool {
        self.current_auth.is_authorized() && self.debouncer.accepted().is_online()
    }

    async fn on_auth_state(&mut self, state: BrokerAuthState) {
        if state != self.current_auth {
            info!(from = %self.current_auth, to = %state, "broker auth state changed");
        }
        self.current_auth = state;

        if state == BrokerAuthState::Unauthorized {
            if self.suppression.allow(AUTH_REQUIRED_KEY, AUTH_REQUIRED_WINDOW) {
                self.post(Notification::authorization_required()).await;
            } else {
                debug!(key = AUTH_REQUIRED_KEY, "notification suppressed");
            }
        }
    }

    fn on_connectivity_reading(&mut self, reading: ConnectivityState) {
        debug!(%reading, accepted = %self.debouncer.accepted(), "raw connectivity reading");
        self.debouncer.submit(reading);
    }

    async fn on_connectivity_transition(&mut self, transition: ConnectivityTransition) {
        info!(from = %transition.from, to = %transition.to, "connectivity settled");

        let (key, notification) = match transition.to {
            ConnectivityState::Offline => (NET_OFFLINE_KEY, Notification::connectivity_lost()),
            ConnectivityState::Online => (NET_ONLINE_KEY, Notification::connectivity_restored()),
        };

        if self.suppression.allow(key, CONNECTIVITY_WINDOW) {
            self.post(notification).await;
        } else {
            debug!(key, "notification suppressed");
        }
    }

    async fn on_clock_event(&mut self, event: MarketClockEvent) {
        if !self.gate_open() {
            debug!(
                ?event,
                auth = %self.current_auth,
                connectivity = %self.debouncer.accepted(),
                "gate closed; discarding clock event"
            );
            return;
        }

        let window = match event {
            MarketClockEvent::OpensIn { minutes } if self.rule.has_open_threshold(minutes) => {
                MARKET_THRESHOLD_WINDOW
            }
            MarketClockEvent::ClosesIn { minutes } if self.rule.has_close_threshold(minutes) => {
                MARKET_THRESHOLD_WINDOW
            }
            MarketClockEvent::Opened | MarketClockEvent::Closed => MARKET_SESSION_WINDOW,
            _ => {
                debug!(?event, "no configured threshold for clock event");
                return;
            }
        };

        let key = event.suppression_key();
        if !self.suppression.allow(&key, window) {
            debug!(%key, "notification suppressed");
            return;
        }

        let notification = match event {
            MarketClockEvent::OpensIn { minutes } => Notification::market_opens_in(minutes),
            MarketClockEvent::ClosesIn { minutes } => Notification::market_closes_in(minutes),
            MarketClockEvent::Opened => Notification::market_opened(),
            MarketClockEvent::Closed => Notification::market_closed(),
        };

        self.post(notification).await;
    }

    async fn post(&self, notification: Notification) {
        info!(title = %notification.title, body = %notification.body, "posting notification");

        if let Err(error) = self.notifier.post(&notification).await {
            warn!(?error, title = %notification.title, "notification post failed");
        }
    }
}
