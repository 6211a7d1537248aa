use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::clock::MarketClockSource;
use crate::clock::calendar::SessionCalendar;
use crate::clock::session_events::SessionEventTracker;
use crate::events::MarketClockEvent;
use crate::feed::StateFeed;
use crate::types::market_session::MarketSession;
use crate::types::notification_rule::NotificationRule;

/// Polls a session calendar at a fixed cadence and publishes threshold events.
pub struct SessionClock {
    calendar: Arc<dyn SessionCalendar>,
    rule: NotificationRule,
    poll_interval: Duration,
    feed: Arc<StateFeed<MarketClockEvent>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionClock {
    pub fn new(
        calendar: Arc<dyn SessionCalendar>,
        rule: NotificationRule,
        poll_interval: Duration,
    ) -> Self {
        Self {
            calendar,
            rule,
            poll_interval,
            feed: Arc::new(StateFeed::events()),
            task: Mutex::new(None),
        }
    }

    /// Starts the poll loop; a second call while it is running does nothing.
    pub fn start_polling(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        info!(poll_interval = ?self.poll_interval, "starting session clock");

        *task = Some(tokio::spawn(poll(
            self.calendar.clone(),
            SessionEventTracker::new(self.rule.clone()),
            self.poll_interval,
            self.feed.clone(),
        )));
    }
}

impl MarketClockSource for SessionClock {
    fn subscribe(&self) -> UnboundedReceiver<MarketClockEvent> {
        self.feed.subscribe()
    }

    fn current_session(&self, now: DateTime<Utc>) -> Option<MarketSession> {
        self.calendar.current_session(now)
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

async fn poll(
    calendar: Arc<dyn SessionCalendar>,
    mut tracker: SessionEventTracker,
    poll_interval: Duration,
    feed: Arc<StateFeed<MarketClockEvent>>,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let now = Utc::now();
        let Some(session) = calendar.current_session(now) else {
            debug!("no session applies; skipping tick");
            continue;
        };

        for event in tracker.on_tick(&session, now) {
            debug!(?event, %session, "clock event");
            feed.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::market_session::SessionKind;

    /// Always reports a session whose open is exactly 30 minutes (plus a margin that
    /// survives the floor) after the queried instant.
    struct ApproachingCalendar;

    impl SessionCalendar for ApproachingCalendar {
        fn current_session(&self, now: DateTime<Utc>) -> Option<MarketSession> {
            let start = now + chrono::Duration::seconds(30 * 60 + 30);
            let end = start + chrono::Duration::hours(6);

            MarketSession::new(start, end, SessionKind::Regular, chrono_tz::Tz::UTC).ok()
        }
    }

    struct NoSessionCalendar;

    impl SessionCalendar for NoSessionCalendar {
        fn current_session(&self, _now: DateTime<Utc>) -> Option<MarketSession> {
            None
        }
    }

    #[tokio::test]
    async fn publishes_threshold_events_to_subscribers() {
        let clock = SessionClock::new(
            Arc::new(ApproachingCalendar),
            NotificationRule::default(),
            Duration::from_millis(10),
        );
        let mut events = clock.subscribe();

        clock.start_polling();
        clock.start_polling();

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap();
        assert_eq!(event, Some(MarketClockEvent::OpensIn { minutes: 30 }));
    }

    #[tokio::test]
    async fn missing_session_yields_no_events() {
        let clock = SessionClock::new(
            Arc::new(NoSessionCalendar),
            NotificationRule::default(),
            Duration::from_millis(5),
        );
        let mut events = clock.subscribe();
        clock.start_polling();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(events.try_recv().is_err());
        assert!(clock.current_session(Utc::now()).is_none());
    }
}
