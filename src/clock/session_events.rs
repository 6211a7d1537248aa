use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::events::MarketClockEvent;
use crate::types::market_session::MarketSession;
use crate::types::notification_rule::NotificationRule;

/// Turns successive clock samples into threshold-crossing events.
///
/// Thresholds match on exact minute equality: a reminder whose minute is skipped by a
/// late poll is lost for that approach. The emitted sets only reset when the session
/// actually opens or closes, or when the calendar hands over a different session, so
/// polling jitter within a minute never double-fires.
#[derive(Debug, Clone)]
pub struct SessionEventTracker {
    rule: NotificationRule,
    tracked: Option<MarketSession>,
    emitted_open: BTreeSet<u32>,
    emitted_close: BTreeSet<u32>,
    opened_emitted: bool,
    closed_emitted: bool,
}

impl SessionEventTracker {
    pub fn new(rule: NotificationRule) -> Self {
        Self {
            rule,
            tracked: None,
            emitted_open: BTreeSet::new(),
            emitted_close: BTreeSet::new(),
            opened_emitted: false,
            closed_emitted: false,
        }
    }

    pub fn on_tick(
        &mut self,
        session: &MarketSession,
        now: DateTime<Utc>,
    ) -> Vec<MarketClockEvent> {
        let mut events = Vec::new();

        if self.tracked.as_ref() != Some(session) {
            if let Some(previous) = self.tracked.take() {
                /* overnight sessions hand over at the close instant, before it is ever sampled */
                if !self.closed_emitted && now >= previous.end() {
                    events.push(MarketClockEvent::Closed);
                }
                self.reset();
            }
            self.tracked = Some(*session);
        }

        let minutes_to_open = session.minutes_to_open(now);
        if minutes_to_open > 0 {
            self.opened_emitted = false;
            for &minutes in self.rule.open_thresholds() {
                if i64::from(minutes) == minutes_to_open && self.emitted_open.insert(minutes) {
                    events.push(MarketClockEvent::OpensIn { minutes });
                }
            }
        } else if !self.opened_emitted && now < session.end() {
            events.push(MarketClockEvent::Opened);
            self.opened_emitted = true;
            self.emitted_open.clear();
        }

        let minutes_to_close = session.minutes_to_close(now);
        if minutes_to_close > 0 {
            self.closed_emitted = false;
            for &minutes in self.rule.close_thresholds() {
                if i64::from(minutes) == minutes_to_close && self.emitted_close.insert(minutes) {
                    events.push(MarketClockEvent::ClosesIn { minutes });
                }
            }
        } else if !self.closed_emitted {
            events.push(MarketClockEvent::Closed);
            self.closed_emitted = true;
            self.emitted_close.clear();
        }

        events
    }

    fn reset(&mut self) {
        self.emitted_open.clear();
        self.emitted_close.clear();
        self.opened_emitted = false;
        self.closed_emitted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::market_session::SessionKind;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(2025, 3, 12, hour, minute, second)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn session() -> MarketSession {
        MarketSession::new(at(9, 30, 0), at(16, 0, 0), SessionKind::Regular, New_York).unwrap()
    }

    fn tracker() -> SessionEventTracker {
        SessionEventTracker::new(NotificationRule::new(&[60, 30, 10, 5, 1], &[10, 1]).unwrap())
    }

    #[test]
    fn fires_open_threshold_on_exact_minute() {
        let session = session();
        let mut tracker = tracker();

        assert!(tracker.on_tick(&session, at(8, 59, 0)).is_empty());
        assert_eq!(
            tracker.on_tick(&session, at(9, 0, 0)),
            vec![MarketClockEvent::OpensIn { minutes: 30 }]
        );
    }

    #[test]
    fn jitter_within_the_same_minute_fires_once() {
        let session = session();
        let mut tracker = tracker();

        let fired: Vec<_> = [at(9, 0, 0), at(9, 0, 20), at(9, 0, 40)]
            .into_iter()
            .flat_map(|now| tracker.on_tick(&session, now))
            .collect();

        assert_eq!(fired, vec![MarketClockEvent::OpensIn { minutes: 30 }]);
    }

    #[test]
    fn skipped_minute_is_lost_for_the_approach() {
        let session = session();
        let mut tracker = tracker();

        assert!(tracker.on_tick(&session, at(9, 19, 0)).is_empty());
        // 09:20 (10 minutes out) is never sampled
        assert!(tracker.on_tick(&session, at(9, 21, 0)).is_empty());
        assert_eq!(
            tracker.on_tick(&session, at(9, 25, 0)),
            vec![MarketClockEvent::OpensIn { minutes: 5 }]
        );
    }

    #[test]
    fn opened_fires_once_and_resets_open_thresholds() {
        let session = session();
        let mut tracker = tracker();

        tracker.on_tick(&session, at(9, 29, 0));
        assert_eq!(tracker.on_tick(&session, at(9, 30, 0)), vec![MarketClockEvent::Opened]);
        assert!(tracker.on_tick(&session, at(9, 31, 0)).is_empty());
        assert!(tracker.emitted_open.is_empty());
    }

    #[test]
    fn close_side_mirrors_open_side() {
        let session = session();
        let mut tracker = tracker();

        tracker.on_tick(&session, at(9, 30, 0));
        assert_eq!(
            tracker.on_tick(&session, at(15, 50, 0)),
            vec![MarketClockEvent::ClosesIn { minutes: 10 }]
        );
        assert!(tracker.on_tick(&session, at(15, 50, 30)).is_empty());
        assert_eq!(
            tracker.on_tick(&session, at(15, 59, 0)),
            vec![MarketClockEvent::ClosesIn { minutes: 1 }]
        );
        assert_eq!(tracker.on_tick(&session, at(16, 0, 0)), vec![MarketClockEvent::Closed]);
        assert!(tracker.on_tick(&session, at(16, 1, 0)).is_empty());
    }

    #[test]
    fn next_approach_fires_thresholds_again() {
        let today = session();
        let tomorrow = MarketSession::new(
            today.start() + chrono::Duration::days(1),
            today.end() + chrono::Duration::days(1),
            SessionKind::Regular,
            New_York,
        )
        .unwrap();
        let mut tracker = tracker();

        assert_eq!(
            tracker.on_tick(&today, at(9, 0, 0)),
            vec![MarketClockEvent::OpensIn { minutes: 30 }]
        );
        tracker.on_tick(&today, at(9, 30, 0));
        tracker.on_tick(&today, at(16, 0, 0));

        let fired = tracker.on_tick(&tomorrow, at(9, 0, 0) + chrono::Duration::days(1));
        assert_eq!(fired, vec![MarketClockEvent::OpensIn { minutes: 30 }]);
    }

    #[test]
    fn overnight_sessions_close_and_remind_every_day() {
        use crate::clock::calendar::{DailySessionCalendar, SessionCalendar};
        use chrono::NaiveTime;
        use chrono_tz::America::Chicago;

        let calendar = DailySessionCalendar::new(
            Chicago,
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            SessionKind::Futures,
        );
        let mut tracker = tracker();
        let chicago = |day, hour| {
            Chicago
                .with_ymd_and_hms(2025, 3, day, hour, 0, 0)
                .unwrap()
                .with_timezone(&Utc)
        };

        // Wednesday 12:00 to Friday 18:00, one sample per minute
        let mut fired = Vec::new();
        let mut now = chicago(12, 12);
        while now <= chicago(14, 18) {
            let session = calendar.current_session(now).unwrap();
            for event in tracker.on_tick(&session, now) {
                fired.push((now, event));
            }
            now += chrono::Duration::minutes(1);
        }

        let count = |event: MarketClockEvent| fired.iter().filter(|(_, e)| *e == event).count();
        assert_eq!(count(MarketClockEvent::Closed), 3);
        assert_eq!(count(MarketClockEvent::ClosesIn { minutes: 10 }), 3);
        assert_eq!(count(MarketClockEvent::ClosesIn { minutes: 1 }), 3);
        assert_eq!(count(MarketClockEvent::OpensIn { minutes: 60 }), 3);

        let at_thursday_close: Vec<_> = fired
            .iter()
            .filter(|(time, _)| *time == chicago(13, 16))
            .map(|(_, event)| *event)
            .collect();
        assert_eq!(
            at_thursday_close,
            vec![MarketClockEvent::Closed, MarketClockEvent::OpensIn { minutes: 60 }]
        );
    }

    #[test]
    fn daily_session_handover_does_not_repeat_closed() {
        let today = session();
        let tomorrow = MarketSession::new(
            today.start() + chrono::Duration::days(1),
            today.end() + chrono::Duration::days(1),
            SessionKind::Regular,
            New_York,
        )
        .unwrap();
        let mut tracker = tracker();

        assert_eq!(tracker.on_tick(&today, at(16, 0, 0)), vec![MarketClockEvent::Closed]);
        assert!(tracker.on_tick(&tomorrow, at(16, 1, 0)).is_empty());
    }

    #[test]
    fn starting_after_close_reports_closed_only() {
        let session = session();
        let mut tracker = tracker();

        assert_eq!(tracker.on_tick(&session, at(18, 0, 0)), vec![MarketClockEvent::Closed]);
    }
}
