use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::types::market_session::{MarketSession, SessionKind};

/// How far ahead to look for the next trading day before giving up.
const MAX_LOOKAHEAD_DAYS: usize = 14;

pub trait SessionCalendar: Send + Sync {
    fn current_session(&self, now: DateTime<Utc>) -> Option<MarketSession>;
}

/// One session per trading day, defined by local open/close times in an exchange time
/// zone. A close at or before the open rolls the session end into the next day.
#[derive(Debug, Clone)]
pub struct DailySessionCalendar {
    time_zone: Tz,
    open: NaiveTime,
    close: NaiveTime,
    kind: SessionKind,
    weekdays_only: bool,
    holidays: BTreeSet<NaiveDate>,
}

impl DailySessionCalendar {
    pub fn new(time_zone: Tz, open: NaiveTime, close: NaiveTime, kind: SessionKind) -> Self {
        Self {
            time_zone,
            open,
            close,
            kind,
            weekdays_only: false,
            holidays: BTreeSet::new(),
        }
    }

    /// NYSE regular hours, 09:30-16:00 New York time, Monday to Friday.
    pub fn nyse_regular() -> Self {
        let open = NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN);
        let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN);

        Self::new(chrono_tz::America::New_York, open, close, SessionKind::Regular)
            .with_weekdays_only(true)
    }

    pub fn with_weekdays_only(mut self, weekdays_only: bool) -> Self {
        self.weekdays_only = weekdays_only;
        self
    }

    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays.extend(holidays);
        self
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    fn is_trading_day(&self, date: NaiveDate) -> bool {
        if self.holidays.contains(&date) {
            return false;
        }

        if self.weekdays_only {
            return !matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        }

        true
    }

    fn session_for(&self, date: NaiveDate) -> Option<MarketSession> {
        let start = self.local_instant(date.and_time(self.open))?;

        let end_date = if self.close <= self.open {
            date.succ_opt()?
        } else {
            date
        };
        let end = self.local_instant(end_date.and_time(self.close))?;

        MarketSession::new(start, end, self.kind, self.time_zone).ok()
    }

    /// Ambiguous local times (DST fall-back) resolve to the earlier instant; times
    /// skipped by a DST jump have no session.
    fn local_instant(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.time_zone
            .from_local_datetime(&local)
            .earliest()
            .map(|instant| instant.with_timezone(&Utc))
    }
}

impl SessionCalendar for DailySessionCalendar {
    fn current_session(&self, now: DateTime<Utc>) -> Option<MarketSession> {
        let today = now.with_timezone(&self.time_zone).date_naive();

        /* an overnight session that started yesterday may still be running */
        if let Some(yesterday) = today.pred_opt() {
            if self.is_trading_day(yesterday) {
                if let Some(session) = self.session_for(yesterday) {
                    if session.contains(now) {
                        return Some(session);
                    }
                }
            }
        }

        let mut date = today;
        for _ in 0..MAX_LOOKAHEAD_DAYS {
            if self.is_trading_day(date) {
                if let Some(session) = self.session_for(date) {
                    return Some(session);
                }
            }
            date = date.succ_opt()?;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::{Chicago, New_York};

    fn ny(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn weekday_morning_returns_upcoming_same_day_session() {
        let calendar = DailySessionCalendar::nyse_regular();
        // Wednesday
        let session = calendar.current_session(ny(2025, 3, 12, 8, 0)).unwrap();

        assert_eq!(session.start(), ny(2025, 3, 12, 9, 30));
        assert_eq!(session.end(), ny(2025, 3, 12, 16, 0));
        assert_eq!(session.kind(), SessionKind::Regular);
        assert_eq!(session.time_zone(), New_York);
    }

    #[test]
    fn evening_still_reports_the_finished_session_of_the_day() {
        let calendar = DailySessionCalendar::nyse_regular();
        let session = calendar.current_session(ny(2025, 3, 12, 18, 0)).unwrap();

        assert_eq!(session.end(), ny(2025, 3, 12, 16, 0));
    }

    #[test]
    fn weekend_rolls_forward_to_monday() {
        let calendar = DailySessionCalendar::nyse_regular();
        // Saturday
        let session = calendar.current_session(ny(2025, 3, 15, 12, 0)).unwrap();

        assert_eq!(session.start(), ny(2025, 3, 17, 9, 30));
    }

    #[test]
    fn holidays_are_skipped() {
        let good_friday = NaiveDate::from_ymd_opt(2025, 4, 18).unwrap();
        let calendar = DailySessionCalendar::nyse_regular().with_holidays([good_friday]);
        let session = calendar.current_session(ny(2025, 4, 18, 10, 0)).unwrap();

        assert_eq!(session.start(), ny(2025, 4, 21, 9, 30));
    }

    #[test]
    fn session_times_follow_daylight_saving() {
        let calendar = DailySessionCalendar::nyse_regular();

        let winter = calendar.current_session(ny(2025, 1, 15, 8, 0)).unwrap();
        let summer = calendar.current_session(ny(2025, 7, 15, 8, 0)).unwrap();

        assert_eq!(winter.start().format("%H:%M").to_string(), "14:30");
        assert_eq!(summer.start().format("%H:%M").to_string(), "13:30");
    }

    #[test]
    fn open_skipped_by_daylight_saving_moves_to_next_day() {
        let open = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let close = NaiveTime::from_hms_opt(4, 0, 0).unwrap();
        let calendar = DailySessionCalendar::new(New_York, open, close, SessionKind::Futures);

        // 2025-03-09 02:30 does not exist in New York
        let session = calendar.current_session(ny(2025, 3, 9, 1, 0)).unwrap();

        assert_eq!(session.start(), ny(2025, 3, 10, 2, 30));
    }

    #[test]
    fn overnight_session_is_found_from_the_previous_day() {
        let open = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap();
        let calendar = DailySessionCalendar::new(Chicago, open, close, SessionKind::Futures);

        let now = Chicago
            .with_ymd_and_hms(2025, 3, 12, 2, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let session = calendar.current_session(now).unwrap();

        assert!(session.contains(now));
        assert_eq!(session.kind(), SessionKind::Futures);
        assert_eq!(
            session.start(),
            Chicago
                .with_ymd_and_hms(2025, 3, 11, 17, 0, 0)
                .unwrap()
                .with_timezone(&Utc)
        );
    }
}
