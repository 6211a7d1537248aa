use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::clock::calendar::DailySessionCalendar;
use crate::types::market_session::SessionKind;
use crate::types::notification_rule::NotificationRule;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketClockConfig {
    pub notifications: NotificationsConfig,
    pub session: SessionConfig,
    pub clock: ClockConfig,
    pub connectivity: ConnectivityConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Minutes before the open at which to remind. Must be > 0.
    pub open_thresholds: Vec<i64>,

    /// Minutes before the close at which to remind. Must be > 0.
    pub close_thresholds: Vec<i64>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            open_thresholds: vec![60, 30, 10, 5, 1],
            close_thresholds: vec![60, 30, 10, 5, 1],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// IANA zone the open/close times are expressed in.
    pub time_zone: String,

    /// Local open time, `HH:MM`.
    pub open: String,

    /// Local close time, `HH:MM`. At or before `open` means the session ends the next day.
    pub close: String,

    pub kind: SessionKind,

    pub weekdays_only: bool,

    pub holidays: Vec<NaiveDate>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_zone: "America/New_York".to_string(),
            open: "09:30".to_string(),
            close: "16:00".to_string(),
            kind: SessionKind::Regular,
            weekdays_only: true,
            holidays: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub poll_interval_secs: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// `host:port` reached with a plain TCP connect to decide online/offline.
    pub probe_address: String,
    pub probe_interval_secs: u64,
    pub probe_timeout_ms: u64,

    /// How long a reading must hold before it is accepted.
    pub quiet_period_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_address: "1.1.1.1:443".to_string(),
            probe_interval_secs: 10,
            probe_timeout_ms: 3_000,
            quiet_period_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Environment variable holding the broker session token.
    pub token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: "BROKER_SESSION_TOKEN".to_string(),
        }
    }
}

impl MarketClockConfig {
    pub const FILE_NAME: &'static str = "market_clock.yml";

    /// Loads an explicitly requested file, or the default file if it exists, or the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(Self::FILE_NAME).exists() => Self::read(Path::new(Self::FILE_NAME))?,
            None => Self::default(),
        };

        config
            .validate()
            .context("market clock config validation failed")?;

        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;

        Self::from_yaml(&raw).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str::<Self>(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.notification_rule()?;
        self.calendar()?;

        if self.clock.poll_interval_secs == 0 {
            bail!("clock.poll_interval_secs must be > 0");
        }
        if self.connectivity.probe_address.trim().is_empty() {
            bail!("connectivity.probe_address must not be empty");
        }
        if self.connectivity.probe_interval_secs == 0 {
            bail!("connectivity.probe_interval_secs must be > 0");
        }
        if self.connectivity.probe_timeout_ms == 0 {
            bail!("connectivity.probe_timeout_ms must be > 0");
        }
        if self.connectivity.quiet_period_ms == 0 {
            bail!("connectivity.quiet_period_ms must be > 0");
        }
        /* readings closer together than the quiet period never settle */
        if self.probe_interval() <= self.quiet_period() {
            bail!(
                "connectivity.probe_interval_secs ({}s) must exceed quiet_period_ms ({}ms)",
                self.connectivity.probe_interval_secs,
                self.connectivity.quiet_period_ms
            );
        }
        if self.auth.token_env.trim().is_empty() {
            bail!("auth.token_env must not be empty");
        }

        Ok(())
    }

    pub fn notification_rule(&self) -> Result<NotificationRule> {
        NotificationRule::new(
            &self.notifications.open_thresholds,
            &self.notifications.close_thresholds,
        )
        .context("invalid notification thresholds")
    }

    pub fn calendar(&self) -> Result<DailySessionCalendar> {
        let session = &self.session;

        let time_zone: Tz = session
            .time_zone
            .parse()
            .map_err(|_| anyhow!("unknown time zone: {}", session.time_zone))?;
        let open = parse_local_time("session.open", &session.open)?;
        let close = parse_local_time("session.close", &session.close)?;

        Ok(DailySessionCalendar::new(time_zone, open, close, session.kind)
            .with_weekdays_only(session.weekdays_only)
            .with_holidays(session.holidays.iter().copied()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.clock.poll_interval_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.connectivity.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity.probe_timeout_ms)
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.connectivity.quiet_period_ms)
    }
}

fn parse_local_time(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .with_context(|| format!("{field} must be HH:MM, got \"{value}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = MarketClockConfig::from_yaml("{}").unwrap();

        config.validate().unwrap();
        assert_eq!(config.notification_rule().unwrap(), NotificationRule::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.quiet_period(), Duration::from_secs(2));
        assert_eq!(config.auth.token_env, "BROKER_SESSION_TOKEN");
    }

    #[test]
    fn parses_a_full_document() {
        let raw = r#"
notifications:
  open_thresholds: [15, 5]
  close_thresholds: [30]
session:
  time_zone: America/Chicago
  open: "17:00"
  close: "16:00"
  kind: futures
  weekdays_only: false
  holidays: ["2025-12-25"]
clock:
  poll_interval_secs: 30
connectivity:
  probe_address: "example.com:443"
  quiet_period_ms: 5000
"#;
        let config = MarketClockConfig::from_yaml(raw).unwrap();
        config.validate().unwrap();

        let rule = config.notification_rule().unwrap();
        assert_eq!(rule.open_thresholds(), &[15, 5]);
        assert_eq!(rule.close_thresholds(), &[30]);
        assert_eq!(config.session.kind, SessionKind::Futures);
        assert_eq!(config.session.holidays.len(), 1);
        assert_eq!(config.quiet_period(), Duration::from_secs(5));
        assert_eq!(config.calendar().unwrap().time_zone(), chrono_tz::America::Chicago);
        // untouched fields keep their defaults
        assert_eq!(config.connectivity.probe_interval_secs, 10);
    }

    #[test]
    fn rejects_negative_thresholds() {
        let config =
            MarketClockConfig::from_yaml("notifications:\n  open_thresholds: [10, -1]\n").unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_time_zone_and_bad_times() {
        let zone = MarketClockConfig::from_yaml("session:\n  time_zone: Mars/Olympus\n").unwrap();
        assert!(zone.validate().is_err());

        let time = MarketClockConfig::from_yaml("session:\n  open: \"9.30\"\n").unwrap();
        assert!(time.validate().is_err());
    }

    #[test]
    fn rejects_zero_intervals() {
        let config = MarketClockConfig::from_yaml("clock:\n  poll_interval_secs: 0\n").unwrap();
        assert!(config.validate().is_err());

        let config =
            MarketClockConfig::from_yaml("connectivity:\n  quiet_period_ms: 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_connectivity_interval_within_quiet_period() {
        let equal = MarketClockConfig::from_yaml(
            "connectivity:\n  probe_interval_secs: 2\n  quiet_period_ms: 2000\n",
        )
        .unwrap();
        assert!(equal.validate().is_err());

        let shorter = MarketClockConfig::from_yaml(
            "connectivity:\n  probe_interval_secs: 1\n  quiet_period_ms: 2000\n",
        )
        .unwrap();
        assert!(shorter.validate().is_err());

        let longer = MarketClockConfig::from_yaml(
            "connectivity:\n  probe_interval_secs: 3\n  quiet_period_ms: 2000\n",
        )
        .unwrap();
        longer.validate().unwrap();
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let missing = Path::new("definitely/not/here/market_clock.yml");

        assert!(MarketClockConfig::load(Some(missing)).is_err());
    }
}
