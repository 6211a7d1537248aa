use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    Regular,
    Premarket,
    AfterHours,
    Futures,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Premarket => write!(f, "premarket"),
            Self::AfterHours => write!(f, "after-hours"),
            Self::Futures => write!(f, "futures"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "regular" => Ok(Self::Regular),
            "premarket" | "pre-market" => Ok(Self::Premarket),
            "after-hours" | "afterhours" => Ok(Self::AfterHours),
            "futures" => Ok(Self::Futures),
            other => Err(anyhow!("unknown session kind: {other}")),
        }
    }
}

/// A single trading window. Computed per query, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSession {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    kind: SessionKind,
    time_zone: Tz,
}

impl MarketSession {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kind: SessionKind,
        time_zone: Tz,
    ) -> Result<Self> {
        if start >= end {
            bail!("session start {start} must be before end {end}");
        }

        Ok(Self {
            start,
            end,
            kind,
            time_zone,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    /// Whole minutes until the session opens, floored, so it turns non-positive at the
    /// open instant.
    pub fn minutes_to_open(&self, now: DateTime<Utc>) -> i64 {
        floor_minutes(self.start, now)
    }

    pub fn minutes_to_close(&self, now: DateTime<Utc>) -> i64 {
        floor_minutes(self.end, now)
    }
}

impl fmt::Display for MarketSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tz = self.time_zone;
        write!(
            formatter,
            "{} session {} - {} ({})",
            self.kind,
            self.start.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
            self.end.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
            tz.name()
        )
    }
}

fn floor_minutes(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (target - now).num_seconds().div_euclid(60)
}
