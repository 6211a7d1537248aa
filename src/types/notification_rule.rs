use anyhow::{Result, bail};

const DEFAULT_THRESHOLDS: [i64; 5] = [60, 30, 10, 5, 1];

/// Minute counts before open/close at which a one-time reminder fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRule {
    /// Distinct, sorted descending.
    open_thresholds: Vec<u32>,

    /// Distinct, sorted descending.
    close_thresholds: Vec<u32>,
}

impl NotificationRule {
    pub fn new(open_thresholds: &[i64], close_thresholds: &[i64]) -> Result<Self> {
        Ok(Self {
            open_thresholds: normalize("open", open_thresholds)?,
            close_thresholds: normalize("close", close_thresholds)?,
        })
    }

    pub fn open_thresholds(&self) -> &[u32] {
        &self.open_thresholds
    }

    pub fn close_thresholds(&self) -> &[u32] {
        &self.close_thresholds
    }

    pub fn has_open_threshold(&self, minutes: u32) -> bool {
        self.open_thresholds.contains(&minutes)
    }

    pub fn has_close_threshold(&self, minutes: u32) -> bool {
        self.close_thresholds.contains(&minutes)
    }
}

impl Default for NotificationRule {
    fn default() -> Self {
        Self {
            open_thresholds: DEFAULT_THRESHOLDS.iter().map(|m| *m as u32).collect(),
            close_thresholds: DEFAULT_THRESHOLDS.iter().map(|m| *m as u32).collect(),
        }
    }
}

fn normalize(side: &str, thresholds: &[i64]) -> Result<Vec<u32>> {
    let mut minutes = Vec::with_capacity(thresholds.len());

    for &value in thresholds {
        if value <= 0 {
            bail!("{side} threshold must be > 0 minutes, got {value}");
        }
        let Ok(value) = u32::try_from(value) else {
            bail!("{side} threshold {value} is out of range");
        };
        minutes.push(value);
    }

    minutes.sort_unstable_by(|a, b| b.cmp(a));
    minutes.dedup();

    Ok(minutes)
}
