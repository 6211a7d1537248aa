use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum MarketClockEvent {
    OpensIn { minutes: u32 },
    ClosesIn { minutes: u32 },
    Opened,
    Closed,
}

impl MarketClockEvent {
    /// Rate-limit key for the cause behind this event; each threshold is its own cause.
    pub fn suppression_key(&self) -> String {
        match self {
            Self::OpensIn { minutes } => format!("market-open-{minutes}"),
            Self::ClosesIn { minutes } => format!("market-close-{minutes}"),
            Self::Opened => "market-opened".to_string(),
            Self::Closed => "market-closed".to_string(),
        }
    }
}
