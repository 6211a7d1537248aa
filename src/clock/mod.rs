pub mod calendar;
pub mod session_clock;
pub mod session_events;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::events::MarketClockEvent;
use crate::types::market_session::MarketSession;

pub trait MarketClockSource: Send + Sync {
    /// A fresh ordered stream of threshold-crossing events from this point on.
    fn subscribe(&self) -> UnboundedReceiver<MarketClockEvent>;

    /// The session containing or following `now`, if a session model applies.
    fn current_session(&self, now: DateTime<Utc>) -> Option<MarketSession>;
}
