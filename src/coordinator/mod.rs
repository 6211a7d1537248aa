pub mod event_coordinator;
pub mod suppression_window;

use std::time::Duration;

pub const AUTH_REQUIRED_KEY: &str = "auth-required";
pub const AUTH_REQUIRED_WINDOW: Duration = Duration::from_secs(300);

pub const NET_OFFLINE_KEY: &str = "net-offline";
pub const NET_ONLINE_KEY: &str = "net-online";
pub const CONNECTIVITY_WINDOW: Duration = Duration::from_secs(120);

/// Window for `opens-in`/`closes-in` reminders, per threshold.
pub const MARKET_THRESHOLD_WINDOW: Duration = Duration::from_secs(90);

/// Window for `opened`/`closed`.
pub const MARKET_SESSION_WINDOW: Duration = Duration::from_secs(300);
