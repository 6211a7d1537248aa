use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrokerAuthState {
    Authorized,
    Unauthorized,
    Refreshing,
    Throttled,
}

impl BrokerAuthState {
    /// Only an authorized broker session lets market-timing reminders through.
    pub fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

impl fmt::Display for BrokerAuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorized => write!(f, "authorized"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Refreshing => write!(f, "refreshing"),
            Self::Throttled => write!(f, "throttled"),
        }
    }
}
