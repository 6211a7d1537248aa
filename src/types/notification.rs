use std::fmt;

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationCategory {
    Market,
    Auth,
    Net,
}

impl NotificationCategory {
    pub const ALL: [NotificationCategory; 3] = [Self::Market, Self::Auth, Self::Net];

    pub fn id(self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Auth => "auth",
            Self::Net => "net",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub category: Option<NotificationCategory>,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        category: Option<NotificationCategory>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            category,
        }
    }

    pub fn authorization_required() -> Self {
        Self::new(
            "Authorization required",
            "Sign in to receive trading alerts",
            Some(NotificationCategory::Auth),
        )
    }

    pub fn market_opens_in(minutes: u32) -> Self {
        Self::new(
            "Market opens soon",
            format!("Opens in {minutes}m"),
            Some(NotificationCategory::Market),
        )
    }

    pub fn market_closes_in(minutes: u32) -> Self {
        Self::new(
            "Market closes soon",
            format!("Closes in {minutes}m"),
            Some(NotificationCategory::Market),
        )
    }

    pub fn market_opened() -> Self {
        Self::new(
            "Market opened",
            "Regular session is now open",
            Some(NotificationCategory::Market),
        )
    }

    pub fn market_closed() -> Self {
        Self::new(
            "Market closed",
            "Regular session is now closed",
            Some(NotificationCategory::Market),
        )
    }

    pub fn connectivity_lost() -> Self {
        Self::new(
            "Connectivity lost",
            "Trading alerts paused while offline",
            Some(NotificationCategory::Net),
        )
    }

    pub fn connectivity_restored() -> Self {
        Self::new(
            "Connectivity restored",
            "Trading alerts resumed",
            Some(NotificationCategory::Net),
        )
    }
}
