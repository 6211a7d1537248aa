use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::notify::Notifier;
use crate::types::notification::{Notification, NotificationCategory};

/// Presents notifications as structured log events.
#[derive(Debug, Default)]
pub struct LogNotifier {
    primed: AtomicBool,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn request_authorization_if_needed(&self) -> Result<()> {
        if !self.primed.swap(true, Ordering::SeqCst) {
            let categories: Vec<&str> = NotificationCategory::ALL.iter().map(|c| c.id()).collect();
            info!(?categories, "notification categories registered");
        }

        Ok(())
    }

    async fn post(&self, notification: &Notification) -> Result<()> {
        info!(
            id = %notification.id,
            category = notification.category.map(|c| c.id()).unwrap_or("none"),
            title = %notification.title,
            body = %notification.body,
            "notification"
        );

        Ok(())
    }
}
