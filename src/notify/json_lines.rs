use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{self, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::notify::Notifier;
use crate::types::notification::{Notification, NotificationCategory};

/// Writes every notification as a single JSON object per line, for piping into
/// another presenter.
pub struct JsonLinesNotifier<W> {
    writer: Mutex<W>,
    primed: AtomicBool,
}

impl JsonLinesNotifier<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesNotifier<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            primed: AtomicBool::new(false),
        }
    }

    async fn write_line<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let mut line = serde_json::to_vec(value).context("failed to encode notification")?;
        line.push(b'\n');

        /* held across the write so concurrent posts never interleave */
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await.context("failed to write notification")?;
        writer.flush().await?;

        Ok(())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Notifier for JsonLinesNotifier<W> {
    async fn request_authorization_if_needed(&self) -> Result<()> {
        if self.primed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let categories: Vec<&str> = NotificationCategory::ALL.iter().map(|c| c.id()).collect();
        self.write_line(&serde_json::json!({ "categories": categories })).await
    }

    async fn post(&self, notification: &Notification) -> Result<()> {
        self.write_line(notification).await
    }
}
