pub mod json_lines;
pub mod log_notifier;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::notification::Notification;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// One-time permission priming. Idempotent; callers treat failure as best-effort.
    async fn request_authorization_if_needed(&self) -> Result<()>;

    /// Fire-and-forget delivery; callers log and drop errors.
    async fn post(&self, notification: &Notification) -> Result<()>;
}
