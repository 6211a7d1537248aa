use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, timeout};
use tracing::{debug, info};

use crate::connectivity::ConnectivitySource;
use crate::feed::StateFeed;
use crate::types::connectivity_state::ConnectivityState;

/// Reports raw connectivity by periodically opening a TCP connection to a known host.
pub struct TcpProbeConnectivity {
    address: String,
    interval: Duration,
    connect_timeout: Duration,
    feed: Arc<StateFeed<ConnectivityState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TcpProbeConnectivity {
    pub fn new(address: impl Into<String>, interval: Duration, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            interval,
            connect_timeout,
            feed: Arc::new(StateFeed::latest_value()),
            task: Mutex::new(None),
        }
    }

    pub fn start_probing(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        info!(address = %self.address, interval = ?self.interval, "starting connectivity probe");

        *task = Some(tokio::spawn(probe_loop(
            self.address.clone(),
            self.interval,
            self.connect_timeout,
            self.feed.clone(),
        )));
    }
}

impl ConnectivitySource for TcpProbeConnectivity {
    fn subscribe(&self) -> UnboundedReceiver<ConnectivityState> {
        self.feed.subscribe()
    }
}

impl Drop for TcpProbeConnectivity {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

async fn probe_loop(
    address: String,
    interval: Duration,
    connect_timeout: Duration,
    feed: Arc<StateFeed<ConnectivityState>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let state = probe(&address, connect_timeout).await;
        debug!(%address, %state, "connectivity probe");

        feed.publish(state);
    }
}

pub async fn probe(address: &str, connect_timeout: Duration) -> ConnectivityState {
    match timeout(connect_timeout, TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => ConnectivityState::Online,
        Ok(Err(error)) => {
            debug!(address, %error, "probe connect failed");
            ConnectivityState::Offline
        }
        Err(_) => {
            debug!(address, "probe connect timed out");
            ConnectivityState::Offline
        }
    }
}
