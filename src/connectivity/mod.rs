pub mod debouncer;
pub mod tcp_probe;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::types::connectivity_state::ConnectivityState;

pub trait ConnectivitySource: Send + Sync {
    /// Raw readings in order; values may repeat or flap.
    fn subscribe(&self) -> UnboundedReceiver<ConnectivityState>;
}
