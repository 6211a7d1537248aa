pub mod manual_auth;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::types::auth_state::BrokerAuthState;

pub trait AuthStateSource: Send + Sync {
    /// Ordered auth readings; latest-value semantics.
    fn subscribe(&self) -> UnboundedReceiver<BrokerAuthState>;
}
