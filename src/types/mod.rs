pub mod auth_state;
pub mod connectivity_state;
pub mod market_session;
pub mod notification;
pub mod notification_rule;
