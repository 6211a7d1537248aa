pub mod broker;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod coordinator;
pub mod events;
pub mod feed;
pub mod notify;
pub mod scenario;
pub mod types;
