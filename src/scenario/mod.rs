pub mod scenario;
pub mod sinks;
