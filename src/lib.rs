pub mod actuator;
pub mod comms;
pub mod panel;
pub mod protocol;
pub mod transport;
pub mod utils;

// Crate version exposed for runtime queries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
