pub mod cli;
pub mod client;
pub mod engine;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod transport;
