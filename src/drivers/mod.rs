pub mod downlink;
pub mod filter;
pub mod heading;
pub mod telemetry;
