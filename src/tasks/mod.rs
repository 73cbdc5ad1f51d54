pub mod producers;
pub mod scheduler;
pub mod uplink;
