//! Error types
//!
//! Collaborator failures are carried as their own associated error types; the
//! core only adds which stage of the cycle failed.

use core::fmt;

/// Why an uplink cycle was abandoned.
///
/// Not being joined is not an error: the task requests a join and reports
/// [`UplinkOutcome::JoinRequested`](crate::tasks::uplink::UplinkOutcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UplinkError<S, E> {
    /// Sensor bus read failed; no frame was built.
    Sensor(S),
    /// The engine refused the frame.
    Send(E),
}

impl<S: fmt::Debug, E: fmt::Debug> fmt::Display for UplinkError<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UplinkError::Sensor(e) => write!(f, "sensor read failed: {:?}", e),
            UplinkError::Send(e) => write!(f, "send rejected: {:?}", e),
        }
    }
}

/// Telemetry frame decode errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Payload is not exactly one telemetry frame long
    Length { expected: usize, found: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Length { expected, found } => {
                write!(f, "telemetry frame is {} bytes, expected {}", found, expected)
            }
        }
    }
}
