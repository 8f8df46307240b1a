//! Error taxonomy for the polling core.
//!
//! `ConfigurationError` is fatal at startup. `TransportError` covers one
//! failed exchange with the device; whether it ends the process is decided
//! by the poller's [`ProbeErrorPolicy`](crate::poller::ProbeErrorPolicy).

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("poll interval must be a positive duration, got {0:?}")]
    InvalidInterval(Duration),

    #[error("invalid duration '{value}' for {field}: {reason}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid label name '{0}': must match [a-zA-Z_][a-zA-Z0-9_]* and not start with '__'")]
    InvalidLabelName(String),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot resolve target '{target}': {reason}")]
    Resolve { target: String, reason: String },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no response after {attempts} attempt(s) of {timeout:?} each")]
    Timeout { attempts: u32, timeout: Duration },

    #[error("SNMP exchange failed: {0}")]
    Protocol(String),

    #[error("agent returned error-status {status} ({name}) at index {index}")]
    Agent {
        status: u32,
        name: &'static str,
        index: u32,
    },

    #[error("request carries no OIDs")]
    NoOids,

    #[error("request carries {count} OIDs, at most {max} are allowed")]
    TooManyOids { count: usize, max: usize },
}

/// Why the polling loop stopped.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("probe failed: {0}")]
    Transport(#[from] TransportError),
}
