use std::io;

/// Errors raised while building or running a socket poll.
///
/// The `Invalid*` variants are construction errors and are returned before
/// any network activity. `Probe` carries an OS error the poller does not know
/// how to interpret as "listening" or "not listening".
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("invalid port '{0}': expected an integer between 1 and 65535")]
    InvalidPort(String),

    #[error("invalid timeout '{0}': expected a whole number of seconds")]
    InvalidTimeout(String),

    #[error("invalid interval '{0}': expected a positive number of seconds")]
    InvalidInterval(String),

    #[error("invalid target '{0}': expected host:port")]
    InvalidTarget(String),

    #[error("probing {target} failed: {source}")]
    Probe {
        target: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PollError>;
