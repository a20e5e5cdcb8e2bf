use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PollError, Result};

/// Default pause between probes, in seconds.
pub const DEFAULT_INTERVAL_SECS: f64 = 0.25;

/// A TCP endpoint to probe: hostname or IP literal plus port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Build a target from a port given as text. Fails unless the port is an
    /// integer in 1..=65535.
    pub fn parse(host: &str, port: &str) -> Result<Self> {
        Ok(Self::new(host, parse_port(port)?))
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(PollError::InvalidPort(raw.to_string())),
        Ok(p) => Ok(p),
    }
}

impl FromStr for Target {
    type Err = PollError;

    /// Parse `host:port`. A bracketed IPv6 literal (`[::1]:80`) is accepted
    /// and unwrapped, though the probe itself only dials IPv4.
    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| PollError::InvalidTarget(s.to_string()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(PollError::InvalidTarget(s.to_string()));
        }
        Self::parse(host, port)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Timing for one wait: how long to keep trying and how long to pause
/// between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
    /// Log every failed probe at debug level.
    pub debug: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            interval: Duration::from_secs_f64(DEFAULT_INTERVAL_SECS),
            debug: false,
        }
    }
}

impl PollConfig {
    /// Build a config from whole-second timeout and fractional-second interval.
    /// A zero, negative or non-finite interval is rejected: with a nonzero
    /// timeout it would spin without ever yielding.
    pub fn new(timeout_secs: u64, interval_secs: f64) -> Result<Self> {
        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
            interval: parse_interval(interval_secs)?,
            debug: false,
        })
    }

    /// Like [`PollConfig::new`], with the timeout given as text.
    pub fn parse(timeout: &str, interval_secs: f64) -> Result<Self> {
        Self::new(parse_timeout(timeout)?, interval_secs)
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Parse a timeout as a non-negative whole number of seconds.
pub fn parse_timeout(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| PollError::InvalidTimeout(raw.to_string()))
}

fn parse_interval(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(PollError::InvalidInterval(secs.to_string()));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| PollError::InvalidInterval(secs.to_string()))
}
