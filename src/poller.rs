use std::io;
use std::net::{SocketAddr, SocketAddrV4, ToSocketAddrs};
use std::thread;
use std::time::Instant;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{debug, trace};

use crate::error::{PollError, Result};
use crate::platform::{Classifier, ErrorClass, Platform, SocketErrorKind};
use crate::target::{PollConfig, Target};

/// Repeatedly probes one TCP endpoint until it reaches the wanted state or
/// the timeout runs out.
///
/// Both [`is_open`](SocketPoller::is_open) and
/// [`is_closed`](SocketPoller::is_closed) block the calling thread for at most
/// the timeout plus roughly one interval. An `Err` means the OS reported
/// something other than "listening" / "not listening"; it is never used for
/// an ordinary timeout.
#[derive(Debug, Clone)]
pub struct SocketPoller {
    target: Target,
    config: PollConfig,
    classifier: Classifier,
}

/// The state a wait is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Desired {
    Open,
    Closed,
}

impl Desired {
    fn is_met(self, listening: bool) -> bool {
        match self {
            Desired::Open => listening,
            Desired::Closed => !listening,
        }
    }
}

enum Step {
    Done(bool),
    Pending,
}

impl SocketPoller {
    pub fn new(target: Target, config: PollConfig) -> Self {
        Self::with_platform(target, config, Platform::current())
    }

    pub fn with_platform(target: Target, config: PollConfig, platform: Platform) -> Self {
        Self {
            target,
            config,
            classifier: Classifier::for_platform(platform),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// True once the target accepts a connection, false if the timeout
    /// elapses first.
    pub fn is_open(&self) -> Result<bool> {
        self.wait_for(Desired::Open)
    }

    /// True once the target stops accepting connections, false if it keeps
    /// accepting them for the whole timeout.
    pub fn is_closed(&self) -> Result<bool> {
        self.wait_for(Desired::Closed)
    }

    fn wait_for(&self, desired: Desired) -> Result<bool> {
        let reached = self.poll_until(|deadline| Ok(desired.is_met(self.probe(deadline)?)))?;
        debug!(endpoint = %self.target, ?desired, reached, "wait finished");
        Ok(reached)
    }

    /// Run `predicate` until it returns true or the deadline passes. The
    /// predicate always runs at least once, even with a zero timeout, and
    /// receives the deadline (`None` when the timeout does not fit in an
    /// `Instant`).
    fn poll_until<F>(&self, mut predicate: F) -> Result<bool>
    where
        F: FnMut(Option<Instant>) -> Result<bool>,
    {
        let deadline = Instant::now().checked_add(self.config.timeout);
        loop {
            if predicate(deadline)? {
                return Ok(true);
            }
            if expired(deadline) {
                return Ok(false);
            }
            thread::sleep(self.config.interval);
        }
    }

    /// One connection attempt: true if the target accepted it.
    ///
    /// The socket is non-blocking. While the handshake is pending the probe
    /// sleeps one interval and then inspects the same socket rather than
    /// issuing `connect` again. A handshake still pending after the deadline
    /// counts as not listening. The socket is closed on every return path.
    fn probe(&self, deadline: Option<Instant>) -> Result<bool> {
        trace!(endpoint = %self.target, "resolving");
        let addr = match resolve_ipv4(&self.target) {
            Ok(addr) => addr,
            Err(err) => return self.settle_final(SocketErrorKind::Resolution, err),
        };

        let socket = match open_socket() {
            Ok(socket) => socket,
            Err(err) => return self.settle_final(SocketErrorKind::of(&err), err),
        };

        trace!(endpoint = %self.target, %addr, "connecting");
        let mut step = match socket.connect(&SockAddr::from(addr)) {
            Ok(()) => Step::Done(true),
            Err(err) => self.settle(err)?,
        };

        loop {
            if let Step::Done(listening) = step {
                return Ok(listening);
            }
            thread::sleep(self.config.interval);
            step = match handshake_finished(&socket) {
                Ok(true) => Step::Done(true),
                Ok(false) => Step::Pending,
                Err(err) => self.settle(err)?,
            };
            if matches!(step, Step::Pending) && expired(deadline) {
                self.report_down(&"handshake still pending at deadline");
                return Ok(false);
            }
        }
    }

    fn settle(&self, err: io::Error) -> Result<Step> {
        self.settle_kind(SocketErrorKind::of(&err), err)
    }

    /// Settle an error raised before any connect is in flight. There is no
    /// handshake to wait for, so an in-progress kind is fatal here.
    fn settle_final(&self, kind: SocketErrorKind, err: io::Error) -> Result<bool> {
        match self.classifier.classify_kind(kind) {
            ErrorClass::Connected => Ok(true),
            ErrorClass::NotConnected => {
                self.report_down(&err);
                Ok(false)
            }
            ErrorClass::InProgress | ErrorClass::Fatal => Err(PollError::Probe {
                target: self.target.to_string(),
                source: err,
            }),
        }
    }

    fn settle_kind(&self, kind: SocketErrorKind, err: io::Error) -> Result<Step> {
        match self.classifier.classify_kind(kind) {
            ErrorClass::InProgress => {
                trace!(endpoint = %self.target, "handshake in progress");
                Ok(Step::Pending)
            }
            ErrorClass::Connected => Ok(Step::Done(true)),
            ErrorClass::NotConnected => {
                self.report_down(&err);
                Ok(Step::Done(false))
            }
            ErrorClass::Fatal => Err(PollError::Probe {
                target: self.target.to_string(),
                source: err,
            }),
        }
    }

    fn report_down(&self, reason: &dyn std::fmt::Display) {
        if self.config.debug {
            debug!(
                host = %self.target.host,
                port = self.target.port,
                %reason,
                "not accepting connections"
            );
        } else {
            trace!(endpoint = %self.target, %reason, "not accepting connections");
        }
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn resolve_ipv4(target: &Target) -> io::Result<SocketAddrV4> {
    (target.host.as_str(), target.port)
        .to_socket_addrs()?
        .find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no IPv4 address for {}", target.host),
            )
        })
}

fn open_socket() -> io::Result<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Check a socket whose non-blocking connect is in flight: `Ok(true)` once
/// connected, `Ok(false)` while pending, or the error the handshake failed
/// with.
fn handshake_finished(socket: &Socket) -> io::Result<bool> {
    if let Some(err) = socket.take_error()? {
        return Err(err);
    }
    match socket.peer_addr() {
        Ok(_) => Ok(true),
        Err(err) if SocketErrorKind::of(&err) == SocketErrorKind::NotConnected => Ok(false),
        Err(err) => Err(err),
    }
}

/// Wait until every target is in the `desired` state, sharing one deadline
/// across all of them. An empty target list is trivially satisfied.
pub fn wait_for_all(targets: &[Target], config: PollConfig, desired: Desired) -> Result<bool> {
    let pollers: Vec<SocketPoller> = targets
        .iter()
        .cloned()
        .map(|t| SocketPoller::new(t, config))
        .collect();
    let Some(first) = pollers.first() else {
        return Ok(true);
    };

    let reached = first.poll_until(|deadline| {
        for poller in &pollers {
            if !desired.is_met(poller.probe(deadline)?) {
                return Ok(false);
            }
        }
        Ok(true)
    })?;
    debug!(count = pollers.len(), ?desired, reached, "wait for all targets finished");
    Ok(reached)
}

/// Probe a target once, without retrying.
pub fn probe_once(target: &Target, platform: Platform) -> Result<bool> {
    let poller = SocketPoller::with_platform(target.clone(), PollConfig::default(), platform);
    poller.probe(Some(Instant::now()))
}
