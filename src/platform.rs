//! Platform-dependent interpretation of socket errors.
//!
//! Which OS errors mean "nobody is listening", "already connected" or "still
//! connecting" differs between POSIX, Windows and Cygwin. Each platform's
//! answer is kept as data in a [`Classifier`], chosen once when a poller is
//! built.

use std::io;

/// The platform whose socket error conventions should be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
    Cygwin,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "cygwin") {
            Platform::Cygwin
        } else {
            Platform::Posix
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }

    pub fn is_cygwin(self) -> bool {
        self == Platform::Cygwin
    }
}

/// OS-independent names for the socket errors a probe can run into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketErrorKind {
    ConnectionRefused,
    NotConnected,
    InProgress,
    AlreadyInProgress,
    WouldBlock,
    AlreadyConnected,
    InvalidArgument,
    PermissionDenied,
    /// Host name lookup failed or produced no IPv4 address.
    Resolution,
    /// A raw OS error code with no special meaning to the probe.
    Other(i32),
    /// An error that carries no OS code at all.
    Unknown,
}

impl SocketErrorKind {
    pub fn of(err: &io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) => from_raw(code),
            None => match err.kind() {
                io::ErrorKind::ConnectionRefused => SocketErrorKind::ConnectionRefused,
                io::ErrorKind::NotConnected => SocketErrorKind::NotConnected,
                io::ErrorKind::WouldBlock => SocketErrorKind::WouldBlock,
                _ => SocketErrorKind::Unknown,
            },
        }
    }
}

#[cfg(unix)]
fn from_raw(code: i32) -> SocketErrorKind {
    match code {
        libc::ECONNREFUSED => SocketErrorKind::ConnectionRefused,
        libc::ENOTCONN => SocketErrorKind::NotConnected,
        libc::EINPROGRESS => SocketErrorKind::InProgress,
        libc::EALREADY => SocketErrorKind::AlreadyInProgress,
        libc::EWOULDBLOCK => SocketErrorKind::WouldBlock,
        libc::EISCONN => SocketErrorKind::AlreadyConnected,
        libc::EINVAL => SocketErrorKind::InvalidArgument,
        libc::EPERM => SocketErrorKind::PermissionDenied,
        other => SocketErrorKind::Other(other),
    }
}

// Winsock codes from winerror.h.
#[cfg(windows)]
const WSAEACCES: i32 = 10013;
#[cfg(windows)]
const WSAEINVAL: i32 = 10022;
#[cfg(windows)]
const WSAEWOULDBLOCK: i32 = 10035;
#[cfg(windows)]
const WSAEINPROGRESS: i32 = 10036;
#[cfg(windows)]
const WSAEALREADY: i32 = 10037;
#[cfg(windows)]
const WSAEISCONN: i32 = 10056;
#[cfg(windows)]
const WSAENOTCONN: i32 = 10057;
#[cfg(windows)]
const WSAECONNREFUSED: i32 = 10061;

#[cfg(windows)]
fn from_raw(code: i32) -> SocketErrorKind {
    match code {
        WSAECONNREFUSED => SocketErrorKind::ConnectionRefused,
        WSAENOTCONN => SocketErrorKind::NotConnected,
        WSAEINPROGRESS => SocketErrorKind::InProgress,
        WSAEALREADY => SocketErrorKind::AlreadyInProgress,
        WSAEWOULDBLOCK => SocketErrorKind::WouldBlock,
        WSAEISCONN => SocketErrorKind::AlreadyConnected,
        WSAEINVAL => SocketErrorKind::InvalidArgument,
        WSAEACCES => SocketErrorKind::PermissionDenied,
        other => SocketErrorKind::Other(other),
    }
}

#[cfg(not(any(unix, windows)))]
fn from_raw(code: i32) -> SocketErrorKind {
    SocketErrorKind::Other(code)
}

/// What a probe should do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Handshake not finished yet: wait and look again.
    InProgress,
    /// The socket ended up connected after all.
    Connected,
    /// Nothing is listening (yet).
    NotConnected,
    /// Unexpected; surfaces to the caller.
    Fatal,
}

/// The error-kind sets consulted by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    in_progress: Vec<SocketErrorKind>,
    connected: Vec<SocketErrorKind>,
    not_connected: Vec<SocketErrorKind>,
}

impl Classifier {
    pub fn for_platform(platform: Platform) -> Self {
        let mut in_progress = vec![
            SocketErrorKind::InProgress,
            SocketErrorKind::AlreadyInProgress,
        ];
        let mut connected = vec![SocketErrorKind::AlreadyConnected];
        let mut not_connected = vec![
            SocketErrorKind::ConnectionRefused,
            SocketErrorKind::NotConnected,
            SocketErrorKind::Resolution,
        ];

        if platform.is_windows() {
            // Winsock reports a pending non-blocking connect as WSAEWOULDBLOCK
            // and a repeated one that already finished as WSAEINVAL.
            in_progress.push(SocketErrorKind::WouldBlock);
            connected.push(SocketErrorKind::InvalidArgument);
        }
        if platform.is_cygwin() {
            not_connected.push(SocketErrorKind::PermissionDenied);
        }

        Self {
            in_progress,
            connected,
            not_connected,
        }
    }

    pub fn classify(&self, err: &io::Error) -> ErrorClass {
        self.classify_kind(SocketErrorKind::of(err))
    }

    pub fn classify_kind(&self, kind: SocketErrorKind) -> ErrorClass {
        if self.in_progress.contains(&kind) {
            ErrorClass::InProgress
        } else if self.connected.contains(&kind) {
            ErrorClass::Connected
        } else if self.not_connected.contains(&kind) {
            ErrorClass::NotConnected
        } else {
            ErrorClass::Fatal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_sets() {
        let c = Classifier::for_platform(Platform::Posix);
        assert_eq!(c.classify_kind(SocketErrorKind::ConnectionRefused), ErrorClass::NotConnected);
        assert_eq!(c.classify_kind(SocketErrorKind::NotConnected), ErrorClass::NotConnected);
        assert_eq!(c.classify_kind(SocketErrorKind::Resolution), ErrorClass::NotConnected);
        assert_eq!(c.classify_kind(SocketErrorKind::InProgress), ErrorClass::InProgress);
        assert_eq!(c.classify_kind(SocketErrorKind::AlreadyInProgress), ErrorClass::InProgress);
        assert_eq!(c.classify_kind(SocketErrorKind::AlreadyConnected), ErrorClass::Connected);
        assert_eq!(c.classify_kind(SocketErrorKind::InvalidArgument), ErrorClass::Fatal);
        assert_eq!(c.classify_kind(SocketErrorKind::PermissionDenied), ErrorClass::Fatal);
        assert_eq!(c.classify_kind(SocketErrorKind::WouldBlock), ErrorClass::Fatal);
        assert_eq!(c.classify_kind(SocketErrorKind::Other(9999)), ErrorClass::Fatal);
        assert_eq!(c.classify_kind(SocketErrorKind::Unknown), ErrorClass::Fatal);
    }

    #[test]
    fn windows_treats_einval_as_connected() {
        let c = Classifier::for_platform(Platform::Windows);
        assert_eq!(c.classify_kind(SocketErrorKind::InvalidArgument), ErrorClass::Connected);
        assert_eq!(c.classify_kind(SocketErrorKind::WouldBlock), ErrorClass::InProgress);
        assert_eq!(c.classify_kind(SocketErrorKind::PermissionDenied), ErrorClass::Fatal);
    }

    #[test]
    fn cygwin_treats_eperm_as_not_connected() {
        let c = Classifier::for_platform(Platform::Cygwin);
        assert_eq!(c.classify_kind(SocketErrorKind::PermissionDenied), ErrorClass::NotConnected);
        assert_eq!(c.classify_kind(SocketErrorKind::InvalidArgument), ErrorClass::Fatal);
    }

    #[test]
    fn current_platform_matches_target() {
        let p = Platform::current();
        assert_eq!(p.is_windows(), cfg!(windows));
    }

    #[test]
    fn io_error_without_os_code() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(SocketErrorKind::of(&err), SocketErrorKind::ConnectionRefused);
        let err = io::Error::other("boom");
        assert_eq!(SocketErrorKind::of(&err), SocketErrorKind::Unknown);
    }

    #[cfg(unix)]
    #[test]
    fn unix_errno_mapping() {
        let of = |code| SocketErrorKind::of(&io::Error::from_raw_os_error(code));
        assert_eq!(of(libc::ECONNREFUSED), SocketErrorKind::ConnectionRefused);
        assert_eq!(of(libc::EINPROGRESS), SocketErrorKind::InProgress);
        assert_eq!(of(libc::EALREADY), SocketErrorKind::AlreadyInProgress);
        assert_eq!(of(libc::EISCONN), SocketErrorKind::AlreadyConnected);
        assert_eq!(of(libc::EPERM), SocketErrorKind::PermissionDenied);
        assert_eq!(of(libc::EAFNOSUPPORT), SocketErrorKind::Other(libc::EAFNOSUPPORT));
    }

    #[cfg(unix)]
    #[test]
    fn unsupported_address_family_is_fatal() {
        let c = Classifier::for_platform(Platform::Posix);
        let err = io::Error::from_raw_os_error(libc::EAFNOSUPPORT);
        assert_eq!(c.classify(&err), ErrorClass::Fatal);
    }
}
