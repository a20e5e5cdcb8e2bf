//! Wait for a TCP endpoint to start, or stop, accepting connections.
//!
//! ```no_run
//! use portwait::{PollConfig, SocketPoller, Target};
//!
//! let target = Target::parse("127.0.0.1", "9515")?;
//! let poller = SocketPoller::new(target, PollConfig::new(20, 0.25)?);
//! if !poller.is_open()? {
//!     eprintln!("driver did not start listening in time");
//! }
//! # Ok::<(), portwait::PollError>(())
//! ```

pub mod error;
pub mod platform;
pub mod poller;
pub mod target;

pub use error::{PollError, Result};
pub use platform::{Classifier, ErrorClass, Platform, SocketErrorKind};
pub use poller::{Desired, SocketPoller, probe_once, wait_for_all};
pub use target::{DEFAULT_INTERVAL_SECS, PollConfig, Target};
