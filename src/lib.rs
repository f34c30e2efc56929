//! # Disk Model (diskmodel)
//!
//! Lists the model name of every disk drive attached to the local host by
//! querying the platform's management service (WMI on Windows).
//!
//! ## Quick Start
//!
//! ```no_run
//! use diskmodel::{enumerate_disks, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! for disk in enumerate_disks(&Config::default())? {
//!     println!("Disk Model: {}", disk.model.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Lifecycle
//!
//! A [`DiskEnumerator`] owns one session: runtime and security
//! initialization, a locator, a namespace connection with negotiated proxy
//! security, and at most one forward-only query. Everything it acquired is
//! released exactly once, on [`DiskEnumerator::teardown`] or on drop.
//!
//! ## Feature Flags
//!
//! - `cli` - `diskmodel` binary with colored terminal output
//!
//! ## Platform Support
//!
//! | Platform | Disk models |
//! |----------|-------------|
//! | Windows  | ✅          |
//! | Linux    | ❌          |
//! | macOS    | ❌          |

pub mod config;
pub mod console;
pub mod enumerator;
pub mod error;
pub mod report;
pub mod source;

pub use config::{AuthenticationLevel, Config, ImpersonationLevel};
pub use console::{Color, ConsoleSink};
pub use enumerator::{DiskEnumerator, DiskRecord, DiskRecords, State};
pub use error::{Error, Result};
pub use report::Outcome;
pub use source::{FieldValue, ManagementSource, PlatformSource};

#[cfg(feature = "cli")]
pub use console::TerminalSink;

/// Enumerate all disk drives on the local host
///
/// Establishes a session with the platform source, drains the query and
/// tears the session down before returning.
pub fn enumerate_disks(config: &Config) -> Result<Vec<DiskRecord>> {
    let mut enumerator = DiskEnumerator::new(PlatformSource::new(), config.clone());
    enumerator.establish_session()?;
    let disks = enumerator.query()?.collect();
    enumerator.teardown();
    Ok(disks)
}
