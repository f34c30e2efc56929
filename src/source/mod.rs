//! Management data source contract
//!
//! The host's management service is consumed through four capabilities that
//! are acquired in order and released in reverse:
//! - [`ManagementSource`]: process-wide runtime and security initialization
//! - [`Locator`]: obtains a connection to a namespace
//! - [`Service`]: a connected namespace (proxy security, query execution)
//! - [`ResultCursor`]: forward-only, single-pass view of a query result
//!
//! Each capability releases its platform handle when dropped.
//!
//! Platform support:
//! - Windows: COM + WMI
//! - Everything else: [`PlatformSource`] fails runtime initialization

use crate::config::{AuthenticationLevel, ImpersonationLevel};
use crate::error::Result;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(target_os = "windows"))]
pub mod unsupported;

#[cfg(test)]
pub(crate) mod scripted;

#[cfg(target_os = "windows")]
pub use self::windows::WmiSource as PlatformSource;

#[cfg(not(target_os = "windows"))]
pub use self::unsupported::UnsupportedSource as PlatformSource;

/// Process-level entry point into the management service
pub trait ManagementSource {
    type Locator: Locator;

    /// Initialize the process-wide runtime. Must be balanced by
    /// [`finalize_runtime`](Self::finalize_runtime) when it succeeds.
    fn initialize_runtime(&mut self) -> Result<()>;

    /// Set process-wide security defaults for outgoing calls
    fn initialize_security(
        &mut self,
        authentication: AuthenticationLevel,
        impersonation: ImpersonationLevel,
    ) -> Result<()>;

    /// Create a locator capability
    fn create_locator(&mut self) -> Result<Self::Locator>;

    /// Undo a successful [`initialize_runtime`](Self::initialize_runtime)
    fn finalize_runtime(&mut self);
}

/// Capability used to connect to a management namespace
pub trait Locator {
    type Service: Service;

    /// Connect to `namespace` on the local host
    fn connect(&self, namespace: &str) -> Result<Self::Service>;
}

/// A connected management namespace
pub trait Service {
    type Cursor: ResultCursor;

    /// Negotiate the security blanket applied to later calls on this proxy
    fn set_proxy_blanket(
        &self,
        authentication: AuthenticationLevel,
        impersonation: ImpersonationLevel,
    ) -> Result<()>;

    /// Execute a forward-only, return-immediately query
    fn exec_query(&self, language: &str, query: &str) -> Result<Self::Cursor>;
}

/// Forward-only cursor over a query result
pub trait ResultCursor {
    type Record: Record;

    /// Block until the next record is available. `Ok(None)` means the
    /// result set is exhausted.
    fn advance(&mut self) -> Result<Option<Self::Record>>;
}

/// One object returned by a query
pub trait Record {
    /// Read a field by name. Fails if the record has no such field.
    fn get(&self, name: &str) -> Result<FieldValue>;

    /// Read a field as text. Null, empty and non-text values map to `None`.
    fn text(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name)?.into_text())
    }
}

/// Service type reached from a source
pub type ServiceOf<S> = <<S as ManagementSource>::Locator as Locator>::Service;

/// Cursor type reached from a source
pub type CursorOf<S> = <ServiceOf<S> as Service>::Cursor;

/// Record type reached from a source
pub type RecordOf<S> = <CursorOf<S> as ResultCursor>::Record;

/// Typed value of a record field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Field exists but holds no value
    Null,
    Text(String),
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    /// Any other value type, by type name
    Other(String),
}

impl FieldValue {
    /// Non-empty text content, if any
    pub fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_text() {
        assert_eq!(
            FieldValue::Text("WDC WD10EZEX".to_string()).into_text(),
            Some("WDC WD10EZEX".to_string())
        );
        assert_eq!(FieldValue::Text(String::new()).into_text(), None);
        assert_eq!(FieldValue::Null.into_text(), None);
        assert_eq!(FieldValue::Unsigned(512).into_text(), None);
    }
}
