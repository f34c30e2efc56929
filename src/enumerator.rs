//! Disk enumerator
//!
//! Owns one session with the management service and walks the disk drive
//! records it returns:
//!
//! ```text
//! Uninitialized -> Establishing -> Established -> Querying -> Done
//!        \______________\_______________\____________\________\__> TornDown
//! ```
//!
//! No state is re-entered. Any session setup failure tears down immediately;
//! [`Drop`] tears down whatever is left.

use crate::config::Config;
use crate::console::{Color, ConsoleSink};
use crate::error::{Error, Result};
use crate::source::{CursorOf, Locator, ManagementSource, Record, ResultCursor, Service, ServiceOf};
use log::{debug, trace, warn};
use std::fmt;
use std::iter::FusedIterator;

/// Enumerator lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Establishing,
    Established,
    Querying,
    Done,
    TornDown,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Uninitialized => "uninitialized",
            State::Establishing => "establishing",
            State::Established => "established",
            State::Querying => "querying",
            State::Done => "done",
            State::TornDown => "torn down",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One disk drive as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskRecord {
    /// Drive model; `None` when the host left it unset or empty
    pub model: Option<String>,
}

/// Enumerates disk drives through a [`ManagementSource`]
pub struct DiskEnumerator<S: ManagementSource> {
    source: S,
    config: Config,
    state: State,
    runtime_initialized: bool,
    locator: Option<S::Locator>,
    service: Option<ServiceOf<S>>,
    cursor: Option<CursorOf<S>>,
}

impl<S: ManagementSource> DiskEnumerator<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self {
            source,
            config,
            state: State::Uninitialized,
            runtime_initialized: false,
            locator: None,
            service: None,
            cursor: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn invalid(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            operation,
            state: self.state.name(),
        }
    }

    /// Initialize the runtime, connect to the configured namespace and
    /// negotiate proxy security.
    ///
    /// Security initialization is best effort: a failure there is logged and
    /// setup continues. Any other failure tears the session down before the
    /// error is returned, so no later step is attempted.
    pub fn establish_session(&mut self) -> Result<()> {
        if self.state != State::Uninitialized {
            return Err(self.invalid("establish a session"));
        }
        self.state = State::Establishing;

        if let Err(e) = self.try_establish() {
            debug!("Session setup failed: {}", e);
            self.teardown();
            return Err(e);
        }

        self.state = State::Established;
        debug!("Session established on {}", self.config.session.namespace);
        Ok(())
    }

    fn try_establish(&mut self) -> Result<()> {
        let session = &self.config.session;

        debug!("Initializing management runtime");
        self.source.initialize_runtime()?;
        self.runtime_initialized = true;

        debug!(
            "Initializing security (authentication: {:?}, impersonation: {:?})",
            session.security_authentication, session.impersonation
        );
        if let Err(e) = self
            .source
            .initialize_security(session.security_authentication, session.impersonation)
        {
            warn!(
                "{} (code {}), continuing with process defaults",
                e,
                e.status_code().unwrap_or_default()
            );
        }

        debug!("Creating locator");
        let locator = self.locator.insert(self.source.create_locator()?);

        debug!("Connecting to {}", session.namespace);
        let service = self.service.insert(locator.connect(&session.namespace)?);

        debug!(
            "Setting proxy blanket (authentication: {:?}, impersonation: {:?})",
            session.proxy_authentication, session.impersonation
        );
        service.set_proxy_blanket(session.proxy_authentication, session.impersonation)?;

        Ok(())
    }

    /// Issue the disk drive query and return a lazy, single-pass iterator
    /// over its records.
    ///
    /// Requires an established session. The query runs at most once per
    /// enumerator; a failed query moves the enumerator to [`State::Done`].
    pub fn query(&mut self) -> Result<DiskRecords<'_, S>> {
        if self.state != State::Established {
            return Err(self.invalid("run a query"));
        }

        let service = self
            .service
            .as_ref()
            .ok_or_else(|| self.invalid("run a query"))?;

        let query = &self.config.query;
        debug!("Executing {} query: {}", query.language, query.text);

        match service.exec_query(&query.language, &query.text) {
            Ok(cursor) => {
                self.cursor = Some(cursor);
                self.state = State::Querying;
                let field = self.config.query.field.clone();
                Ok(DiskRecords {
                    enumerator: self,
                    field,
                    finished: false,
                })
            }
            Err(e) => {
                self.state = State::Done;
                Err(e)
            }
        }
    }

    /// Run the query and write one labeled line per disk to `sink`.
    ///
    /// Each line is the configured label in green followed by the model in
    /// white; a disk without a model gets the label alone. Returns the
    /// number of disks written.
    pub fn query_and_report<W: ConsoleSink>(&mut self, mut sink: W) -> Result<usize> {
        let label = format!("\n{}", self.config.output.label);
        let mut count = 0;

        for disk in self.query()? {
            sink.write(&label, Some(Color::Green))?;
            sink.write_line(disk.model.as_deref().unwrap_or_default(), Some(Color::White))?;
            count += 1;
        }

        Ok(count)
    }

    /// Release the cursor, service and locator, then finalize the runtime.
    ///
    /// Safe to call any number of times and in any state; each resource is
    /// released at most once.
    pub fn teardown(&mut self) {
        if self.state == State::TornDown {
            return;
        }

        debug!("Tearing down session ({})", self.state);

        drop(self.cursor.take());
        drop(self.service.take());
        drop(self.locator.take());

        if std::mem::take(&mut self.runtime_initialized) {
            self.source.finalize_runtime();
        }

        self.state = State::TornDown;
    }
}

impl<S: ManagementSource> Drop for DiskEnumerator<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<S: ManagementSource> fmt::Debug for DiskEnumerator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskEnumerator")
            .field("state", &self.state)
            .field("runtime_initialized", &self.runtime_initialized)
            .field("locator", &self.locator.is_some())
            .field("service", &self.service.is_some())
            .field("cursor", &self.cursor.is_some())
            .finish()
    }
}

/// Lazy iterator over the disk records of one query
///
/// Each step advances the cursor once, blocking until a record arrives or
/// the result set ends. Records whose model field cannot be read are
/// skipped. The cursor is released as soon as the result set ends.
pub struct DiskRecords<'a, S: ManagementSource> {
    enumerator: &'a mut DiskEnumerator<S>,
    field: String,
    finished: bool,
}

impl<S: ManagementSource> DiskRecords<'_, S> {
    fn finish(&mut self) {
        self.finished = true;
        drop(self.enumerator.cursor.take());
        self.enumerator.state = State::Done;
    }
}

impl<S: ManagementSource> Iterator for DiskRecords<'_, S> {
    type Item = DiskRecord;

    fn next(&mut self) -> Option<DiskRecord> {
        if self.finished {
            return None;
        }

        loop {
            let step = match self.enumerator.cursor.as_mut() {
                Some(cursor) => cursor.advance(),
                None => Ok(None),
            };

            match step {
                Ok(Some(record)) => match record.text(&self.field) {
                    Ok(model) => {
                        trace!("Disk record: {:?}", model);
                        return Some(DiskRecord { model });
                    }
                    Err(e) => {
                        trace!("Skipping record: {}", e);
                        continue;
                    }
                },
                Ok(None) => {
                    debug!("Result set exhausted");
                    self.finish();
                    return None;
                }
                Err(e) => {
                    warn!(
                        "{} (code {}), stopping enumeration",
                        e,
                        e.status_code().unwrap_or_default()
                    );
                    self.finish();
                    return None;
                }
            }
        }
    }
}

impl<S: ManagementSource> FusedIterator for DiskRecords<'_, S> {}
