//! Fail-soft disk report
//!
//! Drives one enumerator through its whole lifecycle. Failures never escape:
//! each one becomes a labeled error line with its status code, and the
//! enumerator is always torn down before returning.

use crate::console::{Color, ConsoleSink};
use crate::enumerator::DiskEnumerator;
use crate::error::Error;
use crate::source::ManagementSource;
use log::{debug, error};

/// How a report run ended
#[derive(Debug)]
pub enum Outcome {
    /// The query ran to completion
    Completed { disks: usize },
    /// The session could not be established; no query was issued
    SessionFailed(Error),
    /// The query failed or its output could not be written
    QueryFailed(Error),
}

impl Outcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed { .. } => 0,
            Outcome::SessionFailed(_) | Outcome::QueryFailed(_) => 1,
        }
    }

    pub fn disks(&self) -> usize {
        match self {
            Outcome::Completed { disks } => *disks,
            _ => 0,
        }
    }
}

/// Format a failure the way it is shown to the user
pub fn error_line(err: &Error) -> String {
    format!("{}{}", error_label(err), status_suffix(err))
}

fn error_label(err: &Error) -> String {
    format!("{}.", err)
}

fn status_suffix(err: &Error) -> String {
    match err.status_code() {
        Some(code) => format!(" Error code: {} ({:#010X})", code, code as u32),
        None => String::new(),
    }
}

/// Write a labeled error line; errors on the error sink itself are only logged
pub fn report_error<E: ConsoleSink>(mut err_sink: E, err: &Error) {
    let written = err_sink
        .write(&error_label(err), Some(Color::Red))
        .and_then(|_| err_sink.write_line(&status_suffix(err), None));

    if let Err(e) = written {
        error!("Failed to write error report: {}", e);
    }
}

/// Establish a session, report every disk model to `out`, and tear down.
///
/// Failures are written to `err` and reflected in the returned [`Outcome`].
pub fn run<S, O, E>(enumerator: &mut DiskEnumerator<S>, out: O, mut err: E) -> Outcome
where
    S: ManagementSource,
    O: ConsoleSink,
    E: ConsoleSink,
{
    let outcome = match enumerator.establish_session() {
        Err(e) => {
            report_error(&mut err, &e);
            Outcome::SessionFailed(e)
        }
        Ok(()) => match enumerator.query_and_report(out) {
            Ok(disks) => {
                debug!("Reported {} disk(s)", disks);
                Outcome::Completed { disks }
            }
            Err(e) => {
                report_error(&mut err, &e);
                Outcome::QueryFailed(e)
            }
        },
    };

    enumerator.teardown();
    outcome
}
