//! Management source for hosts without a management service

use super::{FieldValue, Locator, ManagementSource, Record, ResultCursor, Service};
use crate::config::{AuthenticationLevel, ImpersonationLevel};
use crate::error::{Error, Result};

/// Source that refuses runtime initialization, so no later step is reachable
#[derive(Debug, Default)]
pub struct UnsupportedSource;

impl UnsupportedSource {
    pub fn new() -> Self {
        Self
    }
}

/// Uninhabited capability: no value of this type can exist
#[derive(Debug)]
pub enum Never {}

fn not_supported() -> Error {
    Error::NotSupported(format!(
        "Disk enumeration via the management service is not supported on {}",
        std::env::consts::OS
    ))
}

impl ManagementSource for UnsupportedSource {
    type Locator = Never;

    fn initialize_runtime(&mut self) -> Result<()> {
        Err(not_supported())
    }

    fn initialize_security(
        &mut self,
        _authentication: AuthenticationLevel,
        _impersonation: ImpersonationLevel,
    ) -> Result<()> {
        Err(not_supported())
    }

    fn create_locator(&mut self) -> Result<Never> {
        Err(not_supported())
    }

    fn finalize_runtime(&mut self) {}
}

impl Locator for Never {
    type Service = Never;

    fn connect(&self, _namespace: &str) -> Result<Never> {
        match *self {}
    }
}

impl Service for Never {
    type Cursor = Never;

    fn set_proxy_blanket(
        &self,
        _authentication: AuthenticationLevel,
        _impersonation: ImpersonationLevel,
    ) -> Result<()> {
        match *self {}
    }

    fn exec_query(&self, _language: &str, _query: &str) -> Result<Never> {
        match *self {}
    }
}

impl ResultCursor for Never {
    type Record = Never;

    fn advance(&mut self) -> Result<Option<Never>> {
        match *self {}
    }
}

impl Record for Never {
    fn get(&self, _name: &str) -> Result<FieldValue> {
        match *self {}
    }
}
