//! Scripted in-memory management source for tests
//!
//! Every call and every release is appended to a shared log so tests can
//! assert the exact lifecycle.

use super::{FieldValue, Locator, ManagementSource, Record, ResultCursor, Service};
use crate::config::{AuthenticationLevel, ImpersonationLevel};
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InitializeRuntime,
    InitializeSecurity(AuthenticationLevel, ImpersonationLevel),
    CreateLocator,
    Connect(String),
    SetProxyBlanket(AuthenticationLevel, ImpersonationLevel),
    ExecQuery(String, String),
    Advance,
    ReleaseRecord,
    ReleaseCursor,
    ReleaseService,
    ReleaseLocator,
    FinalizeRuntime,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Record fields by name; a name absent from the list is a missing field
pub type Fields = Vec<(&'static str, FieldValue)>;

#[derive(Debug, Default, Clone)]
pub struct Script {
    pub fail_runtime: Option<i32>,
    pub fail_security: Option<i32>,
    pub fail_locator: Option<i32>,
    pub fail_connect: Option<i32>,
    pub fail_blanket: Option<i32>,
    pub fail_query: Option<i32>,
    /// Advance fails instead of returning the record at this index
    pub fail_advance_at: Option<usize>,
    pub records: Vec<Fields>,
}

impl Script {
    /// Script returning one record per model, `None` producing a null field
    pub fn with_models(models: &[Option<&str>]) -> Self {
        let records = models
            .iter()
            .map(|model| {
                let value = match model {
                    Some(m) => FieldValue::Text(m.to_string()),
                    None => FieldValue::Null,
                };
                vec![("Model", value)]
            })
            .collect();

        Self {
            records,
            ..Self::default()
        }
    }
}

pub struct ScriptedSource {
    script: Script,
    log: CallLog,
}

impl ScriptedSource {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            log: CallLog::default(),
        }
    }

    pub fn log(&self) -> CallLog {
        Rc::clone(&self.log)
    }
}

fn record(log: &CallLog, call: Call) {
    log.borrow_mut().push(call);
}

impl ManagementSource for ScriptedSource {
    type Locator = ScriptedLocator;

    fn initialize_runtime(&mut self) -> Result<()> {
        record(&self.log, Call::InitializeRuntime);
        match self.script.fail_runtime {
            Some(code) => Err(Error::RuntimeInit { code }),
            None => Ok(()),
        }
    }

    fn initialize_security(
        &mut self,
        authentication: AuthenticationLevel,
        impersonation: ImpersonationLevel,
    ) -> Result<()> {
        record(
            &self.log,
            Call::InitializeSecurity(authentication, impersonation),
        );
        match self.script.fail_security {
            Some(code) => Err(Error::SecurityInit { code }),
            None => Ok(()),
        }
    }

    fn create_locator(&mut self) -> Result<ScriptedLocator> {
        record(&self.log, Call::CreateLocator);
        match self.script.fail_locator {
            Some(code) => Err(Error::Locator { code }),
            None => Ok(ScriptedLocator {
                script: self.script.clone(),
                log: Rc::clone(&self.log),
            }),
        }
    }

    fn finalize_runtime(&mut self) {
        record(&self.log, Call::FinalizeRuntime);
    }
}

pub struct ScriptedLocator {
    script: Script,
    log: CallLog,
}

impl Locator for ScriptedLocator {
    type Service = ScriptedService;

    fn connect(&self, namespace: &str) -> Result<ScriptedService> {
        record(&self.log, Call::Connect(namespace.to_string()));
        match self.script.fail_connect {
            Some(code) => Err(Error::Connect {
                namespace: namespace.to_string(),
                code,
            }),
            None => Ok(ScriptedService {
                script: self.script.clone(),
                log: Rc::clone(&self.log),
            }),
        }
    }
}

impl Drop for ScriptedLocator {
    fn drop(&mut self) {
        record(&self.log, Call::ReleaseLocator);
    }
}

pub struct ScriptedService {
    script: Script,
    log: CallLog,
}

impl Service for ScriptedService {
    type Cursor = ScriptedCursor;

    fn set_proxy_blanket(
        &self,
        authentication: AuthenticationLevel,
        impersonation: ImpersonationLevel,
    ) -> Result<()> {
        record(&self.log, Call::SetProxyBlanket(authentication, impersonation));
        match self.script.fail_blanket {
            Some(code) => Err(Error::ProxyBlanket { code }),
            None => Ok(()),
        }
    }

    fn exec_query(&self, language: &str, query: &str) -> Result<ScriptedCursor> {
        record(
            &self.log,
            Call::ExecQuery(language.to_string(), query.to_string()),
        );
        match self.script.fail_query {
            Some(code) => Err(Error::Query { code }),
            None => Ok(ScriptedCursor {
                pending: self.script.records.iter().cloned().collect(),
                position: 0,
                fail_at: self.script.fail_advance_at,
                log: Rc::clone(&self.log),
            }),
        }
    }
}

impl Drop for ScriptedService {
    fn drop(&mut self) {
        record(&self.log, Call::ReleaseService);
    }
}

pub struct ScriptedCursor {
    pending: VecDeque<Fields>,
    position: usize,
    fail_at: Option<usize>,
    log: CallLog,
}

impl ResultCursor for ScriptedCursor {
    type Record = ScriptedRecord;

    fn advance(&mut self) -> Result<Option<ScriptedRecord>> {
        record(&self.log, Call::Advance);

        if self.fail_at == Some(self.position) {
            return Err(Error::Advance { code: -1 });
        }

        self.position += 1;
        Ok(self.pending.pop_front().map(|fields| ScriptedRecord {
            fields,
            log: Rc::clone(&self.log),
        }))
    }
}

impl Drop for ScriptedCursor {
    fn drop(&mut self) {
        record(&self.log, Call::ReleaseCursor);
    }
}

pub struct ScriptedRecord {
    fields: Fields,
    log: CallLog,
}

impl Record for ScriptedRecord {
    fn get(&self, name: &str) -> Result<FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| Error::Field {
                name: name.to_string(),
                code: -2147217406,
            })
    }
}

impl Drop for ScriptedRecord {
    fn drop(&mut self) {
        record(&self.log, Call::ReleaseRecord);
    }
}
