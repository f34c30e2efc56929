// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2024 NervoSys

//! Windows management source via COM and WMI
//!
//! Each capability wraps the COM interface it owns, so dropping it calls
//! `Release`. Field values are decoded through `wmi::Variant` and the raw
//! `VARIANT` is cleared when it goes out of scope.

use super::{FieldValue, Locator, ManagementSource, Record, ResultCursor, Service};
use crate::config::{AuthenticationLevel, ImpersonationLevel};
use crate::error::{Error, Result};
use windows::core::{BSTR, HSTRING};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoInitializeSecurity, CoSetProxyBlanket, CoUninitialize,
    CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED, EOAC_NONE, RPC_C_AUTHN_LEVEL, RPC_C_IMP_LEVEL,
};
use windows::Win32::System::Rpc::{RPC_C_AUTHN_WINNT, RPC_C_AUTHZ_NONE};
use windows::Win32::System::Variant::{VariantClear, VARIANT};
use windows::Win32::System::Wmi::{
    IEnumWbemClassObject, IWbemClassObject, IWbemLocator, IWbemServices, WbemLocator,
    WBEM_FLAG_FORWARD_ONLY, WBEM_FLAG_RETURN_IMMEDIATELY, WBEM_INFINITE,
};
use wmi::Variant;

fn code(err: &windows::core::Error) -> i32 {
    err.code().0
}

/// COM-backed management source for the local host
#[derive(Debug, Default)]
pub struct WmiSource;

impl WmiSource {
    pub fn new() -> Self {
        Self
    }
}

impl ManagementSource for WmiSource {
    type Locator = WmiLocator;

    fn initialize_runtime(&mut self) -> Result<()> {
        // S_FALSE (already initialized on this thread) still needs a matching CoUninitialize
        unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
            .ok()
            .map_err(|e| Error::RuntimeInit { code: code(&e) })
    }

    fn initialize_security(
        &mut self,
        authentication: AuthenticationLevel,
        impersonation: ImpersonationLevel,
    ) -> Result<()> {
        unsafe {
            CoInitializeSecurity(
                None,
                -1,
                None,
                None,
                RPC_C_AUTHN_LEVEL(authentication.as_raw()),
                RPC_C_IMP_LEVEL(impersonation.as_raw()),
                None,
                EOAC_NONE,
                None,
            )
        }
        .map_err(|e| Error::SecurityInit { code: code(&e) })
    }

    fn create_locator(&mut self) -> Result<WmiLocator> {
        let locator: IWbemLocator =
            unsafe { CoCreateInstance(&WbemLocator, None, CLSCTX_INPROC_SERVER) }
                .map_err(|e| Error::Locator { code: code(&e) })?;
        Ok(WmiLocator(locator))
    }

    fn finalize_runtime(&mut self) {
        unsafe { CoUninitialize() };
    }
}

/// Owned `IWbemLocator`
pub struct WmiLocator(IWbemLocator);

impl Locator for WmiLocator {
    type Service = WmiService;

    fn connect(&self, namespace: &str) -> Result<WmiService> {
        let services = unsafe {
            self.0.ConnectServer(
                &BSTR::from(namespace),
                &BSTR::new(),
                &BSTR::new(),
                &BSTR::new(),
                0,
                &BSTR::new(),
                None,
            )
        }
        .map_err(|e| Error::Connect {
            namespace: namespace.to_string(),
            code: code(&e),
        })?;

        Ok(WmiService(services))
    }
}

/// Owned `IWbemServices` proxy
pub struct WmiService(IWbemServices);

impl Service for WmiService {
    type Cursor = WmiCursor;

    fn set_proxy_blanket(
        &self,
        authentication: AuthenticationLevel,
        impersonation: ImpersonationLevel,
    ) -> Result<()> {
        unsafe {
            CoSetProxyBlanket(
                &self.0,
                RPC_C_AUTHN_WINNT,
                RPC_C_AUTHZ_NONE,
                None,
                RPC_C_AUTHN_LEVEL(authentication.as_raw()),
                RPC_C_IMP_LEVEL(impersonation.as_raw()),
                None,
                EOAC_NONE,
            )
        }
        .map_err(|e| Error::ProxyBlanket { code: code(&e) })
    }

    fn exec_query(&self, language: &str, query: &str) -> Result<WmiCursor> {
        let enumerator = unsafe {
            self.0.ExecQuery(
                &BSTR::from(language),
                &BSTR::from(query),
                WBEM_FLAG_FORWARD_ONLY | WBEM_FLAG_RETURN_IMMEDIATELY,
                None,
            )
        }
        .map_err(|e| Error::Query { code: code(&e) })?;

        Ok(WmiCursor(enumerator))
    }
}

/// Owned `IEnumWbemClassObject`
pub struct WmiCursor(IEnumWbemClassObject);

impl ResultCursor for WmiCursor {
    type Record = WmiRecord;

    fn advance(&mut self) -> Result<Option<WmiRecord>> {
        let mut objects: [Option<IWbemClassObject>; 1] = [None];
        let mut returned = 0u32;

        let hres = unsafe { self.0.Next(WBEM_INFINITE, &mut objects, &mut returned) };

        if returned == 0 {
            // WBEM_S_FALSE with nothing returned marks the end of the result set
            return match hres.ok() {
                Ok(()) => Ok(None),
                Err(e) => Err(Error::Advance { code: code(&e) }),
            };
        }

        Ok(objects[0].take().map(WmiRecord))
    }
}

/// `VARIANT` filled by `Get`; cleared on drop so owned strings are freed
struct OwnedVariant(VARIANT);

impl Drop for OwnedVariant {
    fn drop(&mut self) {
        let _ = unsafe { VariantClear(&mut self.0) };
    }
}

/// Owned `IWbemClassObject`
pub struct WmiRecord(IWbemClassObject);

impl Record for WmiRecord {
    fn get(&self, name: &str) -> Result<FieldValue> {
        let mut value = OwnedVariant(VARIANT::default());

        unsafe { self.0.Get(&HSTRING::from(name), 0, &mut value.0, None, None) }.map_err(|e| {
            Error::Field {
                name: name.to_string(),
                code: code(&e),
            }
        })?;

        let field = match Variant::from_variant(&value.0) {
            Ok(Variant::Empty) | Ok(Variant::Null) => FieldValue::Null,
            Ok(Variant::String(s)) => FieldValue::Text(s),
            Ok(Variant::Bool(b)) => FieldValue::Bool(b),
            Ok(Variant::I1(n)) => FieldValue::Integer(n.into()),
            Ok(Variant::I2(n)) => FieldValue::Integer(n.into()),
            Ok(Variant::I4(n)) => FieldValue::Integer(n.into()),
            Ok(Variant::I8(n)) => FieldValue::Integer(n),
            Ok(Variant::UI1(n)) => FieldValue::Unsigned(n.into()),
            Ok(Variant::UI2(n)) => FieldValue::Unsigned(n.into()),
            Ok(Variant::UI4(n)) => FieldValue::Unsigned(n.into()),
            Ok(Variant::UI8(n)) => FieldValue::Unsigned(n),
            Ok(Variant::R4(f)) => FieldValue::Float(f.into()),
            Ok(Variant::R8(f)) => FieldValue::Float(f),
            Ok(other) => FieldValue::Other(format!("{:?}", other)),
            Err(e) => FieldValue::Other(e.to_string()),
        };

        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::enumerator::{DiskEnumerator, State};

    #[test]
    fn test_live_disk_query_lifecycle() {
        let mut enumerator = DiskEnumerator::new(WmiSource::new(), Config::default());
        enumerator.establish_session().unwrap();
        assert_eq!(enumerator.state(), State::Established);

        let disks = enumerator.query().unwrap().count();
        assert!(disks > 0);

        enumerator.teardown();
        assert_eq!(enumerator.state(), State::TornDown);
    }

    #[test]
    fn test_missing_field_is_field_error() {
        let config = Config::default();
        let mut source = WmiSource::new();
        source.initialize_runtime().unwrap();
        // RPC_E_TOO_LATE when another test already set process security
        let _ = source.initialize_security(
            config.session.security_authentication,
            config.session.impersonation,
        );

        {
            let locator = source.create_locator().unwrap();
            let service = locator.connect(&config.session.namespace).unwrap();
            service
                .set_proxy_blanket(
                    config.session.proxy_authentication,
                    config.session.impersonation,
                )
                .unwrap();

            let mut cursor = service
                .exec_query("WQL", "SELECT * FROM Win32_OperatingSystem")
                .unwrap();
            let record = cursor.advance().unwrap().unwrap();

            assert!(matches!(
                record.get("Caption").unwrap(),
                FieldValue::Text(_)
            ));
            match record.get("NoSuchField") {
                Err(Error::Field { name, .. }) => assert_eq!(name, "NoSuchField"),
                other => panic!("expected field error, got {:?}", other),
            }
        }

        source.finalize_runtime();
    }
}
