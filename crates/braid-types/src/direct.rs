//! Direct calls: foreign functions bound under a fixed host signature.
//!
//! A direct call resolves its foreign function once, at registration, and
//! checks argument and result types against the type registry on every
//! call. The parameter type `Any` accepts every value.

use std::collections::BTreeMap;

use braid_bridge::Bridge;
use braid_core::{ForeignFunction, HostType, HostValue};

use crate::error::{Result, TypeError};
use crate::init::{FailureLevel, RegistrationFailure};
use crate::manifest::DirectCallSpec;
use crate::registry::TypeRegistry;

const ANY: &str = "Any";

/// A bound direct call.
#[derive(Debug, Clone)]
pub struct DirectCall {
    name: String,
    function: ForeignFunction,
    params: Vec<HostType>,
    returns: Option<HostType>,
}

impl DirectCall {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[HostType] {
        &self.params
    }

    pub fn returns(&self) -> Option<&HostType> {
        self.returns.as_ref()
    }

    pub fn function(&self) -> &ForeignFunction {
        &self.function
    }

    fn signature_error(&self, detail: String) -> TypeError {
        TypeError::DirectCallSignature {
            name: self.name.clone(),
            detail,
        }
    }

    fn check(&self, registry: &TypeRegistry, bridge: &Bridge, expected: &HostType, value: &HostValue, what: &str) -> Result<()> {
        if expected.name() == ANY {
            return Ok(());
        }
        let actual = registry
            .host_type_of(bridge, value)
            .map_err(|_| self.signature_error(format!("{what} {value} has no registered type, expected {expected}")))?;
        if actual != *expected {
            return Err(self.signature_error(format!("{what} has type {actual}, expected {expected}")));
        }
        Ok(())
    }

    /// Check arguments, invoke, and check the result.
    pub fn call(&self, bridge: &Bridge, registry: &TypeRegistry, args: &[HostValue]) -> Result<HostValue> {
        if args.len() != self.params.len() {
            return Err(self.signature_error(format!(
                "expected {} argument(s), got {}",
                self.params.len(),
                args.len()
            )));
        }
        for (i, (param, arg)) in self.params.iter().zip(args).enumerate() {
            self.check(registry, bridge, param, arg, &format!("argument {}", i + 1))?;
        }

        let result = bridge.invoke(&self.function, args)?;

        if let Some(returns) = &self.returns {
            self.check(registry, bridge, returns, &result, "result")?;
        }
        Ok(result)
    }
}

/// All direct calls bound at registration, plus those that failed to bind.
#[derive(Debug, Default)]
pub struct DirectCalls {
    calls: BTreeMap<String, DirectCall>,
    failures: Vec<RegistrationFailure>,
}

impl DirectCalls {
    pub fn get(&self, name: &str) -> Option<&DirectCall> {
        self.calls.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.calls.keys().map(String::as_str)
    }

    pub fn failures(&self) -> &[RegistrationFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Invoke the direct call registered as `name`.
    pub fn call(&self, name: &str, bridge: &Bridge, registry: &TypeRegistry, args: &[HostValue]) -> Result<HostValue> {
        let call = self.calls.get(name).ok_or_else(|| TypeError::DirectCallSignature {
            name: name.to_string(),
            detail: "no direct call with this name is registered".to_string(),
        })?;
        call.call(bridge, registry, args)
    }
}

/// Bind every declared direct call. Each one that cannot be bound is
/// recorded as a failure without affecting the others.
pub fn register_direct_calls(bridge: &Bridge, registry: &TypeRegistry, specs: &[DirectCallSpec]) -> DirectCalls {
    let mut out = DirectCalls::default();
    for spec in specs {
        match bind(bridge, registry, spec) {
            Ok(call) => {
                tracing::debug!(name = %spec.name, function = %spec.function, "bound direct call");
                out.calls.insert(spec.name.clone(), call);
            }
            Err(error) => out
                .failures
                .push(RegistrationFailure::record(FailureLevel::DirectCall, &spec.name, error)),
        }
    }
    out
}

fn bind(bridge: &Bridge, registry: &TypeRegistry, spec: &DirectCallSpec) -> Result<DirectCall> {
    let declared = |ty: &HostType| -> Result<HostType> {
        if ty.name() != ANY && !registry.is_registered(ty) {
            return Err(TypeError::UnregisteredParameter {
                family: spec.name.clone(),
                parameter: ty.to_string(),
            });
        }
        Ok(ty.clone())
    };

    let params = spec
        .params
        .iter()
        .map(declared)
        .collect::<Result<Vec<_>>>()?;
    let returns = spec.returns.as_ref().map(declared).transpose()?;
    let function = bridge.function_by_path(&spec.function, spec.auto_convert)?;

    Ok(DirectCall {
        name: spec.name.clone(),
        function,
        params,
        returns,
    })
}
