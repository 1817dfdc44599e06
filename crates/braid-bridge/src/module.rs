//! Foreign module and global resolution by name.

use std::fmt;

use braid_core::ForeignHandle;

use crate::error::{BridgeError, Result};
use crate::runtime::ForeignRuntime;

/// A resolved foreign namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHandle {
    path: String,
    handle: ForeignHandle,
}

impl ModuleHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handle(&self) -> ForeignHandle {
        self.handle
    }
}

impl fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "Main")
        } else {
            write!(f, "{}", self.path)
        }
    }
}

/// Resolve a dotted module path from the root namespace.
///
/// The empty path names the root module. Resolution is a pure lookup: the
/// same name yields the same handle every time, and a missing segment is an
/// error naming the full path.
pub fn resolve_module(runtime: &dyn ForeignRuntime, path: &str) -> Result<ModuleHandle> {
    let mut handle = runtime.root_module();
    if !path.is_empty() {
        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(BridgeError::ModuleNotFound { name: path.to_string() });
            }
            handle = runtime
                .submodule(handle, segment)
                .ok_or_else(|| BridgeError::ModuleNotFound { name: path.to_string() })?;
        }
    }
    Ok(ModuleHandle {
        path: path.to_string(),
        handle,
    })
}

/// A named binding inside a resolved module.
pub fn lookup_global(runtime: &dyn ForeignRuntime, module: &ModuleHandle, name: &str) -> Result<ForeignHandle> {
    runtime
        .lookup_global(module.handle, name)
        .ok_or_else(|| BridgeError::GlobalNotFound {
            module: module.to_string(),
            name: name.to_string(),
        })
}

/// Split `"A.B.name"` into the module path `"A.B"` and the binding `"name"`.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('.') {
        Some((module, name)) => (module, name),
        None => ("", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::HeapRuntime;
    use crate::runtime::ForeignData;

    #[test]
    fn resolves_dotted_module_path() {
        let rt = HeapRuntime::new();
        let expected = rt.define_module("Polymake.Polytope");
        let module = resolve_module(&rt, "Polymake.Polytope").unwrap();
        assert_eq!(module.handle(), expected);
        assert_eq!(module.path(), "Polymake.Polytope");
    }

    #[test]
    fn resolution_is_idempotent() {
        let rt = HeapRuntime::new();
        rt.define_module("Polymake");
        let a = resolve_module(&rt, "Polymake").unwrap();
        let b = resolve_module(&rt, "Polymake").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_path_is_root() {
        let rt = HeapRuntime::new();
        let root = resolve_module(&rt, "").unwrap();
        assert_eq!(root.handle(), rt.root_module());
        assert_eq!(root.to_string(), "Main");
    }

    #[test]
    fn unknown_module_is_an_error() {
        let rt = HeapRuntime::new();
        rt.define_module("Polymake");
        for name in ["Nope", "Polymake.Nope", "Polymake..Core", "Polymake."] {
            let err = resolve_module(&rt, name).unwrap_err();
            assert!(
                matches!(err, BridgeError::ModuleNotFound { name: ref n } if n == name),
                "unexpected error for {name:?}: {err}"
            );
        }
    }

    #[test]
    fn global_that_is_not_a_module_does_not_resolve_as_one() {
        let rt = HeapRuntime::new();
        rt.define_global("", "answer", ForeignData::Int(42));
        assert!(resolve_module(&rt, "answer").is_err());

        let root = resolve_module(&rt, "").unwrap();
        assert!(lookup_global(&rt, &root, "answer").is_ok());
    }

    #[test]
    fn missing_global_names_module() {
        let rt = HeapRuntime::new();
        rt.define_module("Polymake");
        let module = resolve_module(&rt, "Polymake").unwrap();
        let err = lookup_global(&rt, &module, "cube").unwrap_err();
        assert_eq!(err.to_string(), "'cube' not found in module Polymake");
    }

    #[test]
    fn split_path_separates_last_segment() {
        assert_eq!(split_path("A.B.f"), ("A.B", "f"));
        assert_eq!(split_path("f"), ("", "f"));
    }
}
