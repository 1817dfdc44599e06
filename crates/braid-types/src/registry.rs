//! The host-side registry of foreign types.
//!
//! Each registered family keeps its foreign type constructor; each
//! registered type maps one-to-one to a rooted foreign type object. The
//! parameters are part of the identity, so `Array<Int>` and
//! `Array<Rational>` are distinct registrations with distinct foreign types.

use std::collections::{BTreeMap, HashMap};

use braid_bridge::{guarded, Bridge};
use braid_core::{ForeignCell, ForeignHandle, HostType, HostValue};

use crate::error::{Result, TypeError};
use crate::template::ParametricTypeTemplate;

/// A family whose constructor has been resolved in the foreign runtime.
#[derive(Debug, Clone)]
pub struct RegisteredFamily {
    pub template: ParametricTypeTemplate,
    pub constructor: ForeignCell,
}

/// Registered families and types.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    families: BTreeMap<String, RegisteredFamily>,
    types: BTreeMap<HostType, ForeignCell>,
    by_handle: HashMap<ForeignHandle, HostType>,
    order: Vec<HostType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the template's constructor in the foreign runtime and record
    /// the family. Concrete families also register their single type.
    ///
    /// Extension templates resolve to their base family's constructor and
    /// record nothing of their own.
    pub fn register_family(&mut self, bridge: &Bridge, template: &ParametricTypeTemplate) -> Result<()> {
        let unavailable = |detail: String| TypeError::FamilyUnavailable {
            family: template.family.clone(),
            detail,
        };

        for required in &template.requires {
            if !self.families.contains_key(required) {
                return Err(unavailable(format!("requires {required}, which is not registered")));
            }
        }

        if let Some(since) = &template.since {
            let req = semver::VersionReq::parse(since)
                .map_err(|e| unavailable(format!("invalid version requirement '{since}': {e}")))?;
            let found = bridge.runtime().library_version();
            if !req.matches(&found) {
                return Err(unavailable(format!("needs library {req}, found {found}")));
            }
        }

        if template.extends.is_some() {
            tracing::debug!(family = %template.family, base = template.target_family(), "registered extension");
            return Ok(());
        }

        let constructor = bridge
            .runtime()
            .type_family(&template.foreign_name)
            .ok_or_else(|| unavailable(format!("foreign runtime has no type '{}'", template.foreign_name)))?;
        let constructor = bridge.cell(constructor);

        if template.is_scalar() {
            self.insert(HostType::concrete(&template.family), constructor.clone());
        }
        self.families.insert(
            template.family.clone(),
            RegisteredFamily {
                template: template.clone(),
                constructor,
            },
        );
        tracing::debug!(family = %template.family, foreign = %template.foreign_name, "registered type family");
        Ok(())
    }

    /// Register one parametric instantiation.
    ///
    /// Every parameter must already be registered. Registering a type that
    /// is already present returns its existing foreign type.
    pub fn instantiate(&mut self, bridge: &Bridge, ty: &HostType) -> Result<ForeignHandle> {
        if let Some(existing) = self.types.get(ty) {
            return Ok(existing.read());
        }

        let family = self
            .families
            .get(ty.name())
            .ok_or_else(|| TypeError::UnknownFamily {
                name: ty.name().to_string(),
            })?;
        if ty.params().len() != family.template.arity {
            return Err(TypeError::ArityMismatch {
                family: ty.name().to_string(),
                expected: family.template.arity,
                found: ty.params().len(),
            });
        }

        let mut params = Vec::with_capacity(ty.params().len());
        for param in ty.params() {
            let handle = self.lookup(param).ok_or_else(|| TypeError::UnregisteredParameter {
                family: ty.to_string(),
                parameter: param.to_string(),
            })?;
            params.push(handle);
        }

        let constructor = family.constructor.read();
        let foreign = guarded(bridge.runtime(), |rt| rt.apply_type(constructor, &params))?;
        self.insert(ty.clone(), bridge.cell(foreign));
        tracing::debug!(%ty, "registered type");
        Ok(foreign)
    }

    fn insert(&mut self, ty: HostType, foreign: ForeignCell) {
        self.by_handle.insert(foreign.read(), ty.clone());
        self.order.push(ty.clone());
        self.types.insert(ty, foreign);
    }

    /// The foreign type registered for `ty`.
    pub fn lookup(&self, ty: &HostType) -> Option<ForeignHandle> {
        self.types.get(ty).map(ForeignCell::read)
    }

    /// The host type registered for a foreign type object.
    pub fn host_type(&self, foreign: ForeignHandle) -> Option<&HostType> {
        self.by_handle.get(&foreign)
    }

    /// The registered host type of a value.
    ///
    /// Native scalars map to their element types; foreign objects are
    /// resolved through the foreign runtime's type of the value.
    pub fn host_type_of(&self, bridge: &Bridge, value: &HostValue) -> Result<HostType> {
        let native = match value {
            HostValue::Bool(_) => Some("Bool"),
            HostValue::Int(_) => Some("Int"),
            HostValue::Float(_) => Some("Float"),
            HostValue::Str(_) => Some("String"),
            _ => None,
        };
        if let Some(name) = native {
            let ty = HostType::concrete(name);
            if self.types.contains_key(&ty) {
                return Ok(ty);
            }
        }

        let unknown = || TypeError::UnknownForeignType {
            description: value.to_string(),
        };
        let handle = value.as_foreign().map(ForeignCell::read).ok_or_else(unknown)?;
        let foreign_type = bridge.runtime().type_of(handle);
        self.host_type(foreign_type).cloned().ok_or_else(unknown)
    }

    pub fn family(&self, name: &str) -> Option<&RegisteredFamily> {
        self.families.get(name)
    }

    pub fn is_registered(&self, ty: &HostType) -> bool {
        self.types.contains_key(ty)
    }

    /// Registered family names, sorted.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    /// Registered types in registration order.
    pub fn types(&self) -> &[HostType] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::template;
    use braid_bridge::{ForeignData, ForeignRuntime, HeapRuntime};
    use std::rc::Rc;

    fn heap_with(families: &[&str]) -> Rc<HeapRuntime> {
        let heap = Rc::new(HeapRuntime::new());
        for name in families {
            heap.provide_type_family(name);
        }
        heap
    }

    fn register(registry: &mut TypeRegistry, bridge: &Bridge, families: &[&str]) {
        for family in families {
            let t = template(family).unwrap();
            registry.register_family(bridge, &t).unwrap();
        }
    }

    #[test]
    fn parameters_are_part_of_type_identity() {
        let heap = heap_with(&["long", "pm::Integer", "pm::Rational", "pm::Array"]);
        let bridge = Bridge::new(heap.clone());
        let mut registry = TypeRegistry::new();
        register(&mut registry, &bridge, &["Int", "Integer", "Rational", "Array"]);

        let a = registry.instantiate(&bridge, &HostType::parse("Array<Rational>").unwrap()).unwrap();
        let b = registry.instantiate(&bridge, &HostType::parse("Array<Integer>").unwrap()).unwrap();
        assert_ne!(a, b);
        assert_eq!(heap.describe(a).as_deref(), Some("pm::Array<pm::Rational>"));
    }

    #[test]
    fn parameter_must_be_registered_first() {
        let heap = heap_with(&["long", "pm::Rational", "pm::Array"]);
        let bridge = Bridge::new(heap);
        let mut registry = TypeRegistry::new();
        register(&mut registry, &bridge, &["Int", "Array"]);

        let err = registry
            .instantiate(&bridge, &HostType::parse("Array<Rational>").unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            TypeError::UnregisteredParameter { ref family, ref parameter }
                if family == "Array<Rational>" && parameter == "Rational"
        ));
        assert!(!registry.is_registered(&HostType::parse("Array<Rational>").unwrap()));
    }

    #[test]
    fn instantiation_is_idempotent() {
        let heap = heap_with(&["long", "pm::Set"]);
        let bridge = Bridge::new(heap);
        let mut registry = TypeRegistry::new();
        register(&mut registry, &bridge, &["Int", "Set"]);

        let ty = HostType::parse("Set<Int>").unwrap();
        let first = registry.instantiate(&bridge, &ty).unwrap();
        let second = registry.instantiate(&bridge, &ty).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.types().iter().filter(|t| **t == ty).count(), 1);
    }

    #[test]
    fn arity_and_family_are_checked() {
        let heap = heap_with(&["long", "pm::Map"]);
        let bridge = Bridge::new(heap);
        let mut registry = TypeRegistry::new();
        register(&mut registry, &bridge, &["Int", "Map"]);

        let err = registry.instantiate(&bridge, &HostType::parse("Map<Int>").unwrap()).unwrap_err();
        assert!(matches!(err, TypeError::ArityMismatch { expected: 2, found: 1, .. }));
        let err = registry.instantiate(&bridge, &HostType::parse("Vector<Int>").unwrap()).unwrap_err();
        assert!(matches!(err, TypeError::UnknownFamily { .. }));
    }

    #[test]
    fn missing_foreign_family_is_unavailable() {
        let heap = heap_with(&[]);
        let bridge = Bridge::new(heap);
        let mut registry = TypeRegistry::new();
        let err = registry
            .register_family(&bridge, &template("Int").unwrap())
            .unwrap_err();
        assert!(matches!(err, TypeError::FamilyUnavailable { ref family, .. } if family == "Int"));
    }

    #[test]
    fn library_version_gates_families() {
        let heap = Rc::new(HeapRuntime::with_version(semver::Version::new(2, 5, 0)));
        for name in ["pm::Integer", "pm::Rational", "pm::TropicalNumber<pm::Min,pm::Rational>"] {
            heap.provide_type_family(name);
        }
        let bridge = Bridge::new(heap);
        let mut registry = TypeRegistry::new();
        register(&mut registry, &bridge, &["Integer", "Rational"]);
        let err = registry
            .register_family(&bridge, &template("MinTropical").unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("needs library"));
    }

    #[test]
    fn host_type_of_native_and_foreign_values() {
        let heap = heap_with(&["long", "pm::Set"]);
        let bridge = Bridge::new(heap.clone());
        let mut registry = TypeRegistry::new();
        register(&mut registry, &bridge, &["Int", "Set"]);
        let set_int = HostType::parse("Set<Int>").unwrap();
        let set_type = registry.instantiate(&bridge, &set_int).unwrap();

        assert_eq!(registry.host_type_of(&bridge, &HostValue::Int(3)).unwrap(), HostType::concrete("Int"));

        let obj = heap.new_instance(set_type, vec![("elements", ForeignData::Array(vec![]))]);
        let value = bridge.promote_value(obj);
        assert_eq!(registry.host_type_of(&bridge, &value).unwrap(), set_int);

        let untyped = bridge.promote_value(heap.construct(ForeignData::Opaque));
        assert!(matches!(
            registry.host_type_of(&bridge, &untyped).unwrap_err(),
            TypeError::UnknownForeignType { .. }
        ));
        assert!(registry.host_type_of(&bridge, &HostValue::Float(1.0)).is_err());
    }

    #[test]
    fn registered_types_stay_rooted() {
        let heap = heap_with(&["long", "pm::Vector"]);
        let bridge = Bridge::new(heap.clone());
        let mut registry = TypeRegistry::new();
        register(&mut registry, &bridge, &["Int", "Vector"]);
        let h = registry.instantiate(&bridge, &HostType::parse("Vector<Int>").unwrap()).unwrap();
        assert!(heap.root_count(h) >= 1);
    }
}
