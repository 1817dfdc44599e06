//! In-process reference runtime.
//!
//! [`HeapRuntime`] is a small foreign runtime living in the host process: a
//! slot heap with per-slot root counts, a tracing collector, nested modules,
//! native callables, instance objects with fields, type constructors, and a
//! pending-fault flag. It backs the CLI and serves as the foreign side in
//! tests.
//!
//! A host value boxed into the heap ([`ForeignData::Host`]) may hold
//! foreign cells, and each cell holds the runtime as its root set. Such a
//! box keeps the runtime alive until [`HeapRuntime::collect`] reclaims it.
//!
//! Layout of the namespace tree:
//! ```text
//! Main                    (root module)
//!   <module>/             (define_module("A.B") creates A, then A.B)
//!     <name> = value      (define_global / define_function)
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use braid_core::{ForeignHandle, RootSet};

use crate::runtime::{ForeignData, ForeignRuntime};

/// A native function callable from the bridge.
///
/// Returning `Err(message)` raises a foreign fault carrying `message`.
pub type NativeFn = Rc<dyn Fn(&HeapRuntime, &[ForeignHandle]) -> Result<ForeignHandle, String>>;

enum Object {
    Value(ForeignData),
    Module {
        name: String,
        members: BTreeMap<String, ForeignHandle>,
    },
    Function {
        name: String,
        native: NativeFn,
    },
    TypeConstructor {
        name: String,
    },
    Type {
        constructor: ForeignHandle,
        params: Vec<ForeignHandle>,
    },
    Instance {
        type_: ForeignHandle,
        fields: BTreeMap<String, ForeignHandle>,
    },
}

struct Slot {
    object: Object,
    roots: usize,
}

struct HeapState {
    slots: HashMap<u64, Slot>,
    next_id: u64,
    fault: Option<ForeignHandle>,
    main: ForeignHandle,
    families: BTreeMap<String, ForeignHandle>,
    applied: HashMap<(ForeignHandle, Vec<ForeignHandle>), ForeignHandle>,
    log: Option<Vec<&'static str>>,
}

impl HeapState {
    fn alloc(&mut self, object: Object) -> ForeignHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.slots.insert(id, Slot { object, roots: 0 });
        ForeignHandle::from_raw(id)
    }

    fn object(&self, h: ForeignHandle) -> Option<&Object> {
        self.slots.get(&h.raw()).map(|s| &s.object)
    }

    fn object_mut(&mut self, h: ForeignHandle) -> Option<&mut Object> {
        self.slots.get_mut(&h.raw()).map(|s| &mut s.object)
    }

    fn member(&self, module: ForeignHandle, name: &str) -> Option<ForeignHandle> {
        match self.object(module)? {
            Object::Module { members, .. } => members.get(name).copied(),
            _ => None,
        }
    }

    fn references(&self, h: ForeignHandle) -> Vec<ForeignHandle> {
        match self.object(h) {
            Some(Object::Value(ForeignData::Array(items))) => items.clone(),
            Some(Object::Value(ForeignData::Dict(pairs))) => {
                pairs.iter().flat_map(|(k, v)| [*k, *v]).collect()
            }
            Some(Object::Module { members, .. }) => members.values().copied().collect(),
            Some(Object::Type { constructor, params }) => {
                let mut out = vec![*constructor];
                out.extend(params.iter().copied());
                out
            }
            Some(Object::Instance { type_, fields }) => {
                let mut out = vec![*type_];
                out.extend(fields.values().copied());
                out
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, h: ForeignHandle) -> Option<String> {
        match self.object(h)? {
            Object::Value(data) => match data {
                ForeignData::Nothing => Some("nothing".to_string()),
                ForeignData::Bool(b) => Some(b.to_string()),
                ForeignData::Int(i) => Some(i.to_string()),
                ForeignData::Float(x) => Some(x.to_string()),
                ForeignData::Str(s) => Some(s.clone()),
                ForeignData::Symbol(s) => Some(format!(":{s}")),
                ForeignData::Array(items) => {
                    let parts: Vec<String> = items
                        .iter()
                        .map(|i| self.render(*i).unwrap_or_else(|| "?".to_string()))
                        .collect();
                    Some(format!("[{}]", parts.join(", ")))
                }
                ForeignData::Dict(pairs) => Some(format!("Dict with {} entries", pairs.len())),
                ForeignData::Host(value) => Some(format!("host value {value}")),
                ForeignData::Opaque => None,
            },
            Object::Module { name, .. } => Some(format!("module {name}")),
            Object::Function { name, .. } => Some(format!("function {name}")),
            Object::TypeConstructor { name } => Some(name.clone()),
            Object::Type { constructor, params } => {
                let head = self.render(*constructor)?;
                if params.is_empty() {
                    return Some(head);
                }
                let parts: Vec<String> = params.iter().filter_map(|p| self.render(*p)).collect();
                Some(format!("{head}<{}>", parts.join(",")))
            }
            Object::Instance { type_, .. } => {
                let ty = self.render(*type_).unwrap_or_else(|| "?".to_string());
                Some(format!("<{ty} object>"))
            }
        }
    }
}

/// A foreign runtime implemented as an in-process slot heap.
pub struct HeapRuntime {
    state: RefCell<HeapState>,
    version: semver::Version,
}

impl Default for HeapRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapRuntime {
    /// A runtime reporting library version 4.11.0.
    pub fn new() -> Self {
        Self::with_version(semver::Version::new(4, 11, 0))
    }

    pub fn with_version(version: semver::Version) -> Self {
        let mut state = HeapState {
            slots: HashMap::new(),
            next_id: 0,
            fault: None,
            main: ForeignHandle::NULL,
            families: BTreeMap::new(),
            applied: HashMap::new(),
            log: None,
        };
        state.main = state.alloc(Object::Module {
            name: "Main".to_string(),
            members: BTreeMap::new(),
        });
        HeapRuntime {
            state: RefCell::new(state),
            version,
        }
    }

    fn note(&self, event: &'static str) {
        if let Some(log) = self.state.borrow_mut().log.as_mut() {
            log.push(event);
        }
    }

    /// Start recording the sequence of bridge-facing calls.
    pub fn record_calls(&self) {
        self.state.borrow_mut().log = Some(Vec::new());
    }

    /// The calls recorded since [`HeapRuntime::record_calls`].
    pub fn call_log(&self) -> Vec<&'static str> {
        self.state.borrow().log.clone().unwrap_or_default()
    }

    /// Create (or find) the module at a dotted path below `Main`.
    pub fn define_module(&self, path: &str) -> ForeignHandle {
        let mut state = self.state.borrow_mut();
        let mut current = state.main;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            current = match state.member(current, segment) {
                Some(existing) => existing,
                None => {
                    let child = state.alloc(Object::Module {
                        name: segment.to_string(),
                        members: BTreeMap::new(),
                    });
                    if let Some(Object::Module { members, .. }) = state.object_mut(current) {
                        members.insert(segment.to_string(), child);
                    }
                    child
                }
            };
        }
        current
    }

    fn bind_member(&self, module_path: &str, name: &str, value: ForeignHandle) {
        let module = self.define_module(module_path);
        let mut state = self.state.borrow_mut();
        if let Some(Object::Module { members, .. }) = state.object_mut(module) {
            members.insert(name.to_string(), value);
        }
    }

    /// Define a native function as `module_path.name`.
    pub fn define_function<F>(&self, module_path: &str, name: &str, f: F) -> ForeignHandle
    where
        F: Fn(&HeapRuntime, &[ForeignHandle]) -> Result<ForeignHandle, String> + 'static,
    {
        let handle = self.state.borrow_mut().alloc(Object::Function {
            name: name.to_string(),
            native: Rc::new(f),
        });
        self.bind_member(module_path, name, handle);
        handle
    }

    /// Define a global value as `module_path.name`.
    pub fn define_global(&self, module_path: &str, name: &str, data: ForeignData) -> ForeignHandle {
        let handle = self.construct(data);
        self.bind_member(module_path, name, handle);
        handle
    }

    /// Make a type family available under its foreign name.
    pub fn provide_type_family(&self, foreign_name: &str) -> ForeignHandle {
        let mut state = self.state.borrow_mut();
        if let Some(existing) = state.families.get(foreign_name) {
            return *existing;
        }
        let ctor = state.alloc(Object::TypeConstructor {
            name: foreign_name.to_string(),
        });
        state.families.insert(foreign_name.to_string(), ctor);
        ctor
    }

    /// Allocate an object of type `type_` with the given fields.
    pub fn new_instance(&self, type_: ForeignHandle, fields: Vec<(&str, ForeignData)>) -> ForeignHandle {
        let fields: BTreeMap<String, ForeignHandle> = fields
            .into_iter()
            .map(|(name, data)| (name.to_string(), self.construct(data)))
            .collect();
        self.state.borrow_mut().alloc(Object::Instance { type_, fields })
    }

    /// Raise a fault whose exception object is the string `message`.
    pub fn raise(&self, message: &str) {
        self.raise_value(ForeignData::Str(message.to_string()));
    }

    /// Raise a fault with an arbitrary exception object.
    pub fn raise_value(&self, exception: ForeignData) {
        let mut state = self.state.borrow_mut();
        let h = state.alloc(Object::Value(exception));
        state.fault = Some(h);
    }

    /// Number of roots currently held on `handle`.
    pub fn root_count(&self, handle: ForeignHandle) -> usize {
        self.state
            .borrow()
            .slots
            .get(&handle.raw())
            .map(|s| s.roots)
            .unwrap_or(0)
    }

    pub fn is_live(&self, handle: ForeignHandle) -> bool {
        self.state.borrow().slots.contains_key(&handle.raw())
    }

    /// Reclaim every slot not reachable from a root, the namespace tree,
    /// the type tables or the pending fault. Returns the number reclaimed.
    pub fn collect(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let mut work: Vec<ForeignHandle> = vec![state.main];
        work.extend(state.fault);
        work.extend(state.families.values().copied());
        work.extend(state.applied.values().copied());
        work.extend(
            state
                .slots
                .iter()
                .filter(|(_, s)| s.roots > 0)
                .map(|(id, _)| ForeignHandle::from_raw(*id)),
        );

        let mut marked: HashSet<u64> = HashSet::new();
        while let Some(h) = work.pop() {
            if h.is_null() || !marked.insert(h.raw()) {
                continue;
            }
            work.extend(state.references(h));
        }

        let dead_ids: Vec<u64> = state.slots.keys().filter(|id| !marked.contains(*id)).copied().collect();
        let dead: Vec<Slot> = dead_ids.iter().filter_map(|id| state.slots.remove(id)).collect();
        drop(state);

        // Boxed host values may own cells, and dropping them unroots.
        let reclaimed = dead.len();
        drop(dead);
        reclaimed
    }
}

impl RootSet for HeapRuntime {
    fn root(&self, handle: ForeignHandle) {
        if let Some(slot) = self.state.borrow_mut().slots.get_mut(&handle.raw()) {
            slot.roots += 1;
        }
    }

    fn unroot(&self, handle: ForeignHandle) {
        if let Some(slot) = self.state.borrow_mut().slots.get_mut(&handle.raw()) {
            slot.roots = slot.roots.saturating_sub(1);
        }
    }
}

impl ForeignRuntime for HeapRuntime {
    fn library_version(&self) -> semver::Version {
        self.version.clone()
    }

    fn pending_fault(&self) -> Option<ForeignHandle> {
        self.note("pending_fault");
        self.state.borrow().fault
    }

    fn clear_fault(&self) {
        self.note("clear_fault");
        self.state.borrow_mut().fault = None;
    }

    fn describe(&self, value: ForeignHandle) -> Option<String> {
        self.note("describe");
        self.state.borrow().render(value)
    }

    fn root_module(&self) -> ForeignHandle {
        self.state.borrow().main
    }

    fn submodule(&self, parent: ForeignHandle, name: &str) -> Option<ForeignHandle> {
        let state = self.state.borrow();
        let child = state.member(parent, name)?;
        match state.object(child) {
            Some(Object::Module { .. }) => Some(child),
            _ => None,
        }
    }

    fn lookup_global(&self, module: ForeignHandle, name: &str) -> Option<ForeignHandle> {
        self.state.borrow().member(module, name)
    }

    fn get_field(&self, value: ForeignHandle, name: &str) -> ForeignHandle {
        self.note("get_field");
        let found = {
            let state = self.state.borrow();
            match state.object(value) {
                Some(Object::Instance { fields, .. }) => fields.get(name).copied(),
                Some(Object::Module { members, .. }) => members.get(name).copied(),
                _ => None,
            }
        };
        match found {
            Some(h) => h,
            None => {
                let what = self.state.borrow().render(value).unwrap_or_else(|| value.to_string());
                self.raise(&format!("FieldError: {what} has no field {name}"));
                ForeignHandle::NULL
            }
        }
    }

    fn is_callable(&self, value: ForeignHandle) -> bool {
        matches!(self.state.borrow().object(value), Some(Object::Function { .. }))
    }

    fn call(&self, function: ForeignHandle, args: &[ForeignHandle]) -> ForeignHandle {
        self.note("call");
        let native = match self.state.borrow().object(function) {
            Some(Object::Function { native, .. }) => Some(native.clone()),
            _ => None,
        };
        let Some(native) = native else {
            let what = self.state.borrow().render(function).unwrap_or_else(|| function.to_string());
            self.raise(&format!("MethodError: {what} is not callable"));
            return ForeignHandle::NULL;
        };
        match native(self, args) {
            Ok(result) => result,
            Err(message) => {
                self.raise(&message);
                ForeignHandle::NULL
            }
        }
    }

    fn construct(&self, data: ForeignData) -> ForeignHandle {
        self.state.borrow_mut().alloc(Object::Value(data))
    }

    fn inspect(&self, value: ForeignHandle) -> ForeignData {
        self.note("inspect");
        match self.state.borrow().object(value) {
            Some(Object::Value(data)) => data.clone(),
            _ => ForeignData::Opaque,
        }
    }

    fn type_of(&self, value: ForeignHandle) -> ForeignHandle {
        let state = self.state.borrow();
        let family = |name: &str| state.families.get(name).copied().unwrap_or(ForeignHandle::NULL);
        match state.object(value) {
            Some(Object::Value(ForeignData::Bool(_))) => family("bool"),
            Some(Object::Value(ForeignData::Int(_))) => family("long"),
            Some(Object::Value(ForeignData::Float(_))) => family("double"),
            Some(Object::Value(ForeignData::Str(_))) => family("std::string"),
            Some(Object::Instance { type_, .. }) => *type_,
            _ => ForeignHandle::NULL,
        }
    }

    fn type_family(&self, foreign_name: &str) -> Option<ForeignHandle> {
        self.state.borrow().families.get(foreign_name).copied()
    }

    fn apply_type(&self, constructor: ForeignHandle, params: &[ForeignHandle]) -> ForeignHandle {
        self.note("apply_type");
        let is_ctor = matches!(
            self.state.borrow().object(constructor),
            Some(Object::TypeConstructor { .. })
        );
        if !is_ctor {
            self.raise(&format!("TypeError: {constructor} is not a type constructor"));
            return ForeignHandle::NULL;
        }
        if params.is_empty() {
            return constructor;
        }

        let mut state = self.state.borrow_mut();
        let key = (constructor, params.to_vec());
        if let Some(existing) = state.applied.get(&key) {
            return *existing;
        }
        let ty = state.alloc(Object::Type {
            constructor,
            params: params.to_vec(),
        });
        state.applied.insert(key, ty);
        ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_modules_resolve() {
        let rt = HeapRuntime::new();
        let core = rt.define_module("Polymake.Core");
        let polymake = rt.submodule(rt.root_module(), "Polymake").unwrap();
        assert_eq!(rt.submodule(polymake, "Core"), Some(core));
        // Redefining returns the same module.
        assert_eq!(rt.define_module("Polymake.Core"), core);
    }

    #[test]
    fn globals_are_not_modules() {
        let rt = HeapRuntime::new();
        rt.define_global("Config", "depth", ForeignData::Int(3));
        let config = rt.submodule(rt.root_module(), "Config").unwrap();
        assert!(rt.lookup_global(config, "depth").is_some());
        assert!(rt.submodule(config, "depth").is_none());
    }

    #[test]
    fn native_error_raises_fault() {
        let rt = HeapRuntime::new();
        let f = rt.define_function("", "fail", |_, _| Err("ArgumentError: nope".to_string()));
        let result = rt.call(f, &[]);
        assert!(result.is_null());
        let exc = rt.pending_fault().unwrap();
        assert_eq!(rt.describe(exc).as_deref(), Some("ArgumentError: nope"));
    }

    #[test]
    fn calling_a_non_function_raises() {
        let rt = HeapRuntime::new();
        let v = rt.construct(ForeignData::Int(1));
        rt.call(v, &[]);
        let exc = rt.pending_fault().unwrap();
        assert!(rt.describe(exc).unwrap().contains("MethodError"));
    }

    #[test]
    fn collect_keeps_rooted_and_reachable_values() {
        let rt = HeapRuntime::new();
        let global = rt.define_global("", "kept", ForeignData::Int(1));
        let rooted = rt.construct(ForeignData::Int(2));
        let temp = rt.construct(ForeignData::Int(3));
        let inner = rt.construct(ForeignData::Int(4));
        let outer = rt.construct(ForeignData::Array(vec![inner]));
        rt.root(rooted);
        rt.root(outer);

        assert_eq!(rt.collect(), 1);
        assert!(rt.is_live(global));
        assert!(rt.is_live(rooted));
        assert!(rt.is_live(inner));
        assert!(!rt.is_live(temp));

        rt.unroot(outer);
        rt.collect();
        assert!(!rt.is_live(outer));
        assert!(!rt.is_live(inner));
    }

    #[test]
    fn applied_types_are_interned() {
        let rt = HeapRuntime::new();
        let array = rt.provide_type_family("pm::Array");
        let int = rt.provide_type_family("long");
        let a = rt.apply_type(array, &[int]);
        let b = rt.apply_type(array, &[int]);
        assert_eq!(a, b);
        assert_eq!(rt.describe(a).as_deref(), Some("pm::Array<long>"));
        assert_eq!(rt.apply_type(int, &[]), int);
    }

    #[test]
    fn apply_type_on_non_constructor_faults() {
        let rt = HeapRuntime::new();
        let v = rt.construct(ForeignData::Nothing);
        assert!(rt.apply_type(v, &[]).is_null());
        assert!(rt.pending_fault().is_some());
    }

    #[test]
    fn missing_field_faults() {
        let rt = HeapRuntime::new();
        let ty = rt.provide_type_family("BigObject");
        let obj = rt.new_instance(ty, vec![("N_VERTICES", ForeignData::Int(8))]);
        let n = rt.get_field(obj, "N_VERTICES");
        assert_eq!(rt.inspect(n), ForeignData::Int(8));
        assert!(rt.pending_fault().is_none());

        rt.get_field(obj, "VOLUME");
        assert!(rt.pending_fault().is_some());
    }

    #[test]
    fn type_of_scalars_follows_provided_families() {
        let rt = HeapRuntime::new();
        let v = rt.construct(ForeignData::Int(5));
        assert!(rt.type_of(v).is_null());
        let long = rt.provide_type_family("long");
        assert_eq!(rt.type_of(v), long);
    }
}
