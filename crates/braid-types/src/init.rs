//! One-time registration of the type catalog.
//!
//! Runs inside the bridge's initialization phase. Families are registered
//! in dependency order first. Then every instance of every family is
//! registered shallowest first, so each parameter type exists before the
//! containers built over it, whatever family it belongs to. A family or
//! instance that fails is recorded and logged, and registration carries on
//! with its siblings. The bridge opens for calls once the pass is over.

use std::collections::BTreeMap;
use std::fmt;

use braid_bridge::Bridge;
use braid_core::HostType;

use crate::direct::DirectCalls;
use crate::error::{Result, TypeError};
use crate::families::catalog;
use crate::fingerprint::Fingerprint;
use crate::manifest::RegistrationConfig;
use crate::order::registration_order;
use crate::registry::TypeRegistry;
use crate::template::ParametricTypeTemplate;

/// What a registration failure was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureLevel {
    /// A whole family; none of its types were registered.
    Family,
    /// A single instantiation.
    Instance,
    /// A direct-call binding.
    DirectCall,
}

/// One isolated registration failure.
#[derive(Debug)]
pub struct RegistrationFailure {
    pub level: FailureLevel,
    /// Family name, instance expression, or direct-call name.
    pub subject: String,
    pub error: TypeError,
}

impl RegistrationFailure {
    pub(crate) fn record(level: FailureLevel, subject: &str, error: TypeError) -> Self {
        tracing::warn!(?level, subject, %error, "registration failed");
        RegistrationFailure {
            level,
            subject: subject.to_string(),
            error,
        }
    }
}

impl fmt::Display for RegistrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.error)
    }
}

/// Outcome of [`initialize`].
#[derive(Debug)]
pub struct RegistrationReport {
    /// Families in the order they were attempted.
    pub order: Vec<String>,
    /// Families registered successfully.
    pub registered: Vec<String>,
    /// Families left out by configuration.
    pub skipped: Vec<String>,
    pub failures: Vec<RegistrationFailure>,
    /// Direct calls that failed to bind, once folded in with
    /// [`RegistrationReport::include_direct_calls`].
    pub unbound_calls: Vec<String>,
    pub fingerprint: Fingerprint,
}

impl RegistrationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Families that failed as a whole.
    pub fn failed_families(&self) -> impl Iterator<Item = &str> {
        self.failures
            .iter()
            .filter(|f| f.level == FailureLevel::Family)
            .map(|f| f.subject.as_str())
    }

    /// Fold the outcome of [`register_direct_calls`](crate::register_direct_calls)
    /// into the report, so calls that failed to bind change the fingerprint.
    pub fn include_direct_calls(&mut self, registry: &TypeRegistry, calls: &DirectCalls) {
        self.unbound_calls = calls.failures().iter().map(|f| f.subject.clone()).collect();
        self.unbound_calls.sort();
        let fingerprint = Fingerprint::compute(
            registry.types(),
            self.failed_families(),
            self.unbound_calls.iter().map(String::as_str),
        );
        self.fingerprint = fingerprint;
    }
}

/// Register the catalog with the foreign runtime behind `bridge`.
///
/// Fails only if the bridge is already initialized or initializing; every
/// per-family and per-instance failure lands in the report instead.
pub fn initialize(bridge: &Bridge, config: &RegistrationConfig) -> Result<(TypeRegistry, RegistrationReport)> {
    let guard = bridge.begin_initialization()?;
    let mut failures = Vec::new();

    let all = catalog();
    for name in &config.disabled {
        if !all.iter().any(|t| &t.family == name) {
            tracing::warn!(family = %name, "disabled family is not in the catalog");
        }
    }
    let mut skipped = Vec::new();
    let templates: Vec<ParametricTypeTemplate> = all
        .iter()
        .filter(|t| {
            let keep = !config.is_disabled(&t.family);
            if !keep {
                skipped.push(t.family.clone());
            }
            keep
        })
        .cloned()
        .collect();

    let mut pending = Vec::new();
    for template in &templates {
        for expr in &template.instances {
            match HostType::parse(expr) {
                Ok(ty) => pending.push(PendingInstance {
                    ty,
                    owner: template.family.clone(),
                    configured: false,
                }),
                Err(e) => failures.push(RegistrationFailure::record(FailureLevel::Instance, expr, e.into())),
            }
        }
    }
    for ty in &config.instances {
        match owner_of(&all, ty) {
            Some(owner) if config.is_disabled(&owner.family) => {
                let error = TypeError::FamilyUnavailable {
                    family: owner.family.clone(),
                    detail: "disabled by configuration".to_string(),
                };
                failures.push(RegistrationFailure::record(FailureLevel::Instance, &ty.to_string(), error));
            }
            Some(owner) => pending.push(PendingInstance {
                ty: ty.clone(),
                owner: owner.family.clone(),
                configured: true,
            }),
            None => {
                let error = TypeError::UnknownFamily {
                    name: ty.name().to_string(),
                };
                failures.push(RegistrationFailure::record(FailureLevel::Instance, &ty.to_string(), error));
            }
        }
    }

    let ordering = registration_order(&templates);
    for family in &ordering.cyclic {
        let error = TypeError::DependencyCycle {
            families: ordering.cyclic.clone(),
        };
        failures.push(RegistrationFailure::record(FailureLevel::Family, family, error));
    }

    let by_name: BTreeMap<&str, _> = templates.iter().map(|t| (t.family.as_str(), t)).collect();
    let mut registry = TypeRegistry::new();
    let mut registered = Vec::new();

    for name in &ordering.order {
        let Some(template) = by_name.get(name.as_str()) else {
            continue;
        };
        match registry.register_family(bridge, template) {
            Ok(()) => registered.push(name.clone()),
            Err(error) => failures.push(RegistrationFailure::record(FailureLevel::Family, name, error)),
        }
    }

    // A parameter is always shallower than the type it appears in.
    pending.sort_by(|a, b| a.ty.depth().cmp(&b.ty.depth()).then_with(|| a.ty.cmp(&b.ty)));
    for instance in &pending {
        if !registered.contains(&instance.owner) {
            // Catalog instances of a failed family are covered by its failure.
            if instance.configured {
                let error = TypeError::FamilyUnavailable {
                    family: instance.owner.clone(),
                    detail: "family is not registered".to_string(),
                };
                failures.push(RegistrationFailure::record(FailureLevel::Instance, &instance.ty.to_string(), error));
            }
            continue;
        }
        if let Err(error) = registry.instantiate(bridge, &instance.ty) {
            failures.push(RegistrationFailure::record(FailureLevel::Instance, &instance.ty.to_string(), error));
        }
    }

    guard.complete();

    let failed: Vec<&str> = failures
        .iter()
        .filter(|f| f.level == FailureLevel::Family)
        .map(|f| f.subject.as_str())
        .collect();
    let fingerprint = Fingerprint::compute(registry.types(), failed, std::iter::empty::<&str>());
    tracing::debug!(
        families = registered.len(),
        types = registry.len(),
        failures = failures.len(),
        fingerprint = fingerprint.short(),
        "type registration finished"
    );

    let report = RegistrationReport {
        order: ordering.order,
        registered,
        skipped,
        failures,
        unbound_calls: Vec::new(),
        fingerprint,
    };
    Ok((registry, report))
}

struct PendingInstance {
    ty: HostType,
    /// Template whose registration (and version gate) the instance depends on.
    owner: String,
    /// Requested in configuration rather than by the catalog.
    configured: bool,
}

/// The template an instantiation belongs to: an extension that claims it,
/// otherwise the family it instantiates.
fn owner_of<'a>(templates: &'a [ParametricTypeTemplate], ty: &HostType) -> Option<&'a ParametricTypeTemplate> {
    templates
        .iter()
        .find(|t| t.claims(ty))
        .or_else(|| templates.iter().find(|t| t.extends.is_none() && t.family == ty.name()))
}
