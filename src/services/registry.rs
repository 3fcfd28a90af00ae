use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::inject::{Dependency, Inject};
use crate::error::panic_message;

/// Lifecycle hooks of a process-wide singleton.
///
/// Services are shared by every request thread, so any mutable state must be guarded
/// by the service itself (atomics or locks).
pub trait Service: Send + Sync + 'static {
    /// Called once after every service has been instantiated and wired.
    ///
    /// Runs in registration order. Other services may not have been initialized yet.
    fn initialize(&self) {}

    /// Called once at teardown.
    fn shutdown(&self) {}
}

/// Registration record for one service type.
pub struct ServiceDef<S> {
    name: String,
    factory: Box<dyn Fn() -> S + Send + Sync>,
    dependencies: Vec<Dependency<S>>,
}

impl<S: Service> ServiceDef<S> {
    pub fn new(name: &str, factory: impl Fn() -> S + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            factory: Box::new(factory),
            dependencies: Vec::new(),
        }
    }

    /// Declare an injection point for service `D`.
    #[must_use]
    pub fn require<D: Send + Sync + 'static>(mut self, accessor: fn(&S) -> &Inject<D>) -> Self {
        self.dependencies.push(Dependency::on(accessor));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Type-erased [`ServiceDef`] held by the application catalog.
pub trait ServiceFactory: Send + Sync {
    fn name(&self) -> &str;
    fn service_type(&self) -> TypeId;
    fn service_type_name(&self) -> &'static str;
    fn instantiate(&self) -> ServiceEntry;
    /// Wire the declared dependencies of `entry` from `registry`; returns the wired count.
    fn wire(&self, entry: &ServiceEntry, registry: &ServiceRegistry) -> usize;
}

impl<S: Service> ServiceFactory for ServiceDef<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn service_type(&self) -> TypeId {
        TypeId::of::<S>()
    }

    fn service_type_name(&self) -> &'static str {
        std::any::type_name::<S>()
    }

    fn instantiate(&self) -> ServiceEntry {
        let instance: Arc<S> = Arc::new((self.factory)());
        let service: Arc<dyn Service> = Arc::clone(&instance) as Arc<dyn Service>;
        ServiceEntry {
            name: self.name.clone(),
            type_id: TypeId::of::<S>(),
            type_name: std::any::type_name::<S>(),
            instance,
            service,
        }
    }

    fn wire(&self, entry: &ServiceEntry, registry: &ServiceRegistry) -> usize {
        let Some(owner) = Arc::clone(&entry.instance).downcast::<S>().ok() else {
            warn!(service = %self.name, "Service entry does not hold its declared type");
            return 0;
        };
        registry.wire_dependencies(&self.name, Some(TypeId::of::<S>()), &*owner, &self.dependencies)
    }
}

/// One live singleton.
#[derive(Clone)]
pub struct ServiceEntry {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    instance: Arc<dyn Any + Send + Sync>,
    service: Arc<dyn Service>,
}

impl ServiceEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Debug for ServiceEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Singleton services keyed by concrete type.
///
/// Built once before any dispatch and read-only afterwards.
#[derive(Default)]
pub struct ServiceRegistry {
    entries: Vec<ServiceEntry>,
    by_type: HashMap<TypeId, usize>,
    shut_down: AtomicBool,
}

impl ServiceRegistry {
    /// Empty registry; every injection point resolves to nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Instantiate, wire and initialize `defs` in order.
    ///
    /// A second definition of an already registered type is skipped. A hook that panics
    /// is logged: a panicking factory leaves its service out of the registry, a panic
    /// while wiring or initializing leaves the service registered as it is.
    #[must_use]
    pub fn build(defs: &[Arc<dyn ServiceFactory>]) -> Self {
        let mut registry = Self::default();
        let mut factories: Vec<&Arc<dyn ServiceFactory>> = Vec::with_capacity(defs.len());

        // S1: instantiate
        for def in defs {
            if registry.by_type.contains_key(&def.service_type()) {
                warn!(
                    service = %def.name(),
                    service_type = def.service_type_name(),
                    "Service type already registered, skipping"
                );
                continue;
            }
            info!(service = %def.name(), service_type = def.service_type_name(), "S1: Instantiating service");
            let entry = match catch_unwind(AssertUnwindSafe(|| def.instantiate())) {
                Ok(entry) => entry,
                Err(panic) => {
                    error!(
                        service = %def.name(),
                        panic = %panic_message(panic.as_ref()),
                        "S1: Service factory panicked, service skipped"
                    );
                    continue;
                }
            };
            registry.by_type.insert(entry.type_id, registry.entries.len());
            registry.entries.push(entry);
            factories.push(def);
        }

        // S2: wire
        for (def, entry) in factories.iter().zip(registry.entries.iter()) {
            match catch_unwind(AssertUnwindSafe(|| def.wire(entry, &registry))) {
                Ok(wired) => debug!(service = %entry.name, wired, "S2: Service dependencies wired"),
                Err(panic) => error!(
                    service = %entry.name,
                    panic = %panic_message(panic.as_ref()),
                    "S2: Wiring panicked"
                ),
            }
        }

        // S3: initialize
        for entry in &registry.entries {
            info!(service = %entry.name, "S3: Initializing service");
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| entry.service.initialize())) {
                error!(
                    service = %entry.name,
                    panic = %panic_message(panic.as_ref()),
                    "S3: Service initialize panicked"
                );
            }
        }

        info!(count = registry.entries.len(), "Service registry ready");
        registry
    }

    /// Look up the singleton of type `T`.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.get_any(TypeId::of::<T>())?.downcast::<T>().ok()
    }

    pub(crate) fn get_any(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.by_type
            .get(&type_id)
            .and_then(|index| self.entries.get(*index))
            .map(|entry| Arc::clone(&entry.instance))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.iter()
    }

    /// Resolve each dependency of `owner` against the registry.
    ///
    /// A dependency on the owner's own type is never wired. Unresolved dependencies
    /// are logged and skipped, leaving the injection point empty.
    pub(crate) fn wire_dependencies<O: ?Sized>(
        &self,
        owner_name: &str,
        owner_type: Option<TypeId>,
        owner: &O,
        dependencies: &[Dependency<O>],
    ) -> usize {
        let mut wired = 0;
        for dependency in dependencies {
            if owner_type == Some(dependency.type_id()) {
                warn!(
                    owner = %owner_name,
                    dependency = dependency.type_name(),
                    "Service cannot depend on itself, injection skipped"
                );
                continue;
            }
            match self.get_any(dependency.type_id()) {
                Some(service) => {
                    if dependency.wire(owner, service) {
                        wired += 1;
                    } else {
                        debug!(
                            owner = %owner_name,
                            dependency = dependency.type_name(),
                            "Injection point already wired"
                        );
                    }
                }
                None => warn!(
                    owner = %owner_name,
                    dependency = dependency.type_name(),
                    "Required service is not registered, injection skipped"
                ),
            }
        }
        wired
    }

    /// Call every service's `shutdown` once, in registry order.
    ///
    /// Later calls do nothing. A panicking `shutdown` is logged and the remaining
    /// services are still shut down.
    pub fn shutdown_all(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            debug!("Service registry already shut down");
            return;
        }
        for entry in &self.entries {
            info!(service = %entry.name, "Shutting down service");
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| entry.service.shutdown())) {
                error!(
                    service = %entry.name,
                    panic = %panic_message(panic.as_ref()),
                    "Service shutdown panicked"
                );
            }
        }
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl Debug for ServiceRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("entries", &self.entries)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
