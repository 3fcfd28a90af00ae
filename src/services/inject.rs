use std::any::{Any, TypeId};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, OnceLock};

/// Write-once injection point for a singleton service.
///
/// Declared as a field on a service or controller and filled by the registry. An
/// injection point the registry cannot resolve stays empty.
pub struct Inject<T> {
    cell: OnceLock<Arc<T>>,
}

impl<T> Inject<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    #[must_use]
    pub fn is_wired(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The injected service, or an error naming the missing type.
    ///
    /// # Errors
    ///
    /// Fails when the registry never wired this injection point.
    pub fn try_get(&self) -> anyhow::Result<&T> {
        match self.cell.get() {
            Some(service) => Ok(service.as_ref()),
            None => anyhow::bail!(
                "service [{}] was not injected",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Returns `false` when the point was already wired.
    pub(crate) fn wire(&self, service: Arc<T>) -> bool {
        self.cell.set(service).is_ok()
    }
}

impl<T> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Inject<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("wired", &self.is_wired())
            .finish()
    }
}

type WireFn<O> = dyn Fn(&O, Arc<dyn Any + Send + Sync>) -> bool + Send + Sync;

/// A declared dependency of owner `O` on service type `D`, erased to `D`'s `TypeId`.
pub struct Dependency<O: ?Sized> {
    type_id: TypeId,
    type_name: &'static str,
    wire: Arc<WireFn<O>>,
}

impl<O: 'static> Dependency<O> {
    /// Dependency on `D`, written through `accessor`.
    #[must_use]
    pub fn on<D: Send + Sync + 'static>(accessor: fn(&O) -> &Inject<D>) -> Self {
        Self {
            type_id: TypeId::of::<D>(),
            type_name: std::any::type_name::<D>(),
            wire: Arc::new(move |owner: &O, service: Arc<dyn Any + Send + Sync>| {
                match service.downcast::<D>() {
                    Ok(service) => accessor(owner).wire(service),
                    Err(_) => false,
                }
            }),
        }
    }

    /// Same dependency over a type-erased owner.
    pub(crate) fn erase(self) -> Dependency<dyn Any + Send> {
        let wire = self.wire;
        Dependency {
            type_id: self.type_id,
            type_name: self.type_name,
            wire: Arc::new(
                move |owner: &(dyn Any + Send), service: Arc<dyn Any + Send + Sync>| {
                    owner
                        .downcast_ref::<O>()
                        .is_some_and(|owner| wire(owner, service))
                },
            ),
        }
    }
}

impl<O: ?Sized> Dependency<O> {
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn wire(&self, owner: &O, service: Arc<dyn Any + Send + Sync>) -> bool {
        (self.wire)(owner, service)
    }
}

impl<O: ?Sized> Clone for Dependency<O> {
    fn clone(&self) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            wire: Arc::clone(&self.wire),
        }
    }
}

impl<O: ?Sized> Debug for Dependency<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency")
            .field("type_name", &self.type_name)
            .finish()
    }
}
