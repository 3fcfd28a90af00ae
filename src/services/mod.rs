//! # Service Registry
//!
//! Process-wide singleton services injected into controllers and into each other.
//!
//! ## Start-up
//!
//! [`ServiceRegistry::build`] runs three passes over the configured definitions:
//!
//! 1. **Instantiate** every definition once, keyed by its concrete type
//! 2. **Wire** each declared [`Inject`] point from the registry; a service is never wired
//!    to its own type and unknown dependencies are logged and left empty
//! 3. **Initialize** every service in instantiation order
//!
//! There is no dependency ordering in the third pass: `initialize` must not rely on
//! another service having been initialized first.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use webframe::services::{Inject, Service, ServiceDef, ServiceFactory, ServiceRegistry};
//!
//! #[derive(Default)]
//! struct Counter(AtomicU32);
//! impl Service for Counter {}
//!
//! #[derive(Default)]
//! struct Greeter {
//!     counter: Inject<Counter>,
//! }
//! impl Service for Greeter {}
//!
//! let defs: Vec<Arc<dyn ServiceFactory>> = vec![
//!     Arc::new(ServiceDef::new("Counter", Counter::default)),
//!     Arc::new(ServiceDef::new("Greeter", Greeter::default).require(|g| &g.counter)),
//! ];
//! let registry = ServiceRegistry::build(&defs);
//!
//! let greeter = registry.get::<Greeter>().unwrap();
//! greeter.counter.get().unwrap().0.fetch_add(1, Ordering::SeqCst);
//! assert_eq!(registry.get::<Counter>().unwrap().0.load(Ordering::SeqCst), 1);
//! ```

mod inject;
mod registry;

pub use inject::{Dependency, Inject};
pub use registry::{Service, ServiceDef, ServiceEntry, ServiceFactory, ServiceRegistry};
