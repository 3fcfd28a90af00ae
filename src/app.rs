//! # Application Start-up
//!
//! [`Application`] is the catalog of every controller and service the host program
//! knows about. [`Application::start`] activates the subset an [`AppConfig`] names and
//! returns the running [`WebApp`].
//!
//! ## Start-up order
//!
//! 1. Configured services are instantiated, wired and initialized
//!    ([`ServiceRegistry::build`])
//! 2. Configured controllers are validated and routed in configuration order, which is
//!    also the route matching order
//! 3. The error controller, if any, is routed last
//!
//! Start-up never fails as a whole. Unknown names and controllers that fail validation
//! are logged and skipped, so one bad declaration does not take the others down.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::descriptor::{ControllerDef, ControllerDefinition};
use crate::dispatcher::WebApp;
use crate::services::{Service, ServiceDef, ServiceFactory, ServiceRegistry};

/// Named controller and service declarations available to [`Application::start`].
#[derive(Default)]
pub struct Application {
    services: Vec<Arc<dyn ServiceFactory>>,
    controllers: Vec<Arc<dyn ControllerDefinition>>,
}

impl Application {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a service available under its definition name.
    #[must_use]
    pub fn service<S: Service>(mut self, def: ServiceDef<S>) -> Self {
        self.services.push(Arc::new(def));
        self
    }

    /// Make a controller available under its definition name.
    #[must_use]
    pub fn controller<C: Send + 'static>(mut self, def: ControllerDef<C>) -> Self {
        self.controllers.push(Arc::new(def));
        self
    }

    #[must_use]
    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn controller_names(&self) -> Vec<&str> {
        self.controllers.iter().map(|c| c.name()).collect()
    }

    fn find_service(&self, name: &str) -> Option<&Arc<dyn ServiceFactory>> {
        self.services.iter().find(|s| s.name() == name)
    }

    fn find_controller(&self, name: &str) -> Option<&Arc<dyn ControllerDefinition>> {
        self.controllers.iter().find(|c| c.name() == name)
    }

    /// Build the running application for `config`.
    #[must_use]
    pub fn start(&self, config: &AppConfig) -> WebApp {
        info!(
            services = config.services.len(),
            controllers = config.controllers.len(),
            context_path = %config.context_path,
            "Starting application"
        );

        let selected: Vec<Arc<dyn ServiceFactory>> = config
            .services
            .iter()
            .filter_map(|name| {
                let found = self.find_service(name).map(Arc::clone);
                if found.is_none() {
                    warn!(service = %name, "Unknown service in configuration, skipped");
                }
                found
            })
            .collect();
        let registry = ServiceRegistry::build(&selected);

        let mut app = WebApp::new(registry).with_context_path(&config.context_path);

        for name in &config.controllers {
            let Some(def) = self.find_controller(name) else {
                warn!(controller = %name, "Unknown controller in configuration, skipped");
                continue;
            };
            if let Err(e) = app.register_controller(def.as_ref()) {
                error!(controller = %name, error = %e, "Controller rejected");
            }
        }

        match config.error_handler.as_deref() {
            Some(name) => match self.find_controller(name) {
                Some(def) => {
                    if let Err(e) = app.register_error_controller(def.as_ref()) {
                        error!(controller = %name, error = %e, "Error controller rejected");
                    }
                }
                None => warn!(controller = %name, "Unknown error controller, skipped"),
            },
            None => info!("No controller available for error handling"),
        }

        info!(
            routes = app.routes().len(),
            services = app.services().len(),
            "Application started"
        );
        app
    }
}
