//! # Application Configuration
//!
//! Names the registered controllers and services to activate at start-up, the optional
//! error controller, and the deployment context path.
//!
//! ## Sources
//!
//! - YAML file via [`AppConfig::load`]
//! - Environment via [`AppConfig::from_env`], or layered on a file with
//!   [`AppConfig::with_env_overrides`]
//!
//! ## Environment Variables
//!
//! - `WEBFRAME_CONTEXT_PATH`: deployment prefix, e.g. `/app`
//! - `WEBFRAME_CONTROLLERS`: comma-separated controller names
//! - `WEBFRAME_SERVICES`: comma-separated service names
//! - `WEBFRAME_ERROR_HANDLER`: error controller name
//!
//! List entries are trimmed and blank entries dropped.
//!
//! ## Example
//!
//! ```yaml
//! context_path: /todo-app
//! services:
//!   - TodoListService
//! controllers:
//!   - TodoController
//! error_handler: ApplicationErrorController
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::info;

/// Start-up configuration supplied by the hosting environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub context_path: String,
    pub controllers: Vec<String>,
    pub services: Vec<String>,
    pub error_handler: Option<String>,
}

impl AppConfig {
    /// Read a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid configuration YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse configuration YAML.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or mistyped fields.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(text)?;
        Ok(config.normalized())
    }

    /// Configuration from environment variables alone.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replace each field whose environment variable is set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(context_path) = env::var("WEBFRAME_CONTEXT_PATH") {
            self.context_path = context_path;
        }
        if let Ok(controllers) = env::var("WEBFRAME_CONTROLLERS") {
            self.controllers = split_names(&controllers);
        }
        if let Ok(services) = env::var("WEBFRAME_SERVICES") {
            self.services = split_names(&services);
        }
        if let Ok(error_handler) = env::var("WEBFRAME_ERROR_HANDLER") {
            self.error_handler = Some(error_handler);
        }
        self.normalized()
    }

    /// Builder-style setters for programmatic set-up.
    #[must_use]
    pub fn with_context_path(mut self, context_path: &str) -> Self {
        self.context_path = context_path.to_string();
        self.normalized()
    }

    #[must_use]
    pub fn with_controllers(mut self, names: &[&str]) -> Self {
        self.controllers = names.iter().map(|n| (*n).to_string()).collect();
        self.normalized()
    }

    #[must_use]
    pub fn with_services(mut self, names: &[&str]) -> Self {
        self.services = names.iter().map(|n| (*n).to_string()).collect();
        self.normalized()
    }

    #[must_use]
    pub fn with_error_handler(mut self, name: &str) -> Self {
        self.error_handler = Some(name.to_string());
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        let context_path = self.context_path.trim().trim_end_matches('/');
        self.context_path = context_path.to_string();
        self.controllers = clean(self.controllers);
        self.services = clean(self.services);
        self.error_handler = self
            .error_handler
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        self
    }
}

fn clean(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn split_names(list: &str) -> Vec<String> {
    clean(list.split(',').map(str::to_string).collect())
}
