//! Name to unit registry.
//!
//! Units are registered while a site is assembled, then the builder is sealed
//! into an immutable [`Registry`] that request handling only reads from.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::error::{ConfigError, RenderError};
use crate::unit::Unit;

/// Collects units before the registry is sealed.
#[derive(Default)]
pub struct RegistryBuilder {
    units: HashMap<String, Arc<dyn Unit>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateUnit`] if the name is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        unit: Arc<dyn Unit>,
    ) -> Result<&mut Self, ConfigError> {
        let name = name.into();
        if self.units.contains_key(&name) {
            return Err(ConfigError::DuplicateUnit(name));
        }
        self.units.insert(name, unit);
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Freezes the registry.
    pub fn seal(self) -> Registry {
        Registry { units: self.units }
    }
}

/// The sealed, read-only unit registry.
pub struct Registry {
    units: HashMap<String, Arc<dyn Unit>>,
}

impl Registry {
    /// Returns the unit registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Unit>, RenderError> {
        let found = self.units.get(name).cloned();
        trace!(unit = name, found = found.is_some(), "registry lookup");
        found.ok_or_else(|| RenderError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.units.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("units", &self.names())
            .finish()
    }
}
