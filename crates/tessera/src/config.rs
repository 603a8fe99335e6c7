//! Site configuration files.
//!
//! A site's levels and templates can be described in YAML:
//!
//! ```yaml
//! statuses: [PUBLIC, HUMAN, USER, EDITOR, STAFF, ADMINISTRATOR]
//! styles: [TEXT, LINK, BUTTON, CELL, ROW, PAGE]
//! default_style: PAGE
//! templates:
//!   page: "<main>{{ render_unit('home') }}</main>"
//! template_dirs: [templates]
//! ```
//!
//! Both level lists are ordered lowest first. `default_style` falls back to
//! the highest style. Files under `template_dirs` (`.jinja`, `.j2`, `.html`,
//! `.txt`) are registered by relative path both with and without extension;
//! inline `templates` override them.
//!
//! Units are code, not configuration: register them on the builder returned
//! by [`SiteConfig::builder`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tessera_render::template::walk_template_dir;
use tessera_render::{ConfigError, Levels, Site, SiteBuilder};
use tracing::debug;

/// Deserialized site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Status names, lowest first.
    pub statuses: Vec<String>,
    /// Style names, lowest first.
    pub styles: Vec<String>,
    #[serde(default)]
    pub default_style: Option<String>,
    /// Inline templates by name.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    /// Directories to load template files from.
    #[serde(default)]
    pub template_dirs: Vec<PathBuf>,
}

impl SiteConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads a YAML file. Relative `template_dirs` resolve against the file's
    /// directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_yaml_str(&fs::read_to_string(path)?)?;
        if let Some(base) = path.parent() {
            for dir in &mut config.template_dirs {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        Ok(config)
    }

    /// Validates both level lists.
    pub fn levels(&self) -> Result<Levels, ConfigError> {
        Levels::new(&self.statuses, &self.styles)
    }

    /// A site builder with these levels and templates, ready for units.
    pub fn builder(&self) -> Result<SiteBuilder, ConfigError> {
        let mut builder = Site::builder(self.levels()?);
        if let Some(style) = &self.default_style {
            builder = builder.default_style(style);
        }

        for dir in &self.template_dirs {
            let files = walk_template_dir(dir)?;
            debug!(dir = %dir.display(), files = files.len(), "loading templates");
            for file in files.iter().rev() {
                let source = file.read()?;
                builder = builder
                    .template(&file.name_with_ext, source.clone())
                    .template(&file.name, source);
            }
        }

        for (name, source) in &self.templates {
            builder = builder.template(name, source);
        }
        Ok(builder)
    }
}
