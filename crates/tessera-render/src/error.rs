//! Error types for site setup and rendering.
//!
//! Two error types cover the two lifecycle phases:
//!
//! - [`ConfigError`]: raised while a site is being assembled (duplicate unit
//!   names, malformed level lists, template compilation). These are fatal at
//!   startup.
//! - [`RenderError`]: raised while a request is being rendered (unknown unit
//!   names, missing styles, engine failures). These surface to the caller of
//!   [`Site::render`](crate::Site::render).
//!
//! Permission failures are deliberately absent: a unit or action the caller
//! may not see renders as empty output.

use thiserror::Error;

/// Error raised while assembling a site.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A unit name was registered twice.
    #[error("unit '{0}' is already registered")]
    DuplicateUnit(String),

    /// An ordered level list was empty.
    #[error("the {0} list must contain at least one level")]
    EmptyScale(&'static str),

    /// An ordered level list named the same level twice.
    #[error("{kind} level '{name}' appears more than once")]
    DuplicateLevel {
        /// Which scale (`style` or `status`)
        kind: &'static str,
        /// The repeated name
        name: String,
    },

    /// A level name is not part of its scale.
    #[error("unknown {kind} level '{name}'")]
    UnknownLevel {
        /// Which scale (`style` or `status`)
        kind: &'static str,
        /// The unknown name
        name: String,
    },

    /// A template failed to compile or could not be registered.
    #[error("template error: {0}")]
    Template(String),

    /// Configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Parse(String),

    /// I/O error while reading configuration or templates.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A process-wide site was installed twice.
    #[error("a site is already installed for this process")]
    AlreadyInstalled,
}

/// Error raised while rendering a unit.
///
/// `RenderError` is `Clone` so that an error raised by a nested `render_unit`
/// call can be recovered intact after it crossed the template engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// No unit is registered under this name, or a unit has no such attribute.
    #[error("unit not found: {0}")]
    NotFound(String),

    /// No supported style is at or below the requested one.
    #[error("no style at or below '{requested}' is supported (supported: {supported:?})")]
    StyleUnavailable {
        /// The requested style name
        requested: String,
        /// Names of the styles the unit supports
        supported: Vec<String>,
    },

    /// A unit declared a style or status name that is not configured.
    #[error("unknown {kind} level '{name}'")]
    UnknownLevel {
        /// Which scale (`style` or `status`)
        kind: &'static str,
        /// The unknown name
        name: String,
    },

    /// A template passed something to `render_unit` that is neither a unit nor a name.
    #[error("not a unit: {0}")]
    NotAUnit(String),

    /// The template engine failed.
    #[error("template error: {0}")]
    Template(String),

    /// The template engine could not find a template.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// A value could not be converted into a template context.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A storage backend failed while a unit was reading from it.
    #[error("backend error: {0}")]
    Backend(String),

    /// Units nested deeper than the render pass allows.
    #[error("units nested more than {0} levels deep")]
    RecursionLimit(usize),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;
        use std::error::Error as _;

        // Nested render_unit calls attach the original error as a source.
        let mut source = err.source();
        while let Some(inner) = source {
            if let Some(render_err) = inner.downcast_ref::<RenderError>() {
                return render_err.clone();
            }
            source = inner.source();
        }

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(err.to_string()),
            ErrorKind::BadSerialization => RenderError::Serialization(err.to_string()),
            _ => RenderError::Template(err.to_string()),
        }
    }
}

impl RenderError {
    /// Wraps this error so it can be returned from a template function.
    pub(crate) fn into_template_error(self) -> minijinja::Error {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, self.to_string())
            .with_source(self)
    }
}

impl From<RenderError> for ConfigError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnknownLevel { kind, name } => ConfigError::UnknownLevel { kind, name },
            other => ConfigError::Template(other.to_string()),
        }
    }
}

impl From<minijinja::Error> for ConfigError {
    fn from(err: minijinja::Error) -> Self {
        ConfigError::Template(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RenderError::NotFound("menu".into());
        assert_eq!(err.to_string(), "unit not found: menu");

        let err = ConfigError::DuplicateUnit("home".into());
        assert_eq!(err.to_string(), "unit 'home' is already registered");
    }

    #[test]
    fn test_from_minijinja_template_not_found() {
        let mj_err = minijinja::Error::new(
            minijinja::ErrorKind::TemplateNotFound,
            "template 'foo' not found",
        );
        let render_err: RenderError = mj_err.into();
        assert!(matches!(render_err, RenderError::TemplateNotFound(_)));
    }

    #[test]
    fn test_nested_error_is_recovered() {
        let original = RenderError::NotFound("sidebar".into());
        let wrapped = original.clone().into_template_error();
        let recovered: RenderError = wrapped.into();
        assert_eq!(recovered, original);
    }

    #[test]
    fn test_unknown_level_maps_to_config_error() {
        let err: ConfigError = RenderError::UnknownLevel {
            kind: "style",
            name: "HUGE".into(),
        }
        .into();
        assert!(matches!(err, ConfigError::UnknownLevel { kind: "style", .. }));
    }
}
