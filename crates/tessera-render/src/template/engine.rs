//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait, the seam between the
//! render protocol and the template backend. The default implementation is
//! [`MiniJinjaEngine`], which exposes the protocol to templates as the
//! `render_unit` function.

use minijinja::{AutoEscape, Environment};
use tracing::error;

use crate::context::Context;
use crate::error::RenderError;

use super::assets::FRAMEWORK_TEMPLATES;
use super::filters::register_filters;

/// A template engine that can render templates with a context.
///
/// Template engines handle:
/// - Template compilation and caching
/// - Variable substitution and template logic
/// - Calling back into the render protocol for nested units, if supported
pub trait TemplateEngine: Send + Sync {
    /// Compiles and renders template source in one step.
    fn render_source(&self, source: &str, context: &Context) -> Result<String, RenderError>;

    /// Adds (or replaces) a named template.
    fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError>;

    /// Renders a previously registered template.
    fn render_named(&self, name: &str, context: &Context) -> Result<String, RenderError>;

    /// Checks if a template with the given name exists.
    fn has_template(&self, name: &str) -> bool;
}

/// MiniJinja-based template engine.
///
/// Every template is HTML auto-escaped except those named `*.txt`. Output of
/// `render_unit` is marked safe, so nested units are escaped exactly once.
///
/// # Example
///
/// ```rust
/// use tessera_render::template::{MiniJinjaEngine, TemplateEngine};
/// use tessera_render::Context;
///
/// let engine = MiniJinjaEngine::new();
/// let context = Context::new().with("name", "World");
/// let output = engine.render_source("Hello, {{ name }}!", &context).unwrap();
/// assert_eq!(output, "Hello, World!");
/// ```
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// Creates an engine with the framework templates, filters and the
    /// `render_unit` function registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|name| {
            if name.ends_with(".txt") {
                AutoEscape::None
            } else {
                AutoEscape::Html
            }
        });
        register_filters(&mut env);
        env.add_function("render_unit", crate::site::render_unit);

        let mut engine = Self { env };
        for (name, source) in FRAMEWORK_TEMPLATES {
            if let Err(err) = engine.add_with_stem(name, source) {
                error!(template = *name, %err, "framework template failed to compile");
            }
        }
        engine
    }

    /// Registers `source` under `name` and, if `name` has an extension, under
    /// its stem too.
    pub fn add_with_stem(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.add_template(name, source)?;
        if let Some((stem, _)) = name.rsplit_once('.') {
            if !stem.is_empty() && !stem.ends_with('/') {
                self.add_template(stem, source)?;
            }
        }
        Ok(())
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment.
    ///
    /// This allows registering custom filters or functions.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render_source(&self, source: &str, context: &Context) -> Result<String, RenderError> {
        Ok(self.env.render_str(source, context.to_value())?)
    }

    fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    fn render_named(&self, name: &str, context: &Context) -> Result<String, RenderError> {
        let tmpl = self.env.get_template(name)?;
        Ok(tmpl.render(context.to_value())?)
    }

    fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::assets::BUTTON_TEMPLATE;

    #[test]
    fn test_render_source_with_loop() {
        let engine = MiniJinjaEngine::new();
        let context = Context::new().with("items", vec!["a", "b", "c"]);
        let output = engine
            .render_source("{% for item in items %}{{ item }},{% endfor %}", &context)
            .unwrap();
        assert_eq!(output, "a,b,c,");
    }

    #[test]
    fn test_named_template_registered_with_stem() {
        let mut engine = MiniJinjaEngine::new();
        engine
            .add_with_stem("greeting.html", "Hello, {{ name }}!")
            .unwrap();
        let context = Context::new().with("name", "World");
        assert_eq!(engine.render_named("greeting", &context).unwrap(), "Hello, World!");
        assert!(engine.has_template("greeting.html"));
    }

    #[test]
    fn test_html_is_escaped() {
        let engine = MiniJinjaEngine::new();
        let context = Context::new().with("name", "<b>");
        let output = engine.render_source("{{ name }}", &context).unwrap();
        assert_eq!(output, "&lt;b&gt;");
    }

    #[test]
    fn test_framework_templates_are_registered() {
        let engine = MiniJinjaEngine::new();
        assert!(engine.has_template(BUTTON_TEMPLATE));
        assert!(engine.has_template("tessera/form.html"));
        assert!(!engine.has_template("tessera/missing"));
    }

    #[test]
    fn test_missing_template_maps_to_not_found() {
        let engine = MiniJinjaEngine::new();
        let err = engine.render_named("nope", &Context::new()).unwrap_err();
        assert!(matches!(err, RenderError::TemplateNotFound(_)));
    }

    #[test]
    fn test_syntax_error_is_template_error() {
        let engine = MiniJinjaEngine::new();
        let err = engine.render_source("{{ unclosed", &Context::new()).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }
}
