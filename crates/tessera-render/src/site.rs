//! Site assembly and the render protocol.
//!
//! A [`Site`] bundles the configured [`Levels`], the sealed [`Registry`] and a
//! template engine. Rendering a unit goes through the same steps whether it is
//! started from Rust with [`Site::render`] or from a template with
//! `render_unit(...)`:
//!
//! 1. `action="name"` swaps the unit for its attribute of that name.
//! 2. A caller whose status is too low gets empty output.
//! 3. The requested style is resolved against the unit's supported styles.
//! 4. The unit renders itself.
//! 5. Text is kept verbatim; a template is rendered with the enclosing
//!    context, overlaid by the unit's local context, plus `unit` and `style`.
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera_render::{Caller, Levels, RenderOptions, Request, Site, SimpleUnit};
//!
//! let levels = Levels::new(["PUBLIC", "STAFF"], ["TEXT", "PAGE"]).unwrap();
//! let site = Site::builder(levels)
//!     .register("greeting", Arc::new(SimpleUnit::from_source("greeting", "Hi {{ who }}")))
//!     .unwrap()
//!     .register("page", Arc::new(SimpleUnit::from_source(
//!         "page",
//!         "<p>{{ render_unit('greeting', who='there') }}</p>",
//!     )))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let pass = site.start(Request::get("/"), Caller::anonymous());
//! let html = site.render(&pass, "page", RenderOptions::new()).unwrap();
//! assert_eq!(html, "<p>Hi there</p>");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{Kwargs, Object};
use minijinja::{ErrorKind, State, Value};
use serde_json::json;
use tracing::debug;

use crate::context::Context;
use crate::error::{ConfigError, RenderError};
use crate::gate::permits;
use crate::levels::{Level, Levels, Style};
use crate::pass::RenderPass;
use crate::registry::{Registry, RegistryBuilder};
use crate::request::{Caller, Request};
use crate::resolve::resolve_declared;
use crate::template::{MiniJinjaEngine, TemplateEngine};
use crate::unit::{Invocation, Rendered, TemplateRef, Unit, UnitRef};

/// Context key under which a template sees the unit being rendered.
pub const UNIT_KEY: &str = "unit";
/// Context key holding the resolved style name of the unit being rendered.
pub const STYLE_KEY: &str = "style";
/// `action` value selecting the unit's own render.
pub const SELF_ACTION: &str = "self";

const FRAME_KEY: &str = "__tessera";

/// What to render: a registered name or a unit held directly.
#[derive(Clone)]
pub enum Target {
    Name(String),
    Unit(Arc<dyn Unit>),
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Name(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Name(name)
    }
}

impl From<Arc<dyn Unit>> for Target {
    fn from(unit: Arc<dyn Unit>) -> Self {
        Target::Unit(unit)
    }
}

/// Options of one render call, mirroring the `render_unit` keyword arguments.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Requested style name; `None` uses the site default.
    pub style: Option<String>,
    /// Attribute to render instead of the unit itself.
    pub action: Option<String>,
    /// Template override handed to the unit.
    pub template: Option<TemplateRef>,
    /// Extra named arguments handed to the unit.
    pub args: Context,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn template(mut self, template: impl Into<TemplateRef>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key, value);
        self
    }
}

/// A sealed site: levels, units and templates.
pub struct Site {
    levels: Levels,
    registry: Registry,
    engine: Box<dyn TemplateEngine>,
    default_style: Style,
}

impl Site {
    pub fn builder(levels: Levels) -> SiteBuilder {
        SiteBuilder::new(levels)
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn engine(&self) -> &dyn TemplateEngine {
        self.engine.as_ref()
    }

    /// The style requested when a caller names none.
    pub fn default_style(&self) -> Style {
        self.default_style
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Unit>, RenderError> {
        self.registry.lookup(name)
    }

    /// Starts the render pass of one request.
    pub fn start(&self, request: Request, caller: Caller) -> Arc<RenderPass> {
        RenderPass::new(request, caller)
    }

    /// Renders a unit at the top of a page.
    pub fn render(
        self: &Arc<Self>,
        pass: &Arc<RenderPass>,
        target: impl Into<Target>,
        options: RenderOptions,
    ) -> Result<String, RenderError> {
        let unit = match target.into() {
            Target::Name(name) => self.lookup(&name)?,
            Target::Unit(unit) => unit,
        };
        let ambient = self.ambient(pass);
        self.render_in(pass, &ambient, unit, &options)
    }

    /// Renders a template that is not a unit, such as a page layout.
    ///
    /// The template may call `render_unit`.
    pub fn render_template(
        self: &Arc<Self>,
        pass: &Arc<RenderPass>,
        template: impl Into<TemplateRef>,
        context: Context,
    ) -> Result<String, RenderError> {
        let context = self.ambient(pass).merged(&context);
        self.render_framed(pass, &template.into(), context)
    }

    /// The context every top-level render starts from.
    ///
    /// - `styles`, `statuses`: maps of level name to rank
    /// - `caller`: current and maximum status, by name and rank
    /// - `request`: method, path and query parameters
    pub fn ambient(&self, pass: &RenderPass) -> Context {
        let statuses = self.levels.statuses();
        let styles = self.levels.styles();
        let caller = pass.caller();
        let request = pass.request();

        Context::new()
            .with_serialize(
                "styles",
                &styles
                    .iter()
                    .map(|(style, name)| (name, Level::rank(style)))
                    .collect::<BTreeMap<_, _>>(),
            )
            .with_serialize(
                "statuses",
                &statuses
                    .iter()
                    .map(|(status, name)| (name, Level::rank(status)))
                    .collect::<BTreeMap<_, _>>(),
            )
            .with_serialize(
                "caller",
                &json!({
                    "status": statuses.name(caller.status),
                    "status_rank": Level::rank(caller.status),
                    "max_status": statuses.name(caller.max_status),
                    "max_status_rank": Level::rank(caller.max_status),
                }),
            )
            .with_serialize(
                "request",
                &json!({
                    "method": request.method,
                    "path": request.path,
                    "query": request.query,
                }),
            )
    }

    pub(crate) fn render_in(
        self: &Arc<Self>,
        pass: &Arc<RenderPass>,
        ambient: &Context,
        unit: Arc<dyn Unit>,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        let _depth = pass.enter()?;

        let unit = match options.action.as_deref() {
            None | Some(SELF_ACTION) => unit,
            Some(action) => {
                // The owner's requirement guards all of its actions.
                if !self.permitted(pass, &unit)? {
                    return Ok(String::new());
                }
                let value = unit.clone().attribute(action).ok_or_else(|| {
                    RenderError::NotFound(format!("{}.{}", unit.identifier(), action))
                })?;
                UnitRef::from_value(&value).ok_or_else(|| {
                    RenderError::NotAUnit(format!("{}.{}", unit.identifier(), action))
                })?
            }
        };

        if !self.permitted(pass, &unit)? {
            return Ok(String::new());
        }

        let requested = match options.style.as_deref() {
            Some(name) => self.levels.style(name)?,
            None => self.default_style,
        };
        let declared = unit.supported_styles();
        let style = resolve_declared(self.levels.styles(), requested, declared.as_deref())?;
        if style != requested {
            debug!(
                unit = %unit.identifier(),
                requested = self.levels.styles().name(requested),
                resolved = self.levels.styles().name(style),
                "style fallback"
            );
        }

        let inv = Invocation {
            site: self,
            pass,
            style,
            template: options.template.as_ref(),
            args: &options.args,
        };
        let rendered = unit.render(&inv)?;
        self.normalize(pass, ambient, &unit, style, rendered)
    }

    fn permitted(&self, pass: &RenderPass, unit: &Arc<dyn Unit>) -> Result<bool, RenderError> {
        let Some(required) = unit.required_status() else {
            return Ok(true);
        };
        let required = self.levels.status(required)?;
        let caller = pass.caller();
        if permits(caller.status, required) {
            return Ok(true);
        }
        debug!(
            unit = %unit.identifier(),
            status = self.levels.statuses().name(caller.status),
            required = self.levels.statuses().name(required),
            "status too low, rendering nothing"
        );
        Ok(false)
    }

    fn normalize(
        self: &Arc<Self>,
        pass: &Arc<RenderPass>,
        ambient: &Context,
        unit: &Arc<dyn Unit>,
        style: Style,
        rendered: Rendered,
    ) -> Result<String, RenderError> {
        match rendered {
            Rendered::Text(text) => Ok(text),
            Rendered::Redirect(target) => {
                debug!(unit = %unit.identifier(), %target, "redirect requested");
                pass.request_redirect(target);
                Ok(String::new())
            }
            Rendered::Template { template, context } => {
                let mut context = ambient.merged(&context);
                context.insert(UNIT_KEY, UnitRef::new(unit.clone()).into_value());
                context.insert(STYLE_KEY, self.levels.styles().name(style));
                self.render_framed(pass, &template, context)
            }
        }
    }

    fn render_framed(
        self: &Arc<Self>,
        pass: &Arc<RenderPass>,
        template: &TemplateRef,
        mut context: Context,
    ) -> Result<String, RenderError> {
        let frame = Frame {
            site: self.clone(),
            pass: pass.clone(),
            ambient: Arc::new(context.clone()),
        };
        context.insert(FRAME_KEY, Value::from_object(frame));
        match template {
            TemplateRef::Named(name) => self.engine.render_named(name, &context),
            TemplateRef::Inline(source) => self.engine.render_source(source, &context),
        }
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("levels", &self.levels)
            .field("registry", &self.registry)
            .field("default_style", &self.default_style)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Site`].
pub struct SiteBuilder {
    levels: Levels,
    registry: RegistryBuilder,
    engine: Box<dyn TemplateEngine>,
    templates: Vec<(String, String)>,
    default_style: Option<String>,
}

impl SiteBuilder {
    pub fn new(levels: Levels) -> Self {
        Self {
            levels,
            registry: RegistryBuilder::new(),
            engine: Box::new(MiniJinjaEngine::new()),
            templates: Vec::new(),
            default_style: None,
        }
    }

    /// Registers a unit under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateUnit`] if the name is taken.
    pub fn register(
        mut self,
        name: impl Into<String>,
        unit: Arc<dyn Unit>,
    ) -> Result<Self, ConfigError> {
        self.registry.register(name, unit)?;
        Ok(self)
    }

    /// Adds a named template. Later templates replace earlier ones.
    pub fn template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.push((name.into(), source.into()));
        self
    }

    /// Sets the style requested when a caller names none.
    pub fn default_style(mut self, style: impl Into<String>) -> Self {
        self.default_style = Some(style.into());
        self
    }

    /// Replaces the template engine.
    pub fn engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Compiles the templates and seals the registry.
    pub fn build(self) -> Result<Arc<Site>, ConfigError> {
        let SiteBuilder {
            levels,
            registry,
            mut engine,
            templates,
            default_style,
        } = self;

        let default_style = match default_style {
            Some(name) => levels.style(&name)?,
            None => levels.styles().max(),
        };

        for (name, source) in &templates {
            engine
                .add_template(name, source)
                .map_err(|err| ConfigError::Template(format!("{name}: {err}")))?;
        }

        let registry = registry.seal();
        debug!(units = registry.len(), templates = templates.len(), "site sealed");

        Ok(Arc::new(Site {
            levels,
            registry,
            engine,
            default_style,
        }))
    }
}

impl fmt::Debug for SiteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteBuilder")
            .field("levels", &self.levels)
            .field("templates", &self.templates.len())
            .field("default_style", &self.default_style)
            .finish_non_exhaustive()
    }
}

// Carried through every template render so `render_unit` can reach the site,
// the request pass and the enclosing context.
struct Frame {
    site: Arc<Site>,
    pass: Arc<RenderPass>,
    ambient: Arc<Context>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame").finish_non_exhaustive()
    }
}

impl Object for Frame {}

/// The `render_unit(target, style=, action=, template=, **extra)` template function.
pub(crate) fn render_unit(
    state: &State,
    target: Value,
    kwargs: Kwargs,
) -> Result<Value, minijinja::Error> {
    let frame_value = state.lookup(FRAME_KEY).ok_or_else(|| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            "render_unit can only be used inside a site render",
        )
    })?;
    let frame = frame_value.downcast_object_ref::<Frame>().ok_or_else(|| {
        minijinja::Error::new(ErrorKind::InvalidOperation, "render frame was overwritten")
    })?;

    let options = options_from_kwargs(frame.site.levels(), &kwargs)?;
    kwargs.assert_all_used()?;

    let unit = match target.as_str() {
        Some(name) => frame.site.lookup(name),
        None => UnitRef::from_value(&target).ok_or_else(|| RenderError::NotAUnit(target.to_string())),
    }
    .map_err(RenderError::into_template_error)?;

    let html = frame
        .site
        .render_in(&frame.pass, &frame.ambient, unit, &options)
        .map_err(RenderError::into_template_error)?;
    Ok(Value::from_safe_string(html))
}

fn options_from_kwargs(levels: &Levels, kwargs: &Kwargs) -> Result<RenderOptions, minijinja::Error> {
    let mut options = RenderOptions::new();
    let keys: Vec<String> = kwargs.args().map(str::to_string).collect();

    for key in keys {
        let value: Value = kwargs.get(&key)?;
        if value.is_none() || value.is_undefined() {
            continue;
        }
        match key.as_str() {
            "style" => options.style = Some(style_name(levels, &value)?),
            "action" => options.action = Some(value.to_string()),
            "template" => options.template = Some(TemplateRef::Named(value.to_string())),
            _ => options.args.insert(key, value),
        }
    }
    Ok(options)
}

// Styles may be passed by name or by rank.
fn style_name(levels: &Levels, value: &Value) -> Result<String, minijinja::Error> {
    if let Some(name) = value.as_str() {
        return Ok(name.to_string());
    }
    let rank = usize::try_from(value.clone()).map_err(|_| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("style must be a name or a rank, got {value}"),
        )
    })?;
    levels
        .styles()
        .at(rank)
        .map(|style| levels.styles().name(style).to_string())
        .ok_or_else(|| {
            RenderError::UnknownLevel {
                kind: "style",
                name: rank.to_string(),
            }
            .into_template_error()
        })
}
