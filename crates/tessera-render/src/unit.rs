//! The renderable-unit capability.
//!
//! A [`Unit`] is anything that can render itself. It returns either finished
//! text or a template plus a local context; the render protocol in
//! [`Site`](crate::Site) turns the latter into text, exposing the unit to its
//! template as `unit` so the template can reach the unit's attributes and
//! actions:
//!
//! ```jinja
//! <h2>{{ unit.name }}</h2>
//! {{ render_unit(unit, action="edit", style="BUTTON") }}
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{Object, ObjectRepr};
use minijinja::Value;

use crate::context::Context;
use crate::error::RenderError;
use crate::levels::{Levels, Style};
use crate::pass::RenderPass;
use crate::request::{Caller, Request};
use crate::site::Site;

/// Which template a unit renders with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    /// A template registered with the engine.
    Named(String),
    /// Template source compiled on the fly.
    Inline(String),
}

impl From<&str> for TemplateRef {
    fn from(name: &str) -> Self {
        TemplateRef::Named(name.to_string())
    }
}

impl From<String> for TemplateRef {
    fn from(name: String) -> Self {
        TemplateRef::Named(name)
    }
}

/// What a unit's self-render produced.
#[derive(Debug, Clone)]
pub enum Rendered {
    /// Finished output, emitted verbatim.
    Text(String),
    /// A template to render with the unit's local context.
    Template {
        template: TemplateRef,
        context: Context,
    },
    /// The request should be redirected; renders as empty output.
    Redirect(String),
}

impl Rendered {
    pub fn text(text: impl Into<String>) -> Self {
        Rendered::Text(text.into())
    }

    pub fn template(template: impl Into<TemplateRef>, context: Context) -> Self {
        Rendered::Template {
            template: template.into(),
            context,
        }
    }

    pub fn redirect(target: impl Into<String>) -> Self {
        Rendered::Redirect(target.into())
    }
}

/// Everything a unit is given when asked to render.
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    pub site: &'a Arc<Site>,
    pub pass: &'a Arc<RenderPass>,
    /// The style resolved for this unit.
    pub style: Style,
    /// A template override requested by the caller.
    pub template: Option<&'a TemplateRef>,
    /// Extra named arguments from the call site.
    pub args: &'a Context,
}

impl<'a> Invocation<'a> {
    /// The override template, or `default`.
    pub fn template_or(&self, default: impl Into<TemplateRef>) -> TemplateRef {
        match self.template {
            Some(template) => template.clone(),
            None => default.into(),
        }
    }

    pub fn request(&self) -> &'a Request {
        self.pass.request()
    }

    pub fn caller(&self) -> Caller {
        self.pass.caller()
    }

    pub fn levels(&self) -> &'a Levels {
        self.site.levels()
    }

    /// Configured name of the resolved style.
    pub fn style_name(&self) -> &'a str {
        self.site.levels().styles().name(self.style)
    }
}

/// Something that can render itself inside a template.
pub trait Unit: Send + Sync + 'static {
    /// Stable name of this unit, used for submission markers and display.
    fn identifier(&self) -> Cow<'_, str>;

    /// Produces this unit's output for one invocation.
    fn render(&self, inv: &Invocation<'_>) -> Result<Rendered, RenderError>;

    /// Name of the status required to see this unit (`None`: everyone).
    fn required_status(&self) -> Option<&str> {
        None
    }

    /// Names of the styles this unit renders (`None`: all of them).
    fn supported_styles(&self) -> Option<Vec<&str>> {
        None
    }

    /// A named attribute exposed to templates, such as a field or an action.
    fn attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        let _ = name;
        None
    }
}

/// A unit as a template value.
#[derive(Clone)]
pub struct UnitRef(pub Arc<dyn Unit>);

impl UnitRef {
    pub fn new(unit: Arc<dyn Unit>) -> Self {
        Self(unit)
    }

    pub fn unit(&self) -> &Arc<dyn Unit> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::from_object(self)
    }

    /// Extracts a unit from a template value, if it holds one.
    pub fn from_value(value: &Value) -> Option<Arc<dyn Unit>> {
        value
            .downcast_object_ref::<UnitRef>()
            .map(|unit| unit.0.clone())
    }
}

impl fmt::Debug for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnitRef").field(&self.0.identifier()).finish()
    }
}

impl Object for UnitRef {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.0.clone().attribute(key.as_str()?)
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Banner;

    impl Unit for Banner {
        fn identifier(&self) -> Cow<'_, str> {
            Cow::Borrowed("banner")
        }

        fn render(&self, _inv: &Invocation<'_>) -> Result<Rendered, RenderError> {
            Ok(Rendered::text("SALE"))
        }

        fn attribute(self: Arc<Self>, name: &str) -> Option<Value> {
            (name == "headline").then(|| Value::from("Everything must go"))
        }
    }

    #[test]
    fn unit_ref_exposes_attributes() {
        let value = UnitRef::new(Arc::new(Banner)).into_value();
        assert_eq!(
            value.get_attr("headline").unwrap().as_str(),
            Some("Everything must go")
        );
        assert!(value.get_attr("missing").unwrap().is_undefined());
        assert_eq!(value.to_string(), "banner");
    }

    #[test]
    fn unit_ref_round_trips_identity() {
        let unit: Arc<dyn Unit> = Arc::new(Banner);
        let value = UnitRef::new(unit.clone()).into_value();
        let back = UnitRef::from_value(&value).unwrap();
        assert!(Arc::ptr_eq(&unit, &back));
        assert!(UnitRef::from_value(&Value::from("banner")).is_none());
    }

    #[test]
    fn template_ref_from_str_is_named() {
        assert_eq!(TemplateRef::from("page"), TemplateRef::Named("page".into()));
    }
}
