//! Units built from a fixed template and fixed attributes.
//!
//! ```rust
//! use tessera_render::SimpleUnit;
//!
//! let footer = SimpleUnit::from_source("footer", "(c) {{ year }} {{ owner }}")
//!     .attr("year", 2024)
//!     .attr("owner", "Corner Shop");
//! ```
//!
//! Attributes can also be lazy: a thunk evaluated again on every render and
//! every template access, for values that change between requests.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::Value;

use crate::context::Context;
use crate::error::RenderError;
use crate::unit::{Invocation, Rendered, TemplateRef, Unit};

/// An attribute of a [`SimpleUnit`].
#[derive(Clone)]
pub enum Attr {
    Value(Value),
    Lazy(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Attr {
    pub fn value(&self) -> Value {
        match self {
            Attr::Value(value) => value.clone(),
            Attr::Lazy(thunk) => thunk(),
        }
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Attr::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// A unit with a fixed template and fixed attributes.
#[derive(Debug, Clone)]
pub struct SimpleUnit {
    name: String,
    template: TemplateRef,
    status: Option<String>,
    styles: Option<Vec<String>>,
    attrs: BTreeMap<String, Attr>,
}

impl SimpleUnit {
    /// A unit rendering the registered template `template`.
    pub fn new(name: impl Into<String>, template: impl Into<TemplateRef>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            status: None,
            styles: None,
            attrs: BTreeMap::new(),
        }
    }

    /// A unit rendering template source given inline.
    pub fn from_source(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, TemplateRef::Inline(source.into()))
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), Attr::Value(value.into()));
        self
    }

    pub fn lazy_attr<F>(mut self, key: impl Into<String>, thunk: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.attrs.insert(key.into(), Attr::Lazy(Arc::new(thunk)));
        self
    }

    /// Requires `status` to see this unit.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Restricts the styles this unit renders.
    pub fn styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styles = Some(styles.into_iter().map(Into::into).collect());
        self
    }

    fn context(&self) -> Context {
        self.attrs
            .iter()
            .map(|(key, attr)| (key.clone(), attr.value()))
            .collect()
    }
}

impl Unit for SimpleUnit {
    fn identifier(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn render(&self, inv: &Invocation<'_>) -> Result<Rendered, RenderError> {
        let mut context = self.context();
        context.extend(inv.args);
        Ok(Rendered::template(inv.template_or(self.template.clone()), context))
    }

    fn required_status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn supported_styles(&self) -> Option<Vec<&str>> {
        self.styles
            .as_ref()
            .map(|styles| styles.iter().map(String::as_str).collect())
    }

    fn attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        self.attrs.get(name).map(Attr::value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn lazy_attr_is_reevaluated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let unit = Arc::new(SimpleUnit::from_source("clock", "{{ tick }}").lazy_attr(
            "tick",
            move || Value::from(counter.fetch_add(1, Ordering::SeqCst)),
        ));

        assert_eq!(unit.clone().attribute("tick"), Some(Value::from(0)));
        assert_eq!(unit.clone().attribute("tick"), Some(Value::from(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn declarations_are_exposed() {
        let unit = SimpleUnit::new("nav", "nav.html")
            .status("USER")
            .styles(["LINK", "PAGE"]);
        assert_eq!(unit.required_status(), Some("USER"));
        assert_eq!(unit.supported_styles(), Some(vec!["LINK", "PAGE"]));
        assert_eq!(unit.identifier(), "nav");
    }
}
