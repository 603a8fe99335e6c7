//! Types that render through a template named at the type level.
//!
//! Implementing [`Templated`] for a serializable type makes it a [`Unit`]: its
//! serialized fields become the template context and the type's `TEMPLATE`
//! constant names the template.
//!
//! ```rust
//! use serde::Serialize;
//! use tessera_render::Templated;
//!
//! #[derive(Serialize)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! impl Templated for Greeting {
//!     const TEMPLATE: &'static str = "greeting.html";
//!
//!     fn unit_id(&self) -> String {
//!         format!("greeting-{}", self.name)
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use minijinja::Value;
use serde::Serialize;

use crate::context::Context;
use crate::error::RenderError;
use crate::unit::{Invocation, Rendered, Unit};

/// A serializable type rendered by a fixed, named template.
pub trait Templated: Serialize + Send + Sync + 'static {
    /// Name of the template every value of this type renders with.
    const TEMPLATE: &'static str;

    /// Name of the status required to see values of this type.
    const STATUS: Option<&'static str> = None;

    /// Names of the styles this type renders; `None` supports all styles.
    const STYLES: Option<&'static [&'static str]> = None;

    /// Identifier of this value, used for submission markers.
    fn unit_id(&self) -> String;

    /// Attributes beyond the serialized fields, typically bound actions.
    fn extra_attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        let _ = name;
        None
    }
}

impl<T: Templated> Unit for T {
    fn identifier(&self) -> Cow<'_, str> {
        Cow::Owned(self.unit_id())
    }

    fn render(&self, inv: &Invocation<'_>) -> Result<Rendered, RenderError> {
        let mut context = Context::from_serialize(self)?;
        context.extend(inv.args);
        Ok(Rendered::template(inv.template_or(T::TEMPLATE), context))
    }

    fn required_status(&self) -> Option<&str> {
        T::STATUS
    }

    fn supported_styles(&self) -> Option<Vec<&str>> {
        T::STYLES.map(<[&str]>::to_vec)
    }

    fn attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        if let Some(value) = T::extra_attribute(self.clone(), name) {
            return Some(value);
        }
        Value::from_serialize(&*self)
            .get_attr(name)
            .ok()
            .filter(|value| !value.is_undefined())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Product {
        sku: String,
        price: u32,
    }

    impl Templated for Product {
        const TEMPLATE: &'static str = "product.html";
        const STYLES: Option<&'static [&'static str]> = Some(&["TEXT", "PAGE"]);

        fn unit_id(&self) -> String {
            format!("product-{}", self.sku)
        }

        fn extra_attribute(self: Arc<Self>, name: &str) -> Option<Value> {
            (name == "on_sale").then(|| Value::from(self.price < 10))
        }
    }

    #[test]
    fn fields_become_attributes() {
        let product = Arc::new(Product {
            sku: "lamp".into(),
            price: 8,
        });
        assert_eq!(product.identifier(), "product-lamp");
        assert_eq!(product.clone().attribute("price"), Some(Value::from(8)));
        assert_eq!(product.clone().attribute("on_sale"), Some(Value::from(true)));
        assert_eq!(product.clone().attribute("colour"), None);
    }

    #[test]
    fn type_level_declarations() {
        let product = Product {
            sku: "lamp".into(),
            price: 8,
        };
        assert_eq!(product.supported_styles(), Some(vec!["TEXT", "PAGE"]));
        assert_eq!(Unit::required_status(&product), None);
    }
}
