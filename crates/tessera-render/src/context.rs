//! Template context values.
//!
//! A [`Context`] is the set of named values a template sees. Units build a
//! local context for their own template; the render protocol layers it over
//! the ambient context of the enclosing template, with local keys winning.

use std::collections::BTreeMap;

use minijinja::Value;
use serde::Serialize;

use crate::error::RenderError;

/// Named values passed to a template.
#[derive(Debug, Clone, Default)]
pub struct Context(BTreeMap<String, Value>);

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from the fields of a serializable struct or map.
    ///
    /// Values that do not serialize to a map fail with
    /// [`RenderError::Serialization`].
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, RenderError> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(Self(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from_serialize(&value)))
                    .collect(),
            )),
            serde_json::Value::Null => Ok(Self::new()),
            other => Err(RenderError::Serialization(format!(
                "expected a map of fields, got {other}"
            ))),
        }
    }

    /// Adds a value, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds a serializable value, builder style.
    pub fn with_serialize<T: Serialize>(self, key: impl Into<String>, value: &T) -> Self {
        self.with(key, Value::from_serialize(value))
    }

    /// Inserts a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Reads a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Copies every entry of `other` over this context.
    pub fn extend(&mut self, other: &Context) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Layers `local` over `self`; keys in `local` win.
    pub fn merged(&self, local: &Context) -> Context {
        let mut merged = self.clone();
        merged.extend(local);
        merged
    }

    /// Converts into a template value (a map).
    pub fn to_value(&self) -> Value {
        Value::from_iter(self.0.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Product {
        name: String,
        price: u32,
    }

    #[test]
    fn from_struct_fields() {
        let ctx = Context::from_serialize(&Product {
            name: "Lamp".into(),
            price: 12,
        })
        .unwrap();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("name").and_then(|v| v.as_str()), Some("Lamp"));
    }

    #[test]
    fn scalar_is_rejected() {
        assert!(matches!(
            Context::from_serialize(&42),
            Err(RenderError::Serialization(_))
        ));
    }

    #[test]
    fn local_wins_on_merge() {
        let ambient = Context::new().with("title", "Shop").with("lang", "en");
        let local = Context::new().with("title", "Lamp");
        let merged = ambient.merged(&local);
        assert_eq!(merged.get("title").and_then(|v| v.as_str()), Some("Lamp"));
        assert_eq!(merged.get("lang").and_then(|v| v.as_str()), Some("en"));
    }

    #[test]
    fn to_value_is_a_map() {
        let value = Context::new().with("a", 1).to_value();
        assert_eq!(value.get_attr("a").unwrap(), Value::from(1));
    }
}
