//! Action declaration.
//!
//! An [`Action`] is a behavior bound to a unit type under a name, with a
//! required status and a label:
//!
//! ```rust
//! use tessera_dispatch::Action;
//! use tessera_render::Rendered;
//!
//! struct Cart {
//!     items: usize,
//! }
//!
//! let empty = Action::new("empty_cart", |cart: &Cart, _call| {
//!     Ok(Rendered::text(format!("Removed {} items", cart.items)))
//! })
//! .status("USER");
//!
//! assert_eq!(empty.label_text(), "Empty Cart");
//! ```
//!
//! Behaviors return `anyhow::Result<Rendered>`. An `Err` does not abort the
//! page; it becomes a failed outcome rendered in place of the result.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tessera_render::template::{humanize, BUTTON_TEMPLATE};
use tessera_render::{
    Caller, Context, Gated, Invocation, Levels, RenderPass, Rendered, Request, Site, Submission,
    TemplateRef,
};

/// The function run when an action is triggered.
pub type Behavior<T> = Arc<dyn Fn(&T, &ActionCall<'_>) -> anyhow::Result<Rendered> + Send + Sync>;

/// A named behavior on units of type `T`.
pub struct Action<T> {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) status: Option<String>,
    pub(crate) button_template: TemplateRef,
    pub(crate) behavior: Behavior<T>,
}

impl<T> Action<T> {
    /// Declares an action. By default it requires the lowest status and is
    /// labelled after its name (`add_to_cart` becomes `Add To Cart`).
    pub fn new<F>(name: impl Into<String>, behavior: F) -> Self
    where
        F: Fn(&T, &ActionCall<'_>) -> anyhow::Result<Rendered> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            label: humanize(&name),
            name,
            status: None,
            button_template: TemplateRef::from(BUTTON_TEMPLATE),
            behavior: Arc::new(behavior),
        }
    }

    /// Requires `status` to see and run this action.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Same as [`status`](Self::status), for optional requirements.
    pub fn maybe_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Template used for the trigger.
    pub fn template(mut self, template: impl Into<TemplateRef>) -> Self {
        self.button_template = template.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label_text(&self) -> &str {
        &self.label
    }
}

impl<T> Clone for Action<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            label: self.label.clone(),
            status: self.status.clone(),
            button_template: self.button_template.clone(),
            behavior: self.behavior.clone(),
        }
    }
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl<T> Gated for Action<T> {
    fn required_status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

/// What a behavior is given when it runs.
pub struct ActionCall<'a> {
    /// Name of the action.
    pub name: &'a str,
    /// Submission marker of this action on this unit.
    pub marker: &'a str,
    /// How the action was triggered.
    pub submission: Submission,
    /// Submitted form fields, when triggered by a form; `None` when triggered
    /// by following the button.
    pub data: Option<&'a BTreeMap<String, String>>,
    pub(crate) inv: Invocation<'a>,
}

impl<'a> ActionCall<'a> {
    pub fn request(&self) -> &'a Request {
        self.inv.request()
    }

    pub fn caller(&self) -> Caller {
        self.inv.caller()
    }

    pub fn pass(&self) -> &'a Arc<RenderPass> {
        self.inv.pass
    }

    pub fn site(&self) -> &'a Arc<Site> {
        self.inv.site
    }

    pub fn levels(&self) -> &'a Levels {
        self.inv.levels()
    }

    /// Extra arguments given where the action was rendered.
    pub fn args(&self) -> &'a Context {
        self.inv.args
    }

    /// Reads a submitted form field.
    pub fn field(&self, name: &str) -> Option<&'a str> {
        self.data?.get(name).map(String::as_str)
    }

    pub fn is_form(&self) -> bool {
        self.submission == Submission::Form
    }
}

/// An ordered set of actions on units of type `T`.
pub struct ActionSet<T> {
    actions: Vec<Action<T>>,
}

impl<T> ActionSet<T> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Adds an action, builder style. A later action replaces an earlier one
    /// with the same name.
    pub fn with(mut self, action: Action<T>) -> Self {
        self.push(action);
        self
    }

    pub fn push(&mut self, action: Action<T>) {
        self.actions.retain(|existing| existing.name != action.name);
        self.actions.push(action);
    }

    pub fn get(&self, name: &str) -> Option<&Action<T>> {
        self.actions.iter().find(|action| action.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action<T>> {
        self.actions.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|action| action.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The actions a caller at `caller`'s status may see, in declaration order.
    pub fn visible(&self, levels: &Levels, caller: Caller) -> Vec<&Action<T>> {
        tessera_render::filter_actions(levels.statuses(), &self.actions, caller.status)
    }
}

impl<T> Default for ActionSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ActionSet<T> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
        }
    }
}

impl<T> fmt::Debug for ActionSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_render::Status;

    struct Shelf;

    fn noop(_: &Shelf, _: &ActionCall<'_>) -> anyhow::Result<Rendered> {
        Ok(Rendered::text(""))
    }

    #[test]
    fn test_default_label_and_status() {
        let action = Action::new("restock_shelf", noop);
        assert_eq!(action.label_text(), "Restock Shelf");
        assert_eq!(action.required_status(), None);
        assert_eq!(action.button_template, TemplateRef::from(BUTTON_TEMPLATE));
    }

    #[test]
    fn test_builder_overrides() {
        let action = Action::new("restock", noop)
            .status("STAFF")
            .label("Order more")
            .template("shelf/button.html");
        assert_eq!(action.label_text(), "Order more");
        assert_eq!(action.required_status(), Some("STAFF"));
        assert_eq!(action.button_template, TemplateRef::from("shelf/button.html"));
    }

    #[test]
    fn test_action_set_replaces_by_name() {
        let set = ActionSet::new()
            .with(Action::new("edit", noop))
            .with(Action::new("delete", noop))
            .with(Action::new("edit", noop).label("Change"));
        assert_eq!(set.names(), vec!["delete", "edit"]);
        assert_eq!(set.get("edit").map(Action::label_text), Some("Change"));
    }

    #[test]
    fn test_visible_filters_by_status() {
        let levels = Levels::new(["PUBLIC", "USER", "STAFF"], ["PAGE"]).unwrap();
        let set = ActionSet::new()
            .with(Action::new("view", noop))
            .with(Action::new("edit", noop).status("STAFF"))
            .with(Action::new("comment", noop).status("USER"));

        let user = levels.status("USER").unwrap();
        let visible: Vec<&str> = set
            .visible(&levels, Caller::new(user, user))
            .into_iter()
            .map(Action::name)
            .collect();
        assert_eq!(visible, vec!["view", "comment"]);

        let anonymous = set.visible(&levels, Caller::new(Status::LOWEST, Status::LOWEST));
        assert_eq!(anonymous.len(), 1);
    }
}
