//! Switching the caller's status.
//!
//! A caller entitled to a high status usually acts at a lower one and
//! elevates only when needed. [`StatusSwitch`] shows the current status and a
//! `change` action whose form lists every status up to the caller's maximum.
//! The chosen status is saved in the session under
//! [`STATUS_SESSION_KEY`] and applies to the rest of the request.

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use serde::Serialize;
use tessera_render::template::STATUS_TEMPLATE;
use tessera_render::{
    Context, Invocation, Level, RenderError, Rendered, TemplateRef, Unit, Value, STATUS_SESSION_KEY,
};
use tracing::debug;

use crate::action::{Action, ActionSet};

const SWITCH_TEMPLATE: &str =
    r#"<span class="status">{{ caller.status }}</span>{{ render_unit(unit, action="change") }}"#;

#[derive(Serialize)]
struct Choice<'a> {
    name: &'a str,
    rank: usize,
    selected: bool,
}

/// Shows the caller's status and lets them change it.
pub struct StatusSwitch {
    identifier: String,
    redirect: String,
    actions: ActionSet<StatusSwitch>,
}

impl StatusSwitch {
    pub fn new() -> Self {
        Self {
            identifier: "status".to_string(),
            redirect: ".".to_string(),
            actions: ActionSet::new().with(change_action().label("Change status")),
        }
    }

    /// Identifier used in the switch's submission marker.
    pub fn named(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Where to go once the status changed.
    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect = target.into();
        self
    }
}

impl Default for StatusSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl Unit for StatusSwitch {
    fn identifier(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.identifier)
    }

    fn render(&self, inv: &Invocation<'_>) -> Result<Rendered, RenderError> {
        Ok(Rendered::template(
            inv.template_or(TemplateRef::Inline(SWITCH_TEMPLATE.to_string())),
            inv.args.clone(),
        ))
    }

    fn attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        self.actions.bind(&self, name)
    }
}

fn change_action() -> Action<StatusSwitch> {
    Action::new("change", |switch: &StatusSwitch, call| {
        let levels = call.levels();
        let caller = call.caller();

        let Some(data) = call.data else {
            let choices: Vec<Choice<'_>> = levels
                .status_choices(caller.max_status)
                .into_iter()
                .map(|(status, name)| Choice {
                    name,
                    rank: status.rank(),
                    selected: status == caller.status,
                })
                .collect();
            return Ok(Rendered::template(
                STATUS_TEMPLATE,
                Context::new()
                    .with_serialize("choices", &choices)
                    .with("submitter", call.marker)
                    .with("submit_label", "Change"),
            ));
        };

        let name = data
            .get("status")
            .ok_or_else(|| anyhow!("No status was chosen."))?;
        let status = levels
            .statuses()
            .get(name)
            .ok_or_else(|| anyhow!("Unknown status {name}."))?;
        if status > caller.max_status {
            bail!("You may not switch to {name}.");
        }

        call.request()
            .session
            .insert(STATUS_SESSION_KEY, name.clone());
        call.pass().elevate(status);
        debug!(status = %name, "caller switched status");
        Ok(Rendered::redirect(switch.redirect.clone()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let switch = Arc::new(StatusSwitch::new());
        assert_eq!(Unit::identifier(&*switch), "status");
        assert!(switch.clone().attribute("change").is_some());
        assert!(switch.attribute("other").is_none());
    }

    #[test]
    fn test_builder() {
        let switch = StatusSwitch::new().named("toolbar").redirect_to("/home");
        assert_eq!(Unit::identifier(&switch), "toolbar");
        assert_eq!(switch.redirect, "/home");
        assert_eq!(
            switch.actions.get("change").map(Action::label_text),
            Some("Change status")
        );
    }
}
