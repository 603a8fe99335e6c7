//! The two-phase action protocol.
//!
//! A bound action renders in one of three parts:
//!
//! | Part       | Idle               | Triggered / executed |
//! |------------|--------------------|----------------------|
//! | `button`   | trigger            | trigger, `active`    |
//! | `result`   | nothing            | outcome              |
//! | combined   | trigger            | outcome              |
//!
//! An action is triggered when the request carries its submission marker
//! (`"{unit identifier}-{action name}"`) as a query parameter or form field.
//! The behavior runs the first time a `result` or combined part renders in a
//! triggered request, and never again in that request: every later render of
//! the same marker shows the stored outcome.
//!
//! ```jinja
//! {# the trigger stays in the toolbar, the outcome shows under the table #}
//! <div class="toolbar">{{ render_unit(unit.export.button) }}</div>
//! <table>...</table>
//! {{ render_unit(unit.export.result) }}
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use deunicode::deunicode;
use tessera_render::template::FAILURE_TEMPLATE;
use tessera_render::{
    permits_declared, Begin, Context, ExecutionOutcome, Invocation, RenderError, Rendered,
    Submission, Unit, UnitRef, Value,
};
use tracing::{debug, warn};

use crate::action::{Action, ActionCall, ActionSet};

/// Which view of an action is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    /// Trigger while idle, outcome once triggered.
    Combined,
    /// Always the trigger.
    Button,
    /// The outcome, or nothing while idle.
    Result,
}

/// Turns a unit identifier into the lowercase ASCII slug used in markers.
pub fn slug(identifier: &str) -> String {
    let mut slug = String::with_capacity(identifier.len());
    for c in deunicode(identifier).to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Submission marker of action `name` on the unit `identifier`.
///
/// Markers are only as distinct as the slugs of the identifiers: `"Café"` and
/// `"cafe"` share every marker, and an identifier with no ASCII letters or
/// digits slugs to nothing, giving `"-{name}"`. Units rendered in the same
/// request need identifiers that stay distinct once slugged.
pub fn marker(identifier: &str, name: &str) -> String {
    format!("{}-{}", slug(identifier), name)
}

/// An action bound to the unit that owns it.
pub struct BoundAction<T> {
    owner: Arc<T>,
    action: Action<T>,
    part: Part,
}

impl<T: Unit> BoundAction<T> {
    pub fn new(owner: Arc<T>, action: Action<T>) -> Self {
        Self {
            owner,
            action,
            part: Part::Combined,
        }
    }

    pub fn part(&self) -> Part {
        self.part
    }

    pub fn action(&self) -> &Action<T> {
        &self.action
    }

    pub fn marker(&self) -> String {
        marker(&self.owner.identifier(), &self.action.name)
    }

    fn with_part(&self, part: Part) -> Self {
        Self {
            owner: self.owner.clone(),
            action: self.action.clone(),
            part,
        }
    }

    // Runs the behavior unless it already ran (or is running) in this pass.
    fn run_once(
        &self,
        inv: &Invocation<'_>,
        marker: &str,
        submission: Submission,
    ) -> Option<ExecutionOutcome> {
        let status = self.action.status.as_deref();
        if !permits_declared(inv.levels().statuses(), inv.caller().status, status) {
            debug!(marker, "caller lost permission before execution");
            return None;
        }

        match inv.pass.begin(marker) {
            Begin::Done(outcome) => Some(outcome),
            Begin::Running => {
                debug!(marker, "action rendered from inside its own behavior");
                None
            }
            Begin::Start => {
                debug!(marker, ?submission, "executing action");
                let call = ActionCall {
                    name: &self.action.name,
                    marker,
                    submission,
                    data: match submission {
                        Submission::Form => Some(&inv.request().form),
                        Submission::Query => None,
                    },
                    inv: *inv,
                };
                let outcome = match (self.action.behavior)(&*self.owner, &call) {
                    Ok(rendered) => ExecutionOutcome::Succeeded(rendered),
                    Err(err) => {
                        warn!(marker, error = %format!("{err:#}"), "action failed");
                        ExecutionOutcome::Failed {
                            message: err.to_string(),
                        }
                    }
                };
                inv.pass.finish(marker, outcome.clone());
                Some(outcome)
            }
        }
    }

    fn button(&self, inv: &Invocation<'_>, marker: &str, active: bool) -> Rendered {
        let href = format!("{}?{}", inv.request().path, marker);
        Rendered::template(
            inv.template_or(self.action.button_template.clone()),
            Context::new()
                .with("href", href)
                .with("label", self.action.label.as_str())
                .with("active", active)
                .with("marker", marker)
                .with("name", self.action.name.as_str()),
        )
    }
}

fn outcome_output(outcome: Option<ExecutionOutcome>) -> Rendered {
    match outcome {
        Some(ExecutionOutcome::Succeeded(rendered)) => rendered,
        Some(ExecutionOutcome::Failed { message }) => Rendered::template(
            FAILURE_TEMPLATE,
            Context::new().with("message", message),
        ),
        None => Rendered::text(""),
    }
}

impl<T: Unit> Unit for BoundAction<T> {
    fn identifier(&self) -> Cow<'_, str> {
        Cow::Owned(self.marker())
    }

    fn render(&self, inv: &Invocation<'_>) -> Result<Rendered, RenderError> {
        let marker = self.marker();
        let submission = inv.request().submission(&marker);
        let triggered = submission.is_some();

        let rendered = match (self.part, submission) {
            (Part::Button, _) => self.button(inv, &marker, triggered),
            (Part::Combined, None) => self.button(inv, &marker, false),
            (Part::Result, None) => Rendered::text(""),
            (Part::Result | Part::Combined, Some(submission)) => {
                outcome_output(self.run_once(inv, &marker, submission))
            }
        };
        Ok(rendered)
    }

    fn required_status(&self) -> Option<&str> {
        self.action.status.as_deref()
    }

    fn attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        match name {
            "button" => Some(UnitRef::new(Arc::new(self.with_part(Part::Button))).into_value()),
            "result" => Some(UnitRef::new(Arc::new(self.with_part(Part::Result))).into_value()),
            "label" => Some(Value::from(self.action.label.as_str())),
            "name" => Some(Value::from(self.action.name.as_str())),
            "marker" => Some(Value::from(self.marker())),
            _ => self.owner.clone().attribute(name),
        }
    }
}

impl<T: Unit> fmt::Debug for BoundAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction")
            .field("marker", &self.marker())
            .field("part", &self.part)
            .finish()
    }
}

impl<T: Unit> ActionSet<T> {
    /// Binds the action called `name` to `owner`, as a template value.
    ///
    /// Use it from [`Unit::attribute`] (or `Templated::extra_attribute`) so
    /// templates reach `unit.<name>`, `unit.<name>.button` and
    /// `unit.<name>.result`.
    pub fn bind(&self, owner: &Arc<T>, name: &str) -> Option<Value> {
        let action = self.get(name)?.clone();
        Some(UnitRef::new(Arc::new(BoundAction::new(owner.clone(), action))).into_value())
    }
}
