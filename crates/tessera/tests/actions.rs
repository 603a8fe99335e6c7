//! Integration tests for the two-phase action protocol.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use tessera::prelude::*;
use tessera::ExecutionOutcome;

// ============================================================================
// Test fixtures
// ============================================================================

#[derive(Serialize)]
struct Cart {
    items: Vec<String>,
    #[serde(skip)]
    actions: ActionSet<Cart>,
}

impl Templated for Cart {
    const TEMPLATE: &'static str = "cart";

    fn unit_id(&self) -> String {
        "cart".to_string()
    }

    fn extra_attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        self.actions.bind(&self, name)
    }
}

// Button, result twice, then the combined view.
const CART: &str = "{{ render_unit(unit.empty.button) }}|{{ render_unit(unit.empty.result) }}|{{ render_unit(unit.empty.result) }}|{{ render_unit(unit, action='empty') }}";

fn levels() -> Levels {
    Levels::new(
        ["PUBLIC", "USER", "STAFF", "ADMINISTRATOR"],
        ["TEXT", "LINK", "BUTTON", "CELL", "PAGE"],
    )
    .unwrap()
}

fn cart_site(action: Action<Cart>) -> Arc<Site> {
    let cart = Cart {
        items: vec!["lamp".into(), "desk".into()],
        actions: ActionSet::new().with(action),
    };
    Site::builder(levels())
        .template("cart", CART)
        .register("cart", Arc::new(cart))
        .unwrap()
        .build()
        .unwrap()
}

fn counting_empty(calls: &Arc<AtomicUsize>) -> Action<Cart> {
    let calls = calls.clone();
    Action::new("empty", move |cart: &Cart, _call| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Rendered::text(format!("Removed {} items", cart.items.len())))
    })
}

fn caller(levels: &Levels, status: &str) -> Caller {
    let status = levels.status(status).unwrap();
    Caller::new(status, status)
}

const BUTTON: &str = r#"<a class="button" href="shop?cart-empty">Empty</a>"#;
const ACTIVE_BUTTON: &str = r#"<a class="button active" href="shop?cart-empty">Empty</a>"#;

// ============================================================================
// Idle and triggered
// ============================================================================

#[test]
fn test_idle_shows_trigger_and_no_result() {
    let calls = Arc::new(AtomicUsize::new(0));
    let site = cart_site(counting_empty(&calls));

    let pass = site.start(Request::get("shop"), Caller::anonymous());
    let html = site.render(&pass, "cart", RenderOptions::new()).unwrap();

    assert_eq!(html, format!("{BUTTON}|||{BUTTON}"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_triggered_executes_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let site = cart_site(counting_empty(&calls));

    let request = Request::get("shop").with_query("cart-empty", "");
    let pass = site.start(request, Caller::anonymous());
    let html = site.render(&pass, "cart", RenderOptions::new()).unwrap();

    let outcome = "Removed 2 items";
    assert_eq!(
        html,
        format!("{ACTIVE_BUTTON}|{outcome}|{outcome}|{outcome}")
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(pass.has_executed("cart-empty"));
}

#[test]
fn test_second_render_in_same_pass_reuses_outcome() {
    let calls = Arc::new(AtomicUsize::new(0));
    let site = cart_site(counting_empty(&calls));

    let request = Request::get("shop").with_query("cart-empty", "");
    let pass = site.start(request, Caller::anonymous());
    let first = site.render(&pass, "cart", RenderOptions::new()).unwrap();
    let second = site.render(&pass, "cart", RenderOptions::new()).unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_new_request_executes_again() {
    let calls = Arc::new(AtomicUsize::new(0));
    let site = cart_site(counting_empty(&calls));

    for _ in 0..2 {
        let request = Request::get("shop").with_query("cart-empty", "");
        let pass = site.start(request, Caller::anonymous());
        site.render(&pass, "cart", RenderOptions::new()).unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_form_submission_receives_data() {
    let action = Action::new("empty", |_cart: &Cart, call| {
        let reason = call.field("reason").unwrap_or("none");
        Ok(Rendered::text(format!("form={} reason={reason}", call.is_form())))
    });
    let site = cart_site(action);

    let request = Request::post("shop")
        .with_form("cart-empty", "")
        .with_form("reason", "moving");
    let pass = site.start(request, Caller::anonymous());
    let html = site
        .render(&pass, "cart", RenderOptions::new().action("empty"))
        .unwrap();
    assert_eq!(html, "form=true reason=moving");

    // The same field in the query of a GET is a plain trigger.
    let request = Request::get("shop").with_query("cart-empty", "");
    let pass = site.start(request, Caller::anonymous());
    let html = site
        .render(&pass, "cart", RenderOptions::new().action("empty"))
        .unwrap();
    assert_eq!(html, "form=false reason=none");
}

// ============================================================================
// Gating
// ============================================================================

#[test]
fn test_action_above_caller_status_is_omitted() {
    let calls = Arc::new(AtomicUsize::new(0));
    let site = cart_site(counting_empty(&calls).status("STAFF"));
    let user = caller(site.levels(), "USER");

    let request = Request::get("shop").with_query("cart-empty", "");
    let pass = site.start(request, user);
    let html = site.render(&pass, "cart", RenderOptions::new()).unwrap();

    assert_eq!(html, "|||");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_action_at_caller_status_is_shown() {
    let calls = Arc::new(AtomicUsize::new(0));
    let site = cart_site(counting_empty(&calls).status("STAFF"));
    let admin = caller(site.levels(), "ADMINISTRATOR");

    let pass = site.start(Request::get("shop"), admin);
    let html = site.render(&pass, "cart", RenderOptions::new()).unwrap();
    assert_eq!(html, format!("{BUTTON}|||{BUTTON}"));
}

#[test]
fn test_visible_actions_follow_declaration_order() {
    let noop = |_: &Cart, _: &ActionCall<'_>| -> anyhow::Result<Rendered> { Ok(Rendered::text("")) };
    let actions: ActionSet<Cart> = ActionSet::new()
        .with(Action::new("view", noop))
        .with(Action::new("refund", noop).status("STAFF"))
        .with(Action::new("save", noop).status("USER"));
    let levels = levels();

    let names = |status: &str| -> Vec<String> {
        actions
            .visible(&levels, caller(&levels, status))
            .into_iter()
            .map(|action| action.name().to_string())
            .collect()
    };
    assert_eq!(names("PUBLIC"), vec!["view"]);
    assert_eq!(names("USER"), vec!["view", "save"]);
    assert_eq!(names("STAFF"), vec!["view", "refund", "save"]);
}

// ============================================================================
// Failures and redirects
// ============================================================================

#[test]
fn test_failing_behavior_renders_failure_and_page_completes() {
    let action = Action::new("empty", |_: &Cart, _call| Err(anyhow!("payment gateway down")));
    let site = cart_site(action);

    let request = Request::get("shop").with_query("cart-empty", "");
    let pass = site.start(request, Caller::anonymous());
    let html = site.render(&pass, "cart", RenderOptions::new()).unwrap();

    let failure = r#"<div class="failure">payment gateway down</div>"#;
    assert_eq!(
        html,
        format!("{ACTIVE_BUTTON}|{failure}|{failure}|{failure}")
    );
    assert!(matches!(
        pass.outcome("cart-empty"),
        Some(ExecutionOutcome::Failed { .. })
    ));
}

#[test]
fn test_redirect_outcome_is_recorded() {
    let action = Action::new("empty", |_: &Cart, _call| Ok(Rendered::redirect("/cart")));
    let site = cart_site(action);

    let request = Request::get("shop").with_query("cart-empty", "");
    let pass = site.start(request, Caller::anonymous());
    let html = site
        .render(&pass, "cart", RenderOptions::new().action("empty"))
        .unwrap();

    assert_eq!(html, "");
    assert_eq!(pass.redirect().as_deref(), Some("/cart"));
}

#[test]
fn test_button_markup() {
    let calls = Arc::new(AtomicUsize::new(0));
    let site = cart_site(counting_empty(&calls).label("Empty the cart"));

    let pass = site.start(Request::get("shop"), Caller::anonymous());
    let html = site
        .render(&pass, "cart", RenderOptions::new().action("empty"))
        .unwrap();
    insta::assert_snapshot!(html, @r#"<a class="button" href="shop?cart-empty">Empty the cart</a>"#);
}
