//! A small shop rendered with tessera.
//!
//! Each run renders one simulated request and prints the HTML. Actions are
//! followed with `--trigger MARKER` and their forms submitted with
//! `--submit MARKER --field key=value`:
//!
//! ```text
//! tessera-shop --status USER
//! tessera-shop --trigger currency-switch
//! tessera-shop --submit currency-switch --field currency=USD
//! tessera-shop --status STAFF --submit catalogue-create --field name=Stool --field price=20
//! tessera-shop --max-status STAFF --submit status-change --field status=STAFF
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::Parser;
use serde_json::json;
use tessera::prelude::*;
use tessera::{MemoryStore, TemplateRef};
use tracing::debug;

/// Render the demo shop for one simulated request
#[derive(Parser)]
#[command(name = "tessera-shop")]
#[command(version)]
struct Cli {
    /// Unit to render instead of the whole page
    #[arg(value_name = "UNIT")]
    unit: Option<String>,

    /// Status to act at
    #[arg(long, default_value = "PUBLIC")]
    status: String,

    /// Highest status the caller may switch to (defaults to --status)
    #[arg(long, value_name = "STATUS")]
    max_status: Option<String>,

    /// Style to render the unit at
    #[arg(long)]
    style: Option<String>,

    /// Follow an action's trigger
    #[arg(long, value_name = "MARKER", conflicts_with = "submit")]
    trigger: Option<String>,

    /// Submit an action's form
    #[arg(long, value_name = "MARKER")]
    submit: Option<String>,

    /// Form field sent with --submit
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_pair)]
    fields: Vec<(String, String)>,

    /// Query parameter
    #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_pair)]
    query: Vec<(String, String)>,

    /// Request path
    #[arg(long, default_value = "/shop")]
    path: String,

    /// Log filter, such as `tessera_dispatch=debug`
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

impl Cli {
    fn request(&self) -> Request {
        let mut request = match &self.submit {
            Some(marker) => Request::post(self.path.as_str()).with_form(marker.as_str(), ""),
            None => Request::get(self.path.as_str()),
        };
        if let Some(marker) = &self.trigger {
            request = request.with_query(marker.as_str(), "");
        }
        for (key, value) in &self.query {
            request = request.with_query(key.as_str(), value.as_str());
        }
        for (key, value) in &self.fields {
            request = request.with_form(key.as_str(), value.as_str());
        }
        request
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

// ============================================================================
// Site
// ============================================================================

const STATUSES: &[&str] = &["PUBLIC", "USER", "STAFF", "ADMINISTRATOR"];
const STYLES: &[&str] = &["TEXT", "LINK", "BUTTON", "CELL", "PAGE"];

const CURRENCIES: &[&str] = &["EUR", "USD", "GBP"];
const CURRENCY_KEY: &str = "currency";

const PAGE: &str = r#"<header>{{ render_unit('status') }} {{ render_unit('currency') }}</header>
<main>
{{ render_unit('home') }}
{{ render_unit('catalogue') }}
</main>"#;

const HOME: &str = r#"<h1>{{ title }}</h1>
{%- if caller.status_rank >= statuses.STAFF %}
<p class="notice">Staff tools are enabled.</p>
{%- endif %}"#;

const CURRENCY: &str =
    r#"<span class="currency">{{ currency }}</span> {{ render_unit(unit.switch) }}"#;

const CURRENCY_FORM: &str = r#"<form method="post" action="">
<select name="currency">
{%- for code in currencies %}
<option{% if code == currency %} selected{% endif %}>{{ code }}</option>
{%- endfor %}
</select>
<button type="submit" name="{{ submitter }}">Switch</button>
</form>"#;

const PRODUCT: &str = r#"{% if style == 'PAGE' -%}
<article class="product"><h2>{{ name }}</h2><p>{{ price }}</p></article>
{%- else -%}
<span class="product">{{ name }} ({{ price }})</span>
{%- endif %} {{ render_unit(unit, action="edit") }}{{ render_unit(unit, action="delete") }}"#;

/// Shows the session's currency and switches it.
struct CurrencyPicker {
    actions: ActionSet<CurrencyPicker>,
}

fn current_currency(request: &Request) -> String {
    request
        .session
        .get(CURRENCY_KEY)
        .unwrap_or_else(|| CURRENCIES[0].to_string())
}

impl CurrencyPicker {
    fn new() -> Self {
        let switch = Action::new("switch", |_: &CurrencyPicker, call| {
            let current = current_currency(call.request());
            let Some(code) = call.field(CURRENCY_KEY) else {
                return Ok(Rendered::template(
                    TemplateRef::Inline(CURRENCY_FORM.to_string()),
                    Context::new()
                        .with("currency", current)
                        .with_serialize("currencies", &CURRENCIES)
                        .with("submitter", call.marker),
                ));
            };
            if !CURRENCIES.contains(&code) {
                bail!("{code} is not accepted here.");
            }
            call.request().session.insert(CURRENCY_KEY, code.to_string());
            debug!(from = %current, to = code, "currency switched");
            Ok(Rendered::redirect("."))
        })
        .label("Change currency");

        Self {
            actions: ActionSet::new().with(switch),
        }
    }
}

impl Unit for CurrencyPicker {
    fn identifier(&self) -> Cow<'_, str> {
        Cow::Borrowed("currency")
    }

    fn render(&self, inv: &Invocation<'_>) -> Result<Rendered, RenderError> {
        Ok(Rendered::template(
            inv.template_or("shop/currency"),
            Context::new().with("currency", current_currency(inv.request())),
        ))
    }

    fn attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        self.actions.bind(&self, name)
    }
}

fn catalogue() -> anyhow::Result<Collection<MemoryStore>> {
    let store = MemoryStore::new()
        .with(json!({"name": "Desk lamp", "price": "24.00"}))?
        .with(json!({"name": "Oak desk", "price": "310.00"}))?
        .with(json!({"name": "Task chair", "price": "145.00"}))?
        .with(json!({"name": "Bookshelf", "price": "89.00"}))?;

    Ok(Collection::new("catalogue", store)
        .field(Field::new("name"))
        .field(Field::new("price"))
        .action_status("STAFF")
        .item_style("CELL")
        .page_size(3)
        .record_template("shop/product"))
}

fn build_site() -> anyhow::Result<Arc<Site>> {
    let levels = Levels::new(STATUSES.iter().copied(), STYLES.iter().copied())?;
    let home = SimpleUnit::new("home", "shop/home").attr("title", "The Corner Shop");

    let site = Site::builder(levels)
        .template("page", PAGE)
        .template("shop/home", HOME)
        .template("shop/currency", CURRENCY)
        .template("shop/product", PRODUCT)
        .register("home", Arc::new(home))?
        .register("currency", Arc::new(CurrencyPicker::new()))?
        .register("catalogue", Arc::new(catalogue()?))?
        .register("status", Arc::new(StatusSwitch::new()))?
        .build()?;
    Ok(site)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tessera::logging::init(cli.log.as_deref())?;

    let site = build_site().context("building the shop")?;
    let levels = site.levels();
    let status = levels.status(&cli.status)?;
    let max_status = match &cli.max_status {
        Some(name) => levels.status(name)?,
        None => status,
    };
    if max_status < status {
        bail!("--max-status must not be below --status");
    }

    let pass = site.start(cli.request(), Caller::new(status, max_status));
    let html = match &cli.unit {
        Some(unit) => {
            let mut options = RenderOptions::new();
            if let Some(style) = &cli.style {
                options = options.style(style.as_str());
            }
            site.render(&pass, unit.as_str(), options)?
        }
        None => site.render_template(&pass, "page", Context::new())?,
    };

    println!("{html}");
    if let Some(target) = pass.redirect() {
        eprintln!("redirect: {target}");
    }
    Ok(())
}
