//! # Tessera - self-rendering units for server-side HTML
//!
//! Tessera builds pages out of **units**: objects that render themselves
//! through templates, in one of several **styles** (how much detail), for
//! callers of a given **status** (what they may see), with **actions** whose
//! trigger and outcome render in place.
//!
//! This crate bundles:
//!
//! - [`tessera_render`]: levels, the unit capability, the registry and the
//!   render protocol
//! - [`tessera_dispatch`]: two-phase actions, store-backed collections and
//!   the status switch
//! - [`config`]: YAML site configuration and template directories
//! - [`install`](mod@install): the optional process-wide site
//! - [`logging`]: a `tracing` subscriber for applications
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera::prelude::*;
//!
//! let levels = Levels::new(["PUBLIC", "USER"], ["TEXT", "PAGE"]).unwrap();
//! let site = Site::builder(levels)
//!     .register(
//!         "home",
//!         Arc::new(SimpleUnit::from_source("home", "<h1>Hello {{ caller.status }}</h1>")),
//!     )
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let pass = site.start(Request::get("/"), Caller::anonymous());
//! let html = site.render(&pass, "home", RenderOptions::new()).unwrap();
//! assert_eq!(html, "<h1>Hello PUBLIC</h1>");
//! ```
//!
//! ## Rendering a unit
//!
//! Templates render nested units with `render_unit`:
//!
//! ```jinja
//! {{ render_unit("cart", style="CELL") }}
//! {{ render_unit(unit, action="checkout") }}
//! {{ render_unit(unit.checkout.result) }}
//! ```
//!
//! Each call gates the unit on the caller's status (an unpermitted unit
//! renders nothing), resolves the requested style to the closest one the unit
//! supports at or below it, and renders the unit's template with its local
//! context over the enclosing template's context.
//!
//! ## Configuration
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tessera::{SiteConfig, StatusSwitch};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SiteConfig::from_path("site.yaml")?;
//! let site = config
//!     .builder()?
//!     .register("status", Arc::new(StatusSwitch::new()))?
//!     .build()?;
//! tessera::install(site)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod install;
pub mod logging;

pub use config::SiteConfig;
pub use install::{install, is_installed, site};

pub use tessera_dispatch;
pub use tessera_render;

pub use tessera_dispatch::{
    marker, slug, Action, ActionCall, ActionSet, Behavior, BoundAction, Collection,
    Field, MemoryRecord, MemoryStore, Pagination, Part, Record, StatusSwitch, Store, StoreError,
    StoreQuery, DEFAULT_PAGE_SIZE, DELETE_CONFIRM, DELETE_FAILED, MAX_PAGE_SIZE,
};
pub use tessera_render::{
    filter_actions, permits, permits_declared, resolve, resolve_declared, template, Attr, Begin,
    Caller, ConfigError, Context, ExecutionOutcome, Gated, Invocation, Level, Levels,
    MemorySession, Method, Registry, RegistryBuilder, RenderError, RenderOptions, RenderPass,
    Rendered, Request, Scale, Session, SimpleUnit, Site, SiteBuilder, Status, Style, Submission,
    Target, TemplateRef, Templated, Unit, UnitRef, Value, MAX_DEPTH, SELF_ACTION,
    STATUS_SESSION_KEY, STYLE_KEY, UNIT_KEY,
};

/// The types most applications need.
pub mod prelude {
    pub use crate::config::SiteConfig;
    pub use tessera_dispatch::{
        Action, ActionCall, ActionSet, Collection, Field, MemoryStore, StatusSwitch, Store,
        StoreQuery,
    };
    pub use tessera_render::{
        Caller, Context, Invocation, Level, Levels, RenderError, RenderOptions, Rendered, Request,
        SimpleUnit, Site, Templated, Unit, Value,
    };
}
