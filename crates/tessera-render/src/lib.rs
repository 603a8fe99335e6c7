//! # Tessera Render - Recursive Unit Composition
//!
//! `tessera-render` renders arbitrary objects ("units") inside templates, each
//! of which may render further units. Every render is shaped by two ordered,
//! application-defined scales:
//!
//! - a **style** (how much detail or markup: `TEXT < LINK < ... < PAGE`)
//! - a **status** (who may see what: `PUBLIC < USER < ... < ADMINISTRATOR`)
//!
//! This crate is the rendering foundation for the `tessera` framework; the
//! action protocol lives in `tessera-dispatch`.
//!
//! ## Core Concepts
//!
//! - [`Unit`]: the capability to render oneself, as text or template + context
//! - [`SimpleUnit`]: a unit from a fixed template and attributes
//! - [`Templated`]: a serializable type whose template is named at type level
//! - [`Levels`]: the configured style and status scales
//! - [`resolve`]: picks the greatest supported style at or below a request
//! - [`permits`] / [`filter_actions`]: status gating
//! - [`Site`]: registry, engine and levels; runs the render protocol
//! - [`RenderPass`]: the per-request state shared by nested renders
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera_render::{Caller, Levels, RenderOptions, Request, SimpleUnit, Site};
//!
//! let levels = Levels::new(
//!     ["PUBLIC", "USER", "STAFF"],
//!     ["TEXT", "LINK", "CELL", "PAGE"],
//! ).unwrap();
//!
//! let price = SimpleUnit::from_source("price", "{{ amount }} EUR").styles(["TEXT"]);
//! let product = SimpleUnit::from_source(
//!     "product",
//!     "<h1>{{ name }}</h1>{{ render_unit('price', style='CELL') }}",
//! )
//! .attr("name", "Desk lamp");
//!
//! let site = Site::builder(levels)
//!     .register("price", Arc::new(price.attr("amount", 12)))
//!     .unwrap()
//!     .register("product", Arc::new(product))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let pass = site.start(Request::get("/"), Caller::anonymous());
//! let html = site.render(&pass, "product", RenderOptions::new()).unwrap();
//! assert_eq!(html, "<h1>Desk lamp</h1>12 EUR");
//! ```

mod context;
mod error;
pub mod gate;
pub mod levels;
mod pass;
mod registry;
mod request;
pub mod resolve;
mod simple;
mod site;
pub mod template;
mod templated;
mod unit;

pub use context::Context;
pub use error::{ConfigError, RenderError};
pub use gate::{filter_actions, permits, permits_declared, Gated};
pub use levels::{Level, Levels, Scale, Status, Style};
pub use pass::{Begin, ExecutionOutcome, RenderPass, MAX_DEPTH};
pub use registry::{Registry, RegistryBuilder};
pub use request::{Caller, MemorySession, Method, Request, Session, Submission, STATUS_SESSION_KEY};
pub use resolve::{resolve, resolve_declared};
pub use simple::{Attr, SimpleUnit};
pub use site::{RenderOptions, Site, SiteBuilder, Target, SELF_ACTION, STYLE_KEY, UNIT_KEY};
pub use template::{MiniJinjaEngine, TemplateEngine};
pub use templated::Templated;
pub use unit::{Invocation, Rendered, TemplateRef, Unit, UnitRef};

// Re-exported so downstream crates build template values with the same version.
pub use minijinja::Value;
