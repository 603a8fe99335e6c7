//! Actions and store-backed units for tessera sites.
//!
//! `tessera-dispatch` adds behavior to the units of `tessera-render`:
//!
//! - **Actions**: named behaviors bound to a unit, gated by status, each with
//!   a trigger (`button`) and an outcome (`result`) that may be rendered in
//!   different places of one page
//! - **Two-phase dispatch**: a behavior runs at most once per request, the
//!   first time its outcome is rendered after its trigger was submitted
//! - **Model units**: a paginated [`Collection`] over a [`Store`] with
//!   create, edit and delete actions on its [`Record`]s
//! - **Status switching**: [`StatusSwitch`] lets a caller act at any status up
//!   to their maximum
//!
//! # Declaring actions
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera_dispatch::{Action, ActionSet};
//! use tessera_render::{Rendered, Templated, Unit, Value};
//!
//! #[derive(serde::Serialize)]
//! struct Cart {
//!     #[serde(skip)]
//!     actions: ActionSet<Cart>,
//!     items: Vec<String>,
//! }
//!
//! impl Templated for Cart {
//!     const TEMPLATE: &'static str = "cart";
//!
//!     fn extra_attribute(self: Arc<Self>, name: &str) -> Option<Value> {
//!         self.actions.bind(&self, name)
//!     }
//! }
//!
//! let actions = ActionSet::new().with(
//!     Action::new("empty", |cart: &Cart, _call| {
//!         Ok(Rendered::text(format!("Removed {} items", cart.items.len())))
//!     })
//!     .status("USER"),
//! );
//! ```
//!
//! In the `cart` template, `{{ render_unit(unit.empty) }}` renders the trigger
//! and, once it is followed, the outcome in its place. Split the two with
//! `unit.empty.button` and `unit.empty.result`.

mod action;
mod dispatcher;
mod model;
mod status;
mod store;

pub use action::{Action, ActionCall, ActionSet, Behavior};
pub use dispatcher::{marker, slug, BoundAction, Part};
pub use model::{
    Collection, Field, Pagination, Record, DEFAULT_PAGE_SIZE, DELETE_CONFIRM, DELETE_FAILED,
    MAX_PAGE_SIZE,
};
pub use status::StatusSwitch;
pub use store::{MemoryRecord, MemoryStore, Store, StoreError, StoreQuery};
