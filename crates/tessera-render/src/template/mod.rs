//! Template backend and framework templates.
//!
//! Units hand the render protocol a template name (or inline source) and a
//! context; a [`TemplateEngine`] turns that into text. The default
//! [`MiniJinjaEngine`] registers:
//!
//! - the `render_unit(target, style=, action=, template=, **extra)` function,
//!   which renders a nested unit through the full protocol
//! - the `humanize` filter (`add_to_cart` becomes `Add To Cart`)
//! - the framework templates listed in [`FRAMEWORK_TEMPLATES`]
//!
//! ```jinja
//! <nav>{{ render_unit('menu', style='LINK') }}</nav>
//! {% for product in products %}
//!   {{ render_unit(product, style='ROW', highlight=loop.first) }}
//! {% endfor %}
//! ```
//!
//! Templates can also be loaded from directories with [`walk_template_dir`].
//! Supported extensions: `.jinja`, `.j2`, `.html`, `.txt` (in priority order).

mod assets;
mod engine;
mod files;
pub mod filters;

pub use assets::{
    BUTTON_TEMPLATE, FAILURE_TEMPLATE, FORM_TEMPLATE, FRAMEWORK_TEMPLATES, LIST_TEMPLATE,
    RECORD_TEMPLATE, STATUS_TEMPLATE,
};
pub use engine::{MiniJinjaEngine, TemplateEngine};
pub use files::{walk_template_dir, TemplateFile, TEMPLATE_EXTENSIONS};
pub use filters::humanize;
