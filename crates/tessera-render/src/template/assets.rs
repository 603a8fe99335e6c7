//! Framework template definitions.
//!
//! Templates are stored as `(name, content)` pairs. The engine registers each
//! one both with and without its extension, so `tessera/button` and
//! `tessera/button.html` name the same template. Applications override one by
//! registering a template under the same name.

/// Template for an action's trigger.
pub const BUTTON_TEMPLATE: &str = "tessera/button";
/// Template for a failed action outcome.
pub const FAILURE_TEMPLATE: &str = "tessera/failure";
/// Template for a create/edit/delete form.
pub const FORM_TEMPLATE: &str = "tessera/form";
/// Template for a paginated collection.
pub const LIST_TEMPLATE: &str = "tessera/list";
/// Template for one stored record.
pub const RECORD_TEMPLATE: &str = "tessera/record";
/// Template for the status switch form.
pub const STATUS_TEMPLATE: &str = "tessera/status";

/// Framework-supplied templates, as `(name_with_extension, content)`.
pub const FRAMEWORK_TEMPLATES: &[(&str, &str)] = &[
    ("tessera/button.html", BUTTON),
    ("tessera/failure.html", FAILURE),
    ("tessera/form.html", FORM),
    ("tessera/list.html", LIST),
    ("tessera/record.html", RECORD),
    ("tessera/status.html", STATUS),
];

/// Variables: `href`, `label`, `active`.
const BUTTON: &str = r#"<a class="button{% if active %} active{% endif %}" href="{{ href }}">{{ label }}</a>"#;

/// Variables: `message`.
const FAILURE: &str = r#"<div class="failure">{{ message }}</div>"#;

/// Variables:
/// - `fields`: list of `{name, label, value}`
/// - `submitter`: name of the submit button (the action's marker)
/// - `submit_label`, `cancel_label`
/// - `alert`: optional confirmation text shown above the fields
/// - `cancel`: where the cancel link points (defaults to the current page)
const FORM: &str = r#"<form method="post" action="">
{%- if alert %}
<p class="alert">{{ alert }}</p>
{%- endif %}
{%- for field in fields %}
<label>{{ field.label }} <input name="{{ field.name }}" value="{{ field.value }}"></label>
{%- endfor %}
<button type="submit" name="{{ submitter }}">{{ submit_label }}</button>
<a href="{{ cancel | default('?') }}">{{ cancel_label }}</a>
</form>"#;

/// Variables: `items` (units), `item_style`, `index`, `size`, `count`,
/// `previous`, `next`, `has_previous`, `has_next`. The collection is `unit`.
const LIST: &str = r#"<section class="collection">
{{- render_unit(unit, action="create") }}
<ul>
{%- for item in items %}
<li>{{ render_unit(item, style=item_style) }}</li>
{%- endfor %}
</ul>
{%- if has_previous %}
<a class="previous" href="?index={{ previous }}&amp;size={{ size }}">Previous</a>
{%- endif %}
{%- if has_next %}
<a class="next" href="?index={{ next }}&amp;size={{ size }}">Next</a>
{%- endif %}
</section>"#;

/// Variables: `fields` (list of `{name, label, value}`). The record is `unit`.
const RECORD: &str = r#"<article class="record">
{%- for field in fields %}
<p><b>{{ field.label }}</b> {{ field.value }}</p>
{%- endfor %}
{{ render_unit(unit, action="edit") }}{{ render_unit(unit, action="delete") }}
</article>"#;

/// Variables: `choices` (list of `{name, rank, selected}`), `submitter`,
/// `submit_label`.
const STATUS: &str = r#"<form method="post" action="">
<select name="status">
{%- for choice in choices %}
<option value="{{ choice.name }}"{% if choice.selected %} selected{% endif %}>{{ choice.name }}</option>
{%- endfor %}
</select>
<button type="submit" name="{{ submitter }}">{{ submit_label }}</button>
</form>"#;
