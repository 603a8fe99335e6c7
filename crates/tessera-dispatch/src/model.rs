//! Store-backed units: a paginated collection and its records.
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tessera_dispatch::{Collection, Field, MemoryStore};
//!
//! let store = MemoryStore::new().with(json!({"name": "Lamp", "price": "12"})).unwrap();
//! let products = Collection::new("products", store)
//!     .field(Field::new("name"))
//!     .field(Field::new("price").label("Price (EUR)"))
//!     .action_status("STAFF");
//! let unit = Arc::new(products);
//! ```
//!
//! The collection lists one page of records (query parameters `index` and
//! `size`) and offers a `create` action. Each record offers `edit` and
//! `delete`. Following a create, edit or delete button presents a form; the
//! form's submission writes to the store and redirects.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Serialize;
use tessera_render::template::{humanize, FORM_TEMPLATE, LIST_TEMPLATE, RECORD_TEMPLATE};
use tessera_render::{Context, Invocation, RenderError, Rendered, TemplateRef, Unit, UnitRef, Value};
use tracing::debug;

use crate::action::{Action, ActionCall, ActionSet};
use crate::store::{Store, StoreQuery};

/// Page size when the request gives none.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page a request may ask for with `size`.
pub const MAX_PAGE_SIZE: usize = 500;

/// Message of a failed delete.
pub const DELETE_FAILED: &str = "This item could not be deleted.";

/// Confirmation shown before a delete.
pub const DELETE_CONFIRM: &str = "Are you sure you want to delete this item?";

/// A field shown in records and edited in forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub label: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: humanize(&name),
            name,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[derive(Serialize)]
struct FieldValue<'a> {
    name: &'a str,
    label: &'a str,
    value: String,
}

/// Page position computed from `index`, `size` and the total count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub index: usize,
    pub size: usize,
    pub count: usize,
    /// Start of the previous page, clamped to 0.
    pub previous: usize,
    /// Start of the next page, or 0 when this is the last page.
    pub next: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(index: usize, size: usize, count: usize) -> Self {
        let size = size.clamp(1, MAX_PAGE_SIZE);
        let next = index
            .checked_add(size)
            .filter(|next| *next < count)
            .unwrap_or(0);
        Self {
            index,
            size,
            count,
            previous: index.saturating_sub(size),
            next,
            has_previous: index > 0,
            has_next: next != 0,
        }
    }
}

// Configuration shared by a collection and all of its records.
struct Model<S: Store> {
    name: String,
    store: S,
    fields: Vec<Field>,
    status: Option<String>,
    action_status: Option<String>,
    item_style: Option<String>,
    page_size: usize,
    redirect: Option<String>,
    list_template: TemplateRef,
    record_template: TemplateRef,
    form_template: TemplateRef,
    record_actions: ActionSet<Record<S>>,
}

impl<S: Store> Model<S> {
    fn field_values(&self, item: Option<&serde_json::Value>) -> Vec<FieldValue<'_>> {
        self.fields
            .iter()
            .map(|field| FieldValue {
                name: &field.name,
                label: &field.label,
                value: item
                    .and_then(|item| item.get(&field.name))
                    .map(display_value)
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn submitted(&self, call: &ActionCall<'_>) -> serde_json::Value {
        let mut data = serde_json::Map::new();
        for field in &self.fields {
            if let Some(value) = call.field(&field.name) {
                data.insert(field.name.clone(), serde_json::Value::from(value));
            }
        }
        serde_json::Value::Object(data)
    }

    fn form(
        &self,
        call: &ActionCall<'_>,
        fields: Vec<FieldValue<'_>>,
        submit_label: &str,
        alert: Option<&str>,
    ) -> Rendered {
        Rendered::template(
            self.form_template.clone(),
            Context::new()
                .with_serialize("fields", &fields)
                .with("submitter", call.marker)
                .with("submit_label", submit_label)
                .with("cancel_label", "Cancel")
                .with("cancel", call.request().path.as_str())
                .with("alert", alert),
        )
    }

    fn saved(&self, what: &str) -> Rendered {
        match &self.redirect {
            Some(target) => Rendered::redirect(target.clone()),
            None => Rendered::text(format!("<p class=\"success\">{what}</p>")),
        }
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A paginated list of the records in a [`Store`].
pub struct Collection<S: Store> {
    model: Arc<Model<S>>,
    actions: ActionSet<Collection<S>>,
}

impl<S: Store> Collection<S> {
    pub fn new(name: impl Into<String>, store: S) -> Self {
        Self {
            model: Arc::new(Model {
                name: name.into(),
                store,
                fields: Vec::new(),
                status: None,
                action_status: None,
                item_style: None,
                page_size: DEFAULT_PAGE_SIZE,
                redirect: Some(".".to_string()),
                list_template: TemplateRef::from(LIST_TEMPLATE),
                record_template: TemplateRef::from(RECORD_TEMPLATE),
                form_template: TemplateRef::from(FORM_TEMPLATE),
                record_actions: ActionSet::new(),
            }),
            actions: ActionSet::new(),
        }
        .rebuild_actions()
    }

    // Builder methods edit the model while no record shares it yet.
    fn configure(mut self, edit: impl FnOnce(&mut Model<S>)) -> Self {
        if let Some(model) = Arc::get_mut(&mut self.model) {
            edit(model);
        }
        self.rebuild_actions()
    }

    fn rebuild_actions(mut self) -> Self {
        let status = self.model.action_status.clone();
        self.actions = ActionSet::new().with(create_action().maybe_status(status.clone()));
        if let Some(model) = Arc::get_mut(&mut self.model) {
            model.record_actions = ActionSet::new()
                .with(edit_action().maybe_status(status.clone()))
                .with(delete_action().maybe_status(status));
        }
        self
    }

    pub fn field(self, field: Field) -> Self {
        self.configure(|model| model.fields.push(field))
    }

    /// Status required to see the collection and its records.
    pub fn status(self, status: impl Into<String>) -> Self {
        let status = status.into();
        self.configure(|model| model.status = Some(status))
    }

    /// Status required to create, edit and delete.
    pub fn action_status(self, status: impl Into<String>) -> Self {
        let status = status.into();
        self.configure(|model| model.action_status = Some(status))
    }

    /// Style requested for each record in the list.
    pub fn item_style(self, style: impl Into<String>) -> Self {
        let style = style.into();
        self.configure(|model| model.item_style = Some(style))
    }

    pub fn page_size(self, size: usize) -> Self {
        self.configure(|model| model.page_size = size.max(1))
    }

    /// Where to go after a successful write.
    pub fn redirect_to(self, target: impl Into<String>) -> Self {
        let target = target.into();
        self.configure(|model| model.redirect = Some(target))
    }

    /// Stay on the page after a write and show a confirmation instead.
    pub fn no_redirect(self) -> Self {
        self.configure(|model| model.redirect = None)
    }

    pub fn list_template(self, template: impl Into<TemplateRef>) -> Self {
        let template = template.into();
        self.configure(|model| model.list_template = template)
    }

    pub fn record_template(self, template: impl Into<TemplateRef>) -> Self {
        let template = template.into();
        self.configure(|model| model.record_template = template)
    }

    pub fn form_template(self, template: impl Into<TemplateRef>) -> Self {
        let template = template.into();
        self.configure(|model| model.form_template = template)
    }

    pub fn name(&self) -> &str {
        &self.model.name
    }

    pub fn store(&self) -> &S {
        &self.model.store
    }

    /// Loads one stored item as a record unit.
    pub fn record(&self, id: &S::Id) -> Result<Option<Record<S>>, S::Error> {
        Ok(self.model.store.get(id)?.map(|item| Record {
            model: self.model.clone(),
            id: id.clone(),
            item,
        }))
    }

    /// Loads the record whose id is given as text, such as a request parameter.
    pub fn find(&self, key: &str) -> Result<Record<S>, S::Error> {
        let id = self.model.store.parse_id(key)?;
        let item = self.model.store.resolve(&id)?;
        Ok(Record {
            model: self.model.clone(),
            id,
            item,
        })
    }

    fn page(&self, inv: &Invocation<'_>) -> Result<(Pagination, Vec<Value>), RenderError> {
        let request = inv.request();
        let index = request
            .param("index")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let size = request
            .param("size")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.model.page_size);

        let backend = |err: S::Error| RenderError::Backend(err.to_string());
        let count = self.model.store.count().map_err(backend)?;
        let page = Pagination::new(index, size, count);
        let items = self
            .model
            .store
            .list(&StoreQuery::new(page.index, page.size))
            .map_err(backend)?
            .into_iter()
            .map(|item| {
                let record = Record {
                    model: self.model.clone(),
                    id: self.model.store.item_id(&item),
                    item,
                };
                UnitRef::new(Arc::new(record)).into_value()
            })
            .collect();
        Ok((page, items))
    }
}

impl<S: Store> Unit for Collection<S> {
    fn identifier(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.model.name)
    }

    fn render(&self, inv: &Invocation<'_>) -> Result<Rendered, RenderError> {
        let (page, items) = self.page(inv)?;
        let mut context = Context::from_serialize(&page)?
            .with("name", self.model.name.as_str())
            .with("items", items)
            .with("item_style", self.model.item_style.as_deref());
        context.extend(inv.args);
        Ok(Rendered::template(
            inv.template_or(self.model.list_template.clone()),
            context,
        ))
    }

    fn required_status(&self) -> Option<&str> {
        self.model.status.as_deref()
    }

    fn attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::from(self.model.name.as_str())),
            "fields" => Some(Value::from_serialize(&self.model.fields)),
            _ => self.actions.bind(&self, name).or_else(|| {
                let record = self.find(name).ok()?;
                Some(UnitRef::new(Arc::new(record)).into_value())
            }),
        }
    }
}

impl<S: Store> fmt::Debug for Collection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.model.name)
            .field("fields", &self.model.fields)
            .finish_non_exhaustive()
    }
}

/// One stored item, with `edit` and `delete` actions.
pub struct Record<S: Store> {
    model: Arc<Model<S>>,
    id: S::Id,
    item: S::Item,
}

impl<S: Store> Record<S> {
    pub fn id(&self) -> &S::Id {
        &self.id
    }

    pub fn item(&self) -> &S::Item {
        &self.item
    }

    fn item_value(&self) -> serde_json::Value {
        serde_json::to_value(&self.item).unwrap_or(serde_json::Value::Null)
    }
}

impl<S: Store> Unit for Record<S> {
    fn identifier(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{}-{}", self.model.name, self.id))
    }

    fn render(&self, inv: &Invocation<'_>) -> Result<Rendered, RenderError> {
        let item = serde_json::to_value(&self.item)?;
        let mut context = Context::from_serialize(&item)?
            .with("id", self.id.to_string())
            .with_serialize("fields", &self.model.field_values(Some(&item)));
        context.extend(inv.args);
        Ok(Rendered::template(
            inv.template_or(self.model.record_template.clone()),
            context,
        ))
    }

    fn required_status(&self) -> Option<&str> {
        self.model.status.as_deref()
    }

    fn attribute(self: Arc<Self>, name: &str) -> Option<Value> {
        if name == "id" {
            return Some(Value::from(self.id.to_string()));
        }
        if let Some(action) = self.model.record_actions.bind(&self, name) {
            return Some(action);
        }
        self.item_value()
            .get(name)
            .map(Value::from_serialize)
    }
}

fn create_action<S: Store>() -> Action<Collection<S>> {
    Action::new("create", |collection: &Collection<S>, call| {
        let model = &collection.model;
        match call.data {
            None => Ok(model.form(call, model.field_values(None), "Create", None)),
            Some(_) => {
                let item = model.store.create(model.submitted(call))?;
                debug!(collection = %model.name, id = %model.store.item_id(&item), "created");
                Ok(model.saved("Created."))
            }
        }
    })
}

fn edit_action<S: Store>() -> Action<Record<S>> {
    Action::new("edit", |record: &Record<S>, call| {
        let model = &record.model;
        match call.data {
            None => {
                let item = record.item_value();
                Ok(model.form(call, model.field_values(Some(&item)), "Save", None))
            }
            Some(_) => {
                model.store.update(&record.id, model.submitted(call))?;
                debug!(collection = %model.name, id = %record.id, "updated");
                Ok(model.saved("Saved."))
            }
        }
    })
}

fn delete_action<S: Store>() -> Action<Record<S>> {
    Action::new("delete", |record: &Record<S>, call| {
        let model = &record.model;
        match call.data {
            None => Ok(model.form(call, Vec::new(), "Delete", Some(DELETE_CONFIRM))),
            Some(_) => {
                model.store.delete(&record.id).context(DELETE_FAILED)?;
                debug!(collection = %model.name, id = %record.id, "deleted");
                Ok(model.saved("Deleted."))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_pagination_middle_page() {
        let page = Pagination::new(20, 20, 50);
        assert_eq!(page.previous, 0);
        assert_eq!(page.next, 40);
        assert!(page.has_previous && page.has_next);
    }

    #[test]
    fn test_pagination_last_page() {
        let page = Pagination::new(40, 20, 50);
        assert_eq!(page.previous, 20);
        assert_eq!(page.next, 0);
        assert!(!page.has_next);
    }

    #[test]
    fn test_pagination_first_page_clamps_previous() {
        let page = Pagination::new(5, 20, 50);
        assert_eq!(page.previous, 0);
        assert!(page.has_previous);
        assert_eq!(Pagination::new(0, 20, 5).has_previous, false);
    }

    #[test]
    fn test_pagination_exactly_full_last_page() {
        let page = Pagination::new(40, 20, 60);
        assert_eq!(page.next, 0);
        assert!(!page.has_next);
    }

    #[test]
    fn test_pagination_index_past_count() {
        let page = Pagination::new(80, 20, 50);
        assert_eq!(page.previous, 60);
        assert_eq!(page.next, 0);
        assert!(page.has_previous && !page.has_next);
    }

    #[test]
    fn test_pagination_size_is_clamped() {
        assert_eq!(Pagination::new(0, 0, 10).size, 1);
        assert_eq!(Pagination::new(0, 0, 10).next, 1);
        assert_eq!(Pagination::new(0, usize::MAX, 10).size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_pagination_huge_values_do_not_overflow() {
        let page = Pagination::new(usize::MAX, usize::MAX, 5);
        assert_eq!(page.next, 0);
        assert!(!page.has_next);
        assert_eq!(page.previous, usize::MAX - MAX_PAGE_SIZE);

        let page = Pagination::new(usize::MAX, 20, 5);
        assert_eq!(page.next, 0);
    }

    #[test]
    fn test_record_identifier_and_attributes() {
        let store = MemoryStore::new()
            .with(json!({"name": "Lamp"}))
            .unwrap();
        let collection = Collection::new("products", store).field(Field::new("name"));
        let record = Arc::new(collection.record(&1).unwrap().unwrap());

        assert_eq!(record.identifier(), "products-1");
        assert_eq!(record.clone().attribute("name"), Some(Value::from("Lamp")));
        assert_eq!(record.clone().attribute("id"), Some(Value::from("1")));
        assert!(record.clone().attribute("edit").is_some());
        assert!(record.clone().attribute("delete").is_some());
        assert!(record.clone().attribute("missing").is_none());
    }

    #[test]
    fn test_find_parses_and_resolves_ids() {
        let store = MemoryStore::new()
            .with(json!({"name": "Lamp"}))
            .unwrap();
        let collection = Arc::new(Collection::new("products", store).field(Field::new("name")));

        let record = collection.find("1").unwrap();
        assert_eq!(record.identifier(), "products-1");
        assert!(matches!(collection.find("7"), Err(StoreError::NotFound(_))));
        assert!(matches!(collection.find("lamp"), Err(StoreError::InvalidId(_))));

        assert!(collection.clone().attribute("1").is_some());
        assert!(collection.attribute("7").is_none());
    }

    #[test]
    fn test_builder_applies_action_status() {
        let collection = Collection::new("products", MemoryStore::new()).action_status("STAFF");
        let create = collection.actions.get("create").unwrap();
        assert_eq!(create.status.as_deref(), Some("STAFF"));
        let edit = collection.model.record_actions.get("edit").unwrap();
        assert_eq!(edit.status.as_deref(), Some("STAFF"));
    }

    #[test]
    fn test_field_default_label() {
        assert_eq!(Field::new("unit_price").label, "Unit Price");
        assert_eq!(Field::new("sku").label("SKU").label, "SKU");
    }

    proptest! {
        #[test]
        fn pagination_stays_in_bounds(index in any::<usize>(), size in any::<usize>(), count in 0usize..200) {
            let page = Pagination::new(index, size, count);
            prop_assert!(page.previous <= index);
            prop_assert!(page.next == 0 || (page.next > index && page.next < count));
        }
    }
}
