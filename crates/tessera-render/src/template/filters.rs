//! MiniJinja filter registration.

use minijinja::Environment;

/// Turns an identifier into a display label: `add_to_cart` becomes `Add To Cart`.
pub fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Registers the built-in filters on a minijinja environment.
pub fn register_filters(env: &mut Environment<'static>) {
    // Usage: {{ "unit_price" | humanize }} outputs "Unit Price"
    env.add_filter("humanize", |value: String| -> String { humanize(&value) });
}
