//! `{{name}}` placeholder rendering for command and connection-string templates
//!
//! Templates are Handlebars in strict mode with escaping turned off: every
//! placeholder must be supplied and values are substituted verbatim. A
//! literal `{{` is written `\{{`.

use std::sync::OnceLock;

use handlebars::Handlebars;
use serde_json::{Map, Value};

use crate::error::{DbdumpError, DbdumpResult};

static REGISTRY: OnceLock<Handlebars<'static>> = OnceLock::new();

fn registry() -> &'static Handlebars<'static> {
    REGISTRY.get_or_init(|| {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    })
}

/// Render `template`, replacing each `{{key}}` with its value from `vars`
pub fn render(template: &str, vars: &[(&str, &str)]) -> DbdumpResult<String> {
    let data: Map<String, Value> = vars
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();

    registry()
        .render_template(template, &Value::Object(data))
        .map_err(|e| DbdumpError::Template(format!("`{}`: {}", template, e)))
}
