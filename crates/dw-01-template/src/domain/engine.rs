//! # Placeholder Substitution
//!
//! Every field of the record is visited in key order; its value replaces
//! each `${path}` and each percent-encoded `%24%7Bpath%7D` in the markup.
//! Nested records extend the path with `.key`, sequences with `[index]`.
//!
//! No escaping is applied. Callers sanitize.

use serde::Serialize;
use tracing::trace;

use super::value::{Record, Value};

/// Errors raised when turning caller data into a record.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The data could not be serialized.
    #[error("template data not serializable: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The data serialized to something other than a record.
    #[error("template data must be a record, got {0}")]
    NotARecord(&'static str),
}

/// Substitute every placeholder that names a path in `data`.
pub fn render(template: &str, data: &Record) -> String {
    let mut html = template.to_string();
    for (key, value) in data {
        substitute(&mut html, key, value);
    }
    html
}

/// Render any serializable record-shaped value.
pub fn render_serialize<T: Serialize>(template: &str, data: &T) -> Result<String, TemplateError> {
    match serde_json::to_value(data)? {
        serde_json::Value::Object(map) => {
            let record: Record = map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
            Ok(render(template, &record))
        }
        other => Err(TemplateError::NotARecord(kind_of(&other))),
    }
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn substitute(html: &mut String, path: &str, value: &Value) {
    match value {
        Value::Record(fields) => {
            for (key, inner) in fields {
                substitute(html, &format!("{path}.{key}"), inner);
            }
        }
        Value::List(items) => {
            for (index, inner) in items.iter().enumerate() {
                substitute(html, &format!("{path}[{index}]"), inner);
            }
        }
        leaf => {
            let Some(text) = leaf.as_text() else {
                return;
            };
            replace_tag(html, &format!("${{{path}}}"), &text);
            replace_tag(html, &encoded_tag(path), &text);
        }
    }
}

fn replace_tag(html: &mut String, tag: &str, text: &str) {
    if html.contains(tag) {
        trace!(tag, "Substituting placeholder");
        *html = html.replace(tag, text);
    }
}

/// `%24%7B` + path + `%7D`, with brackets in the path encoded too.
fn encoded_tag(path: &str) -> String {
    let path = path.replace('[', "%5B").replace(']', "%5D");
    format!("%24%7B{path}%7D")
}

/// A named markup template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    markup: String,
}

impl Template {
    /// Wrap `markup` under `name`.
    pub fn new(name: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markup: markup.into(),
        }
    }

    /// Template name (usually the id of the element it was read from).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw markup.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// See [`render`].
    pub fn render(&self, data: &Record) -> String {
        render(&self.markup, data)
    }

    /// See [`render_serialize`].
    pub fn render_serialize<T: Serialize>(&self, data: &T) -> Result<String, TemplateError> {
        render_serialize(&self.markup, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::format_timestamp;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match Value::from(value) {
            Value::Record(r) => r,
            _ => panic!("not a record"),
        }
    }

    #[test]
    fn test_single_placeholder_round_trip() {
        let data = record(json!({"x": "hello"}));
        let out = render("<p>${x}</p>", &data);
        assert_eq!(out, "<p>hello</p>");
        assert!(!out.contains("${"));
        // Nothing left to substitute.
        assert_eq!(render(&out, &data), out);
    }

    #[test]
    fn test_idempotent() {
        let data = record(json!({"a": 1, "b": {"c": [true, null]}}));
        let tmpl = "${a}|${b.c[0]}|${b.c[1]}|%24%7Bb.c%5B0%5D%7D";
        let first = render(tmpl, &data);
        assert_eq!(first, "1|true||true");
        assert_eq!(render(tmpl, &data), first);
    }

    #[test]
    fn test_encoded_and_repeated() {
        let data = record(json!({"link": "/message/abc"}));
        let out = render("<a href=\"%24%7Blink%7D\">${link}</a> ${link}", &data);
        assert_eq!(out, "<a href=\"/message/abc\">/message/abc</a> /message/abc");
    }

    #[test]
    fn test_nested_record() {
        let data = record(json!({"user": {"name": "Moky", "id": {"address": "4WDfe"}}}));
        let out = render("${user.name} @ ${user.id.address}", &data);
        assert_eq!(out, "Moky @ 4WDfe");
    }

    #[test]
    fn test_unknown_placeholder_untouched() {
        let data = record(json!({"x": "1"}));
        assert_eq!(render("${y} ${x}", &data), "${y} 1");
    }

    #[test]
    fn test_date_value() {
        let mut data = Record::new();
        data.insert("when".into(), Value::date_from_timestamp(1_560_000_000));
        let expected = format_timestamp(1_560_000_000).unwrap();
        assert_eq!(render("${when}", &data), expected);
    }

    #[test]
    fn test_no_escaping() {
        let data = record(json!({"title": "<b>hi</b>"}));
        assert_eq!(render("${title}", &data), "<b>hi</b>");
    }

    #[derive(Serialize)]
    struct Post {
        title: String,
        time: i64,
    }

    #[test]
    fn test_render_serialize() {
        let tmpl = Template::new("message_template", "${title}@${time}");
        let post = Post {
            title: "hi".into(),
            time: 7,
        };
        assert_eq!(tmpl.render_serialize(&post).unwrap(), "hi@7");
        assert_eq!(tmpl.name(), "message_template");
        assert!(matches!(
            render_serialize("${x}", &vec![1, 2]),
            Err(TemplateError::NotARecord("array"))
        ));
    }
}
