//! Template domain: values and the substitution engine.

pub mod engine;
pub mod value;

pub use engine::{render, render_serialize, Template, TemplateError};
pub use value::{format_date, format_timestamp, Record, Value};
