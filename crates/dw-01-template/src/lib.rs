//! # Template Engine (dw-01)
//!
//! Produces markup fragments from data records by placeholder substitution.
//!
//! ```text
//! "<p>${title}</p>"  +  {title: "hello"}  ──render──→  "<p>hello</p>"
//! ```
//!
//! ## Placeholder forms
//!
//! | Form | Example |
//! |------|---------|
//! | Plain | `${user.name}` |
//! | Percent-encoded | `%24%7Buser.name%7D` |
//! | Sequence element | `${tags[0]}` / `%24%7Btags%5B0%5D%7D` |
//!
//! Rendering is pure: the same template and record always yield
//! byte-identical output.

pub mod domain;

pub use domain::{
    format_date, format_timestamp, render, render_serialize, Record, Template, TemplateError,
    Value,
};
