//! # Documents
//!
//! Named view models for every generated document, rendered with askama from the
//! `templates/` directory:
//!
//! | document | view model | template |
//! |----------|------------|----------|
//! | Go model (`convert`, API storage model) | [`ModelTemplate`] | `model.go.txt` |
//! | per-table route file | [`ApiTemplate`] | `api.api.txt` |
//! | aggregate route file | [`ServerApiTemplate`] | `server.api.txt` |
//! | conversion gists | [`ConvertTemplate`] | `convert.go.txt` |
//! | update-map gist | [`UpdateMapTemplate`] | `update_map.go.txt` |
//! | filter gist | [`FilterTemplate`] | `filter.go.txt` |
//!
//! View models are built by explicit mapping functions from the field model
//! ([`crate::model`]); templates never look at catalog rows directly.

use anyhow::Context;
use askama::Template;

mod api;
mod gist;
mod model;

pub use api::{api_field, render_api, render_server_api, ApiField, ApiTemplate, IdView, ServerApiTemplate};
pub use gist::{
    render_gists, ConversionKind, ConvertField, ConvertTemplate, FieldAccess, FilterField, FilterTemplate, GistSet,
    Gists, UpdateField, UpdateMapTemplate,
};
pub use model::{model_imports, model_template, render_model, ModelField, ModelTemplate};

/// Render a view model, naming the template in the error.
pub(crate) fn render_template<T: Template>(template: &T, name: &str) -> anyhow::Result<String> {
    let rendered = template
        .render()
        .with_context(|| format!("Failed to render template {name}"))?;
    // Templates differ in trailing whitespace; normalize to exactly one newline
    Ok(format!("{}\n", rendered.trim_end()))
}

/// Text safe to place on one line of a generated document.
pub(crate) fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text safe to place inside a double-quoted string of a generated document.
pub(crate) fn quoted(text: &str) -> String {
    single_line(text).replace('"', "'")
}
