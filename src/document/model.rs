use askama::Template;
use std::collections::BTreeSet;

use super::{render_template, single_line};
use crate::catalog::TableMetadata;
use crate::config::GenerationConfig;
use crate::format::SourceFormatter;
use crate::model::FieldDescriptor;
use crate::types::{GoType, Scalar};

/// One struct member of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelField {
    pub name: String,
    pub ty: String,
    /// Combined tag including backticks, or empty
    pub tag: String,
    /// Trailing comment, or empty
    pub comment: String,
}

/// Template data for a Go model file
#[derive(Template)]
#[template(path = "model.go.txt", escape = "none")]
pub struct ModelTemplate {
    pub package_name: String,
    /// Sorted import paths
    pub imports: Vec<String>,
    pub table: String,
    pub table_comment: String,
    pub struct_name: String,
    /// Method receiver (`u` for `User`)
    pub receiver: String,
    pub fields: Vec<ModelField>,
    /// Emit `TableName()`
    pub table_name: bool,
    /// `TableIndex()` groupings, each a comma-joined list of quoted field names
    pub table_index: Vec<String>,
    /// `TableUnique()` groupings
    pub table_unique: Vec<String>,
}

/// Import paths the field types need.
pub fn model_imports(fields: &[FieldDescriptor]) -> Vec<String> {
    let mut imports = BTreeSet::new();
    for field in fields {
        match field.ty {
            GoType::SqlNull(_) => {
                imports.insert("database/sql");
            }
            GoType::GureguNull(_) => {
                imports.insert("gopkg.in/guregu/null.v4");
            }
            ty if ty.is(Scalar::Time) => {
                imports.insert("time");
            }
            ty if ty.is(Scalar::DeletedAt) => {
                imports.insert("gorm.io/gorm");
            }
            ty if ty.is(Scalar::DataTypesJson) => {
                imports.insert("gorm.io/datatypes");
            }
            _ => {}
        }
    }
    imports.into_iter().map(String::from).collect()
}

/// Build the model view of a table.
///
/// `fields` is the model or storage view of the table's columns.
pub fn model_template(
    table: &TableMetadata,
    struct_name: &str,
    fields: &[FieldDescriptor],
    config: &GenerationConfig,
) -> ModelTemplate {
    let receiver = struct_name
        .chars()
        .next()
        .map(|c| c.to_lowercase().to_string())
        .unwrap_or_default();
    let beego = config.enable_beego_tag;

    ModelTemplate {
        package_name: config.package_name.clone(),
        imports: model_imports(fields),
        table: table.name.clone(),
        table_comment: single_line(&table.comment),
        struct_name: struct_name.to_string(),
        receiver,
        fields: fields
            .iter()
            .map(|f| ModelField {
                name: f.name.clone(),
                ty: f.ty.to_string(),
                tag: f.tag.clone(),
                comment: if config.enable_field_comment {
                    single_line(&f.comment)
                } else {
                    String::new()
                },
            })
            .collect(),
        table_name: config.enables_table_name(),
        table_index: if beego { table.indexes.normal.clone() } else { Vec::new() },
        table_unique: if beego { table.indexes.unique.clone() } else { Vec::new() },
    }
}

/// Render and format a model document. The single trailing newline is removed.
pub fn render_model(template: &ModelTemplate, formatter: &dyn SourceFormatter) -> anyhow::Result<String> {
    let raw = render_template(template, "model.go.txt")?;
    let formatted = formatter
        .format_source(&raw)
        .map_err(|e| e.context(format!("Failed to format model {}\n{raw}", template.struct_name)))?;
    Ok(formatted.strip_suffix('\n').unwrap_or(&formatted).to_string())
}
