//! # Orchestration
//!
//! Drives the two top-level runs:
//!
//! - [`convert_table`] reads one table and returns its model document
//! - [`generate_project`] reads every configured table and writes the route files, the
//!   optional storage models, the aggregate route file and the gists into `dir`
//!
//! Both runs own the catalog reader for their duration and close it at the end, whether
//! or not generation succeeded. Tables without fields are skipped with a warning; any
//! other failure aborts the run, since the aggregate documents assume every table is
//! present.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{read_table, CatalogReader};
use crate::config::{GenerationConfig, ProjectConfig};
use crate::document::{model_template, render_api, render_gists, render_model, render_server_api, GistSet};
use crate::format::{RouteValidator, SourceFormatter};
use crate::model::{build_entity, build_fields, storage_fields, struct_name_for};
use crate::naming::{replace_initialisms, to_exported_name};

/// Suffix of route files.
pub const API_FILE_SUFFIX: &str = ".api";
/// Aggregate route file name when no table prefix is configured.
pub const SERVER_API_NAME: &str = "server";
/// Directory of storage models inside the project dir.
pub const MODEL_DIR: &str = "model";

/// What a project run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectReport {
    /// Every file written, in write order
    pub written: Vec<PathBuf>,
    /// Tables skipped because they have no fields
    pub skipped: Vec<String>,
}

/// Run `body` and close the reader afterwards. A body error wins over a close error.
fn with_reader<T>(
    reader: &mut dyn CatalogReader,
    body: impl FnOnce(&mut dyn CatalogReader) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let result = body(&mut *reader);
    let closed = reader.close().context("Failed to close catalog");
    let value = result?;
    closed?;
    Ok(value)
}

/// Read `config.db.table` and render its model document.
pub fn convert_table(
    reader: &mut dyn CatalogReader,
    config: &GenerationConfig,
    formatter: &dyn SourceFormatter,
) -> anyhow::Result<String> {
    config.check()?;
    let name = config.db.table.trim();
    with_reader(reader, |reader| {
        let table = read_table(reader, name, config.enable_initialism)?;
        let fields = build_fields(&table.columns, config)?;
        if fields.is_empty() {
            anyhow::bail!("table `{name}` has no columns to convert");
        }
        let struct_name = struct_name_for(&table.name, config);
        tracing::info!(table = name, struct_name = %struct_name, fields = fields.len(), "converting table");
        render_model(&model_template(&table, &struct_name, &fields, config), formatter)
    })
}

/// Struct name and route file name of a table.
///
/// With `enable_trim_table_prefix` the prefix is dropped from both; otherwise only the
/// file name loses it. A configured struct name applies when exactly one table is
/// generated.
fn table_names(config: &ProjectConfig, table: &str) -> (String, String) {
    let initialism = config.api.enable_initialism;
    let trimmed = table.strip_prefix(config.table_prefix.as_str()).unwrap_or(table);
    let trimmed_name = to_exported_name(trimmed, initialism);
    let struct_name = if config.tables.len() == 1 && !config.api.struct_name.is_empty() {
        config.api.struct_name.clone()
    } else if config.enable_trim_table_prefix {
        trimmed_name.clone()
    } else {
        to_exported_name(table, initialism)
    };
    (struct_name, format!("{}{API_FILE_SUFFIX}", trimmed_name.to_lowercase()))
}

/// File name of the aggregate route file: the table prefix without underscores, or `server`.
pub fn server_api_file(table_prefix: &str) -> String {
    let name = table_prefix.trim_matches('_').to_lowercase();
    let name = if name.is_empty() { SERVER_API_NAME.to_string() } else { name };
    format!("{name}{API_FILE_SUFFIX}")
}

fn write_file(path: &Path, contents: &str, label: &str, report: &mut ProjectReport) -> anyhow::Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {label}: {}", path.display()))?;
    println!("✅ Generated {label} → {path:?}");
    report.written.push(path.to_path_buf());
    Ok(())
}

/// Generate the API project described by `config`.
pub fn generate_project(
    reader: &mut dyn CatalogReader,
    config: &ProjectConfig,
    formatter: &dyn SourceFormatter,
    validator: &dyn RouteValidator,
) -> anyhow::Result<ProjectReport> {
    config.check_layout()?;
    let dir = config.dir.as_path();
    fs::create_dir_all(dir).with_context(|| format!("Failed to create output dir: {}", dir.display()))?;
    if config.api.enable_model {
        let model_dir = dir.join(MODEL_DIR);
        fs::create_dir_all(&model_dir)
            .with_context(|| format!("Failed to create model dir: {}", model_dir.display()))?;
    }

    with_reader(reader, |reader| {
        let mut report = ProjectReport::default();
        let mut imports = Vec::with_capacity(config.tables.len());
        let mut gists = GistSet::default();

        for name in &config.tables {
            let (struct_name, api_file) = table_names(config, name);
            let mut generation = config.api.generation_config(&config.db);
            generation.struct_name = struct_name;

            let table = read_table(reader, name, config.api.enable_initialism)?;
            let entity = build_entity(&table, &generation, &config.api)
                .with_context(|| format!("Failed to build entity of table `{name}`"))?;
            if entity.fields.is_empty() {
                tracing::warn!(table = %name, "table has no fields, skipping");
                report.skipped.push(name.clone());
                continue;
            }
            tracing::info!(table = %name, model = %entity.model_name, fields = entity.fields.len(), "generating table");

            let api = render_api(&entity, &config.api, validator, formatter)?;
            write_file(&dir.join(&api_file), &api, "route file", &mut report)?;
            imports.push(api_file);

            let storage = storage_fields(&build_fields(&table.columns, &generation)?);
            if config.api.enable_model {
                let storage_name = replace_initialisms(&entity.struct_name);
                let model = render_model(&model_template(&table, &storage_name, &storage, &generation), formatter)?;
                let path = dir.join(MODEL_DIR).join(format!("{}.go", table.name));
                write_file(&path, &model, "model", &mut report)?;
            }
            gists.push(render_gists(&entity, &storage, formatter)?);
        }

        if !imports.is_empty() {
            let server = render_server_api(&config.api, &imports, validator, formatter)?;
            let path = dir.join(server_api_file(&config.table_prefix));
            write_file(&path, &server, "aggregate route file", &mut report)?;
        }
        for (file, contents) in gists.files() {
            write_file(&dir.join(file), &contents, "gist", &mut report)?;
        }
        Ok(report)
    })
}
