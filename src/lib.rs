//! # grom
//!
//! **grom** reads MySQL table metadata from `information_schema` and emits Go source text:
//! model structs with struct tags, go-zero route declaration files and the conversion,
//! update-map and filter snippets that go with them.
//!
//! ## Architecture
//!
//! - **[`catalog`]** - Catalog rows, the [`catalog::CatalogReader`] seam and its snapshot and MySQL readers
//! - **[`naming`]** - Exported names, route names, plurals and abbreviations
//! - **[`types`]** - Data-type keyword to Go type mapping under a null-wrapper policy
//! - **[`annotation`]** - Label and enum extraction from column comments
//! - **[`tags`]** - Struct tag dialects rendered from minijinja fragments
//! - **[`model`]** - Field descriptors and the per-table entity model
//! - **[`document`]** - Askama view models of every generated document
//! - **[`format`]** - Route document post-formatter and the source formatter/validator seams
//! - **[`project`]** - `convert` and `api generate` runs
//! - **[`config`]** - Config structs loaded from JSON, YAML or TOML
//! - **[`cli`]** - The `grom` command line
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as CLI<br/>(grom)
//!     participant Catalog as catalog::read_table
//!     participant Model as model::build_entity
//!     participant Docs as document
//!     participant Format as format::format_api
//!     participant FS as File System
//!
//!     CLI->>Catalog: read_table(reader, "user")
//!     Catalog-->>CLI: TableMetadata
//!     CLI->>Model: build_entity(&table, &config, &api)
//!     Model-->>CLI: EntityModel
//!     CLI->>Docs: render_api / render_model / render_gists
//!     Docs->>Format: raw route text
//!     Format-->>Docs: canonical route text
//!     CLI->>FS: user.api, model/user.go, server.api, gists
//!     CLI->>Catalog: close()
//! ```
//!
//! ## Example
//!
//! ```rust
//! use grom::catalog::{ColumnRow, SnapshotCatalog, SnapshotTable};
//! use grom::config::GenerationConfig;
//! use grom::format::Verbatim;
//!
//! let mut catalog = SnapshotCatalog::default().with_table(
//!     "user",
//!     SnapshotTable {
//!         columns: vec![ColumnRow {
//!             name: "user_name".to_string(),
//!             ordinal: 1,
//!             nullable: "NO".to_string(),
//!             data_type: "varchar".to_string(),
//!             column_type: "varchar(255)".to_string(),
//!             ..ColumnRow::default()
//!         }],
//!         ..SnapshotTable::default()
//!     },
//! );
//! let mut config = GenerationConfig::default();
//! config.db.table = "user".to_string();
//! config.enable_json_tag = true;
//!
//! let model = grom::project::convert_table(&mut catalog, &config, &Verbatim).unwrap();
//! assert!(model.contains("\tUserName string `json:\"user_name\"`\n"));
//! ```

pub mod annotation;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod document;
pub mod format;
pub mod logging;
pub mod model;
pub mod naming;
pub mod project;
pub mod tags;
pub mod types;

pub use catalog::{CatalogReader, SnapshotCatalog};
pub use config::{ApiConfig, GenerationConfig, ProjectConfig};
pub use project::{convert_table, generate_project, ProjectReport};
