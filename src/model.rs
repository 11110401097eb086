//! # Field Model Builder
//!
//! Turns catalog columns into [`FieldDescriptor`]s and assembles the per-table
//! [`EntityModel`] consumed by the API documents.
//!
//! Three field views exist for the same table:
//!
//! | view | built by | used for |
//! |------|----------|----------|
//! | model | [`build_fields`] | the `convert` model document |
//! | API | [`build_entity`] | route documents and gists |
//! | storage | [`storage_fields`] | `model/<table>.go` of API projects |
//!
//! Column order is the catalog ordinal order in every view.
//!
//! Pointer promotion is decided per [`DocumentMode`] by [`is_promoted`], which looks at
//! nothing but the field and the mode.

use anyhow::Context;

use crate::annotation::{extract_annotation, BOOL_ENUMS};
use crate::catalog::{ColumnDescriptor, TableMetadata};
use crate::config::{ApiConfig, GenerationConfig};
use crate::naming::{pluralize, replace_initialisms, to_camel, to_exported_name, to_lower_camel, to_route_name};
use crate::tags::combined_tag;
use crate::types::{map_type, GoType, Scalar};

/// Default value of database-managed timestamps.
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";
/// Raw-name suffix of auto-time columns.
pub const AUTO_TIME_SUFFIX: &str = "_at";
/// Soft-delete column of gorm models.
pub const DELETED_AT: &str = "deleted_at";
/// Data type keyword of JSON columns.
pub const JSON_DATA_TYPE: &str = "json";
/// Suffix of the fallback id comment.
pub const DEFAULT_ID_COMMENT: &str = "ID";

/// Which document a field is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentMode {
    /// Plain model / response type.
    Model,
    Create,
    /// Single update, the primary key travels as a path parameter.
    Update,
    /// Batch update, the primary key is omitted.
    BatchUpdate,
    /// List query parameters (`form` tags).
    Get,
    /// Filter body (`json` tags).
    Filter,
}

impl DocumentMode {
    /// Whether the mode describes a user-supplied write payload.
    pub fn is_write(self) -> bool {
        matches!(self, DocumentMode::Create | DocumentMode::Update | DocumentMode::BatchUpdate)
    }

    pub fn is_query(self) -> bool {
        matches!(self, DocumentMode::Get | DocumentMode::Filter)
    }
}

/// One column as seen by the documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Exported Go name.
    pub name: String,
    /// Type rendered into documents of this view.
    pub ty: GoType,
    /// Type chosen by the type mapper before view-specific rewrites.
    pub source_type: GoType,
    pub raw_name: String,
    /// Full column type (`varchar(255)`).
    pub column_type: String,
    /// Data type keyword (`varchar`).
    pub data_type: String,
    pub default: String,
    /// Space-joined enum values, empty when none.
    pub enums: String,
    pub label: String,
    /// Comment rendered after the field.
    pub comment: String,
    /// Combined struct tag including backticks, empty when no dialect is enabled.
    pub tag: String,
    pub primary_key: bool,
    pub nullable: bool,
}

impl FieldDescriptor {
    /// Model view of a column.
    ///
    /// Fails only when a tag template cannot be rendered.
    pub fn from_column(column: &ColumnDescriptor, config: &GenerationConfig) -> anyhow::Result<Self> {
        let annotation = extract_annotation(&column.comment);
        let is_bool = config.enable_bool_detection && column.is_bool_column();
        let ty = map_type(
            &column.data_type,
            column.nullable,
            column.unsigned && !config.disable_unsigned,
            is_bool,
            config.nullability(),
        );
        Ok(Self {
            name: to_exported_name(&column.name, config.enable_initialism),
            ty,
            source_type: ty,
            raw_name: column.name.clone(),
            column_type: column.column_type.clone(),
            data_type: column.data_type.to_ascii_lowercase(),
            default: column.default.clone(),
            enums: annotation.enums,
            label: annotation.label,
            comment: column.comment.clone(),
            tag: combined_tag(column, config)
                .with_context(|| format!("Failed to render tags of column `{}`", column.name))?,
            primary_key: column.primary_key,
            nullable: column.nullable,
        })
    }

    pub fn has_default(&self) -> bool {
        !self.default.is_empty()
    }

    /// Whether the default carries nothing beyond the type's zero value.
    pub fn is_default_empty(&self) -> bool {
        self.ty.is_default_empty(&self.default)
    }

    pub fn is_json(&self) -> bool {
        self.data_type == JSON_DATA_TYPE
    }

    /// A column stored as a timestamp, whatever the view renders it as.
    pub fn is_time_field(&self) -> bool {
        self.source_type.is_time()
    }

    /// A database-managed timestamp (`*_at` defaulting to `CURRENT_TIMESTAMP`).
    pub fn is_auto_time(&self) -> bool {
        self.raw_name.ends_with(AUTO_TIME_SUFFIX) && self.default == CURRENT_TIMESTAMP && self.is_time_field()
    }

    /// An integer field restricted to an enum set.
    pub fn has_int_enum(&self) -> bool {
        !self.enums.is_empty()
            && matches!(
                self.ty.scalar(),
                Some(Scalar::Int | Scalar::Int32 | Scalar::Uint | Scalar::Uint32)
            )
    }

    /// Fixed-width fields whose zero value is indistinguishable from "absent".
    pub fn is_narrow(&self) -> bool {
        matches!(self.ty.scalar(), Some(Scalar::Int32 | Scalar::Bool))
    }

    /// Whether a write payload must carry the field.
    pub fn is_required(&self) -> bool {
        !self.nullable && !self.has_default()
    }

    /// Whether the field appears in documents of `mode` at all.
    pub fn appears_in(&self, mode: DocumentMode) -> bool {
        match mode {
            DocumentMode::Model => true,
            DocumentMode::Create | DocumentMode::BatchUpdate => !self.primary_key && !self.is_auto_time(),
            DocumentMode::Update => !self.is_auto_time(),
            DocumentMode::Get | DocumentMode::Filter => !self.primary_key,
        }
    }

    /// Type of the field in documents of `mode`.
    pub fn type_in(&self, mode: DocumentMode) -> GoType {
        if is_promoted(self, mode) {
            self.ty.to_pointer()
        } else {
            self.ty
        }
    }
}

/// Pointer promotion of a field in a document mode.
///
/// Reference types and the plain model never promote, neither does the primary key.
/// Write payloads promote nullable, meaningfully defaulted, narrow and enum fields;
/// query payloads promote nullable, narrow and enum fields.
pub fn is_promoted(field: &FieldDescriptor, mode: DocumentMode) -> bool {
    if mode == DocumentMode::Model || field.primary_key || field.ty.is_reference() {
        return false;
    }
    let shared = field.nullable || field.is_narrow() || field.has_int_enum();
    if mode.is_write() {
        shared || !field.is_default_empty()
    } else {
        shared
    }
}

/// Model view of every non-ignored column.
pub fn build_fields(columns: &[ColumnDescriptor], config: &GenerationConfig) -> anyhow::Result<Vec<FieldDescriptor>> {
    columns
        .iter()
        .filter(|c| {
            let ignored = config.is_ignored(&c.name);
            if ignored {
                tracing::debug!(column = %c.name, "ignoring column");
            }
            !ignored
        })
        .map(|c| FieldDescriptor::from_column(c, config))
        .collect()
}

/// Exported struct name of a table: the configured one or the normalized table name.
pub fn struct_name_for(table: &str, config: &GenerationConfig) -> String {
    if config.struct_name.is_empty() {
        to_exported_name(table, config.enable_initialism)
    } else {
        config.struct_name.clone()
    }
}

/// Primary key metadata used for path and batch parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdInfo {
    pub name: String,
    pub name_plural: String,
    pub ty: GoType,
    pub raw_name: String,
    pub raw_name_plural: String,
    pub comment: String,
    pub label: String,
}

/// One table prepared for the API documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityModel {
    pub table: String,
    pub table_comment: String,
    /// Exported struct name (`UserInfo`).
    pub struct_name: String,
    /// Model name; equals the struct name unless a route name is configured.
    pub model_name: String,
    /// Route name in the configured style (`user-info`).
    pub route_name: String,
    /// Route name of list endpoints.
    pub list_route_name: String,
    /// Handler group (`userinfo`).
    pub group_name: String,
    /// Lower camel variable name of a model value (`userInfo`).
    pub object_name: String,
    pub id: Option<IdInfo>,
    pub fields: Vec<FieldDescriptor>,
}

impl EntityModel {
    /// Fields that appear in `mode`, in column order.
    pub fn fields_in(&self, mode: DocumentMode) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.appears_in(mode))
    }

    pub fn id_name(&self) -> &str {
        self.id.as_ref().map(|id| id.name.as_str()).unwrap_or_default()
    }
}

/// Rewrite a model field into its API view.
fn to_api_field(mut field: FieldDescriptor, config: &GenerationConfig) -> FieldDescriptor {
    if config.disable_unsigned {
        field.ty = field.ty.strip_unsigned();
    }
    if field.is_json() {
        field.ty = GoType::Scalar(Scalar::JsonMap);
    } else if field.ty.is(Scalar::Time) {
        field.ty = GoType::Scalar(Scalar::Int64);
    } else if field.ty.is(Scalar::Bool) && field.enums == BOOL_ENUMS {
        field.comment = field.label.clone();
    } else if field.ty.is(Scalar::Int) {
        field.ty = GoType::Scalar(if field.enums.is_empty() { Scalar::Int64 } else { Scalar::Int32 });
    } else if field.ty.is(Scalar::Uint) {
        field.ty = GoType::Scalar(if field.enums.is_empty() { Scalar::Uint64 } else { Scalar::Uint32 });
    }
    field
}

/// Build the API view of a table.
///
/// `config` is the generation config derived from `api` with the table's struct name set.
/// Malformed columns degrade instead of failing; an entity without fields is left to the
/// caller to skip.
pub fn build_entity(table: &TableMetadata, config: &GenerationConfig, api: &ApiConfig) -> anyhow::Result<EntityModel> {
    let struct_name = struct_name_for(&table.name, config);
    let (route_name, model_name) = if api.route_name.is_empty() {
        (to_route_name(&struct_name, api.route_style), struct_name.clone())
    } else {
        (api.route_name.clone(), to_camel(&api.route_name))
    };
    let list_route_name = if api.enable_plural {
        pluralize(&route_name)
    } else {
        route_name.clone()
    };

    let fields: Vec<FieldDescriptor> = build_fields(&table.columns, config)?
        .into_iter()
        .map(|f| to_api_field(f, config))
        .collect();

    let id = fields.iter().find(|f| f.primary_key).map(|pk| {
        let comment = if pk.comment.is_empty() {
            format!("{}{DEFAULT_ID_COMMENT}", table.comment)
        } else {
            pk.comment.clone()
        };
        IdInfo {
            name: pk.name.clone(),
            name_plural: pluralize(&pk.name),
            ty: pk.ty,
            raw_name: pk.raw_name.clone(),
            raw_name_plural: pluralize(&pk.raw_name),
            label: extract_annotation(&comment).label,
            comment,
        }
    });
    if id.is_none() && !fields.is_empty() {
        tracing::warn!(table = %table.name, "table has no primary key, id routes will be incomplete");
    }

    Ok(EntityModel {
        table: table.name.clone(),
        table_comment: table.comment.clone(),
        object_name: to_lower_camel(&model_name),
        group_name: model_name.to_lowercase(),
        struct_name,
        model_name,
        route_name,
        list_route_name,
        id,
        fields,
    })
}

/// Storage view of model fields: the gorm model written next to the API documents.
pub fn storage_fields(fields: &[FieldDescriptor]) -> Vec<FieldDescriptor> {
    fields
        .iter()
        .cloned()
        .map(|mut f| {
            f.name = replace_initialisms(&f.name);
            f.ty = f.ty.strip_unsigned();
            if f.ty.is(Scalar::Time) {
                f.ty = if f.raw_name == DELETED_AT {
                    GoType::Scalar(Scalar::DeletedAt)
                } else {
                    GoType::Pointer(Scalar::Time)
                };
            } else if f.ty.is(Scalar::Bool) && f.enums == BOOL_ENUMS {
                f.comment = f.label.clone();
            } else if f.ty.is(Scalar::Int) {
                f.ty = GoType::Scalar(if f.enums.is_empty() { Scalar::Int64 } else { Scalar::Int32 });
            }
            if f.is_json() {
                f.ty = GoType::Scalar(Scalar::DataTypesJson);
            }
            if f.has_default() {
                f.ty = f.ty.to_pointer();
            }
            f
        })
        .collect()
}
