//! # Tag Renderer
//!
//! Renders the struct tag of a column for every enabled dialect and joins the fragments
//! into one backtick-wrapped tag:
//!
//! ```text
//! `json:"name" gorm:"column:name;type:varchar(255);not null;index:name_index;default:'user'"`
//! ```
//!
//! Key-only dialects (`json`, `xml`, `gorose`) are formatted directly. The relational
//! dialects have clause grammars where every clause is optional and order is fixed; they
//! are expressed as minijinja fragments parsed once into a shared [`Environment`].

use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::catalog::ColumnDescriptor;
use crate::config::GenerationConfig;

const GORM_TAG: &str = r#"gorm:"
{%- if pk %}primary_key;{% endif -%}
column:{{ name }};type:{{ column_type }}{% if auto_increment %} auto_increment{% endif %}
{%- if not (nullable or pk) %};not null{% endif -%}
{%- for i in indexes %}{% if loop.first %};index:{% else %},{% endif %}{{ i }}{% endfor -%}
{%- for i in unique_indexes %}{% if loop.first %};unique_index:{% else %},{% endif %}{{ i }}{% endfor -%}
{%- if default %};default:'{{ default }}'{% endif -%}
{%- if comment %};comment:'{{ comment }}'{% endif -%}
""#;

const GORM_V2_TAG: &str = r#"gorm:"
{%- if pk %}primaryKey;{% endif -%}
{%- if auto_increment %}autoIncrement;{% endif -%}
column:{{ name }}
{%- if not pk %};type:{{ column_type }}{% endif -%}
{%- if not (nullable or pk) %};not null{% endif -%}
{%- for i in indexes %}{% if loop.first %};index:{% else %},{% endif %}{{ i }}{% endfor -%}
{%- for i in unique_indexes %}{% if loop.first %};uniqueIndex:{% else %},{% endif %}{{ i }}{% endfor -%}
{%- if default %};default:{{ default }}{% endif -%}
{%- if comment %};comment:{{ comment }}{% endif -%}
""#;

const XORM_TAG: &str = r#"xorm:"
{%- if pk %}pk {% endif -%}
{%- if auto_increment %}autoincr {% endif -%}
{{ column_type }} '{{ name }}'
{%- if not (nullable or pk) %} notnull{% endif -%}
{%- for i in indexes %} index({{ i }}){% endfor -%}
{%- for i in unique_indexes %} unique({{ i }}){% endfor -%}
{%- if default %} default('{{ default }}'){% endif -%}
{%- if comment %} comment('{{ comment }}'){% endif -%}
""#;

const BEEGO_TAG: &str = r#"orm:"
{%- if pk %}pk;{% endif -%}
{%- if auto_increment %}auto;{% endif -%}
column({{ name }}){{ beego_type }}
{%- if nullable %};null{% endif -%}
{%- if default %};default({{ default }}){% endif -%}
{%- if comment %};description({{ comment }}){% endif -%}
""#;

static TAG_TEMPLATES: Lazy<Result<Environment<'static>, minijinja::Error>> = Lazy::new(|| {
    let mut env = Environment::new();
    for dialect in TagDialect::ALL {
        if let Some(source) = dialect.template() {
            env.add_template(dialect.name(), source)?;
        }
    }
    Ok(env)
});

fn environment() -> anyhow::Result<&'static Environment<'static>> {
    TAG_TEMPLATES
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to parse tag templates: {e}"))
}

/// One struct tag convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagDialect {
    Json,
    Xml,
    Gorm,
    Xorm,
    Beego,
    Gorose,
    GormV2,
}

impl TagDialect {
    /// Every dialect in combined-tag order.
    pub const ALL: [TagDialect; 7] = [
        TagDialect::Json,
        TagDialect::Xml,
        TagDialect::Gorm,
        TagDialect::Xorm,
        TagDialect::Beego,
        TagDialect::Gorose,
        TagDialect::GormV2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TagDialect::Json => "json",
            TagDialect::Xml => "xml",
            TagDialect::Gorm => "gorm",
            TagDialect::Xorm => "xorm",
            TagDialect::Beego => "beego",
            TagDialect::Gorose => "gorose",
            TagDialect::GormV2 => "gorm_v2",
        }
    }

    fn template(self) -> Option<&'static str> {
        match self {
            TagDialect::Gorm => Some(GORM_TAG),
            TagDialect::GormV2 => Some(GORM_V2_TAG),
            TagDialect::Xorm => Some(XORM_TAG),
            TagDialect::Beego => Some(BEEGO_TAG),
            TagDialect::Json | TagDialect::Xml | TagDialect::Gorose => None,
        }
    }

    fn is_enabled(self, config: &GenerationConfig) -> bool {
        match self {
            TagDialect::Json => config.enable_json_tag,
            TagDialect::Xml => config.enable_xml_tag,
            TagDialect::Gorm => config.enable_gorm_tag,
            TagDialect::Xorm => config.enable_xorm_tag,
            TagDialect::Beego => config.enable_beego_tag,
            TagDialect::Gorose => config.enable_gorose_tag,
            // v1 and v2 both own the `gorm` key
            TagDialect::GormV2 => config.enable_gorm_v2_tag && !config.enable_gorm_tag,
        }
    }
}

/// Dialects enabled by `config`, in combined-tag order.
pub fn enabled_dialects(config: &GenerationConfig) -> Vec<TagDialect> {
    TagDialect::ALL
        .into_iter()
        .filter(|d| d.is_enabled(config))
        .collect()
}

#[derive(Debug, Serialize)]
struct TagContext<'a> {
    name: &'a str,
    column_type: &'a str,
    pk: bool,
    auto_increment: bool,
    nullable: bool,
    default: &'a str,
    comment: &'a str,
    indexes: Vec<&'a str>,
    unique_indexes: Vec<&'a str>,
    beego_type: String,
}

impl<'a> TagContext<'a> {
    fn new(column: &'a ColumnDescriptor) -> Self {
        Self {
            name: &column.name,
            column_type: &column.column_type,
            pk: column.primary_key,
            auto_increment: column.auto_increment,
            nullable: column.nullable,
            default: &column.default,
            comment: &column.comment,
            indexes: column.indexes.iter().map(|i| i.name.as_str()).collect(),
            unique_indexes: column.unique_indexes.iter().map(|i| i.name.as_str()).collect(),
            beego_type: beego_type(column),
        }
    }
}

/// The `type(...)` clauses of the beego `orm` tag.
///
/// Integers carry a `size` one wider than their numeric precision, floating and decimal
/// columns carry `digits`/`decimals`, sized strings and binaries carry their length, and
/// `year`/`time`/`timestamp` columns are declared as `datetime`.
pub fn beego_type(column: &ColumnDescriptor) -> String {
    let data_type = column.data_type.to_ascii_lowercase();
    let unsigned = if column.unsigned { " unsigned" } else { "" };
    match data_type.as_str() {
        "float" | "double" | "real" | "decimal" | "numeric" => format!(
            ";type({data_type}{unsigned});digits({});decimals({})",
            column.precision, column.scale
        ),
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => {
            format!(";type({data_type}{unsigned});size({})", column.precision + 1)
        }
        "year" | "time" | "timestamp" => ";type(datetime)".to_string(),
        "bit" | "binary" | "varbinary" | "char" | "varchar" => {
            format!(";type({data_type});size({})", column.length)
        }
        "tinytext" | "text" | "mediumtext" | "longtext" => ";type(text)".to_string(),
        other => format!(";type({other})"),
    }
}

/// Render one dialect's fragment (without backticks).
pub fn render_tag(dialect: TagDialect, column: &ColumnDescriptor) -> anyhow::Result<String> {
    match dialect {
        TagDialect::Json => Ok(format!("json:\"{}\"", column.name)),
        TagDialect::Xml => Ok(format!("xml:\"{}\"", column.name)),
        TagDialect::Gorose => Ok(format!("gorose:\"{}\"", column.name)),
        _ => {
            let template = environment()?.get_template(dialect.name())?;
            template
                .render(TagContext::new(column))
                .map_err(|e| anyhow::anyhow!("Failed to render `{}` tag template: {e}", dialect.name()))
        }
    }
}

/// Combined struct tag of a column, or an empty string when no dialect is enabled.
pub fn combined_tag(column: &ColumnDescriptor, config: &GenerationConfig) -> anyhow::Result<String> {
    let mut fragments = Vec::new();
    for dialect in enabled_dialects(config) {
        let fragment = render_tag(dialect, column)?;
        if !fragment.is_empty() {
            fragments.push(fragment);
        }
    }
    if fragments.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("`{}`", fragments.join(" ")))
}
