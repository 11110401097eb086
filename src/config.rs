//! Configuration for model conversion and API project generation
//!
//! Config files are JSON, YAML or TOML, chosen by extension. Every struct uses
//! `#[serde(default)]`, so a file only needs the keys it wants to change; database
//! settings are flattened into the top level (`host`, `port`, ... sit next to
//! `package_name`).

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use crate::types::NullPolicy;

/// Errors raised by configuration checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Host, port, user or database is missing.
    InvalidDbConfig,
    /// No table to convert.
    EmptyTable,
    EmptyServiceName,
    EmptyDir,
    NoTables,
    /// An `--enable` service name that is not recognized.
    InvalidService(String),
    /// A config file extension that has no loader.
    UnsupportedFormat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDbConfig => {
                write!(f, "invalid db config: host, port, user and database are required")
            }
            ConfigError::EmptyTable => write!(f, "no table given"),
            ConfigError::EmptyServiceName => write!(f, "service_name must not be empty"),
            ConfigError::EmptyDir => write!(f, "dir must not be empty"),
            ConfigError::NoTables => write!(f, "tables must not be empty"),
            ConfigError::InvalidService(s) => write!(
                f,
                "enabled service is invalid, service: {s} (must be one of [{}])",
                VALID_SERVICES.join(",")
            ),
            ConfigError::UnsupportedFormat(ext) => {
                write!(f, "unsupported config format '{ext}' (expected json, yaml, yml or toml)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Service names accepted by `grom convert --enable`.
pub const VALID_SERVICES: &[&str] = &[
    "INITIALISM",
    "FIELD_COMMENT",
    "SQL_NULL",
    "GUREGU_NULL",
    "JSON_TAG",
    "XML_TAG",
    "GORM_TAG",
    "XORM_TAG",
    "BEEGO_TAG",
    "GOROSE_TAG",
    "GORM_V2_TAG",
    "DISABLE_UNSIGNED",
];

/// Route path style of generated API documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStyle {
    Snake,
    #[default]
    Kebab,
}

impl RouteStyle {
    /// Parse a style name; anything but `snake` is kebab.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "snake" => RouteStyle::Snake,
            "kebab" | "" => RouteStyle::Kebab,
            other => {
                tracing::warn!(route_style = other, "unknown route style, using kebab");
                RouteStyle::Kebab
            }
        }
    }
}

impl<'de> Deserialize<'de> for RouteStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RouteStyle::parse(&raw))
    }
}

/// Connection settings of the catalog database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub table: String,
}

impl DbConfig {
    /// Validate that a live connection can be attempted.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() || self.port == 0 || self.user.is_empty() || self.database.is_empty() {
            return Err(ConfigError::InvalidDbConfig);
        }
        Ok(())
    }
}

fn default_package_name() -> String {
    "model".to_string()
}

fn default_true() -> bool {
    true
}

/// Settings of one model conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[serde(flatten)]
    pub db: DbConfig,
    #[serde(default = "default_package_name")]
    pub package_name: String,
    /// Empty means "derive from the table name".
    pub struct_name: String,
    pub enable_initialism: bool,
    pub enable_field_comment: bool,
    #[serde(alias = "enable_sql_null_wrapper")]
    pub enable_sql_null: bool,
    #[serde(alias = "enable_guregu_null_wrapper")]
    pub enable_guregu_null: bool,
    pub enable_json_tag: bool,
    pub enable_xml_tag: bool,
    pub enable_gorm_tag: bool,
    pub enable_gorm_v2_tag: bool,
    pub enable_xorm_tag: bool,
    pub enable_beego_tag: bool,
    pub enable_gorose_tag: bool,
    /// Map unsigned columns to signed Go types. On unless a config file turns it off.
    #[serde(default = "default_true")]
    pub disable_unsigned: bool,
    #[serde(default = "default_true")]
    pub enable_bool_detection: bool,
    pub ignore_fields: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            package_name: default_package_name(),
            struct_name: String::new(),
            enable_initialism: false,
            enable_field_comment: false,
            enable_sql_null: false,
            enable_guregu_null: false,
            enable_json_tag: false,
            enable_xml_tag: false,
            enable_gorm_tag: false,
            enable_gorm_v2_tag: false,
            enable_xorm_tag: false,
            enable_beego_tag: false,
            enable_gorose_tag: false,
            disable_unsigned: true,
            enable_bool_detection: true,
            ignore_fields: Vec::new(),
        }
    }
}

impl GenerationConfig {
    /// Run-wide representation of nullable columns. Guregu wins when both wrappers are on.
    pub fn nullability(&self) -> NullPolicy {
        if self.enable_guregu_null {
            NullPolicy::GureguNull
        } else if self.enable_sql_null {
            NullPolicy::SqlNull
        } else {
            NullPolicy::Plain
        }
    }

    /// Turn on one `--enable` service by name (case-insensitive).
    pub fn enable(&mut self, service: &str) -> Result<(), ConfigError> {
        let service = service.trim().to_uppercase();
        let flag = match service.as_str() {
            "INITIALISM" => &mut self.enable_initialism,
            "FIELD_COMMENT" => &mut self.enable_field_comment,
            "SQL_NULL" => &mut self.enable_sql_null,
            "GUREGU_NULL" => &mut self.enable_guregu_null,
            "JSON_TAG" => &mut self.enable_json_tag,
            "XML_TAG" => &mut self.enable_xml_tag,
            "GORM_TAG" => &mut self.enable_gorm_tag,
            "XORM_TAG" => &mut self.enable_xorm_tag,
            "BEEGO_TAG" => &mut self.enable_beego_tag,
            "GOROSE_TAG" => &mut self.enable_gorose_tag,
            "GORM_V2_TAG" => &mut self.enable_gorm_v2_tag,
            "DISABLE_UNSIGNED" => &mut self.disable_unsigned,
            _ => return Err(ConfigError::InvalidService(service)),
        };
        *flag = true;
        Ok(())
    }

    /// Whether a raw column name is on the ignore list.
    pub fn is_ignored(&self, raw_name: &str) -> bool {
        self.ignore_fields.iter().any(|f| f == raw_name)
    }

    /// Whether the model document gets a `TableName()` method.
    pub fn enables_table_name(&self) -> bool {
        self.enable_gorm_tag
            || self.enable_gorm_v2_tag
            || self.enable_xorm_tag
            || self.enable_beego_tag
            || self.enable_gorose_tag
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.db.table.trim().is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        Ok(())
    }

    /// The config written by `grom generate`.
    pub fn sample() -> Self {
        Self {
            db: DbConfig {
                host: "localhost".to_string(),
                port: 3306,
                user: "user".to_string(),
                password: "password".to_string(),
                database: "database".to_string(),
                table: "table".to_string(),
            },
            package_name: "package_name".to_string(),
            struct_name: "struct_name".to_string(),
            enable_initialism: true,
            enable_field_comment: true,
            enable_json_tag: true,
            enable_gorm_v2_tag: true,
            ..Self::default()
        }
    }
}

/// Settings of the generated go-zero API documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Exported struct name; derived from the table when empty.
    pub struct_name: String,
    /// Overrides the route name and the model name derived from it.
    pub route_name: String,
    pub enable_initialism: bool,
    pub ignore_fields: Vec<String>,
    pub title: String,
    pub desc: String,
    pub author: String,
    pub email: String,
    pub version: String,
    pub service_name: String,
    pub route_prefix: String,
    pub group_prefix: String,
    pub route_style: RouteStyle,
    pub enable_plural: bool,
    pub enable_model: bool,
    #[serde(default = "default_true")]
    pub disable_unsigned: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            struct_name: String::new(),
            route_name: String::new(),
            enable_initialism: false,
            ignore_fields: Vec::new(),
            title: String::new(),
            desc: String::new(),
            author: String::new(),
            email: String::new(),
            version: String::new(),
            service_name: String::new(),
            route_prefix: String::new(),
            group_prefix: String::new(),
            route_style: RouteStyle::default(),
            enable_plural: false,
            enable_model: false,
            disable_unsigned: true,
        }
    }
}

impl ApiConfig {
    /// Model conversion settings used to build fields for API documents.
    pub fn generation_config(&self, db: &DbConfig) -> GenerationConfig {
        GenerationConfig {
            db: db.clone(),
            package_name: default_package_name(),
            struct_name: self.struct_name.clone(),
            enable_initialism: self.enable_initialism,
            enable_field_comment: true,
            enable_json_tag: true,
            enable_gorm_v2_tag: true,
            disable_unsigned: self.disable_unsigned,
            ignore_fields: self.ignore_fields.clone(),
            ..GenerationConfig::default()
        }
    }
}

/// Settings of a whole `grom api generate` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    #[serde(flatten)]
    pub db: DbConfig,
    #[serde(flatten)]
    pub api: ApiConfig,
    pub dir: PathBuf,
    pub table_prefix: String,
    pub tables: Vec<String>,
    pub enable_trim_table_prefix: bool,
}

impl ProjectConfig {
    /// Validate everything including the database connection settings.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.db.check()?;
        self.check_layout()
    }

    /// Validate the settings that do not involve a live database.
    pub fn check_layout(&self) -> Result<(), ConfigError> {
        if self.api.service_name.trim().is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }
        if self.dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDir);
        }
        if self.tables.is_empty() {
            return Err(ConfigError::NoTables);
        }
        Ok(())
    }

    /// The config written by `grom api config`.
    pub fn sample() -> Self {
        Self {
            db: DbConfig {
                host: "localhost".to_string(),
                port: 3306,
                user: "user".to_string(),
                password: "password".to_string(),
                database: "database".to_string(),
                table: String::new(),
            },
            api: ApiConfig {
                enable_initialism: true,
                ignore_fields: vec!["deleted_at".to_string()],
                title: "title".to_string(),
                desc: "desc".to_string(),
                author: "author".to_string(),
                email: "email".to_string(),
                version: "v1.0.0".to_string(),
                service_name: "service".to_string(),
                route_prefix: "api".to_string(),
                group_prefix: "v1".to_string(),
                route_style: RouteStyle::Kebab,
                enable_plural: true,
                enable_model: true,
                ..ApiConfig::default()
            },
            dir: PathBuf::from("output"),
            table_prefix: String::new(),
            tables: vec!["user".to_string()],
            enable_trim_table_prefix: false,
        }
    }
}

/// Config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match ext.as_str() {
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }

    pub fn parse<T: DeserializeOwned>(self, contents: &str) -> anyhow::Result<T> {
        Ok(match self {
            ConfigFormat::Json => serde_json::from_str(contents)?,
            ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
            ConfigFormat::Toml => toml::from_str(contents)?,
        })
    }

    pub fn render<T: Serialize>(self, value: &T) -> anyhow::Result<String> {
        Ok(match self {
            ConfigFormat::Json => serde_json::to_string_pretty(value)?,
            ConfigFormat::Yaml => serde_yaml::to_string(value)?,
            ConfigFormat::Toml => toml::to_string_pretty(value)?,
        })
    }
}

/// Load a config file, picking the parser from its extension.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let format = ConfigFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    format
        .parse(&contents)
        .with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Write a config file in the format its extension names.
pub fn save_config<T: Serialize>(value: &T, path: &Path) -> anyhow::Result<()> {
    let format = ConfigFormat::from_path(path)?;
    let contents = format.render(value)?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config: {}", path.display()))
}
