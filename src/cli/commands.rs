use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::catalog::{CatalogReader, SnapshotCatalog};
use crate::config::{load_config, save_config, ConfigError, DbConfig, GenerationConfig, ProjectConfig};
use crate::format::{DelimiterValidator, Gofmt, SourceFormatter, Verbatim};
use crate::project::{convert_table, generate_project};

/// Command-line interface for grom
///
/// Converts MySQL tables into Go models and go-zero API projects.
#[derive(Parser, Debug)]
#[command(name = "grom", version)]
#[command(about = "Generate Go models and go-zero route files from MySQL table metadata", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the Go model of one table
    Convert(ConvertArgs),
    /// Write a sample conversion config
    Generate {
        /// Path of the config file to write (json, yaml or toml)
        #[arg(short = 'n', long = "name", default_value = "grom.json")]
        name: PathBuf,
    },
    /// go-zero API project commands
    Api {
        #[command(subcommand)]
        command: ApiCommands,
    },
}

/// Subcommands of `grom api`
#[derive(Subcommand, Debug)]
pub enum ApiCommands {
    /// Write a sample project config
    Config {
        /// Path of the config file to write (json, yaml or toml)
        #[arg(short = 'n', long = "name", default_value = "config.yaml")]
        name: PathBuf,
    },
    /// Generate route files, models and gists for every configured table
    Generate {
        /// Path of the project config
        #[arg(short = 'n', long = "name", default_value = "config.yaml")]
        name: PathBuf,

        /// Read tables from a catalog snapshot instead of a live server
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

/// Options of `grom convert`. Flags override values from the config file.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct ConvertArgs {
    /// Config file (json, yaml or toml)
    #[arg(short = 'n', long = "name")]
    pub config: Option<PathBuf>,

    /// Database host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Database port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Database user
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Database password
    #[arg(short = 'p', long, env = "GROM_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database name
    #[arg(short = 'd', long)]
    pub database: Option<String>,

    /// Table to convert
    #[arg(short = 't', long)]
    pub table: Option<String>,

    /// Package name of the model
    #[arg(long = "package")]
    pub package_name: Option<String>,

    /// Struct name of the model
    #[arg(long = "struct")]
    pub struct_name: Option<String>,

    /// Services to enable (comma-separated): INITIALISM, FIELD_COMMENT, SQL_NULL,
    /// GUREGU_NULL, JSON_TAG, XML_TAG, GORM_TAG, XORM_TAG, BEEGO_TAG, GOROSE_TAG,
    /// GORM_V2_TAG, DISABLE_UNSIGNED
    #[arg(short = 'e', long = "enable", value_delimiter = ',')]
    pub enable: Vec<String>,

    /// Read the table from a catalog snapshot instead of a live server
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

impl ConvertArgs {
    /// Apply the flags on top of `config`.
    pub fn merge(&self, mut config: GenerationConfig) -> Result<GenerationConfig, ConfigError> {
        let db = &mut config.db;
        if let Some(host) = &self.host {
            db.host = host.clone();
        }
        if let Some(port) = self.port {
            db.port = port;
        }
        if let Some(user) = &self.user {
            db.user = user.clone();
        }
        if let Some(password) = &self.password {
            db.password = password.clone();
        }
        if let Some(database) = &self.database {
            db.database = database.clone();
        }
        if let Some(table) = &self.table {
            db.table = table.clone();
        }
        if let Some(package_name) = &self.package_name {
            config.package_name = package_name.clone();
        }
        if let Some(struct_name) = &self.struct_name {
            config.struct_name = struct_name.clone();
        }
        for service in self.enable.iter().filter(|s| !s.trim().is_empty()) {
            config.enable(service)?;
        }
        Ok(config)
    }

    /// Config file values (if any) with the flags applied.
    pub fn resolve(&self) -> anyhow::Result<GenerationConfig> {
        let base = match &self.config {
            Some(path) => load_config(path)?,
            None => GenerationConfig::default(),
        };
        Ok(self.merge(base)?)
    }
}

/// Open the snapshot at `catalog`, or a live connection when none is given.
fn open_catalog(catalog: Option<&Path>, db: &DbConfig) -> anyhow::Result<Box<dyn CatalogReader>> {
    if let Some(path) = catalog {
        return Ok(Box::new(SnapshotCatalog::load(path)?));
    }
    live_catalog(db)
}

#[cfg(feature = "mysql")]
fn live_catalog(db: &DbConfig) -> anyhow::Result<Box<dyn CatalogReader>> {
    Ok(Box::new(crate::catalog::MysqlCatalog::new(db)?))
}

#[cfg(not(feature = "mysql"))]
fn live_catalog(_db: &DbConfig) -> anyhow::Result<Box<dyn CatalogReader>> {
    anyhow::bail!("grom was built without the `mysql` feature; pass --catalog <snapshot> instead")
}

/// `gofmt` when it can be spawned, otherwise documents are written unformatted.
fn source_formatter() -> Box<dyn SourceFormatter> {
    let gofmt = Gofmt::from_env();
    if gofmt.is_available() {
        Box::new(gofmt)
    } else {
        tracing::warn!("gofmt not found, Go source is written unformatted (set {})", Gofmt::BIN_ENV);
        Box::new(Verbatim)
    }
}

/// Execute a parsed command line
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Convert(args) => {
            let config = args.resolve()?;
            config.check()?;
            let mut reader = open_catalog(args.catalog.as_deref(), &config.db)?;
            let formatter = source_formatter();
            let model = convert_table(reader.as_mut(), &config, formatter.as_ref())
                .with_context(|| format!("Failed to convert table `{}`", config.db.table))?;
            println!("{model}");
            Ok(())
        }
        Commands::Generate { name } => {
            save_config(&GenerationConfig::sample(), &name)?;
            println!("✅ Wrote sample config → {name:?}");
            Ok(())
        }
        Commands::Api {
            command: ApiCommands::Config { name },
        } => {
            save_config(&ProjectConfig::sample(), &name)?;
            println!("✅ Wrote sample project config → {name:?}");
            Ok(())
        }
        Commands::Api {
            command: ApiCommands::Generate { name, catalog },
        } => {
            let config: ProjectConfig = load_config(&name)?;
            match catalog {
                Some(_) => config.check_layout()?,
                None => config.check()?,
            }
            let mut reader = open_catalog(catalog.as_deref(), &config.db)?;
            let formatter = source_formatter();
            let report = generate_project(reader.as_mut(), &config, formatter.as_ref(), &DelimiterValidator)?;
            for table in &report.skipped {
                println!("⚠️  Skipped table without fields: {table}");
            }
            println!("write in: {}", config.dir.display());
            Ok(())
        }
    }
}
