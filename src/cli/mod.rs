//! # CLI Module
//!
//! Command-line interface of the `grom` binary.
//!
//! ## Commands
//!
//! ### `convert`
//!
//! Print the Go model of one table:
//!
//! ```bash
//! grom convert -H localhost -P 3306 -u root -p secret -d shop -t user -e JSON_TAG,GORM_V2_TAG
//! grom convert -n grom.json
//! grom convert -n grom.json --catalog catalog.yaml
//! ```
//!
//! Flags override the values of the config file given with `-n`. The password can also
//! come from `GROM_DB_PASSWORD`.
//!
//! ### `generate`
//!
//! Write a sample conversion config (`grom generate -n grom.json`).
//!
//! ### `api config` / `api generate`
//!
//! Write a sample project config, then generate the project it describes:
//!
//! ```bash
//! grom api config -n config.yaml
//! grom api generate -n config.yaml
//! ```
//!
//! Without the `mysql` cargo feature every command that reads tables needs `--catalog`.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use grom::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{run_cli, ApiCommands, Cli, Commands, ConvertArgs};
