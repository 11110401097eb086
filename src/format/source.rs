use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Pretty-printer for generated Go source.
pub trait SourceFormatter {
    fn format_source(&self, source: &str) -> anyhow::Result<String>;
}

impl<F> SourceFormatter for F
where
    F: Fn(&str) -> anyhow::Result<String>,
{
    fn format_source(&self, source: &str) -> anyhow::Result<String> {
        self(source)
    }
}

/// Returns source untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl SourceFormatter for Verbatim {
    fn format_source(&self, source: &str) -> anyhow::Result<String> {
        Ok(source.to_string())
    }
}

/// Pipes source through `gofmt` on stdin, which also accepts declaration and statement
/// lists without a package clause.
#[derive(Debug, Clone)]
pub struct Gofmt {
    binary: PathBuf,
}

impl Gofmt {
    /// Environment variable overriding the `gofmt` binary.
    pub const BIN_ENV: &'static str = "GROM_GOFMT_BIN";

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var(Self::BIN_ENV).unwrap_or_else(|_| "gofmt".to_string()))
    }

    /// Whether the binary can be spawned at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-h")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }
}

impl Default for Gofmt {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SourceFormatter for Gofmt {
    fn format_source(&self, source: &str) -> anyhow::Result<String> {
        let mut child = Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.binary.display()))?;
        }
        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for {}", self.binary.display()))?;
        if !output.status.success() {
            anyhow::bail!(
                "{} failed: {}",
                self.binary.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        String::from_utf8(output.stdout).context("gofmt produced invalid UTF-8")
    }
}
