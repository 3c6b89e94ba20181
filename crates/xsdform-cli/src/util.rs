use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use nu_ansi_term::Color;
use serde::Serialize;
use xsdform::config::XsdformConfig;
use xsdform::report::{SourceFile, format_error};

/// Configuration in effect for a run, with the file it came from.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    pub config: XsdformConfig,
}

impl LoadedConfig {
    /// Directory target globs are resolved against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.path
            .as_deref()
            .map(|path| path.parent().unwrap_or(Path::new(".")))
    }
}

/// Load the explicit configuration file, or search upward from the working
/// directory. A missing file is not an error unless it was named explicitly.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = XsdformConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
        });
    }
    let current_dir = std::env::current_dir().context("failed to get current directory")?;
    match XsdformConfig::load_from_dir(&current_dir)? {
        Some((path, config)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(LoadedConfig {
                path: Some(path),
                config,
            })
        }
        None => Ok(LoadedConfig::default()),
    }
}

/// `-` stands for stdin.
pub fn input_file(file: &str) -> Option<&str> {
    if file == "-" { None } else { Some(file) }
}

/// Read input from file path or stdin.
/// - `None` reads from stdin
/// - `Some(path)` reads from file
pub fn read_input(file: Option<&str>) -> Result<String, String> {
    match file {
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Error reading from stdin: {e}"))?;
            Ok(buffer)
        }
        Some(path) => fs::read_to_string(path).map_err(|e| format!("Error reading file: {e}")),
    }
}

/// Helper to get display path for error messages
pub fn display_path(file: Option<&str>) -> &str {
    file.unwrap_or("<stdin>")
}

/// Serialize `value` as JSON to `output`, or stdout when it is `None`.
pub fn write_json<T: Serialize>(
    value: &T,
    pretty: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize JSON")?;
    match output {
        Some(path) => fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

/// Print a rendered error report to stderr.
pub fn print_error(error: &xsdform::Error, file: Option<SourceFile<'_>>) {
    eprintln!("{}", format_error(error, file, io::stderr().is_terminal()));
}

/// Print a rendered error report and exit with status 1.
pub fn exit_with_error(error: &xsdform::Error, file: Option<SourceFile<'_>>) -> ! {
    print_error(error, file);
    std::process::exit(1);
}

/// Print a plain error message and exit with status 1.
pub fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", Color::Red.paint(format!("Error: {message}")));
    std::process::exit(1);
}
