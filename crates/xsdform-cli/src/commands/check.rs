//! Check command - compiles and generates every XSD file of the configured
//! targets, reporting each failure.

use std::path::Path;
use std::time::Instant;

use nu_ansi_term::Color;
use xsdform::config::CONFIG_FILENAME;
use xsdform::report::SourceFile;
use xsdform::{CompileOptions, Error, GenerateOptions, compile_str, generate_instance_model};

use crate::util::{LoadedConfig, fail, print_error};

#[derive(clap::Args)]
pub struct Args {
    /// Targets to check. All targets are checked when omitted.
    #[arg(num_args = 0..)]
    pub targets: Vec<String>,

    /// Quiet mode: only print failures and a summary line
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: Args, loaded: &LoadedConfig) {
    let start = Instant::now();
    let Some(base_dir) = loaded.base_dir() else {
        fail(format!("no {CONFIG_FILENAME} found"));
    };
    let config = &loaded.config;

    let target_names: Vec<&str> = if args.targets.is_empty() {
        config.target_names().collect()
    } else {
        args.targets.iter().map(String::as_str).collect()
    };
    if target_names.is_empty() {
        eprintln!(
            "{}",
            Color::Yellow.paint(format!("No targets defined in {CONFIG_FILENAME}"))
        );
        std::process::exit(0);
    }

    let compile_options = CompileOptions {
        schema_id: config.compile.schema_id.clone(),
    };
    let generate_options = GenerateOptions {
        policy: config.instance_model.expansion_policy.unwrap_or_default(),
    };
    let org = config.instance_model.org.as_deref().unwrap_or("org");
    let service = config.instance_model.service.as_deref().unwrap_or("service");

    let mut checked = 0;
    let mut failed = 0;
    for name in &target_names {
        let Some(target) = config.get_target(name) else {
            eprintln!("{}", Color::Red.paint(format!("Error: Unknown target '{name}'")));
            println!("\nAvailable targets:");
            for name in config.target_names() {
                println!("  - {name}");
            }
            std::process::exit(1);
        };
        let files = target
            .files(base_dir)
            .unwrap_or_else(|e| fail(format!("target '{name}': {e}")));
        if !args.quiet {
            println!("{} ({} files)", Color::Cyan.bold().paint(*name), files.len());
        }

        for file in &files {
            checked += 1;
            if check_file(file, &compile_options, generate_options, org, service) {
                if !args.quiet {
                    println!("  {} {}", Color::Green.paint("✓"), file.display());
                }
            } else {
                failed += 1;
                if !args.quiet {
                    println!("  {} {}", Color::Red.paint("✗"), file.display());
                }
            }
        }
    }

    let elapsed = start.elapsed();
    if failed == 0 {
        println!(
            "{}",
            Color::Green.paint(format!("{checked} files checked in {elapsed:.2?}"))
        );
    } else {
        println!(
            "{}",
            Color::Red.paint(format!(
                "{failed} of {checked} files failed in {elapsed:.2?}"
            ))
        );
        std::process::exit(1);
    }
}

fn check_file(
    file: &Path,
    compile_options: &CompileOptions,
    generate_options: GenerateOptions,
    org: &str,
    service: &str,
) -> bool {
    let path = file.display().to_string();
    let contents = match std::fs::read_to_string(file) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("{}", Color::Red.paint(format!("Error reading {path}: {e}")));
            return false;
        }
    };
    let schema = match compile_str(&contents, compile_options) {
        Ok(schema) => schema,
        Err(e) => {
            print_error(
                &e,
                Some(SourceFile {
                    path: &path,
                    source: &contents,
                }),
            );
            return false;
        }
    };
    match generate_instance_model(&schema, org, service, generate_options) {
        Ok(generator) => {
            tracing::debug!(%path, elements = generator.model().len(), "generated instance model");
            true
        }
        Err(e) => {
            print_error(&Error::from(e), None);
            false
        }
    }
}
