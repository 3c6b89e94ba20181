//! Instance-model command - builds and edits the path-keyed model of a schema.
//!
//! Removals are applied before expansions, each in the order given.

use std::path::PathBuf;

use xsdform::report::SourceFile;
use xsdform::{
    CompileOptions, Error, ExpansionPolicy, GenerateOptions, Schema, compile_str,
    generate_instance_model,
};

use crate::util::{
    LoadedConfig, display_path, exit_with_error, fail, input_file, read_input, write_json,
};

#[derive(clap::Args)]
pub struct Args {
    /// Path to XSD file (use - for stdin)
    pub file: String,
    /// Read a compiled JSON Schema instead of XSD
    #[arg(long)]
    pub from_schema: bool,
    /// Organisation that owns the form
    #[arg(long)]
    pub org: Option<String>,
    /// Service the form belongs to
    #[arg(long)]
    pub service: Option<String>,
    /// Expansion policy for shared types: first-occurrence or per-branch
    #[arg(long)]
    pub policy: Option<ExpansionPolicy>,
    /// Expand the group at this path (repeatable)
    #[arg(long = "expand", value_name = "PATH")]
    pub expand: Vec<String>,
    /// Remove every descendant of this path (repeatable)
    #[arg(long = "remove", value_name = "PATH")]
    pub remove: Vec<String>,
    /// Write the model to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Pretty print JSON output
    #[arg(short, long)]
    pub pretty: bool,
}

pub fn run(args: Args, config: &LoadedConfig) {
    let file_opt = input_file(&args.file);
    let contents = read_input(file_opt).unwrap_or_else(|e| fail(e));

    let schema = if args.from_schema {
        serde_json::from_str::<Schema>(&contents).unwrap_or_else(|e| {
            fail(format!("{}: invalid JSON Schema: {e}", display_path(file_opt)))
        })
    } else {
        let options = CompileOptions {
            schema_id: config.config.compile.schema_id.clone(),
        };
        compile_str(&contents, &options).unwrap_or_else(|e| {
            exit_with_error(
                &e,
                Some(SourceFile {
                    path: display_path(file_opt),
                    source: &contents,
                }),
            )
        })
    };

    let settings = &config.config.instance_model;
    let org = args
        .org
        .or_else(|| settings.org.clone())
        .unwrap_or_else(|| fail("no organisation given: pass --org or set it in Xsdform.toml"));
    let service = args
        .service
        .or_else(|| settings.service.clone())
        .unwrap_or_else(|| fail("no service given: pass --service or set it in Xsdform.toml"));
    let options = GenerateOptions {
        policy: args
            .policy
            .or(settings.expansion_policy)
            .unwrap_or_default(),
    };

    let mut generator = generate_instance_model(&schema, &org, &service, options)
        .unwrap_or_else(|e| exit_with_error(&Error::from(e), None));
    for path in &args.remove {
        if let Err(e) = generator.remove_path(path) {
            exit_with_error(&Error::from(e), None);
        }
    }
    for path in &args.expand {
        if let Err(e) = generator.expand_path(path) {
            exit_with_error(&Error::from(e), None);
        }
    }

    if let Err(e) = write_json(generator.model(), args.pretty, args.output.as_deref()) {
        fail(format!("{e:#}"));
    }
}
