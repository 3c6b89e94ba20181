//! Compile command - turns an XSD file into a JSON Schema document.

use std::path::PathBuf;

use xsdform::report::SourceFile;
use xsdform::{CompileOptions, compile_str};

use crate::util::{
    LoadedConfig, display_path, exit_with_error, fail, input_file, read_input, write_json,
};

#[derive(clap::Args)]
pub struct Args {
    /// Path to XSD file to compile (use - for stdin)
    pub file: String,
    /// Write the schema to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// `$id` of the compiled schema
    #[arg(long)]
    pub schema_id: Option<String>,
    /// Pretty print JSON output
    #[arg(short, long)]
    pub pretty: bool,
}

pub fn run(args: Args, config: &LoadedConfig) {
    let file_opt = input_file(&args.file);
    let contents = read_input(file_opt).unwrap_or_else(|e| fail(e));

    let options = CompileOptions {
        schema_id: args
            .schema_id
            .or_else(|| config.config.compile.schema_id.clone()),
    };
    let schema = match compile_str(&contents, &options) {
        Ok(schema) => schema,
        Err(e) => exit_with_error(
            &e,
            Some(SourceFile {
                path: display_path(file_opt),
                source: &contents,
            }),
        ),
    };

    let pretty = args.pretty || config.config.compile.pretty;
    if let Err(e) = write_json(&schema, pretty, args.output.as_deref()) {
        fail(format!("{e:#}"));
    }
}
