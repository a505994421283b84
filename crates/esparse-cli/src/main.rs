#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod logging;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use esparse::{parse_source, to_estree, Context, ParseError, ParserOptions, SourceType};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{CliError, SyntaxReport};

#[derive(Parser, Debug)]
#[command(name = "esparse")]
#[command(author, version, about = "Parse ECMAScript files and print ESTree JSON", long_about = None)]
struct Cli {
    /// Files to parse
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// JSON file with parser options (command line flags override it)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only check for errors, print no AST
    #[arg(long)]
    check: bool,

    /// Emit one machine-readable JSON result object on stdout
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write logs to stderr as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(flatten)]
    options: OptionFlags,
}

/// Flags mirroring [`ParserOptions`]. Each one only overrides the config
/// file when given.
#[derive(clap::Args, Debug)]
struct OptionFlags {
    /// Parse with the module goal
    #[arg(long)]
    module: bool,

    /// Enable all staged grammar extensions
    #[arg(long)]
    next: bool,

    /// Enable Annex B web compatibility syntax
    #[arg(long)]
    webcompat: bool,

    /// Keep block-scoped redeclaration checks under --webcompat
    #[arg(long)]
    lexical: bool,

    /// Add start, end and range to every node
    #[arg(long)]
    ranges: bool,

    /// Add line/column locations to every node
    #[arg(long)]
    loc: bool,

    /// Add the source text of literals
    #[arg(long)]
    raw: bool,

    /// Parse in strict mode from the start
    #[arg(long)]
    implied_strict: bool,

    /// Allow `return` at the top level
    #[arg(long)]
    global_return: bool,

    /// Skip validation of regular expression bodies
    #[arg(long)]
    no_validate_regex: bool,

    /// Goal and source type reported on the program
    #[arg(long, value_enum, value_name = "TYPE")]
    source_type: Option<SourceTypeArg>,

    /// Maximum nesting depth
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SourceTypeArg {
    Script,
    Module,
    Commonjs,
}

impl From<SourceTypeArg> for SourceType {
    fn from(arg: SourceTypeArg) -> Self {
        match arg {
            SourceTypeArg::Script => SourceType::Script,
            SourceTypeArg::Module => SourceType::Module,
            SourceTypeArg::Commonjs => SourceType::Commonjs,
        }
    }
}

impl OptionFlags {
    fn apply(&self, options: &mut ParserOptions) {
        options.module |= self.module;
        options.next |= self.next;
        options.webcompat |= self.webcompat;
        options.lexical |= self.lexical;
        options.ranges |= self.ranges;
        options.loc |= self.loc;
        options.raw |= self.raw;
        options.implied_strict |= self.implied_strict;
        options.global_return |= self.global_return;
        if self.no_validate_regex {
            options.validate_regex = false;
        }
        if let Some(source_type) = self.source_type {
            options.source_type = source_type.into();
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(2)
        }
    }
}

/// Parse every file. Returns whether all of them parsed.
fn run(cli: &Cli) -> Result<bool, CliError> {
    let mut options = match &cli.config {
        Some(path) => load_config(path)?,
        None => ParserOptions::default(),
    };
    cli.options.apply(&mut options);
    debug!(?options, "resolved parser options");

    let mut all_ok = true;
    let mut results = Vec::new();
    for path in &cli.files {
        let source = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        let name = path.display().to_string();

        match parse_source(&source, &options, Context::empty()) {
            Ok(program) => {
                info!(file = %name, statements = program.body.len(), "parsed");
                let ast = (!cli.check).then(|| to_estree(&program, &source, &options));
                if cli.json {
                    let mut result = json!({ "file": name, "ok": true });
                    if let Some(ast) = ast {
                        result["ast"] = ast;
                    }
                    results.push(result);
                } else if let Some(ast) = ast {
                    print_json(&ast)?;
                } else {
                    println!("{name}: ok");
                }
            }
            Err(err) => {
                all_ok = false;
                info!(file = %name, error = %err, "parse failed");
                if cli.json {
                    results.push(json!({ "file": name, "ok": false, "error": error_json(&err) }));
                } else {
                    let report = miette::Report::new(SyntaxReport::new(&name, &source, &err));
                    eprintln!("{report:?}");
                }
            }
        }
    }

    if cli.json {
        print_json(&json!({ "ok": all_ok, "files": results }))?;
    }
    Ok(all_ok)
}

fn load_config(path: &Path) -> Result<ParserOptions, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}

fn error_json(err: &ParseError) -> Value {
    json!({
        "name": err.name(),
        "message": err.to_string(),
        "description": err.description(),
        "kind": format!("{:?}", err.kind()),
        "start": err.span.start,
        "end": err.span.end,
        "loc": err.loc,
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    let written = serde_json::to_writer_pretty(&mut out, value)
        .map_err(io::Error::from)
        .and_then(|()| writeln!(out));
    match written {
        // `esparse big.js | head` closes the pipe early.
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result.map_err(CliError::Output),
    }
}
