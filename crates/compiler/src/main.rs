use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use modelmark_compiler::{
    compile_schema, entity_summary, format_diagnostics, CompilerConfig, DialectSetting,
};
use tracing::Level;

/// Modelmark schema checker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Schema file to check
    #[arg(short, long)]
    input: PathBuf,

    /// Configuration file (`modelmark.toml`)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Surface dialect; overrides the configuration file
    #[arg(short, long, value_enum)]
    dialect: Option<DialectSetting>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let config = match &args.config {
        Some(path) => CompilerConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CompilerConfig::default(),
    };
    let mut options = config.options();
    if let Some(dialect) = args.dialect {
        options.dialect = dialect.into();
    }

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    match compile_schema(&source, &options) {
        Ok(output) => {
            if !output.warnings.is_empty() {
                println!("{}", format_diagnostics(&source, output.warnings.all(), true));
            }
            for entity in output.document.entities() {
                println!("{}", entity_summary(entity));
            }
            println!("{}: ok ({})", args.input.display(), output.warnings.summary());
            Ok(true)
        }
        Err(err) => {
            println!("{}", format_diagnostics(&source, err.diagnostics(), true));
            eprintln!("{}: {err}", args.input.display());
            Ok(false)
        }
    }
}
