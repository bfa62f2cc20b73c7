use c_ast::ClangParser;
use clap::Parser;
use csbind_generate::cli::{Args, initialize};
use csbind_generate::{Error, Outcome, resolve_output_dir, run};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    if let Err(e) = generate(&args) {
        error!("Error: {e}");
        std::process::exit(1);
    }
}

fn generate(args: &Args) -> Result<(), Error> {
    let Some(config) = initialize(args)? else {
        return Ok(());
    };
    let exe_dir = exe_dir()?;
    let output_dir = resolve_output_dir(args.output.as_deref(), &exe_dir);
    let includes = config.includes_dir(&exe_dir);
    let parser = ClangParser::new(&config.clang, &includes);

    match run(&config, &parser, &includes, &output_dir)? {
        Outcome::Generated { files } => {
            info!("Generated {} files in {}", files.len(), output_dir.display());
        }
        // A header that does not compile is reported, not treated as a failure of the tool.
        Outcome::Aborted {
            header,
            diagnostics,
        } => {
            eprintln!("{}:", header.display());
            for line in diagnostics {
                eprintln!("  {line}");
            }
        }
    }
    Ok(())
}

fn exe_dir() -> Result<PathBuf, Error> {
    let exe = std::env::current_exe().map_err(|e| csbind_core::Error::io("current executable", e))?;
    Ok(exe
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".")))
}
