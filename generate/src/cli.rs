//! The command-line arguments and configuration system for the `generate` binary.

use clap::Parser;
use config::FileFormat::Toml;
use csbind_core::Error;
use csbind_core::config::{Config, DEFAULT_CONFIG};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Command-line arguments for the `generate` binary.
#[derive(Debug, Parser)]
#[command(name = "generate", about = "Generates C# interop bindings from C headers")]
pub struct Args {
    /// Directory to write the bindings to; `Generated` is appended unless already present.
    /// Relative paths resolve against the executable's directory, which is also the default.
    pub output: Option<PathBuf>,

    /// Set a configuration value; format $NAME=$VALUE.
    #[arg(long, short)]
    pub config: Vec<String>,

    /// Prints out the location of the config file.
    #[arg(long)]
    pub print_config_path: bool,

    /// Enable debug logging.
    #[arg(long, short)]
    pub verbose: bool,
}

/// Performs parsing and validation of the config; to be called by main() before doing any work.
///
/// Returns the config, or None if a command line flag that calls for an early exit (such as
/// --print-config-path) was provided.
pub fn initialize(args: &Args) -> Result<Option<Config>, Error> {
    let dirs = ProjectDirs::from("", "", "csbind").ok_or(Error::NoHomeDir)?;
    if args.print_config_path {
        println!("Config file location: {:?}", config_file(dirs.config_dir()));
        return Ok(None);
    }
    let config = load_config(args, dirs.config_dir())?;
    for key in config.unknown_keys() {
        warn!("Unknown config key {key}");
    }
    Ok(Some(config))
}

fn load_config(args: &Args, config_dir: &Path) -> Result<Config, Error> {
    let mut settings = config::Config::builder()
        .add_source(config::File::from_str(DEFAULT_CONFIG, Toml))
        .add_source(config::File::from(config_file(config_dir)).required(false))
        .add_source(config::File::from(PathBuf::from("csbind.toml")).required(false));
    for config_arg in &args.config {
        let Some((name, value)) = config_arg.split_once('=') else {
            return Err(Error::Override(config_arg.clone()));
        };
        settings = settings.set_override(name, value)?;
    }
    Ok(settings.build()?.try_deserialize()?)
}

/// Returns the config file path, given the config directory.
fn config_file(config_dir: &Path) -> PathBuf {
    [config_dir, "generate.toml".as_ref()].iter().collect()
}
