use crate::constants::{exit_codes, verbosity};
use clap::{error::ErrorKind, CommandFactory, Parser};
use log::LevelFilter;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#;

/// CLI arguments for jetset.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Render a template from a template directory",
    long_about = None
)]
pub struct Args {
    /// Template to render, relative to the template root.
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Directory templates are loaded from.
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Set options file (`.json`, `.yaml` or `.yml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root data value as a JSON string or `-` to read from stdin.
    #[arg(short, long)]
    pub data: Option<String>,

    /// Execution variable as `KEY=VALUE` (repeatable).
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// Extension candidate replacing the configured list (repeatable).
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Reload and reparse templates on every lookup.
    #[arg(long)]
    pub dev: bool,

    /// Write dynamic values without HTML escaping.
    #[arg(long = "no-escape")]
    pub no_escape: bool,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, found '{s}'")),
    }
}

/// Parse command line arguments with custom handling for missing required inputs.
pub fn get_args() -> Args {
    Args::try_parse().unwrap_or_else(|e| {
        if e.kind() == ErrorKind::MissingRequiredArgument {
            let mut command = Args::command().help_template(HELP_TEMPLATE);
            if let Err(print_err) = command.print_help() {
                eprintln!("Failed to display help information: {print_err}");
            } else {
                println!();
            }
            std::process::exit(exit_codes::FAILURE);
        } else {
            e.exit();
        }
    })
}

/// Map `-v` counts to the appropriate log level.
pub fn get_log_level_from_verbose(verbose_count: u8) -> LevelFilter {
    match verbose_count {
        verbosity::OFF => LevelFilter::Error,
        verbosity::INFO => LevelFilter::Info,
        verbosity::DEBUG => LevelFilter::Debug,
        verbosity::TRACE.. => LevelFilter::Trace,
    }
}
