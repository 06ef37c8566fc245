use std::{
    env, fs, io,
    path::{Path, PathBuf},
    process,
    str::FromStr,
};

use anyhow::Result;
use clap::Parser;
use log::{debug, error};
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};
use spacing_sniffs::{load_token_file, Config, LintOutput, Linter, OutputFormatter};

const DEFAULT_CONFIG_FILE: &str = "spacing-sniffs.config.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Token dump (JSON) or directory of token dumps to lint
    target: PathBuf,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: simple or json
    #[arg(long, default_value = "simple")]
    format: String,

    /// Apply fixes and write the corrected source to --output
    #[arg(long, requires = "output")]
    fix: bool,

    /// Where to write the fixed source
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long)]
    silent: bool,

    /// Turn debugging information on
    #[arg(short, long, conflicts_with = "silent")]
    debug: bool,
}

fn setup_logging(args: &Args) -> Result<LevelFilter> {
    let log_level = match (args.silent, args.debug) {
        (true, _) => LevelFilter::Error,
        (_, true) => LevelFilter::Debug,
        _ => LevelFilter::Info,
    };
    TermLogger::init(
        log_level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    Ok(log_level)
}

fn load_config(current_dir: &Path, config: Option<&PathBuf>) -> Result<Config> {
    match config {
        Some(config) => Config::from_config_file(current_dir.join(config)),
        None => {
            let default_path = current_dir.join(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                debug!("Using default config at {default_path:?}");
                Config::from_config_file(default_path)
            } else {
                debug!("No config file found, using defaults");
                Ok(Config::default())
            }
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let current_dir = env::current_dir()?;
    let target = current_dir.join(&args.target);
    debug!("Lint target is {target:?}");

    let formatter = OutputFormatter::from_str(&args.format)?;

    let linter = match load_config(&current_dir, args.config.as_ref())
        .and_then(|config| Linter::builder().config(config).build())
    {
        Ok(linter) => linter,
        Err(err) => {
            error!("Invalid configuration: {err:#}");
            return Ok(exitcode::CONFIG);
        }
    };

    let outputs = if args.fix {
        if target.is_dir() {
            anyhow::bail!("--fix needs a single token dump, not a directory");
        }
        let file = load_token_file(&target)?;
        let summary = linter.fix(&file)?;
        if let Some(output) = args.output.as_ref() {
            let output = current_dir.join(output);
            fs::write(&output, summary.fixed_source())?;
            debug!(
                "Applied {} correction(s) in {} pass(es), wrote {output:?}",
                summary.corrections_applied, summary.passes
            );
        }
        vec![LintOutput::new(target.to_string_lossy(), summary.remaining)]
    } else {
        linter.lint_path(&target)?
    };

    if !args.silent || !formatter.should_log_metadata() {
        formatter.format(&outputs, &mut io::stdout())?;
    }

    if outputs.iter().any(LintOutput::has_errors) {
        Ok(exitcode::DATAERR)
    } else {
        Ok(exitcode::OK)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = setup_logging(&args)?;
    debug!("Log level set to {log_level}");

    let code = run(args).inspect_err(|err| error!("{err:#}"))?;
    process::exit(code);
}
