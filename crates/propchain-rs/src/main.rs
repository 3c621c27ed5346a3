//! Command-line entry point: resolve an inheritable properties chain and print it.

use anyhow::Context;
use clap::Parser;
use log::{debug, info};
use propchain_rs::config::{FileSystemFetcher, ProcessEnv, resolve_chain};
use propchain_rs::{OutputFormat, ResolutionOptions, init_logging, render};
use std::path::PathBuf;

/// Command-line options for the resolver.
#[derive(Parser)]
#[command(name = "propchain", version)]
struct Cli {
    /// Location of the properties file to resolve (`classpath:`, `file:` or a path)
    location: String,
    /// Optional path to a propchain.json5 options file
    #[arg(long)]
    options: Option<PathBuf>,
    /// Directory searched for `classpath:` locations (repeatable, in order)
    #[arg(long = "classpath")]
    classpath: Vec<PathBuf>,
    /// Base directory for relative locations (defaults to the working directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Leave unresolvable placeholders as literal text
    #[arg(long)]
    ignore_unresolvable: bool,
    /// Override the reserved parent key
    #[arg(long)]
    extends_key: Option<String>,
    /// Output encoding
    #[arg(long, value_enum, default_value_t = OutputFormat::Properties)]
    format: OutputFormat,
    /// Print the loaded ancestor chain to stderr
    #[arg(long)]
    show_chain: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    info!(
        "starting propchain (location={}, options_set={}, classpath_roots={})",
        cli.location,
        cli.options.is_some(),
        cli.classpath.len()
    );

    let mut options = match cli.options.as_ref() {
        Some(path) => ResolutionOptions::load_from_path(path).context("failed to load options")?,
        None => ResolutionOptions::load_user_default().context("failed to load user options")?,
    };
    if cli.ignore_unresolvable {
        options.ignore_unresolvable = true;
    }
    if let Some(key) = cli.extends_key {
        options.extends_key = key;
    }
    debug!("effective options: {options:?}");

    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("cwd")?,
    };
    let fetcher = cli
        .classpath
        .iter()
        .fold(FileSystemFetcher::new(&base_dir), |fetcher, root| {
            fetcher.with_classpath_root(root)
        });

    let resolved = resolve_chain(&cli.location, &options, &fetcher, &ProcessEnv)
        .with_context(|| format!("failed to resolve {}", cli.location))?;
    if cli.show_chain {
        for location in &resolved.chain {
            eprintln!("{location}");
        }
    }

    print!("{}", render(&resolved.properties, cli.format)?);
    if cli.format == OutputFormat::Json {
        println!();
    }
    Ok(())
}
