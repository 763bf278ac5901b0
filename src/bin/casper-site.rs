//! casper-site command line
//!
//! Validates site definitions and compiles them into CasperJS scripts.

use anyhow::{Context, Result};
use casper_site::{CompileOptions, IndentWidth, Site, SiteDefinition, StepRegistry, StepType};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "casper-site")]
#[command(version)]
#[command(about = "Compile site definitions into CasperJS scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a site definition into a script
    Compile {
        /// Path to the site definition (JSON)
        file: PathBuf,

        /// Spaces per indentation level (2 or 4)
        #[arg(long, short = 'i', default_value = "4")]
        indent: usize,

        /// Write the script here instead of stdout
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check a site definition and report the first error
    Validate {
        /// Path to the site definition (JSON)
        file: PathBuf,
    },

    /// List the output parameters a compiled run yields
    Params {
        /// Path to the site definition (JSON)
        file: PathBuf,
    },

    /// Print the JSON schema of a site definition or of one step type
    Schema {
        /// Step type (click, select, form, form_selector, scrape, selector)
        #[arg(long)]
        step: Option<String>,
    },

    /// Print a blank site definition or step descriptor
    Defaults {
        /// Step type; omit for a blank site
        step: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            file,
            indent,
            output,
        } => {
            let options = CompileOptions::new().indent(IndentWidth::try_from(indent)?);
            let site = load_site(&file)?;
            let script = site
                .compile(&options)
                .with_context(|| format!("Failed to compile {}", file.display()))?;

            match output {
                Some(path) => {
                    fs::write(&path, format!("{}\n", script))
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    log::info!("Wrote {}", path.display());
                }
                None => println!("{}", script),
            }
        }
        Commands::Validate { file } => {
            let site = load_site(&file)?;
            println!(
                "{}: site '{}' with {} step(s) is valid",
                file.display(),
                site.name(),
                site.steps().len()
            );
        }
        Commands::Params { file } => {
            let site = load_site(&file)?;
            println!("{}", serde_json::to_string_pretty(&site.all_params())?);
        }
        Commands::Schema { step } => {
            let schema = match step {
                Some(tag) => StepRegistry::global().parameters_schema(tag.parse::<StepType>()?)?,
                None => serde_json::to_value(schemars::schema_for!(SiteDefinition))?,
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Commands::Defaults { step } => {
            let defaults = match step {
                Some(tag) => {
                    serde_json::to_value(StepRegistry::global().defaults(tag.parse::<StepType>()?)?)?
                }
                None => serde_json::to_value(SiteDefinition::default())?,
            };
            println!("{}", serde_json::to_string_pretty(&defaults)?);
        }
    }

    Ok(())
}

fn load_site(path: &Path) -> Result<Site> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let site = Site::from_json_str(&json)
        .with_context(|| format!("Invalid site definition in {}", path.display()))?;
    log::debug!("Loaded site '{}' from {}", site.name(), path.display());
    Ok(site)
}
