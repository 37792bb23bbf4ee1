use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;

use pir_core::config::{self, CONFIG_FILE_NAME, GeneratorConfig};
use pir_core::parse::{self, source_map::SourceMap, spec::OpenApiSpec};
use pir_core::transform::{self, Generated};

#[derive(Parser)]
#[command(
    name = "pir",
    about = "Generate a provider schema IR from an OpenAPI 3.x document",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the provider IR from an OpenAPI document
    Generate {
        /// Path to the OpenAPI document (YAML or JSON)
        input: PathBuf,

        /// Path to the generator config
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,

        /// Write the IR here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a document and config without writing anything
    Validate {
        /// Path to the OpenAPI document (YAML or JSON)
        input: PathBuf,

        /// Path to the generator config
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
    },

    /// Write a starter generator config
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            config,
            output,
        } => cmd_generate(&input, &config, output.as_deref()),

        Commands::Validate { input, config } => cmd_validate(&input, &config),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "pir", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_spec(path: &Path) -> Result<(OpenApiSpec, SourceMap)> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let parsed = match ext {
        "json" => parse::from_json(&content),
        _ => parse::from_yaml(&content),
    };
    let parsed = parsed.map_err(|e| match e.line() {
        Some(line) => anyhow::anyhow!("{}: {e} (line {line})", path.display()),
        None => anyhow::anyhow!("{}: {e}", path.display()),
    })?;

    Ok((parsed, SourceMap::new(&content)))
}

fn load_config(path: &Path) -> Result<GeneratorConfig> {
    let cfg = config::load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}

fn run(input: &Path, config_path: &Path) -> Result<Generated> {
    let cfg = load_config(config_path)?;
    let (spec, source) = load_spec(input)?;
    log::debug!(
        "{}: {} paths, {} resources and {} data sources configured",
        input.display(),
        spec.paths.len(),
        cfg.resources.len(),
        cfg.data_sources.len()
    );
    let generated = transform::generate_with_source(&spec, &cfg, Some(&source))?;
    Ok(generated)
}

fn print_summary(generated: &Generated) {
    let ir = &generated.ir;
    eprintln!("  Provider: {}", ir.provider.name);
    eprintln!("  Resources: {}", ir.resources.len());
    eprintln!("  Data sources: {}", ir.data_sources.len());

    if !generated.skipped.is_empty() {
        eprintln!("Skipped {}:", generated.skipped.len());
        for skipped in &generated.skipped {
            eprintln!("  {} {skipped}", skipped.kind.as_str());
        }
    }
}

fn cmd_generate(input: &Path, config_path: &Path, output: Option<&Path>) -> Result<()> {
    let generated = run(input, config_path)?;
    let json = serde_json::to_string_pretty(&generated.ir)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }

    print_summary(&generated);
    Ok(())
}

fn cmd_validate(input: &Path, config_path: &Path) -> Result<()> {
    let generated = run(input, config_path)?;
    eprintln!("Valid document and config: {}", input.display());
    print_summary(&generated);
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
