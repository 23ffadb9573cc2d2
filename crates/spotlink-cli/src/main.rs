//! Spotlink CLI - Command-line interface
//!
//! Usage:
//!   spotlink annotate <infile> <outfile> [--truecase] [--relations]
//!   spotlink batch [--uncased] [--relations] [--in-dir <dir>] [--out-dir <dir>]
//!   spotlink metadata

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use spotlink_core::{vocabulary, AppConfig, LoggingConfig, Mmif};
use spotlink_extractor::AnnotationPipeline;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spotlink")]
#[command(about = "Link named entities in MMIF files to DBpedia")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate a single MMIF file
    Annotate {
        infile: PathBuf,
        outfile: PathBuf,
        /// Semi-truecase the text and keep only entities confirmed upstream
        #[arg(long)]
        truecase: bool,
        /// Extract relations from an upstream dependency layer
        #[arg(long)]
        relations: bool,
    },
    /// Annotate every .json file in a directory
    Batch {
        /// Input is lowercased; implies --truecase and the -uncased directories
        #[arg(long)]
        uncased: bool,
        #[arg(long)]
        relations: bool,
        #[arg(long)]
        in_dir: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Print the app metadata
    Metadata,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json_format {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Default batch directories, the `-uncased` pair for lowercased input
fn batch_dirs(uncased: bool) -> (PathBuf, PathBuf) {
    if uncased {
        ("input-mmif-uncased".into(), "output-mmif-uncased".into())
    } else {
        ("input-mmif".into(), "output-mmif".into())
    }
}

/// `.json` files directly inside `dir`, sorted by name
fn json_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Per-view entity and relation counts for views added by `app`
fn view_summary(mmif: &Mmif, app: &str, first_new_view: usize) -> Vec<(String, usize, usize)> {
    mmif.views
        .iter()
        .skip(first_new_view)
        .filter(|v| v.metadata.app == app)
        .map(|v| {
            (
                v.id.clone(),
                v.annotations_of_type(vocabulary::NAMED_ENTITY).count(),
                v.annotations_of_type(vocabulary::RELATION).count(),
            )
        })
        .collect()
}

async fn annotate_file(
    pipeline: &AnnotationPipeline,
    infile: &Path,
    outfile: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<Vec<(String, usize, usize)>> {
    let json = tokio::fs::read_to_string(infile)
        .await
        .with_context(|| format!("reading {}", infile.display()))?;
    let mmif = Mmif::from_json(&json).with_context(|| format!("parsing {}", infile.display()))?;
    let existing_views = mmif.views.len();

    let annotated = pipeline.annotate(mmif, cancel).await?;
    let summary = view_summary(
        &annotated,
        &pipeline.options().app_identifier,
        existing_views,
    );

    if let Some(parent) = outfile.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(outfile, annotated.to_json(true)?)
        .await
        .with_context(|| format!("writing {}", outfile.display()))?;
    Ok(summary)
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; stopping after the current linker call");
            handle.cancel();
        }
    });
    token
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Annotate {
            infile,
            outfile,
            truecase,
            relations,
        } => {
            config.annotation.semi_truecase |= truecase;
            config.annotation.extract_relations |= relations;
            let pipeline = AnnotationPipeline::from_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&pipeline.app_metadata())?);

            let summary = annotate_file(&pipeline, &infile, &outfile, &cancel_on_ctrl_c()).await?;
            for (view, entities, relations) in summary {
                println!("{view}: {entities} entities, {relations} relations");
            }
            println!("Wrote {}", outfile.display());
        }
        Commands::Batch {
            uncased,
            relations,
            in_dir,
            out_dir,
        } => {
            config.annotation.semi_truecase |= uncased;
            config.annotation.extract_relations |= relations;
            let (default_in, default_out) = batch_dirs(uncased);
            let in_dir = in_dir.unwrap_or(default_in);
            let out_dir = out_dir.unwrap_or(default_out);

            let pipeline = AnnotationPipeline::from_config(&config)?;
            let cancel = cancel_on_ctrl_c();
            let files = json_files(&in_dir)?;
            tracing::info!(files = files.len(), in_dir = %in_dir.display(), "Starting batch");

            let mut failed = 0;
            for infile in &files {
                let Some(name) = infile.file_name() else {
                    continue;
                };
                let outfile = out_dir.join(name);
                match annotate_file(&pipeline, infile, &outfile, &cancel).await {
                    Ok(summary) => {
                        let entities: usize = summary.iter().map(|(_, e, _)| e).sum();
                        let relations: usize = summary.iter().map(|(_, _, r)| r).sum();
                        println!(
                            "{}: {entities} entities, {relations} relations",
                            infile.display()
                        );
                    }
                    Err(e) => {
                        tracing::error!(file = %infile.display(), error = %e, "Annotation failed");
                        failed += 1;
                    }
                }
                if cancel.is_cancelled() {
                    break;
                }
            }

            if failed > 0 {
                anyhow::bail!("{failed} of {} files failed", files.len());
            }
        }
        Commands::Metadata => {
            let pipeline = AnnotationPipeline::from_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&pipeline.app_metadata())?);
        }
    }

    Ok(())
}
