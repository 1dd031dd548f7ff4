//! classforge: generate a CRUD application from a class description
//!
//! Usage:
//!   classforge shop.classes -o ./out --flavor seaorm
//!   classforge shop.classes --params flavor=laravel,connection=pgsql,namespace=Shop

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classforge::{Diagnostics, Flavor, Generation, GenerationConfig, SkippedClass};

mod writer;

use writer::FileWriter;

#[derive(Parser, Debug)]
#[command(name = "classforge")]
#[command(about = "Generate a CRUD application from a class description")]
struct Args {
    /// Class description document
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "generated")]
    output: PathBuf,

    /// Parameter string, e.g. `flavor=seaorm,connection=sqlite`
    #[arg(long)]
    params: Option<String>,

    /// Target framework flavor (laravel, seaorm)
    #[arg(long, conflicts_with = "params")]
    flavor: Option<Flavor>,

    /// Default storage connection name
    #[arg(long)]
    connection: Option<String>,

    /// Namespace / package prefix for generated sources
    #[arg(long)]
    namespace: Option<String>,

    /// Project name used in configuration artifacts
    #[arg(long)]
    project: Option<String>,

    /// Write a JSON report of artifacts, diagnostics and skipped classes
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the destination of every artifact without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    /// `--params` or `--flavor` first, then the individual flags on top
    fn config(&self) -> anyhow::Result<GenerationConfig> {
        let mut config = match &self.params {
            Some(params) => GenerationConfig::from_params(params)?,
            None => GenerationConfig::for_flavor(self.flavor.unwrap_or_default()),
        };
        if let Some(connection) = &self.connection {
            config.connection = connection.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(project) = &self.project {
            config.project_name = project.clone();
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct Report<'a> {
    flavor: Flavor,
    artifacts: Vec<String>,
    diagnostics: &'a Diagnostics,
    skipped: &'a [SkippedClass],
}

impl<'a> From<&'a Generation> for Report<'a> {
    fn from(generation: &'a Generation) -> Self {
        Self {
            flavor: generation.flavor,
            artifacts: generation.ids(),
            diagnostics: &generation.diagnostics,
            skipped: &generation.skipped,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "classforge=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.config()?;

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let generation = classforge::generate(&source, &config)?;

    for diagnostic in &generation.diagnostics {
        eprintln!("{}", diagnostic);
    }

    let writer = FileWriter::new(&args.output, &config);
    if args.dry_run {
        for (path, artifact) in writer.plan(&generation)? {
            println!("{} -> {}", artifact.id, path.display());
        }
    } else {
        let written = writer.write(&generation)?;
        tracing::info!(
            files = written.len(),
            output = %args.output.display(),
            "Wrote generated sources"
        );
    }

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&Report::from(&generation))?;
        fs::write(report, json).with_context(|| format!("failed to write {}", report.display()))?;
    }

    Ok(())
}
