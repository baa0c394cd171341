use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use femx_io::{
    ElmerMode, FrameMode, IngestOptions, IngestStatus, IngestionResult, Ingestor, Severity,
    Snapshot, SourceFormat, save_snapshot,
};
use femx_model::MeshStatistics;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "femx", author, version, about = "Read FEM meshes and results from Elmer, Frame3DD and SU2 files", long_about = None)]
struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "warn", global = true)]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a summary of a mesh or result file
    Inspect {
        #[command(flatten)]
        source: SourceArgs,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the ingested mesh and results to a JSON snapshot
    Export {
        #[command(flatten)]
        source: SourceArgs,
        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Mesh file, Frame3DD case/report, or Elmer mesh directory
    path: PathBuf,
    /// Force the input format instead of detecting it from the path
    #[arg(long)]
    format: Option<SourceFormat>,
    /// Read the Elmer boundary mesh instead of the volume mesh
    #[arg(long)]
    boundary: bool,
    /// Force the Frame3DD reading mode
    #[arg(long, value_enum)]
    frame_mode: Option<FrameModeArg>,
    /// JSON file with ingestion options; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Skip the result node-id check
    #[arg(long)]
    no_validate: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FrameModeArg {
    Geometry,
    Results,
}

impl From<FrameModeArg> for FrameMode {
    fn from(mode: FrameModeArg) -> Self {
        match mode {
            FrameModeArg::Geometry => FrameMode::Geometry,
            FrameModeArg::Results => FrameMode::Results,
        }
    }
}

impl SourceArgs {
    fn options(&self) -> std::io::Result<IngestOptions> {
        let mut options = match &self.config {
            Some(path) => IngestOptions::from_json_file(path)?,
            None => IngestOptions::default(),
        };
        if let Some(format) = self.format {
            options.format = Some(format);
        }
        if self.boundary {
            options.elmer_mode = ElmerMode::Boundary;
        }
        if let Some(mode) = self.frame_mode {
            options.frame_mode = Some(mode.into());
        }
        if self.no_validate {
            options.validate_references = false;
        }
        Ok(options)
    }
}

fn status_name(status: IngestStatus) -> &'static str {
    match status {
        IngestStatus::Complete => "complete",
        IngestStatus::EmptyMesh => "empty_mesh",
        IngestStatus::StructuralFailure => "structural_failure",
    }
}

fn exit_code(result: &IngestionResult) -> ExitCode {
    if result.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn print_mesh(stats: &MeshStatistics) {
    println!("nodes: {}", stats.num_nodes);
    println!("elements: {}", stats.num_elements);
    for (kind, count) in &stats.per_kind {
        println!("  {}: {count}", kind.bucket_name());
    }
}

fn print_summary(result: &IngestionResult) {
    println!("source: {}", result.source.display());
    match result.format {
        Some(format) => println!("format: {format}"),
        None => println!("format: unknown"),
    }
    println!("status: {}", status_name(result.status));
    print_mesh(&result.mesh.statistics());
    println!("result_sets: {}", result.increments());
    for set in &result.results {
        println!("  {}: {} displacements", set.name, set.displacements.len());
    }
    if !result.inout_nodes.is_empty() {
        println!("inout_nodes: {} rows", result.inout_nodes.len());
    }
    println!(
        "diagnostics: {} info, {} warnings, {} errors",
        result.diagnostics.count(Severity::Info),
        result.diagnostics.warning_count(),
        result.diagnostics.error_count()
    );
    for diagnostic in result.diagnostics.iter() {
        if diagnostic.severity != Severity::Info {
            println!("  {diagnostic}");
        }
    }
}

fn print_json_summary(result: &IngestionResult) -> serde_json::Result<()> {
    let summary = serde_json::json!({
        "source": result.source,
        "format": result.format,
        "status": result.status,
        "mesh": result.mesh.statistics(),
        "result_sets": result.results.iter().map(|set| &set.name).collect::<Vec<_>>(),
        "inout_nodes": result.inout_nodes.len(),
        "diagnostics": result.diagnostics,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn ingest(source: &SourceArgs) -> Result<IngestionResult, ExitCode> {
    let options = source.options().map_err(|err| {
        eprintln!("cannot load options: {err}");
        ExitCode::from(2)
    })?;
    Ok(Ingestor::new(options).ingest(&source.path))
}

fn export(result: &IngestionResult, output: &Path) -> ExitCode {
    let snapshot = Snapshot::new(result.clone()).generated_at(chrono::Utc::now().to_rfc3339());
    if let Err(err) = save_snapshot(output, &snapshot) {
        error!("failed to write snapshot {}: {err}", output.display());
        eprintln!("cannot write {}: {err}", output.display());
        return ExitCode::from(1);
    }
    info!("snapshot written to {}", output.display());
    println!(
        "wrote {} ({}, {} nodes, {} result sets)",
        output.display(),
        status_name(result.status),
        result.mesh.node_count(),
        result.increments()
    );
    exit_code(result)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install the log subscriber");
    }

    match &cli.command {
        Commands::Inspect { source, json } => {
            let result = match ingest(source) {
                Ok(result) => result,
                Err(code) => return code,
            };
            if *json {
                if let Err(err) = print_json_summary(&result) {
                    eprintln!("cannot encode summary: {err}");
                    return ExitCode::from(1);
                }
            } else {
                print_summary(&result);
            }
            exit_code(&result)
        }
        Commands::Export { source, output } => match ingest(source) {
            Ok(result) => export(&result, output),
            Err(code) => code,
        },
    }
}
