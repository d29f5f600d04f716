use orbit_backend::config::{ConfigArgs, OrbitConfig};
use orbit_backend::index::JsonFileIndex;
use orbit_backend::module::{RecordBuilder, ingest_all, read_orbit_file_names};

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "orbit-ingest")]
#[command(about = "Index Sentinel-1 orbit files for product lookups")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: ConfigArgs,

    /// Orbit file names; read one per line from stdin when none are given
    names: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = OrbitConfig::load(&cli.common.config)?;

    let _logging_guard = orbit_backend::logging::init_logging(
        &config.log_dir,
        "orbit-ingest",
        &config.log_level,
    )?;

    let storage_root = config
        .storage
        .storage_root()
        .context("No storage root configured: set storage.bucket_name, storage.url_root or BUCKET_NAME")?;
    let builder = RecordBuilder::new(storage_root);

    let table_path = config.index.table_path();
    let index = JsonFileIndex::open(&table_path)
        .await
        .with_context(|| format!("Failed to open index table {:?}", table_path))?;

    let names = if cli.names.is_empty() {
        read_orbit_file_names(std::io::stdin().lock())
            .context("Failed to read orbit file names from stdin")?
    } else {
        cli.names
    };
    tracing::info!("Ingesting {} orbit files into {:?}", names.len(), index.path());

    let summary = ingest_all(&builder, &index, &names).await;
    tracing::info!(
        "Ingestion finished: {} indexed, {} rejected, {} failed",
        summary.indexed,
        summary.rejected,
        summary.failed
    );

    if !summary.is_complete() {
        anyhow::bail!(
            "{} of {} orbit files were not indexed",
            summary.rejected + summary.failed,
            summary.total()
        );
    }
    Ok(())
}
