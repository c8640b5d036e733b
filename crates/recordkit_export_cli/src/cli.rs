use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use recordkit_export_xlsx::{RecordExporter, SpecExportConfig, SpecExportRequest};
use tracing::info;

use crate::input::{load_record, load_resolvers};

#[derive(Parser, Debug)]
#[command(name = "recordkit-export")]
#[command(about = "Export one record as a two-column XLSX document", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Record JSON file.
    #[arg(long)]
    pub record: PathBuf,

    /// Resolver table JSON file (`files` and `terms` maps).
    #[arg(long)]
    pub resolvers: Option<PathBuf>,

    /// Exporter TOML configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Display name of the requesting user.
    #[arg(long, default_value = "anonymous")]
    pub user: String,

    /// Treat the user as lacking the export permission.
    #[arg(long)]
    pub deny: bool,

    /// Output directory or file path.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Debug-level logging.
    #[arg(long)]
    pub verbose: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    recordkit_log::init_logging(cli.verbose).map_err(anyhow::Error::msg)?;

    let record = load_record(&cli.record)?;
    let config = match &cli.config {
        Some(path) => SpecExportConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SpecExportConfig {
            content_types: vec![record.category.clone()],
            ..SpecExportConfig::default()
        },
    };
    let (files, terms) = load_resolvers(cli.resolvers.as_deref())?.into_resolvers();

    let exporter = RecordExporter::from_config(&config)?;
    let request = SpecExportRequest {
        record: &record,
        user_display_name: &cli.user,
        if_user_has_permission: !cli.deny,
    };
    let response = exporter.export(&request, &files, &terms).with_context(|| {
        format!("Export of {} {} failed", record.category, record.id)
    })?;

    let path_out = derive_output_path(&cli.out, &response.file_name);
    fs::write(&path_out, &response.body)
        .with_context(|| format!("Failed to write {}", path_out.display()))?;
    info!(path = %path_out.display(), n_bytes = response.body.len(), "export written");

    for (c_name, c_value) in &response.headers {
        println!("{c_name}: {c_value}");
    }
    println!("{}", response.report);
    for c_warning in &response.report.warnings {
        println!("  warning: {c_warning}");
    }
    println!("Wrote {}", path_out.display());
    Ok(())
}

/// Target file: `out/<file_name>` for a directory, `out` itself otherwise.
pub fn derive_output_path(out: &Path, file_name: &str) -> PathBuf {
    if out.is_dir() {
        out.join(file_name)
    } else {
        out.to_path_buf()
    }
}
