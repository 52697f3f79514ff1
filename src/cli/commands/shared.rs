//! Shared components for CLI commands
//!
//! Logging setup, layered configuration, school data loading and the
//! progress bar used by the import commands.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::app::services::progress::ImportProgress;
use crate::app::services::repositories::{InMemoryStore, SchoolData};
use crate::cli::args::CommonArgs;
use crate::config::ImportConfig;
use crate::{Error, Result};

/// Set up structured logging on stderr
pub fn setup_logging(args: &CommonArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("grade_import={}", log_level)));

    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Defaults, then the config file, then command-line overrides
pub fn load_configuration(args: &CommonArgs) -> Result<ImportConfig> {
    let config = ImportConfig::load_layered(args.config_file.as_deref())?;
    let config = args.apply_overrides(config);
    config.validate().map_err(Error::configuration)?;
    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

/// Path of the school data file; required by every data-backed command
pub fn data_path(args: &CommonArgs) -> Result<&Path> {
    args.data_file
        .as_deref()
        .ok_or_else(|| Error::configuration("A school data file is required (--data FILE)"))
}

/// Load the school data file into an in-memory store
pub fn load_store(args: &CommonArgs) -> Result<(Arc<InMemoryStore>, PathBuf)> {
    let path = data_path(args)?;
    let data = SchoolData::load(path)?;
    info!(
        "Loaded {} classes, {} subjects, {} students, {} notes from {}",
        data.classes.len(),
        data.subjects.len(),
        data.students.len(),
        data.notes.len(),
        path.display()
    );
    Ok((Arc::new(InMemoryStore::new(data)), path.to_path_buf()))
}

/// Write the store back to its data file
pub async fn save_store(store: &InMemoryStore, path: &Path) -> Result<()> {
    store.snapshot().await.save(path)?;
    info!("Saved school data to {}", path.display());
    Ok(())
}

/// Read an uploaded spreadsheet into memory
pub async fn read_upload(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::file_not_found(path.display().to_string()));
    }
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))
}

/// Print any result as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Progress bar over the 0-100 import percentage
pub fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Mirror one progress update on the bar
pub fn update_progress_bar(pb: &ProgressBar, progress: &ImportProgress) {
    pb.set_position(u64::from(progress.progress));
    pb.set_message(format!("[{}] {}", progress.stage, progress.message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::progress::ImportStage;
    use crate::cli::args::{Args, Commands};
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn common(extra: &[&str]) -> CommonArgs {
        let mut argv = vec!["grade-import", "info"];
        argv.extend_from_slice(extra);
        match Args::try_parse_from(argv).unwrap().command {
            Some(Commands::Info(info)) => info.common,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_configuration_layers_file_and_flags() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = 20").unwrap();
        writeln!(file, "max_rows = 300").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = load_configuration(&common(&["--config", &path, "--max-rows", "40"])).unwrap();
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.max_rows, 40);
    }

    #[test]
    fn test_zero_override_is_rejected() {
        let result = load_configuration(&common(&["--batch-size", "0"]));
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_data_file_is_required() {
        assert!(matches!(load_store(&common(&[])), Err(Error::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_missing_upload_is_reported() {
        let result = read_upload(Path::new("/nonexistent/notes.xlsx")).await;
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_progress_bar_follows_updates() {
        let pb = create_progress_bar();
        update_progress_bar(
            &pb,
            &ImportProgress {
                stage: ImportStage::Saving,
                progress: 72,
                message: "Saved batch 2 of 3".into(),
                current_row: None,
                total_rows: None,
            },
        );
        assert_eq!(pb.position(), 72);
        assert_eq!(pb.message(), "[saving] Saved batch 2 of 3");
    }
}
