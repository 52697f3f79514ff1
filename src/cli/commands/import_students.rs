//! `import-students` command

use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::import_notes::print_messages;
use super::shared::{load_configuration, load_store, print_json, read_upload, save_store};
use crate::Result;
use crate::app::services::roster_import::{ImportStudentsRequest, RosterImporter};
use crate::cli::args::{ImportStudentsArgs, OutputFormat};

pub async fn run_import_students(
    args: ImportStudentsArgs,
    cancellation: CancellationToken,
) -> Result<bool> {
    let config = load_configuration(&args.common)?;
    let (store, data_path) = load_store(&args.common)?;
    let buffer = read_upload(&args.file).await?;

    info!("Importing roster {} into class {}", args.file.display(), args.class_id);
    let request = ImportStudentsRequest::new(args.class_id).with_overwrite(args.overwrite);
    let summary = RosterImporter::with_store(store.clone(), config)
        .with_cancellation(cancellation)
        .execute(&buffer, &request)
        .await?;

    if summary.successful_imports > 0 {
        save_store(&store, &data_path).await?;
    }

    match args.common.output_format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text if !args.common.quiet => {
            println!("\n{}", "Roster Import Summary".bright_green().bold());
            if summary.success {
                println!("  {}", summary.message.bright_green());
            } else {
                println!("  {}", summary.message.bright_yellow());
            }
            println!(
                "  {} {} created, {} updated",
                "Students:".bright_cyan(),
                summary.created.to_string().bright_white().bold(),
                summary.updated.to_string().bright_white().bold()
            );
            print_messages("Errors", &summary.errors, true);
            print_messages("Warnings", &summary.warnings, false);
        }
        OutputFormat::Text => {}
    }
    Ok(summary.success)
}
