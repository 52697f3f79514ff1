//! `import-notes` command

use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::shared::{
    create_progress_bar, load_configuration, load_store, print_json, read_upload, save_store,
    update_progress_bar,
};
use crate::Result;
use crate::app::services::notes_import::{ImportNotesRequest, ImportSummary, NotesImporter};
use crate::app::services::progress::ImportProgress;
use crate::cli::args::{ImportNotesArgs, OutputFormat};

pub async fn run_import_notes(args: ImportNotesArgs, cancellation: CancellationToken) -> Result<bool> {
    debug!("Command line arguments: {:?}", args);
    let config = load_configuration(&args.common)?;
    let (store, data_path) = load_store(&args.common)?;
    let buffer = read_upload(&args.file).await?;

    let mut request = ImportNotesRequest::new(args.subject_id)
        .with_overwrite(args.overwrite)
        .with_validate_only(args.validate_only);
    request.class_id = args.class_id;
    request.teacher_id = args.teacher_id;

    info!("Importing {} for subject {}", args.file.display(), args.subject_id);
    let importer =
        NotesImporter::with_store(store.clone(), config).with_cancellation(cancellation);

    let summary = if args.common.show_progress() {
        let pb = create_progress_bar();
        let mut on_progress = |progress: &ImportProgress| update_progress_bar(&pb, progress);
        let summary = importer
            .execute(&buffer, &request, Some(&mut on_progress))
            .await;
        pb.finish_and_clear();
        summary?
    } else {
        importer.execute(&buffer, &request, None).await?
    };

    if !summary.validate_only && summary.successful_imports > 0 {
        save_store(&store, &data_path).await?;
    }

    match args.common.output_format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text if !args.common.quiet => print_summary(&summary),
        OutputFormat::Text => {}
    }
    Ok(summary.success)
}

fn print_summary(summary: &ImportSummary) {
    let title = if summary.validate_only {
        "Validation Summary"
    } else {
        "Import Summary"
    };
    println!("\n{}", title.bright_green().bold());

    let headline = if summary.success {
        summary.message.bright_green()
    } else {
        summary.message.bright_yellow()
    };
    println!("  {}", headline);
    println!(
        "  {} {} total, {} valid, {} invalid",
        "Rows:".bright_cyan(),
        summary.total_rows,
        summary.valid_rows.to_string().bright_white().bold(),
        summary.invalid_rows
    );
    println!(
        "  {} {} created, {} updated, {} skipped",
        "Notes:".bright_cyan(),
        summary.created_notes.to_string().bright_white().bold(),
        summary.updated_notes.to_string().bright_white().bold(),
        summary.skipped_duplicates
    );
    if summary.students_not_found > 0 {
        println!(
            "  {} {}",
            "Students not found:".bright_red(),
            summary.students_not_found.to_string().bright_red().bold()
        );
    }

    let stats = &summary.statistics;
    if let Some(average) = stats.average_final {
        println!(
            "  {} average {:.2}, pass rate {:.1}%, completion {:.1}%",
            "Grades:".bright_cyan(),
            average,
            stats.pass_rate,
            stats.completion_rate
        );
    }

    print_messages("Errors", &summary.errors, true);
    print_messages("Warnings", &summary.warnings, false);
}

/// Print a list of row messages under a heading
pub fn print_messages(heading: &str, messages: &[String], is_error: bool) {
    if messages.is_empty() {
        return;
    }
    let heading = format!("{} ({}):", heading, messages.len());
    if is_error {
        println!("\n{}", heading.bright_red().bold());
    } else {
        println!("\n{}", heading.bright_yellow().bold());
    }
    for message in messages {
        println!("  - {}", message);
    }
}
