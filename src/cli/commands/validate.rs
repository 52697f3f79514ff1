//! `validate` command: preview a grade sheet without importing it

use colored::*;

use super::import_notes::print_messages;
use super::shared::{load_configuration, print_json, read_upload};
use crate::Result;
use crate::app::services::notes_import::NotesWorkbookParser;
use crate::cli::args::{OutputFormat, ValidateArgs};

pub async fn run_validate(args: ValidateArgs) -> Result<bool> {
    let config = load_configuration(&args.common)?;
    let buffer = read_upload(&args.file).await?;
    let preview = NotesWorkbookParser::new(config).preview(&buffer)?;

    match args.common.output_format {
        OutputFormat::Json => print_json(&preview)?,
        OutputFormat::Text if !args.common.quiet => {
            println!(
                "\n{} {}",
                "Validation of".bright_green().bold(),
                args.file.display()
            );
            println!("  {} {}", "Sheet:".bright_cyan(), preview.sheet_name);
            println!(
                "  {} {} total, {} valid, {} invalid",
                "Rows:".bright_cyan(),
                preview.total_rows,
                preview.valid_rows.to_string().bright_white().bold(),
                preview.invalid_rows
            );
            println!(
                "  {} {}",
                "Columns found:".bright_cyan(),
                preview.found_columns.join(", ")
            );
            if !preview.missing_columns.is_empty() {
                println!(
                    "  {} {}",
                    "Columns missing:".bright_red(),
                    preview.missing_columns.join(", ")
                );
            }
            println!(
                "  {} {}",
                "TP grades present:".bright_cyan(),
                if preview.has_tp_component { "yes" } else { "no" }
            );
            print_messages("Errors", &preview.errors, true);
            print_messages("Warnings", &preview.warnings, false);

            if preview.is_importable() {
                println!("\n{}", "The sheet can be imported".bright_green());
            } else {
                println!("\n{}", "The sheet cannot be imported".bright_red().bold());
            }
        }
        OutputFormat::Text => {}
    }
    Ok(preview.is_importable())
}
