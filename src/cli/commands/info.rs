//! `info` command: accepted formats, columns and limits

use colored::*;

use super::shared::{load_configuration, print_json};
use crate::Result;
use crate::app::services::notes_import::NotesWorkbookParser;
use crate::cli::args::{InfoArgs, OutputFormat};

pub fn run_info(args: InfoArgs) -> Result<bool> {
    let config = load_configuration(&args.common)?;
    let info = NotesWorkbookParser::new(config.clone()).file_format_info();

    if args.common.output_format == OutputFormat::Json {
        print_json(&info)?;
        return Ok(true);
    }

    println!("{}", "Grade sheet format".bright_green().bold());
    println!(
        "  {} {}",
        "Formats:".bright_cyan(),
        info.supported_formats.join(", ")
    );
    println!("  {} {}", "Max file size:".bright_cyan(), info.max_file_size);
    println!("  {} {}", "Max rows:".bright_cyan(), info.max_rows);
    println!(
        "  {} {}",
        "Required columns:".bright_cyan(),
        info.required_columns.join(", ")
    );
    println!(
        "  {} {}",
        "Optional columns:".bright_cyan(),
        info.optional_columns.join(", ")
    );
    println!(
        "  {} {} (at least one)",
        "Grade columns:".bright_cyan(),
        info.note_columns.join(", ")
    );
    println!("  {} {}", "Batch size:".bright_cyan(), config.batch_size);
    Ok(true)
}
