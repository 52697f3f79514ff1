//! `template` command: write a pre-filled grade sheet

use colored::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use super::shared::{load_store, print_json};
use crate::app::services::template::{TemplateGenerator, TemplateRequest};
use crate::cli::args::{OutputFormat, TemplateArgs};
use crate::{Error, Result};

#[derive(Debug, Serialize)]
struct TemplateOutput<'a> {
    path: String,
    headers: &'a [String],
    students: usize,
    has_tp_component: bool,
}

pub async fn run_template(args: TemplateArgs) -> Result<bool> {
    let (store, _) = load_store(&args.common)?;
    let request = TemplateRequest::new(args.subject_id, args.class_id)
        .with_existing_notes(args.include_existing_notes)
        .with_student_emails(args.include_student_emails);

    let template = TemplateGenerator::with_store(store).generate(&request).await?;
    let buffer = template.to_xlsx()?;

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&template.filename));
    tokio::fs::write(&path, &buffer)
        .await
        .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))?;
    info!("Wrote template to {}", path.display());

    match args.common.output_format {
        OutputFormat::Json => print_json(&TemplateOutput {
            path: path.display().to_string(),
            headers: &template.headers,
            students: template.students.len(),
            has_tp_component: template.has_tp_component,
        })?,
        OutputFormat::Text if !args.common.quiet => {
            println!(
                "{} {} ({} students, {} / {})",
                "Template written to".bright_green(),
                path.display().to_string().bright_white().bold(),
                template.students.len(),
                template.subject_name,
                template.class_name
            );
            println!("  {} {}", "Columns:".bright_cyan(), template.headers.join(", "));
        }
        OutputFormat::Text => {}
    }
    Ok(true)
}
