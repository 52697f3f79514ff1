//! Command implementations for the grade import CLI
//!
//! Each subcommand lives in its own module; [`run`] dispatches to them.
//! A command returns `Ok(false)` when it ran to completion but imported
//! nothing, so the binary can exit non-zero without printing an error.

pub mod import_notes;
pub mod import_students;
pub mod info;
pub mod shared;
pub mod template;
pub mod validate;

use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::cli::args::Commands;

/// Run one subcommand
///
/// The cancellation token stops imports between persistence batches.
pub async fn run(command: Commands, cancellation: CancellationToken) -> Result<bool> {
    shared::setup_logging(command.common())?;

    match command {
        Commands::ImportNotes(args) => import_notes::run_import_notes(args, cancellation).await,
        Commands::ImportStudents(args) => {
            import_students::run_import_students(args, cancellation).await
        }
        Commands::Validate(args) => validate::run_validate(args).await,
        Commands::Template(args) => template::run_template(args).await,
        Commands::Info(args) => info::run_info(args),
    }
}
