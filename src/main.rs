use clap::Parser;
use grade_import::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    let args = Args::parse();

    let Some(command) = args.command else {
        show_help_and_commands();
        process::exit(0);
    };

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let cancellation_token = CancellationToken::new();

        // Ctrl-C stops the import after the batch in flight
        let token = cancellation_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived CTRL+C, finishing the current batch...");
                token.cancel();
            }
        });

        commands::run(command, cancellation_token).await
    });

    match result {
        Ok(true) => process::exit(0),
        // The command already reported what went wrong
        Ok(false) => process::exit(2),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Grade Import - Spreadsheet import of student grades and rosters");
    println!("===============================================================");
    println!();
    println!("Validate grade sheets row by row, compute weighted final grades and");
    println!("write them in batches to a JSON school data file.");
    println!();
    println!("USAGE:");
    println!("    grade-import <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    import-notes       Import grades for a subject from a grade sheet");
    println!("    import-students    Import students into a class from a roster sheet");
    println!("    validate           Check a grade sheet without importing it");
    println!("    template           Generate a pre-filled grade sheet");
    println!("    info               Show accepted formats, columns and limits");
    println!();
    println!("EXAMPLES:");
    println!("    # Import grades for subject 3, restricted to class 7:");
    println!("    grade-import import-notes notes.xlsx --subject 3 --class 7 --data school.json");
    println!();
    println!("    # Dry run with JSON output:");
    println!("    grade-import import-notes notes.xlsx -s 3 --validate-only --format json -d school.json");
    println!();
    println!("    # Template with existing grades filled in:");
    println!("    grade-import template -s 3 --class 7 --include-notes -d school.json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    grade-import <COMMAND> --help");
}
