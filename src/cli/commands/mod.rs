pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod login;
pub mod serve;
pub mod update;

use colored::Colorize;

/// Display an error message with proper formatting
pub fn display_error(err: &anyhow::Error) {
    eprintln!(
        "\n{} {}",
        "✗".bright_red().bold(),
        "Operation failed".bright_red().bold()
    );
    eprintln!("  {} {}", "├".bright_black(), err);

    // Display error chain
    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "├".bright_black(), cause);
    }

    let error_str = err.to_string();
    if error_str.contains("not found") {
        eprintln!(
            "  {} Run {} to see the stored projects",
            "└".bright_cyan(),
            "projman list".bright_cyan()
        );
    } else if error_str.contains("Permission denied") {
        eprintln!(
            "  {} Check permissions on the projects XML file",
            "└".bright_cyan()
        );
    } else {
        eprintln!(
            "  {} Set {} for more details",
            "└".bright_black(),
            "RUST_LOG=debug".bright_cyan()
        );
    }
}
