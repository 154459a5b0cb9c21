use anyhow::Result;
use colored::Colorize;
use projman::App;
use std::path::Path;

pub fn handle(config_path: &Path, id: &str) -> Result<()> {
    let app = App::new(config_path)?;
    app.service().delete(id)?;

    println!("{} Deleted {}", "✓".bright_green(), id.bright_yellow());
    Ok(())
}
