use anyhow::Result;
use colored::Colorize;
use projman::App;
use std::path::Path;

pub fn handle(config_path: &Path) -> Result<()> {
    let app = App::new(config_path)?;
    let projects = app.service().get_all()?;

    if projects.is_empty() {
        println!("{} No projects stored yet", "ℹ".bright_blue());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} projects:", projects.len()).bright_green()
    );
    for project in &projects {
        println!(
            "  {} {}  {} [{}] for {}",
            "•".bright_cyan(),
            project.id.bright_yellow(),
            project.name,
            project.abbreviation,
            project.customer
        );
    }

    Ok(())
}
