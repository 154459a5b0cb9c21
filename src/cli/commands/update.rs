use anyhow::Result;
use colored::Colorize;
use projman::service::ProjectDto;
use projman::App;
use std::path::Path;

pub fn handle(
    config_path: &Path,
    id: &str,
    name: &str,
    abbreviation: &str,
    customer: &str,
) -> Result<()> {
    let app = App::new(config_path)?;

    let updated = app.service().update(&ProjectDto {
        id: id.to_string(),
        name: name.to_string(),
        abbreviation: abbreviation.to_string(),
        customer: customer.to_string(),
    })?;

    println!(
        "{} Updated {} ({} [{}] for {})",
        "✓".bright_green(),
        updated.id.bright_yellow().bold(),
        updated.name,
        updated.abbreviation,
        updated.customer
    );

    Ok(())
}
