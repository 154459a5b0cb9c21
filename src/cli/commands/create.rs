use anyhow::Result;
use colored::Colorize;
use projman::service::CreateProjectRequest;
use projman::App;
use std::path::Path;

pub fn handle(config_path: &Path, name: &str, abbreviation: &str, customer: &str) -> Result<()> {
    let app = App::new(config_path)?;

    let created = app.service().create(&CreateProjectRequest {
        name: name.to_string(),
        abbreviation: abbreviation.to_string(),
        customer: customer.to_string(),
    })?;

    println!(
        "{} Created {} ({} [{}] for {})",
        "✓".bright_green(),
        created.id.bright_yellow().bold(),
        created.name,
        created.abbreviation,
        created.customer
    );

    Ok(())
}
