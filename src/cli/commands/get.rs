use anyhow::Result;
use colored::Colorize;
use projman::App;
use std::path::Path;

pub fn handle(config_path: &Path, id: &str) -> Result<()> {
    let app = App::new(config_path)?;

    match app.service().get_by_id(id)? {
        Some(project) => {
            println!("{}", project.id.bright_yellow().bold());
            println!("  name:         {}", project.name);
            println!("  abbreviation: {}", project.abbreviation);
            println!("  customer:     {}", project.customer);
            Ok(())
        }
        None => anyhow::bail!("Project with id '{}' was not found.", id),
    }
}
