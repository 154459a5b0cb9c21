use anyhow::Result;
use colored::Colorize;
use projman::App;
use std::path::Path;

pub fn handle(config_path: &Path, username: &str, password: &str) -> Result<()> {
    let app = App::new(config_path)?;

    if !app.auth().validate_credentials(username, password) {
        anyhow::bail!("Invalid credentials.");
    }

    let issued = app.tokens().issue(username)?;

    println!("{}", "Login ok".bright_green().bold());
    println!("  token:   {}", issued.token);
    println!("  expires: {}", issued.expires_at.to_rfc3339());

    Ok(())
}
