use anyhow::{Context, Result};
use colored::Colorize;
use projman::App;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

pub fn handle(config_path: &Path, addr: &str) -> Result<()> {
    let addr: SocketAddr = addr.parse().context("Invalid listen address")?;
    let app = Arc::new(App::new(config_path)?);

    println!(
        "{} {}",
        "Serving projects API on".bright_blue().bold(),
        addr.to_string().bright_cyan()
    );
    println!(
        "  {} storage: {}",
        "•".bright_cyan(),
        app.config().storage.projects_path.display()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime
        .block_on(projman::http::serve(app, addr))
        .context("Server terminated unexpectedly")?;

    Ok(())
}
