mod cli;

use anyhow::Result;
use clap::Parser;
use cli::commands;

fn main() {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = cli::Cli::parse();

    // Run the command and handle errors gracefully
    if let Err(err) = run_command(cli) {
        commands::display_error(&err);
        std::process::exit(1);
    }
}

fn run_command(cli: cli::Cli) -> Result<()> {
    use cli::Commands;

    match cli.command {
        Commands::Serve { addr } => commands::serve::handle(&cli.config, &addr),
        Commands::List => commands::list::handle(&cli.config),
        Commands::Get { id } => commands::get::handle(&cli.config, &id),
        Commands::Create {
            name,
            abbreviation,
            customer,
        } => commands::create::handle(&cli.config, &name, &abbreviation, &customer),
        Commands::Update {
            id,
            name,
            abbreviation,
            customer,
        } => commands::update::handle(&cli.config, &id, &name, &abbreviation, &customer),
        Commands::Delete { id } => commands::delete::handle(&cli.config, &id),
        Commands::Login { username, password } => {
            commands::login::handle(&cli.config, &username, &password)
        }
    }
}
