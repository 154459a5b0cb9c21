pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "projman")]
#[command(about = "Company project management over a single XML file", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        default_value = "./config.xml",
        env = "PROJMAN_CONFIG",
        help = "Path to the XML configuration file"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:8080", help = "Listen address")]
        addr: String,
    },

    #[command(about = "List all projects")]
    List,

    #[command(about = "Show a single project")]
    Get {
        #[arg(help = "Project id, e.g. prj1")]
        id: String,
    },

    #[command(about = "Create a new project")]
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        abbreviation: String,
        #[arg(long)]
        customer: String,
    },

    #[command(about = "Update an existing project")]
    Update {
        #[arg(help = "Project id, e.g. prj1")]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        abbreviation: String,
        #[arg(long)]
        customer: String,
    },

    #[command(about = "Delete a project")]
    Delete {
        #[arg(help = "Project id, e.g. prj1")]
        id: String,
    },

    #[command(about = "Validate credentials and print a bearer token")]
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
}
