//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "chorus-server")]
#[command(about = "Multi-model AI safety verification service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CHORUS_CONFIG", default_value = "chorus.yaml")]
    pub config: String,

    /// Listen address
    #[arg(short = 'l', long, env = "CHORUS_LISTEN")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "CHORUS_PORT")]
    pub port: Option<u16>,

    /// SQLite database file for analysis results
    #[arg(short, long, env = "CHORUS_DATABASE")]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
