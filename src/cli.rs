use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tokenprobe", about = "Log in, harvest balance and tokens, try token login")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the JSON endpoint over HTTP
    Serve {
        /// Listen address (overrides config)
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Run one check and print the summary
    Check {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
}
