use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "certbot")]
#[command(author, version, long_about = None)]
#[command(about = "Telegram bot that writes a name and ID number onto a PDF certificate")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Telegram bot (token from TELEGRAM_BOT_TOKEN)
    Run {
        /// Template file path (overrides CERTBOT_TEMPLATE)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Directory for generated certificates (overrides CERTBOT_OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Fill a single certificate without the bot
    Fill {
        /// Template file path
        #[arg(short, long)]
        template: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Name for the certificate
        #[arg(short, long)]
        name: String,

        /// ID number for the certificate
        #[arg(short, long)]
        id_number: String,
    },

    /// Fill certificates from a JSON array of {"name", "id_number"} objects
    Batch {
        /// Template file path
        #[arg(short, long)]
        template: PathBuf,

        /// JSON file with certificate data
        #[arg(short, long)]
        json: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },
}
