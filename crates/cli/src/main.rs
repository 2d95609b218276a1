//! Delivery tracker CLI - account and data management against the data directory.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (password from TRACKER_USER_PASSWORD or stdin)
//! dt-cli user create -e admin@example.com -n "Admin Name" -r admin
//!
//! # Seed deliveries from YAML, replacing whatever is stored
//! dt-cli seed --file deliveries.yaml --replace
//!
//! # Import a CSV file, all-or-nothing
//! dt-cli import deliveries.csv
//!
//! # Export to CSV (Shift_JIS), Excel or JSON, chosen by extension
//! dt-cli export out.csv --encoding shift_jis
//! ```
//!
//! # Commands
//!
//! - `user create` - Create or replace an account
//! - `seed` - Load deliveries from a YAML file
//! - `import` - Import deliveries from CSV
//! - `export` - Export deliveries to CSV, Excel or JSON
//!
//! All commands read `TRACKER_DATA_DIR` (default `./data`) and
//! `TRACKER_USERS_FILE`, the same variables as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use delivery_tracker_admin::services::export::{Delimiter, TextEncoding};
use delivery_tracker_core::Role;

mod commands;

#[derive(Parser)]
#[command(name = "dt-cli")]
#[command(author, version, about = "Delivery tracker CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Load deliveries from a YAML file
    Seed {
        /// YAML file with a `deliveries` list
        #[arg(short, long)]
        file: PathBuf,

        /// Drop existing deliveries first
        #[arg(long)]
        replace: bool,
    },
    /// Import deliveries from a CSV file
    Import {
        /// CSV file to read
        path: PathBuf,

        /// Import the valid rows even when some rows fail
        #[arg(long)]
        skip_invalid: bool,

        /// Force an encoding (`utf8`, `shift_jis`) instead of detecting it
        #[arg(long)]
        encoding: Option<TextEncoding>,

        /// Force a delimiter (`comma`, `tab`, `semicolon`) instead of detecting it
        #[arg(long)]
        delimiter: Option<Delimiter>,
    },
    /// Export every delivery; the format follows the file extension
    Export {
        /// Output file (`.csv`, `.xlsx` or `.json`)
        path: PathBuf,

        /// CSV encoding (`utf8`, `shift_jis`)
        #[arg(long, default_value = "utf8")]
        encoding: TextEncoding,

        /// CSV delimiter (`comma`, `tab`, `semicolon`)
        #[arg(long, default_value = "comma")]
        delimiter: Delimiter,

        /// Omit the UTF-8 byte order mark
        #[arg(long)]
        no_bom: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create or replace an account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account role (`admin`, `user`)
        #[arg(short, long, default_value = "user")]
        role: Role,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), commands::CommandError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let config = commands::local_config();

    match cli.command {
        Commands::User { action } => match action {
            UserAction::Create { email, name, role } => {
                let password = commands::user::read_password().await?;
                commands::user::create(&config, &email, &name, role, &password).await?;
            }
        },
        Commands::Seed { file, replace } => {
            commands::seed::deliveries(&config, &file, replace).await?;
        }
        Commands::Import {
            path,
            skip_invalid,
            encoding,
            delimiter,
        } => {
            let options = commands::transfer::ImportOptions {
                encoding,
                delimiter,
            };
            commands::transfer::import(&config, &path, options, skip_invalid).await?;
        }
        Commands::Export {
            path,
            encoding,
            delimiter,
            no_bom,
        } => {
            let options = commands::transfer::ExportOptions {
                encoding,
                delimiter,
                include_bom: !no_bom,
            };
            commands::transfer::export(&config, &path, &options).await?;
        }
    }
    Ok(())
}
