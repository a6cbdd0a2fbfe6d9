use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sitevault::cli::{handle_backup_command, handle_keygen_command, handle_restore_command};
use sitevault::config::settings::{Destination, Settings, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(
    name = "sitevault",
    version,
    about = "Generational, encrypted backups of a website and its database",
    long_about = "sitevault performs daily, retention-bounded backups of a website's \
                  file tree and MySQL database. Artifacts are sealed with AES-256-GCM \
                  before leaving the host and replicated to local disk, S3 or FTP, \
                  keeping a fixed number of daily generations in rotation."
)]
struct Cli {
    /// Path to the settings file
    #[arg(short, long, env = "SITEVAULT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run today's backup
    Backup,

    /// Restore a retained generation
    Restore {
        /// Generation to restore: 0 = most recent, k = k days old
        #[arg(short, long, default_value_t = 0)]
        generation: u32,

        /// Store to restore from (defaults to the configured destination)
        #[arg(long)]
        from: Option<Destination>,
    },

    /// Generate a fresh 256-bit encryption key
    Keygen {
        /// Where to write the key file
        #[arg(long, default_value = "/etc/sitevault.key")]
        path: PathBuf,
    },

    /// Show the resolved configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keygen runs before any settings exist
    if let Commands::Keygen { path } = &cli.command {
        handle_keygen_command(path)?;
        return Ok(());
    }

    let settings = Settings::load(&cli.config)?;

    match cli.command {
        Commands::Backup => handle_backup_command(&settings)?,
        Commands::Restore { generation, from } => {
            handle_restore_command(&settings, generation, from)?
        }
        Commands::Config => print_config(&cli.config, &settings),
        Commands::Keygen { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn print_config(path: &PathBuf, settings: &Settings) {
    println!("sitevault configuration ({})", path.display());
    println!("=======================");
    println!("Retention depth:  {}", settings.retention_depth);
    println!("Destination:      {}", settings.destination);
    println!("Local root:       {}", settings.local_root.display());
    println!("Key file:         {}", settings.key_file.display());
    println!("Site path:        {}", settings.site.path.display());
    println!(
        "Database:         {}@{}/{} (password: [REDACTED])",
        settings.database.user, settings.database.host, settings.database.name
    );
    if let Some(s3) = &settings.s3 {
        println!(
            "S3:               bucket {} in {} (keys: [REDACTED])",
            s3.bucket, s3.region
        );
    }
    if let Some(ftp) = &settings.ftp {
        println!(
            "FTP:              {}@{}:{} (password: [REDACTED])",
            ftp.user, ftp.server, ftp.root_path
        );
    }
}
