use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use dbdump::cli::{handle_dump_command, handle_list_command, DumpArgs};
use dbdump::config::{DbdumpPaths, Settings};
use dbdump::process::SystemRunner;
use dbdump::retention::effective_max_dumps;

#[derive(Parser)]
#[command(
    name = "dbdump",
    version,
    about = "Database dump, retention and rsync orchestration",
    long_about = "dbdump creates full database dumps with the vendor dump tool, \
                  compresses them, keeps the newest dumps per database alias \
                  and mirrors the dump directory to a remote host with rsync."
)]
struct Cli {
    /// Config file (JSON, or YAML by extension)
    #[arg(short, long, global = true, env = "DBDUMP_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump, compress and prune databases, then optionally rsync
    Dump(DumpArgs),

    /// List existing dumps per alias
    List {
        /// Aliases to list (default: all configured)
        aliases: Vec<String>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    dbdump::logging::init(cli.verbose);

    let mut paths = DbdumpPaths::new()?;
    if let Some(config) = &cli.config {
        paths = paths.with_config_file(config);
    }

    match cli.command {
        Commands::Dump(args) => {
            let settings = Settings::load_or_create(&paths)?;
            settings.validate()?;

            println!("Running db dump tool");
            let mut stdout = std::io::stdout();
            let summary = handle_dump_command(&settings, &args, &SystemRunner, &mut stdout)?;

            if let Some(message) = &summary.sync_error {
                bail!("rsync failed: {}", message);
            }
            if !summary.failed.is_empty() {
                bail!(
                    "{} alias(es) failed: {}",
                    summary.failed.len(),
                    summary.failed.join(", ")
                );
            }
        }
        Commands::List { aliases } => {
            let settings = Settings::load_or_create(&paths)?;
            handle_list_command(&settings, &aliases, &mut std::io::stdout())?;
        }
        Commands::Init { force } => {
            let config_file = paths.config_file();
            if config_file.exists() && !force {
                bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    config_file.display()
                );
            }

            let settings = Settings::example(&paths);
            settings.save(&paths)?;
            println!("Config written to: {}", config_file.display());
            println!("Edit the `databases` section, then run 'dbdump dump --show-dump-cmd'.");
        }
        Commands::Config => {
            let settings = Settings::load_or_create(&paths)?;
            println!("dbdump Configuration");
            println!("====================");
            println!("Config file:    {}", paths.config_file().display());
            println!("Dump directory: {}", settings.dump_dir.display());
            println!();
            println!("Settings:");
            println!("  Timestamp format:    {}", settings.strftime_format);
            println!("  Max dumps per alias: {}", settings.max_dumps_per_alias);
            println!("  Concurrency:         {}", settings.concurrency());
            println!(
                "  Compression:         {}",
                if settings.compression.is_active() {
                    settings.compression.command.as_str()
                } else {
                    "disabled"
                }
            );
            println!(
                "  Decompression:       {}",
                settings.compression.decompress_command
            );
            println!(
                "  Rsync after dump:    {}",
                if settings.rsync.enabled { "yes" } else { "no" }
            );
            println!("  Rsync destination:   {}", settings.rsync.destination);
            println!();
            println!("Databases:");
            if settings.databases.is_empty() {
                println!("  (none configured)");
            }
            for (alias, db) in &settings.databases {
                println!("  {}: {} ({})", alias, db.name, db.engine);
                println!(
                    "    keep {}, concurrency {}",
                    effective_max_dumps(&settings, alias, None),
                    settings.alias_concurrency(alias)
                );
            }
        }
    }

    Ok(())
}
