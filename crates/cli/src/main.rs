// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, Command};

mod commands;

fn build_cli() -> Command {
    Command::new("billstage")
        .version("0.1.0")
        .author("Billstage Team")
        .about("Offline-first billing store with cloud synchronization")
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .help("Path to the database file")
                .default_value("billstage.db")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to the settings file (defaults to the platform config dir)")
                .global(true),
        )
        .subcommand(Command::new("init").about("Initialize the database and create tables"))
        .subcommand(
            Command::new("seed").about("Insert a demo customer, item, and invoice"),
        )
        .subcommand(
            Command::new("status").about("Show pending, archived, and failed staging files"),
        )
        .subcommand(
            Command::new("sync")
                .about("Replay staged changes against the remote store")
                .arg(
                    Arg::new("check")
                        .long("check")
                        .help("Verify the remote is reachable before starting")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("full-sync")
                .about("Upload a snapshot of every table in referential order"),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect the sync settings")
                .subcommand(Command::new("show").about("Print the effective settings"))
                .subcommand(Command::new("path").about("Print the settings file location")),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();
    let db_path = matches
        .get_one::<String>("database")
        .map(|s| s.as_str())
        .unwrap_or("billstage.db");
    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());

    match matches.subcommand() {
        Some(("init", _)) => commands::init_database(db_path).await,
        Some(("seed", _)) => commands::seed_demo_data(db_path, config_path).await,
        Some(("status", _)) => commands::show_status(config_path),
        Some(("sync", sub_matches)) => {
            let check = sub_matches.get_flag("check");
            commands::run_incremental(db_path, config_path, check).await
        }
        Some(("full-sync", _)) => commands::run_full(db_path, config_path).await,
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("path", _)) => commands::show_config_path(config_path),
            _ => commands::show_config(config_path),
        },
        _ => {
            build_cli().print_help().context("Failed to print help")?;
            Ok(())
        }
    }
}
