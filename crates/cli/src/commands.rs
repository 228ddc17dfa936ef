// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use billstage_config::{
    default_settings_path, resolve_staging_root, SettingsPersistence, SyncSettings,
};
use billstage_database::{
    connection::{connect, DatabaseConfig},
    run_migrations, BillingStore, DbPool, NewCustomer, NewInvoice, NewInvoiceLine, NewItem,
};
use billstage_core::AnalyticsEvent;
use billstage_remote::{ConnectivityChecker, RemoteClient, RemoteConfig};
use billstage_staging::{load_pending_files, ChangeCapture, LogKind, StagingLayout};
use billstage_sync_engine::{SyncEngine, SyncError, SyncOptions};
use console::style;
use std::path::PathBuf;

/// Initialize the database and apply migrations
pub async fn init_database(db_path: &str) -> Result<()> {
    let pool = connect_db(db_path).await?;
    billstage_database::verify_integrity(&pool)
        .await
        .context("Database integrity check failed")?;
    println!("Database initialized at {}", style(db_path).bold());
    Ok(())
}

/// Insert a demo customer, item, and invoice, capturing the change events
pub async fn seed_demo_data(db_path: &str, config_path: Option<&str>) -> Result<()> {
    let (settings, _) = load_settings(config_path)?;
    let layout = staging_layout(&settings)?;
    let store = open_store(db_path, &layout).await?;

    let customer = store
        .create_customer(&NewCustomer {
            name: "Demo Customer".to_string(),
            phone: "555-0100".to_string(),
            business_type: Some("retail".to_string()),
            ..Default::default()
        })
        .await
        .context("Failed to create demo customer")?;
    let item = store
        .create_item(&NewItem {
            name: "Demo Item".to_string(),
            unit_price: 100.0,
            tax_percentage: Some(18.0),
            ..Default::default()
        })
        .await
        .context("Failed to create demo item")?;
    let (invoice, lines) = store
        .create_invoice(&NewInvoice {
            invoice_id: format!("INV-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")),
            customer_id: customer.id,
            pdf_path: "/tmp/demo-invoice.pdf".to_string(),
            total_amount: 118.0,
            lines: vec![NewInvoiceLine {
                item_id: item.id,
                quantity: 1,
                rate: 100.0,
                discount: 0.0,
                tax_percentage: 18.0,
                line_total: 118.0,
            }],
        })
        .await
        .context("Failed to create demo invoice")?;
    store.log_event(
        AnalyticsEvent::new("invoices", "seed_demo_data", &settings.user_id)
            .into_map()
            .context("Failed to serialize analytics event")?,
    );

    println!(
        "Seeded customer #{}, item #{}, invoice {} with {} line(s)",
        customer.id,
        item.id,
        style(&invoice.invoice_id).bold(),
        lines.len()
    );
    println!(
        "Change events staged under {}",
        layout.root().display()
    );
    Ok(())
}

/// Show pending, archived, and failed staging files
pub fn show_status(config_path: Option<&str>) -> Result<()> {
    let (settings, settings_path) = load_settings(config_path)?;
    let layout = staging_layout(&settings)?;

    println!("Settings file: {}", settings_path.display());
    println!("Staging root:  {}", layout.root().display());
    println!();

    for kind in [LogKind::Activity, LogKind::Analytics] {
        let files = load_pending_files(&layout, kind);
        let events: usize = files.iter().map(|f| f.entries.len()).sum();
        println!(
            "{:<10} {} pending file(s), {} event(s)",
            kind.dir_name(),
            style(files.len()).bold(),
            events
        );
    }

    let archived = count_json_files(&layout.archive_root());
    let failed = count_json_files(&layout.failed_root());
    println!();
    println!("Archived:  {} file(s)", archived);
    println!("Failed:    {} file(s)", failed);
    Ok(())
}

/// Replay staged changes against the remote store
pub async fn run_incremental(
    db_path: &str,
    config_path: Option<&str>,
    check_first: bool,
) -> Result<()> {
    let engine = build_engine(db_path, config_path).await?;

    if check_first {
        let client = remote_client(config_path)?;
        ConnectivityChecker::new(client)
            .check()
            .await
            .context("Remote store is not reachable")?;
        println!("Remote store is reachable");
    }

    let outcome = engine.sync_incremental().await;
    println!(
        "Incremental sync: {} uploaded, {} failed, {} file(s) archived",
        style(outcome.uploaded()).green(),
        if outcome.failed() > 0 {
            style(outcome.failed()).red()
        } else {
            style(outcome.failed())
        },
        outcome.archived_db + outcome.archived_analytics
    );

    if !outcome.is_clean() {
        bail!("{} record(s) could not be delivered; they remain staged", outcome.failed());
    }
    Ok(())
}

/// Upload a snapshot of every table in referential order
pub async fn run_full(db_path: &str, config_path: Option<&str>) -> Result<()> {
    let engine = build_engine(db_path, config_path).await?;

    match engine.sync_full().await {
        Ok(outcome) => {
            for table in &outcome.tables {
                println!(
                    "  {:<14} {} record(s) in {} chunk(s)",
                    table.table,
                    style(table.result.uploaded).green(),
                    table.chunks
                );
            }
            println!("Full sync: {} record(s) uploaded", outcome.uploaded());
            Ok(())
        }
        Err(SyncError::IntegrityStop {
            failed_table,
            failed_count,
            skipped_tables,
            detail,
            table_results,
        }) => {
            for table in &table_results {
                println!(
                    "  {:<14} {} ok, {} failed",
                    table.table,
                    table.result.uploaded,
                    table.result.failed
                );
            }
            eprintln!(
                "{} table '{}': {} record(s) failed{}",
                style("Full sync stopped at").red().bold(),
                failed_table,
                failed_count,
                detail
                    .map(|d| format!(" ({d})"))
                    .unwrap_or_default()
            );
            if !skipped_tables.is_empty() {
                eprintln!("Skipped tables: {}", skipped_tables.join(", "));
            }
            bail!("full sync did not complete");
        }
        Err(e) => Err(e).context("Full sync failed"),
    }
}

/// Print the effective settings, with the key redacted
pub fn show_config(config_path: Option<&str>) -> Result<()> {
    let (settings, settings_path) = load_settings(config_path)?;
    let staging = staging_layout(&settings)?;

    println!("Settings file:  {}", settings_path.display());
    println!("Remote URL:     {}", display_or(&settings.remote_url, "(not set)"));
    println!("API key:        {}", if settings.api_key.is_empty() { "(not set)" } else { "(set)" });
    println!("User:           {}", settings.user_id);
    println!("Chunk size:     {}", settings.chunk_size);
    println!("Max attempts:   {}", settings.max_attempts);
    println!("Retention days: {}", settings.retention_days);
    println!("Staging root:   {}", staging.root().display());
    Ok(())
}

/// Print the settings file location
pub fn show_config_path(config_path: Option<&str>) -> Result<()> {
    let (_, settings_path) = load_settings(config_path)?;
    println!("{}", settings_path.display());
    Ok(())
}

async fn connect_db(db_path: &str) -> Result<DbPool> {
    let pool = connect(DatabaseConfig::new(db_path))
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to apply database migrations")?;
    Ok(pool)
}

async fn open_store(db_path: &str, layout: &StagingLayout) -> Result<BillingStore> {
    let pool = connect_db(db_path).await?;
    Ok(BillingStore::new(pool, ChangeCapture::new(layout.clone())))
}

async fn build_engine(db_path: &str, config_path: Option<&str>) -> Result<SyncEngine> {
    let (settings, _) = load_settings(config_path)?;
    settings
        .validate()
        .context("Settings are incomplete; run 'billstage config show'")?;

    let layout = staging_layout(&settings)?;
    let store = open_store(db_path, &layout).await?;
    let client = RemoteClient::new(RemoteConfig::new(
        settings.remote_url.clone(),
        settings.api_key.clone(),
    ))
    .context("Invalid remote configuration")?;

    let options = SyncOptions {
        user_id: settings.user_id.clone(),
        chunk_size: settings.chunk_size,
        max_attempts: settings.max_attempts,
        retention_days: settings.retention_days,
    };
    Ok(SyncEngine::new(store, client, layout, options))
}

fn remote_client(config_path: Option<&str>) -> Result<RemoteClient> {
    let (settings, _) = load_settings(config_path)?;
    RemoteClient::new(RemoteConfig::new(settings.remote_url, settings.api_key))
        .context("Invalid remote configuration")
}

fn load_settings(config_path: Option<&str>) -> Result<(SyncSettings, PathBuf)> {
    let path = match config_path {
        Some(p) => PathBuf::from(p),
        None => default_settings_path().context("Could not resolve the settings location")?,
    };
    let persistence = SettingsPersistence::new(path.clone());
    let settings = persistence
        .load()
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    Ok((settings, path))
}

fn staging_layout(settings: &SyncSettings) -> Result<StagingLayout> {
    let root = resolve_staging_root(settings).context("Could not resolve the staging root")?;
    Ok(StagingLayout::new(root))
}

fn count_json_files(root: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(root) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| {
            let path = e.path();
            if path.is_dir() {
                count_json_files(&path)
            } else if path.extension().is_some_and(|ext| ext == "json") {
                1
            } else {
                0
            }
        })
        .sum()
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
