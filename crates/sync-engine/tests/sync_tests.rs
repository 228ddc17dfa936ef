//! Integration tests for the sync engine

use billstage_core::TrackedTable;
use billstage_database::{
    connection::create_test_db, run_migrations, BillingStore, NewCustomer, NewInvoice,
    NewInvoiceLine, NewItem,
};
use billstage_remote::{RemoteClient, RemoteConfig};
use billstage_staging::{ChangeCapture, LogKind, StagingLayout};
use billstage_sync_engine::{SyncEngine, SyncError, SyncOptions};
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// The engine does not expose its store, so tests keep a second handle
// over the same pool and capture layout for seeding.
struct Harness {
    engine: SyncEngine,
    store: BillingStore,
}

async fn harness(server: &MockServer, staging: &TempDir, options: SyncOptions) -> Harness {
    let layout = StagingLayout::new(staging.path());
    let pool = create_test_db().await.unwrap();
    run_migrations(&pool).await.unwrap();
    let store = BillingStore::new(pool, ChangeCapture::new(layout.clone()));
    let client = RemoteClient::new(RemoteConfig::new(server.uri(), "test-key")).unwrap();
    let engine = SyncEngine::new(store.clone(), client, layout, options);
    Harness { engine, store }
}

fn allow_audit_rows(server: &MockServer) -> impl std::future::Future<Output = ()> + '_ {
    Mock::given(method("POST"))
        .and(path("/rest/v1/upload_logs"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
}

#[tokio::test]
async fn test_incremental_replays_captured_invoice() {
    let server = MockServer::start().await;
    for table in ["customer", "item", "invoice", "invoice_item"] {
        Mock::given(method("POST"))
            .and(path(format!("/rest/v1/{table}")))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
    }
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let h = harness(&server, &staging, SyncOptions::default()).await;
    seed_via(&h.store).await;

    let outcome = h.engine.sync_incremental().await;

    // customer + item + invoice + one line
    assert_eq!(outcome.db.uploaded, 4);
    assert!(outcome.is_clean());
    assert_eq!(outcome.archived_db, 1);

    // The day's file moved from pending to sent/
    let layout = h.engine.layout();
    assert!(fs::read_dir(layout.pending_dir(LogKind::Activity))
        .map(|mut d| d.next().is_none())
        .unwrap_or(true));
    assert_eq!(
        fs::read_dir(layout.archive_dir(LogKind::Activity))
            .unwrap()
            .count(),
        1
    );

    // One audit row per kind was posted
    let audit_posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/rest/v1/upload_logs")
        .count();
    assert_eq!(audit_posts, 2);
}

#[tokio::test]
async fn test_incremental_retries_failed_file_on_next_run() {
    let server = MockServer::start().await;
    allow_audit_rows(&server).await;

    // First run: customer inserts are rejected
    let rejection = Mock::given(method("POST"))
        .and(path("/rest/v1/customer"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})))
        .expect(1)
        .mount_as_scoped(&server)
        .await;

    let staging = TempDir::new().unwrap();
    let h = harness(&server, &staging, SyncOptions::default()).await;
    h.store
        .create_customer(&NewCustomer {
            name: "Acme".to_string(),
            phone: "555-0100".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let first = h.engine.sync_incremental().await;
    assert_eq!(first.db.failed, 1);
    assert_eq!(first.archived_db, 0);
    drop(rejection);

    // Second run: the remote recovered; the same event goes through
    Mock::given(method("POST"))
        .and(path("/rest/v1/customer"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let second = h.engine.sync_incremental().await;
    assert_eq!(second.db.uploaded, 1);
    assert_eq!(second.archived_db, 1);
}

#[tokio::test]
async fn test_full_sync_uploads_tables_in_referential_order() {
    let server = MockServer::start().await;
    for table in ["customer", "item", "invoice", "invoice_item"] {
        Mock::given(method("POST"))
            .and(path(format!("/rest/v1/{table}")))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
    }
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let h = harness(&server, &staging, SyncOptions::default()).await;
    seed_via(&h.store).await;

    let outcome = h.engine.sync_full().await.unwrap();
    assert_eq!(outcome.tables.len(), 4);
    assert_eq!(outcome.uploaded(), 4);
    assert_eq!(outcome.failed(), 0);

    let table_posts: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| {
            r.method.as_str() == "POST" && r.url.path() != "/rest/v1/upload_logs"
        })
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        table_posts,
        vec![
            "/rest/v1/customer",
            "/rest/v1/item",
            "/rest/v1/invoice",
            "/rest/v1/invoice_item",
        ]
    );
}

#[tokio::test]
async fn test_full_sync_stops_at_first_failing_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/customer"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    // Item chunk fails on every attempt
    Mock::given(method("POST"))
        .and(path("/rest/v1/item"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "disk full"})))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/invoice"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/invoice_item"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let h = harness(&server, &staging, SyncOptions::default()).await;
    seed_via(&h.store).await;

    let err = h.engine.sync_full().await.unwrap_err();
    match err {
        SyncError::IntegrityStop {
            failed_table,
            failed_count,
            skipped_tables,
            detail,
            table_results,
        } => {
            assert_eq!(failed_table, "item");
            assert_eq!(failed_count, 1);
            assert_eq!(skipped_tables, vec!["invoice", "invoice_item"]);
            assert_eq!(detail.as_deref(), Some("disk full"));
            // customer succeeded, item failed, nothing after
            assert_eq!(table_results.len(), 2);
            assert_eq!(table_results[0].table, "customer");
            assert_eq!(table_results[0].result.uploaded, 1);
            assert_eq!(table_results[1].result.failed, 1);
        }
        other => panic!("expected IntegrityStop, got {other}"),
    }

    // Failure diagnostics were persisted locally
    let failed_dir = h.engine.layout().failed_dir_today();
    let names: Vec<String> = fs::read_dir(failed_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.starts_with("failed_item_")));
}

#[tokio::test]
async fn test_full_sync_stop_summary_carries_skipped_tables_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/customer"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/item"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "disk full"})))
        .mount(&server)
        .await;
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let h = harness(&server, &staging, SyncOptions::default()).await;
    seed_via(&h.store).await;

    h.engine.sync_full().await.unwrap_err();

    let events = audit_events(h.engine.layout());
    let summary = events
        .iter()
        .find(|e| e["kind"] == "full_upload_stopped")
        .expect("no stop summary in audit log");
    assert_eq!(summary["failed_table"], "item");
    assert_eq!(summary["uploaded"], 1);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["skipped_tables"], json!(["invoice", "invoice_item"]));
    assert_eq!(summary["detail"], "disk full");
}

#[tokio::test]
async fn test_clean_full_sync_appends_local_summary() {
    let server = MockServer::start().await;
    for table in ["customer", "item", "invoice", "invoice_item"] {
        Mock::given(method("POST"))
            .and(path(format!("/rest/v1/{table}")))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
    }
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let h = harness(&server, &staging, SyncOptions::default()).await;
    seed_via(&h.store).await;

    h.engine.sync_full().await.unwrap();

    let events = audit_events(h.engine.layout());
    let summary = events
        .iter()
        .find(|e| e["kind"] == "full_upload_summary")
        .expect("no summary in audit log");
    assert_eq!(summary["uploaded"], 4);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["tables"], 4);
}

#[tokio::test]
async fn test_full_sync_does_not_retry_definitive_rejections() {
    let server = MockServer::start().await;
    // A 409 will not get better on retry, so exactly one attempt
    Mock::given(method("POST"))
        .and(path("/rest/v1/customer"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "duplicate key"})))
        .expect(1)
        .mount(&server)
        .await;
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let h = harness(&server, &staging, SyncOptions::default()).await;
    h.store
        .create_customer(&NewCustomer {
            name: "Acme".to_string(),
            phone: "555-0100".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let err = h.engine.sync_full().await.unwrap_err();
    match err {
        SyncError::IntegrityStop {
            failed_table,
            detail,
            ..
        } => {
            assert_eq!(failed_table, "customer");
            assert_eq!(detail.as_deref(), Some("duplicate key"));
        }
        other => panic!("expected IntegrityStop, got {other}"),
    }
}

#[tokio::test]
async fn test_failed_chunk_persists_one_failure_record_per_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/customer"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "duplicate key"})))
        .mount(&server)
        .await;
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let h = harness(&server, &staging, SyncOptions::default()).await;
    for n in 0..3 {
        h.store
            .create_customer(&NewCustomer {
                name: format!("Customer {n}"),
                phone: format!("555-01{n:02}"),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    h.engine.sync_full().await.unwrap_err();

    let failure_files: Vec<_> = fs::read_dir(h.engine.layout().failed_dir_today())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("failed_customer_")
        })
        .collect();
    assert_eq!(failure_files.len(), 3);

    // Each file holds the rejected record itself, not a chunk wrapper
    for file in failure_files {
        let record: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(record["table"], "customer");
        assert!(record["record"]["phone"].as_str().is_some());
        assert_eq!(record["details"]["status_code"], 409);
    }
}

#[tokio::test]
async fn test_full_sync_chunks_large_tables() {
    let server = MockServer::start().await;
    for table in ["customer", "item", "invoice", "invoice_item"] {
        Mock::given(method("POST"))
            .and(path(format!("/rest/v1/{table}")))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
    }
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let options = SyncOptions {
        chunk_size: 2,
        ..Default::default()
    };
    let h = harness(&server, &staging, options).await;
    for n in 0..5 {
        h.store
            .create_customer(&NewCustomer {
                name: format!("Customer {n}"),
                phone: format!("555-01{n:02}"),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let outcome = h.engine.sync_full().await.unwrap();
    let customers = outcome
        .tables
        .iter()
        .find(|t| t.table == TrackedTable::Customer.as_str())
        .unwrap();
    assert_eq!(customers.result.uploaded, 5);
    // 5 records in chunks of 2
    assert_eq!(customers.chunks, 3);
}

#[tokio::test]
async fn test_retention_prunes_old_archives_after_run() {
    let server = MockServer::start().await;
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let options = SyncOptions {
        retention_days: 0,
        ..Default::default()
    };
    let h = harness(&server, &staging, options).await;

    // Pre-existing archived file; with zero-day retention any past mtime
    // falls behind the cutoff
    let archive_dir = h.engine.layout().archive_dir(LogKind::Activity);
    fs::create_dir_all(&archive_dir).unwrap();
    let stale = archive_dir.join("activity_2020_01_01.json");
    fs::write(&stale, "[]").unwrap();

    h.engine.sync_incremental().await;
    assert!(!stale.exists());
}

#[tokio::test]
async fn test_concurrent_runs_are_serialized() {
    let server = MockServer::start().await;
    allow_audit_rows(&server).await;

    let staging = TempDir::new().unwrap();
    let h = harness(&server, &staging, SyncOptions::default()).await;
    let engine = std::sync::Arc::new(h.engine);

    let a = tokio::spawn({
        let engine = engine.clone();
        async move { engine.sync_incremental().await }
    });
    let b = tokio::spawn({
        let engine = engine.clone();
        async move { engine.sync_incremental().await }
    });

    // Both runs complete; with nothing staged they upload nothing
    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert_eq!(a.attempted() + b.attempted(), 0);
}

fn audit_events(layout: &StagingLayout) -> Vec<serde_json::Value> {
    let contents = fs::read_to_string(layout.audit_log_today()).unwrap();
    serde_json::from_str(&contents).unwrap()
}

async fn seed_via(store: &BillingStore) {
    let customer = store
        .create_customer(&NewCustomer {
            name: "Acme".to_string(),
            phone: "555-0100".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let item = store
        .create_item(&NewItem {
            name: "Widget".to_string(),
            unit_price: 100.0,
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .create_invoice(&NewInvoice {
            invoice_id: "INV-001".to_string(),
            customer_id: customer.id,
            pdf_path: "/invoices/INV-001.pdf".to_string(),
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
        .unwrap();
}
