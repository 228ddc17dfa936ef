// crates/database/src/store.rs
//! Mutation facade that couples database writes to change capture
//!
//! Every mutating operation first commits locally, then appends a change
//! event to the staging tree. Capture happens strictly after commit and is
//! best-effort, so a staging failure can never roll back or abort the
//! local write.

use crate::queries::{customers, invoices, items};
use crate::DbPool;
use billstage_core::{
    AppError, ChangeAction, Customer, EntityRecord, Invoice, InvoiceItem, Item, TrackedTable,
};
use billstage_staging::ChangeCapture;
use serde_json::{Map, Value};

pub use crate::queries::{NewCustomer, NewInvoice, NewInvoiceLine, NewItem};

/// Local business store with durable change capture
#[derive(Debug, Clone)]
pub struct BillingStore {
    pool: DbPool,
    capture: ChangeCapture,
}

impl BillingStore {
    /// Creates a store over an open pool and a capture handle
    pub fn new(pool: DbPool, capture: ChangeCapture) -> Self {
        Self { pool, capture }
    }

    /// The underlying connection pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// The capture handle this store stages through
    pub fn capture(&self) -> &ChangeCapture {
        &self.capture
    }

    /// Creates a customer and captures the insert
    pub async fn create_customer(&self, new: &NewCustomer) -> Result<Customer, AppError> {
        let customer = customers::create_customer(&self.pool, new).await?;
        self.capture
            .record(ChangeAction::Insert, &EntityRecord::Customer(customer.clone()));
        Ok(customer)
    }

    /// Updates a customer and captures the full updated row
    pub async fn update_customer(&self, customer: &Customer) -> Result<(), AppError> {
        customers::update_customer(&self.pool, customer).await?;
        self.capture
            .record(ChangeAction::Update, &EntityRecord::Customer(customer.clone()));
        Ok(())
    }

    /// Deletes a customer and captures the row as it was
    pub async fn delete_customer(&self, id: i64) -> Result<Customer, AppError> {
        let customer = customers::delete_customer(&self.pool, id).await?;
        self.capture
            .record(ChangeAction::Delete, &EntityRecord::Customer(customer.clone()));
        Ok(customer)
    }

    /// Creates an item and captures the insert
    pub async fn create_item(&self, new: &NewItem) -> Result<Item, AppError> {
        let item = items::create_item(&self.pool, new).await?;
        self.capture
            .record(ChangeAction::Insert, &EntityRecord::Item(item.clone()));
        Ok(item)
    }

    /// Updates an item and captures the full updated row
    pub async fn update_item(&self, item: &Item) -> Result<(), AppError> {
        items::update_item(&self.pool, item).await?;
        self.capture
            .record(ChangeAction::Update, &EntityRecord::Item(item.clone()));
        Ok(())
    }

    /// Deletes an item and captures the row as it was
    pub async fn delete_item(&self, id: i64) -> Result<Item, AppError> {
        let item = items::delete_item(&self.pool, id).await?;
        self.capture
            .record(ChangeAction::Delete, &EntityRecord::Item(item.clone()));
        Ok(item)
    }

    /// Creates an invoice with its lines, then captures one insert event
    /// for the header and one per line
    pub async fn create_invoice(
        &self,
        new: &NewInvoice,
    ) -> Result<(Invoice, Vec<InvoiceItem>), AppError> {
        let (invoice, lines) = invoices::create_invoice(&self.pool, new).await?;
        self.capture
            .record(ChangeAction::Insert, &EntityRecord::Invoice(invoice.clone()));
        for line in &lines {
            self.capture
                .record(ChangeAction::Insert, &EntityRecord::InvoiceItem(line.clone()));
        }
        Ok((invoice, lines))
    }

    /// Deletes an invoice with its lines, then captures one delete event
    /// per line and one for the header
    pub async fn delete_invoice(&self, id: i64) -> Result<Invoice, AppError> {
        let (invoice, lines) = invoices::delete_invoice(&self.pool, id).await?;
        for line in &lines {
            self.capture
                .record(ChangeAction::Delete, &EntityRecord::InvoiceItem(line.clone()));
        }
        self.capture
            .record(ChangeAction::Delete, &EntityRecord::Invoice(invoice.clone()));
        Ok(invoice)
    }

    /// Records a telemetry event; never fails
    pub fn log_event(&self, data: Map<String, Value>) {
        self.capture.record_analytics(data);
    }

    /// Gets every customer
    pub async fn all_customers(&self) -> Result<Vec<Customer>, AppError> {
        customers::all_customers(&self.pool).await
    }

    /// Gets every item
    pub async fn all_items(&self) -> Result<Vec<Item>, AppError> {
        items::all_items(&self.pool).await
    }

    /// Gets every invoice header
    pub async fn all_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        invoices::all_invoices(&self.pool).await
    }

    /// Gets every invoice line
    pub async fn all_invoice_lines(&self) -> Result<Vec<InvoiceItem>, AppError> {
        invoices::all_invoice_lines(&self.pool).await
    }

    /// Reads the full contents of one table as flat wire-shaped maps
    pub async fn snapshot(&self, table: TrackedTable) -> Result<Vec<Map<String, Value>>, AppError> {
        let records: Vec<EntityRecord> = match table {
            TrackedTable::Customer => self
                .all_customers()
                .await?
                .into_iter()
                .map(EntityRecord::Customer)
                .collect(),
            TrackedTable::Item => self
                .all_items()
                .await?
                .into_iter()
                .map(EntityRecord::Item)
                .collect(),
            TrackedTable::Invoice => self
                .all_invoices()
                .await?
                .into_iter()
                .map(EntityRecord::Invoice)
                .collect(),
            TrackedTable::InvoiceItem => self
                .all_invoice_lines()
                .await?
                .into_iter()
                .map(EntityRecord::InvoiceItem)
                .collect(),
        };
        records.iter().map(|r| Ok(r.to_map()?)).collect()
    }
}
