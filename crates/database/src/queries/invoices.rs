//! Invoice and invoice-line database operations
//!
//! An invoice header and its lines are written in one transaction so a
//! crash can never leave a half-saved invoice behind.

use crate::DbPool;
use billstage_core::{AppError, Invoice, InvoiceItem};
use chrono::{DateTime, Utc};

/// One line of an invoice about to be created
#[derive(Debug, Clone)]
pub struct NewInvoiceLine {
    /// Referenced item
    pub item_id: i64,
    /// Billed quantity
    pub quantity: i64,
    /// Billed rate per unit
    pub rate: f64,
    /// Absolute discount applied to the line
    pub discount: f64,
    /// Tax rate in percent
    pub tax_percentage: f64,
    /// Line total after discount and tax
    pub line_total: f64,
}

/// Fields for an invoice about to be created
#[derive(Debug, Clone)]
pub struct NewInvoice {
    /// Human-facing invoice number, unique
    pub invoice_id: String,
    /// Owning customer
    pub customer_id: i64,
    /// Path of the rendered PDF
    pub pdf_path: String,
    /// Grand total
    pub total_amount: f64,
    /// Lines of the invoice
    pub lines: Vec<NewInvoiceLine>,
}

/// Creates an invoice with its lines in one transaction and returns the
/// stored header plus lines
pub async fn create_invoice(
    pool: &DbPool,
    new: &NewInvoice,
) -> Result<(Invoice, Vec<InvoiceItem>), AppError> {
    let created_at = Utc::now();
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin invoice transaction", e))?;

    let header = sqlx::query(
        r#"
        INSERT INTO invoice (invoiceId, customerId, createdAt, pdfPath, totalAmount)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.invoice_id)
    .bind(new.customer_id)
    .bind(created_at)
    .bind(&new.pdf_path)
    .bind(new.total_amount)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::database("Failed to create invoice", e))?;
    let invoice_pk = header.last_insert_rowid();

    for line in &new.lines {
        sqlx::query(
            r#"
            INSERT INTO invoice_item (invoiceId, itemId, quantity, rate, discount, taxPercentage, line_total)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(invoice_pk)
        .bind(line.item_id)
        .bind(line.quantity)
        .bind(line.rate)
        .bind(line.discount)
        .bind(line.tax_percentage)
        .bind(line.line_total)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to create invoice line", e))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit invoice", e))?;

    let invoice = get_invoice(pool, invoice_pk).await?;
    let lines = invoice_lines(pool, invoice_pk).await?;
    Ok((invoice, lines))
}

/// Gets an invoice header by primary key
pub async fn get_invoice(pool: &DbPool, id: i64) -> Result<Invoice, AppError> {
    let row = sqlx::query(
        "SELECT id, invoiceId, customerId, createdAt, pdfPath, totalAmount FROM invoice WHERE id = ?",
    )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch invoice", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "Invoice".to_string(),
            identifier: id.to_string(),
        })?;

    row_to_invoice(row)
}

/// Gets the lines of an invoice, in insertion order
pub async fn invoice_lines(pool: &DbPool, invoice_pk: i64) -> Result<Vec<InvoiceItem>, AppError> {
    let rows = sqlx::query(
        "SELECT id, invoiceId, itemId, quantity, rate, discount, taxPercentage, line_total FROM invoice_item WHERE invoiceId = ? ORDER BY id",
    )
        .bind(invoice_pk)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch invoice lines", e))?;

    rows.into_iter().map(row_to_invoice_item).collect()
}

/// Deletes an invoice with its lines in one transaction and returns the
/// deleted rows
pub async fn delete_invoice(
    pool: &DbPool,
    id: i64,
) -> Result<(Invoice, Vec<InvoiceItem>), AppError> {
    let invoice = get_invoice(pool, id).await?;
    let lines = invoice_lines(pool, id).await?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin delete transaction", e))?;

    sqlx::query("DELETE FROM invoice_item WHERE invoiceId = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to delete invoice lines", e))?;

    sqlx::query("DELETE FROM invoice WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to delete invoice", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit invoice delete", e))?;

    Ok((invoice, lines))
}

/// Gets every invoice header, oldest first
pub async fn all_invoices(pool: &DbPool) -> Result<Vec<Invoice>, AppError> {
    let rows = sqlx::query(
        "SELECT id, invoiceId, customerId, createdAt, pdfPath, totalAmount FROM invoice ORDER BY id",
    )
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list invoices", e))?;

    rows.into_iter().map(row_to_invoice).collect()
}

/// Gets every invoice line across all invoices, oldest first
pub async fn all_invoice_lines(pool: &DbPool) -> Result<Vec<InvoiceItem>, AppError> {
    let rows = sqlx::query(
        "SELECT id, invoiceId, itemId, quantity, rate, discount, taxPercentage, line_total FROM invoice_item ORDER BY id",
    )
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list invoice lines", e))?;

    rows.into_iter().map(row_to_invoice_item).collect()
}

pub(crate) fn row_to_invoice(row: sqlx::sqlite::SqliteRow) -> Result<Invoice, AppError> {
    use sqlx::Row;

    let created_at: DateTime<Utc> = row
        .try_get("createdAt")
        .map_err(|e| AppError::database("Missing invoice createdAt", e))?;

    Ok(Invoice {
        id: row
            .try_get("id")
            .map_err(|e| AppError::database("Missing invoice ID", e))?,
        invoice_id: row
            .try_get("invoiceId")
            .map_err(|e| AppError::database("Missing invoice number", e))?,
        customer_id: row
            .try_get("customerId")
            .map_err(|e| AppError::database("Missing invoice customerId", e))?,
        created_at,
        pdf_path: row
            .try_get("pdfPath")
            .map_err(|e| AppError::database("Missing invoice pdfPath", e))?,
        total_amount: row
            .try_get("totalAmount")
            .map_err(|e| AppError::database("Missing invoice totalAmount", e))?,
    })
}

pub(crate) fn row_to_invoice_item(row: sqlx::sqlite::SqliteRow) -> Result<InvoiceItem, AppError> {
    use sqlx::Row;

    Ok(InvoiceItem {
        id: row
            .try_get("id")
            .map_err(|e| AppError::database("Missing invoice line ID", e))?,
        invoice_id: row
            .try_get("invoiceId")
            .map_err(|e| AppError::database("Missing invoice line invoiceId", e))?,
        item_id: row
            .try_get("itemId")
            .map_err(|e| AppError::database("Missing invoice line itemId", e))?,
        quantity: row
            .try_get("quantity")
            .map_err(|e| AppError::database("Missing invoice line quantity", e))?,
        rate: row
            .try_get("rate")
            .map_err(|e| AppError::database("Missing invoice line rate", e))?,
        discount: row
            .try_get("discount")
            .map_err(|e| AppError::database("Missing invoice line discount", e))?,
        tax_percentage: row
            .try_get("taxPercentage")
            .map_err(|e| AppError::database("Missing invoice line taxPercentage", e))?,
        line_total: row
            .try_get("line_total")
            .map_err(|e| AppError::database("Missing invoice line total", e))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::create_test_db;
    use crate::migrations::run_migrations;
    use crate::queries::customers::{create_customer, NewCustomer};
    use crate::queries::items::{create_item, NewItem};

    async fn setup() -> (DbPool, i64, i64) {
        let pool = create_test_db().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let customer = create_customer(
            &pool,
            &NewCustomer {
                name: "Acme".to_string(),
                phone: "555-0100".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let item = create_item(
            &pool,
            &NewItem {
                name: "Widget".to_string(),
                unit_price: 100.0,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        (pool, customer.id, item.id)
    }

    fn sample(customer_id: i64, item_id: i64) -> NewInvoice {
        NewInvoice {
            invoice_id: "INV-001".to_string(),
            customer_id,
            pdf_path: "/invoices/INV-001.pdf".to_string(),
            total_amount: 236.0,
            lines: vec![NewInvoiceLine {
                item_id,
                quantity: 2,
                rate: 100.0,
                discount: 0.0,
                tax_percentage: 18.0,
                line_total: 236.0,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_invoice_with_lines() {
        let (pool, customer_id, item_id) = setup().await;

        let (invoice, lines) = create_invoice(&pool, &sample(customer_id, item_id))
            .await
            .unwrap();
        assert_eq!(invoice.invoice_id, "INV-001");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].invoice_id, invoice.id);
        assert_eq!(lines[0].line_total, 236.0);
    }

    #[tokio::test]
    async fn test_create_invoice_rejects_unknown_customer() {
        let (pool, _, item_id) = setup().await;

        let result = create_invoice(&pool, &sample(999, item_id)).await;
        assert!(result.is_err());

        // Nothing should have been committed
        assert!(all_invoices(&pool).await.unwrap().is_empty());
        assert!(all_invoice_lines(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_invoice_removes_lines() {
        let (pool, customer_id, item_id) = setup().await;

        let (invoice, _) = create_invoice(&pool, &sample(customer_id, item_id))
            .await
            .unwrap();
        let (deleted, lines) = delete_invoice(&pool, invoice.id).await.unwrap();
        assert_eq!(deleted.id, invoice.id);
        assert_eq!(lines.len(), 1);

        assert!(all_invoices(&pool).await.unwrap().is_empty());
        assert!(all_invoice_lines(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_invoice_lines_spans_invoices() {
        let (pool, customer_id, item_id) = setup().await;

        create_invoice(&pool, &sample(customer_id, item_id))
            .await
            .unwrap();
        let mut second = sample(customer_id, item_id);
        second.invoice_id = "INV-002".to_string();
        create_invoice(&pool, &second).await.unwrap();

        assert_eq!(all_invoice_lines(&pool).await.unwrap().len(), 2);
    }
}
