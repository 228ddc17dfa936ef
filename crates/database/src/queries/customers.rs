//! Customer database operations

use crate::DbPool;
use billstage_core::{AppError, Customer};
use chrono::{DateTime, Utc};

/// Fields for a customer about to be created; the id and creation time
/// are assigned by the database layer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    /// Display name
    pub name: String,
    /// Company name, if any
    pub company: Option<String>,
    /// Unique phone number
    pub phone: String,
    /// Contact email
    pub email: Option<String>,
    /// GST registration number
    pub gst: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Free-form business category
    pub business_type: Option<String>,
}

/// Creates a new customer and returns the stored row
pub async fn create_customer(pool: &DbPool, new: &NewCustomer) -> Result<Customer, AppError> {
    let created_at = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO customer (name, company, phone, email, gst, address, businessType, createdAt)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.name)
    .bind(&new.company)
    .bind(&new.phone)
    .bind(&new.email)
    .bind(&new.gst)
    .bind(&new.address)
    .bind(&new.business_type)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to create customer", e))?;

    get_customer(pool, result.last_insert_rowid()).await
}

/// Gets a customer by ID
pub async fn get_customer(pool: &DbPool, id: i64) -> Result<Customer, AppError> {
    let row = sqlx::query(
        "SELECT id, name, company, phone, email, gst, address, businessType, createdAt FROM customer WHERE id = ?"
    )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch customer", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "Customer".to_string(),
            identifier: id.to_string(),
        })?;

    row_to_customer(row)
}

/// Updates an existing customer
pub async fn update_customer(pool: &DbPool, customer: &Customer) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE customer
        SET name = ?, company = ?, phone = ?, email = ?, gst = ?, address = ?, businessType = ?
        WHERE id = ?
        "#,
    )
    .bind(&customer.name)
    .bind(&customer.company)
    .bind(&customer.phone)
    .bind(&customer.email)
    .bind(&customer.gst)
    .bind(&customer.address)
    .bind(&customer.business_type)
    .bind(customer.id)
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to update customer", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound {
            entity: "Customer".to_string(),
            identifier: customer.id.to_string(),
        });
    }
    Ok(())
}

/// Deletes a customer and returns the deleted row
pub async fn delete_customer(pool: &DbPool, id: i64) -> Result<Customer, AppError> {
    let customer = get_customer(pool, id).await?;
    sqlx::query("DELETE FROM customer WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete customer", e))?;
    Ok(customer)
}

/// Gets every customer, oldest first
pub async fn all_customers(pool: &DbPool) -> Result<Vec<Customer>, AppError> {
    let rows = sqlx::query(
        "SELECT id, name, company, phone, email, gst, address, businessType, createdAt FROM customer ORDER BY id"
    )
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list customers", e))?;

    rows.into_iter().map(row_to_customer).collect()
}

pub(crate) fn row_to_customer(row: sqlx::sqlite::SqliteRow) -> Result<Customer, AppError> {
    use sqlx::Row;

    let created_at: DateTime<Utc> = row
        .try_get("createdAt")
        .map_err(|e| AppError::database("Missing customer createdAt", e))?;

    Ok(Customer {
        id: row
            .try_get("id")
            .map_err(|e| AppError::database("Missing customer ID", e))?,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database("Missing customer name", e))?,
        company: row.try_get("company").ok().flatten(),
        phone: row
            .try_get("phone")
            .map_err(|e| AppError::database("Missing customer phone", e))?,
        email: row.try_get("email").ok().flatten(),
        gst: row.try_get("gst").ok().flatten(),
        address: row.try_get("address").ok().flatten(),
        business_type: row.try_get("businessType").ok().flatten(),
        created_at,
    })
}
