//! Item database operations

use crate::DbPool;
use billstage_core::{AppError, Item};

/// Fields for an item about to be created
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Display name
    pub name: String,
    /// HSN/SAC classification code
    pub hsn: Option<String>,
    /// Price per unit
    pub unit_price: f64,
    /// Default quantity
    pub quantity: f64,
    /// Default tax rate in percent
    pub tax_percentage: Option<f64>,
}

impl Default for NewItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            hsn: None,
            unit_price: 0.0,
            quantity: 1.0,
            tax_percentage: None,
        }
    }
}

/// Creates a new item and returns the stored row
pub async fn create_item(pool: &DbPool, new: &NewItem) -> Result<Item, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO item (name, hsn, unitPrice, quantity, taxPercentage)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.name)
    .bind(&new.hsn)
    .bind(new.unit_price)
    .bind(new.quantity)
    .bind(new.tax_percentage)
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to create item", e))?;

    get_item(pool, result.last_insert_rowid()).await
}

/// Gets an item by ID
pub async fn get_item(pool: &DbPool, id: i64) -> Result<Item, AppError> {
    let row = sqlx::query(
        "SELECT id, name, hsn, unitPrice, quantity, taxPercentage FROM item WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::database("Failed to fetch item", e))?
    .ok_or_else(|| AppError::RecordNotFound {
        entity: "Item".to_string(),
        identifier: id.to_string(),
    })?;

    row_to_item(row)
}

/// Updates an existing item
pub async fn update_item(pool: &DbPool, item: &Item) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE item
        SET name = ?, hsn = ?, unitPrice = ?, quantity = ?, taxPercentage = ?
        WHERE id = ?
        "#,
    )
    .bind(&item.name)
    .bind(&item.hsn)
    .bind(item.unit_price)
    .bind(item.quantity)
    .bind(item.tax_percentage)
    .bind(item.id)
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to update item", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound {
            entity: "Item".to_string(),
            identifier: item.id.to_string(),
        });
    }
    Ok(())
}

/// Deletes an item and returns the deleted row
pub async fn delete_item(pool: &DbPool, id: i64) -> Result<Item, AppError> {
    let item = get_item(pool, id).await?;
    sqlx::query("DELETE FROM item WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete item", e))?;
    Ok(item)
}

/// Gets every item, oldest first
pub async fn all_items(pool: &DbPool) -> Result<Vec<Item>, AppError> {
    let rows = sqlx::query(
        "SELECT id, name, hsn, unitPrice, quantity, taxPercentage FROM item ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to list items", e))?;

    rows.into_iter().map(row_to_item).collect()
}

pub(crate) fn row_to_item(row: sqlx::sqlite::SqliteRow) -> Result<Item, AppError> {
    use sqlx::Row;

    Ok(Item {
        id: row
            .try_get("id")
            .map_err(|e| AppError::database("Missing item ID", e))?,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database("Missing item name", e))?,
        hsn: row.try_get("hsn").ok().flatten(),
        unit_price: row
            .try_get("unitPrice")
            .map_err(|e| AppError::database("Missing item unitPrice", e))?,
        quantity: row
            .try_get("quantity")
            .map_err(|e| AppError::database("Missing item quantity", e))?,
        tax_percentage: row.try_get("taxPercentage").ok().flatten(),
    })
}
