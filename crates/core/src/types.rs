// crates/core/src/types.rs
//! Shared types for change capture and synchronization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A business table whose mutations are captured for synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedTable {
    /// Customer master records
    Customer,
    /// Item (product/service) master records
    Item,
    /// Invoice headers
    Invoice,
    /// Invoice line items
    InvoiceItem,
}

impl TrackedTable {
    /// Parent-before-child order for full synchronization.
    ///
    /// The remote schema enforces the same foreign keys as the local one,
    /// so children uploaded before their parents would be rejected.
    pub const SYNC_ORDER: [TrackedTable; 4] = [
        TrackedTable::Customer,
        TrackedTable::Item,
        TrackedTable::Invoice,
        TrackedTable::InvoiceItem,
    ];

    /// Returns the table name used both locally and on the remote REST path
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedTable::Customer => "customer",
            TrackedTable::Item => "item",
            TrackedTable::Invoice => "invoice",
            TrackedTable::InvoiceItem => "invoice_item",
        }
    }

    /// Parses a table name, returning `None` for untracked tables
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "customer" => Some(TrackedTable::Customer),
            "item" => Some(TrackedTable::Item),
            "invoice" => Some(TrackedTable::Invoice),
            "invoice_item" => Some(TrackedTable::InvoiceItem),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrackedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of mutation a change event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// Row was created
    Insert,
    /// Row was updated
    Update,
    /// Row was deleted
    Delete,
}

impl ChangeAction {
    /// Returns the lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Insert => "insert",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        }
    }

    /// Lenient parse used when replaying staged files.
    ///
    /// Anything that is not an update or a delete is dispatched as an
    /// insert, matching how older staged files recorded dependent inserts.
    pub fn parse_lenient(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "update" => ChangeAction::Update,
            "delete" => ChangeAction::Delete,
            _ => ChangeAction::Insert,
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer master record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Primary key
    pub id: i64,
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
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// An item (product or service) master record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Primary key
    pub id: i64,
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

/// An invoice header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Primary key
    pub id: i64,
    /// Human-facing invoice number, unique
    pub invoice_id: String,
    /// Owning customer
    pub customer_id: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Path of the rendered PDF
    pub pdf_path: String,
    /// Grand total
    pub total_amount: f64,
}

/// A single line on an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    /// Primary key
    pub id: i64,
    /// Owning invoice
    pub invoice_id: i64,
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
    #[serde(rename = "line_total")]
    pub line_total: f64,
}

/// One record of a tracked table, tagged by table.
///
/// Capture goes through this enum so every staged payload has an explicit,
/// compile-time field list. Replay of already-staged files stays loosely
/// typed (see [`ChangeEvent::data`]).
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRecord {
    /// A customer row
    Customer(Customer),
    /// An item row
    Item(Item),
    /// An invoice row
    Invoice(Invoice),
    /// An invoice line row
    InvoiceItem(InvoiceItem),
}

impl EntityRecord {
    /// Returns the table this record belongs to
    pub fn table(&self) -> TrackedTable {
        match self {
            EntityRecord::Customer(_) => TrackedTable::Customer,
            EntityRecord::Item(_) => TrackedTable::Item,
            EntityRecord::Invoice(_) => TrackedTable::Invoice,
            EntityRecord::InvoiceItem(_) => TrackedTable::InvoiceItem,
        }
    }

    /// Serializes the record into the flat JSON map used on disk and on the wire
    pub fn to_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let value = match self {
            EntityRecord::Customer(c) => serde_json::to_value(c)?,
            EntityRecord::Item(i) => serde_json::to_value(i)?,
            EntityRecord::Invoice(i) => serde_json::to_value(i)?,
            EntityRecord::InvoiceItem(i) => serde_json::to_value(i)?,
        };
        match value {
            Value::Object(map) => Ok(map),
            // Entity structs always serialize to objects
            _ => Ok(Map::new()),
        }
    }
}

/// One durable record of a single mutation, as staged on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// When the mutation was captured
    pub timestamp: DateTime<Utc>,
    /// Table name; `analytics` for telemetry events
    pub table: String,
    /// The kind of mutation
    pub action: ChangeAction,
    /// Flat record payload; carries `id` for updates and deletes
    pub data: Map<String, Value>,
}

impl ChangeEvent {
    /// Builds a change event for a tracked entity mutation
    pub fn for_entity(
        action: ChangeAction,
        record: &EntityRecord,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            timestamp: Utc::now(),
            table: record.table().as_str().to_string(),
            action,
            data: record.to_map()?,
        })
    }

    /// Builds an insert-style telemetry event for the `analytics` kind
    pub fn for_analytics(data: Map<String, Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            table: "analytics".to_string(),
            action: ChangeAction::Insert,
            data,
        }
    }
}

/// A telemetry event with the fixed analytics field set.
///
/// Producers go through this struct so every analytics payload carries the
/// same keys; unset fields serialize as `null` rather than being absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Page the user was on
    pub current_page: String,
    /// What the user did
    pub activity: String,
    /// Element clicked, when the activity was a click
    pub click: Option<String>,
    /// Seconds spent on the page, for navigation events
    pub time_spent: Option<f64>,
    /// Page navigated away from
    pub previous_page: Option<String>,
    /// Acting user
    pub user: String,
}

impl AnalyticsEvent {
    /// Builds an event with the optional fields unset
    pub fn new(current_page: &str, activity: &str, user: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            current_page: current_page.to_string(),
            activity: activity.to_string(),
            click: None,
            time_spent: None,
            previous_page: None,
            user: user.to_string(),
        }
    }

    /// Serializes the event into the flat map staged on disk
    pub fn into_map(self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// A record that was delivered successfully
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedRecord {
    /// Destination table
    pub table: String,
    /// Action that was applied
    pub action: ChangeAction,
    /// The delivered payload
    pub data: Map<String, Value>,
}

/// A record that could not be delivered, with diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Destination table
    pub table: String,
    /// Action that was attempted
    pub action: ChangeAction,
    /// The payload that was rejected
    pub record: Map<String, Value>,
    /// Server response or transport error
    pub details: Value,
}

impl FailureDetail {
    /// Extracts a short human-readable message from the diagnostics, if any
    pub fn message(&self) -> Option<String> {
        match &self.details {
            Value::Object(map) => {
                for key in ["message", "error"] {
                    if let Some(Value::String(s)) = map.get(key) {
                        return Some(s.clone());
                    }
                }
                map.get("response").and_then(|resp| match resp {
                    Value::Object(inner) => {
                        for key in ["message", "error"] {
                            if let Some(Value::String(s)) = inner.get(key) {
                                return Some(s.clone());
                            }
                        }
                        None
                    }
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
            }
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Aggregate outcome of one engine run (or one table within a full run)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResult {
    /// Number of records acknowledged by the remote store
    pub uploaded: usize,
    /// Number of records that failed transmission
    pub failed: usize,
    /// The acknowledged records
    pub uploaded_records: Vec<UploadedRecord>,
    /// Diagnostics for every failed record
    pub failure_details: Vec<FailureDetail>,
}

impl UploadResult {
    /// Creates an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one acknowledged delivery
    pub fn record_success(&mut self, table: &str, action: ChangeAction, data: Map<String, Value>) {
        self.uploaded += 1;
        self.uploaded_records.push(UploadedRecord {
            table: table.to_string(),
            action,
            data,
        });
    }

    /// Records one failed delivery with its diagnostics
    pub fn record_failure(
        &mut self,
        table: &str,
        action: ChangeAction,
        record: Map<String, Value>,
        details: Value,
    ) {
        self.failed += 1;
        self.failure_details.push(FailureDetail {
            table: table.to_string(),
            action,
            record,
            details,
        });
    }

    /// Folds another result into this one
    pub fn merge(&mut self, other: UploadResult) {
        self.uploaded += other.uploaded;
        self.failed += other.failed;
        self.uploaded_records.extend(other.uploaded_records);
        self.failure_details.extend(other.failure_details);
    }

    /// Returns true if nothing failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Total number of records attempted in this run
    pub fn attempted(&self) -> usize {
        self.uploaded + self.failed
    }
}

/// A failed transmission persisted under the `failed/` tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// When the failure was recorded
    pub timestamp: DateTime<Utc>,
    /// Destination table
    pub table: String,
    /// Action that was attempted
    pub action: ChangeAction,
    /// The rejected payload
    pub record: Map<String, Value>,
    /// Server response or transport error
    pub details: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_customer() -> Customer {
        Customer {
            id: 1,
            name: "Acme".to_string(),
            company: Some("Acme Corp".to_string()),
            phone: "555-0100".to_string(),
            email: None,
            gst: None,
            address: None,
            business_type: Some("retail".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sync_order_is_parent_before_child() {
        assert_eq!(TrackedTable::SYNC_ORDER[0], TrackedTable::Customer);
        assert_eq!(TrackedTable::SYNC_ORDER[3], TrackedTable::InvoiceItem);
    }

    #[test]
    fn test_table_name_round_trip() {
        for table in TrackedTable::SYNC_ORDER {
            assert_eq!(TrackedTable::from_name(table.as_str()), Some(table));
        }
        assert_eq!(TrackedTable::from_name("user"), None);
    }

    #[test]
    fn test_action_lenient_parse() {
        assert_eq!(ChangeAction::parse_lenient("UPDATE"), ChangeAction::Update);
        assert_eq!(ChangeAction::parse_lenient("delete"), ChangeAction::Delete);
        assert_eq!(
            ChangeAction::parse_lenient("post_commit_insert"),
            ChangeAction::Insert
        );
    }

    #[test]
    fn test_customer_wire_names() {
        let value = serde_json::to_value(sample_customer()).unwrap();
        assert!(value.get("businessType").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("business_type").is_none());
    }

    #[test]
    fn test_invoice_item_keeps_snake_line_total() {
        let line = InvoiceItem {
            id: 1,
            invoice_id: 2,
            item_id: 3,
            quantity: 4,
            rate: 100.0,
            discount: 0.0,
            tax_percentage: 18.0,
            line_total: 472.0,
        };
        let value = serde_json::to_value(line).unwrap();
        assert!(value.get("line_total").is_some());
        assert!(value.get("invoiceId").is_some());
        assert!(value.get("lineTotal").is_none());
    }

    #[test]
    fn test_change_event_for_entity() {
        let record = EntityRecord::Customer(sample_customer());
        let event = ChangeEvent::for_entity(ChangeAction::Insert, &record).unwrap();
        assert_eq!(event.table, "customer");
        assert_eq!(event.action, ChangeAction::Insert);
        assert_eq!(event.data.get("id"), Some(&json!(1)));
    }

    #[test]
    fn test_analytics_event_has_fixed_field_set() {
        let mut event = AnalyticsEvent::new("invoices", "navigate", "guest");
        event.previous_page = Some("dashboard".to_string());
        let map = event.into_map().unwrap();
        for field in [
            "timestamp",
            "current_page",
            "activity",
            "click",
            "time_spent",
            "previous_page",
            "user",
        ] {
            assert!(map.contains_key(field), "missing {}", field);
        }
        assert_eq!(map["click"], Value::Null);
        assert_eq!(map["previous_page"], "dashboard");
    }

    #[test]
    fn test_upload_result_invariant() {
        let mut result = UploadResult::new();
        result.record_success("customer", ChangeAction::Insert, Map::new());
        result.record_failure(
            "item",
            ChangeAction::Update,
            Map::new(),
            json!({"status_code": 500}),
        );
        assert_eq!(result.attempted(), 2);
        assert_eq!(result.uploaded, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_clean());
    }

    #[test]
    fn test_upload_result_merge() {
        let mut a = UploadResult::new();
        a.record_success("customer", ChangeAction::Insert, Map::new());
        let mut b = UploadResult::new();
        b.record_failure("item", ChangeAction::Insert, Map::new(), json!("boom"));
        a.merge(b);
        assert_eq!(a.uploaded, 1);
        assert_eq!(a.failed, 1);
        assert_eq!(a.failure_details.len(), 1);
    }

    #[test]
    fn test_failure_detail_message_extraction() {
        let detail = FailureDetail {
            table: "item".to_string(),
            action: ChangeAction::Insert,
            record: Map::new(),
            details: json!({"status_code": 409, "response": {"message": "duplicate key"}}),
        };
        assert_eq!(detail.message(), Some("duplicate key".to_string()));

        let plain = FailureDetail {
            table: "item".to_string(),
            action: ChangeAction::Insert,
            record: Map::new(),
            details: json!({"error": "connection refused"}),
        };
        assert_eq!(plain.message(), Some("connection refused".to_string()));
    }
}
