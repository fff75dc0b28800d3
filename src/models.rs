//! Typed records for the persisted collections.
//!
//! Field names serialize camelCase and status values kebab-case so the
//! stored JSON matches the layout the web client persists; every
//! collection is a JSON array of whole records under one named slot.
//! Timestamps are RFC 3339 UTC; calendar values (payroll periods, leave
//! ranges) are plain dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Cached projection of the stock ledger. Sales clamp at 0; explicit
    /// adjustments may drive it negative.
    pub stock: i64,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Line item snapshotted at order time; later catalog price changes do not
/// touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Approved,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::OutForDelivery => "out-for-delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Append-only order history record. Orders are never deleted; only the
/// status-transition operations in `orders` mutate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOrder {
    pub id: String,
    pub restaurant_name: String,
    pub items: Vec<OrderItem>,
    pub delivery_address: String,
    pub timestamp: DateTime<Utc>,
    pub status: OrderStatus,
    pub customer_name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_delivery_time: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Delivery agents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentStatus {
    Available,
    OnDelivery,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Available => "available",
            AgentStatus::OnDelivery => "on-delivery",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    ClockedIn,
    #[default]
    ClockedOut,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::ClockedIn => "clocked-in",
            AttendanceStatus::ClockedOut => "clocked-out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAgent {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_location: Option<GeoPoint>,
    #[serde(default)]
    pub attendance_status: AttendanceStatus,
    #[serde(default)]
    pub hourly_rate: f64,
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub clock_in_time: DateTime<Utc>,
    /// Null while the shift is open. At most one open record per agent.
    pub clock_out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_in_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_out_photo: Option<String>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.clock_out_time.is_none()
    }
}

// ---------------------------------------------------------------------------
// Payroll
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayrollStatus {
    Pending,
    Paid,
}

/// Generated in batch from attendance records; immutable once created
/// except for the pending -> paid flip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRecord {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub hours_worked: f64,
    /// Rate snapshotted at generation time.
    pub hourly_rate: f64,
    pub total_pay: f64,
    pub status: PayrollStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Stock ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockRecordType {
    StockIn,
    Sale,
    Adjustment,
}

/// Append-only audit entry. The product's `stock` field is a cached
/// projection of this ledger; every mutation path updates both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    #[serde(rename = "type")]
    pub record_type: StockRecordType,
    pub quantity_change: i64,
    pub new_stock_level: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Supplies,
    Rent,
    Utilities,
    Marketing,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: f64,
}

// ---------------------------------------------------------------------------
// Leave requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub requested_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tasks, submissions, FAQ
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqItem {
    pub id: String,
    pub question: String,
    pub answer: String,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_order_serializes_camel_case_and_kebab_status() {
        let order = DeliveryOrder {
            id: "order-1".into(),
            restaurant_name: "STANLEY'S CAFETERIA".into(),
            items: vec![OrderItem {
                name: "Pizza".into(),
                quantity: 3,
                price: 12.99,
            }],
            delivery_address: "123 Main St".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            status: OrderStatus::OutForDelivery,
            customer_name: "Alice".into(),
            phone_number: "555-0100".into(),
            agent_id: Some("agent-1".into()),
            estimated_delivery_time: None,
            actual_delivery_time: None,
        };

        let json = serde_json::to_value(&order).expect("serialize order");
        assert_eq!(json["status"], "out-for-delivery");
        assert_eq!(json["deliveryAddress"], "123 Main St");
        assert_eq!(json["customerName"], "Alice");
        assert_eq!(json["agentId"], "agent-1");
        // Unset optionals are omitted entirely, not serialized as null
        assert!(json.get("actualDeliveryTime").is_none());
    }

    #[test]
    fn test_attendance_open_record_serializes_null_clock_out() {
        let record = AttendanceRecord {
            id: "att-1".into(),
            agent_id: "agent-1".into(),
            agent_name: "John Doe".into(),
            clock_in_time: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            clock_out_time: None,
            status: AttendanceStatus::ClockedIn,
            clock_in_photo: None,
            clock_out_photo: None,
        };

        let json = serde_json::to_value(&record).expect("serialize attendance");
        // clockOutTime is an explicit null while the shift is open
        assert!(json["clockOutTime"].is_null());
        assert_eq!(json["status"], "clocked-in");
    }

    #[test]
    fn test_agent_defaults_tolerate_missing_fields() {
        // Agents persisted by earlier versions carry neither attendance
        // status nor hourly rate.
        let agent: DeliveryAgent = serde_json::from_str(
            r#"{"id":"agent-1","name":"John Doe","phone":"123-456-7890","status":"available"}"#,
        )
        .expect("deserialize legacy agent");
        assert_eq!(agent.attendance_status, AttendanceStatus::ClockedOut);
        assert_eq!(agent.hourly_rate, 0.0);
        assert!(agent.current_location.is_none());
    }

    #[test]
    fn test_stock_record_type_field_name() {
        let rec = StockRecord {
            id: "stk-1".into(),
            product_id: "prod-1".into(),
            product_name: "Pizza".into(),
            record_type: StockRecordType::StockIn,
            quantity_change: 10,
            new_stock_level: 30,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            order_id: None,
            note: Some("weekly delivery".into()),
        };

        let json = serde_json::to_value(&rec).expect("serialize stock record");
        assert_eq!(json["type"], "stock-in");
        assert_eq!(json["quantityChange"], 10);
        assert_eq!(json["newStockLevel"], 30);
    }

    #[test]
    fn test_expense_category_serializes_capitalized() {
        let json = serde_json::to_value(ExpenseCategory::Supplies).expect("serialize category");
        assert_eq!(json, "Supplies");
    }

    #[test]
    fn test_payroll_period_serializes_plain_dates() {
        let rec = PayrollRecord {
            id: "payroll-agent-1-2025-06-01".into(),
            agent_id: "agent-1".into(),
            agent_name: "John Doe".into(),
            period_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            hours_worked: 42.5,
            hourly_rate: 12.5,
            total_pay: 531.25,
            status: PayrollStatus::Pending,
            paid_at: None,
        };

        let json = serde_json::to_value(&rec).expect("serialize payroll");
        assert_eq!(json["periodStart"], "2025-06-01");
        assert_eq!(json["periodEnd"], "2025-06-15");
        assert!(json["paidAt"].is_null());
    }
}
