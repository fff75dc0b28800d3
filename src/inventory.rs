//! Stock ledger for the product catalog.
//!
//! The ledger is the append-only audit trail; a product's `stock` field is
//! a cached projection of it. Every mutation path writes both in the same
//! operation — current stock always equals the baseline plus the sum of
//! all signed ledger deltas.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{DeliveryOrder, Product, StockRecord, StockRecordType};
use crate::store::{Collection, Store};

/// Products at or above this level are considered healthy; anything below
/// is surfaced as low stock. Read-side classification only, never stored.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Apply a signed manual adjustment and return the new stock level.
///
/// A delta that would drive the level negative fails with
/// [`Error::NegativeStock`] unless the caller passes
/// `acknowledge_negative` — negative stock is permitted as a recorded
/// state, it is merely flagged on the way in.
pub fn adjust_stock(
    store: &Store,
    product_id: &str,
    delta: i64,
    note: Option<&str>,
    acknowledge_negative: bool,
) -> Result<i64> {
    if delta == 0 {
        return Err(Error::validation("stock adjustment cannot be zero"));
    }
    apply_change(
        store,
        product_id,
        delta,
        StockRecordType::Adjustment,
        note,
        acknowledge_negative,
    )
}

/// Record a supplier delivery (`stock-in`) and return the new level.
pub fn receive_stock(
    store: &Store,
    product_id: &str,
    quantity: i64,
    note: Option<&str>,
) -> Result<i64> {
    if quantity <= 0 {
        return Err(Error::validation(
            "received quantity must be greater than zero",
        ));
    }
    apply_change(
        store,
        product_id,
        quantity,
        StockRecordType::StockIn,
        note,
        false,
    )
}

fn apply_change(
    store: &Store,
    product_id: &str,
    delta: i64,
    record_type: StockRecordType,
    note: Option<&str>,
    acknowledge_negative: bool,
) -> Result<i64> {
    let mut products: Vec<Product> = store.read(Collection::Products);
    let idx = products
        .iter()
        .position(|p| p.id == product_id)
        .ok_or_else(|| Error::not_found("product", product_id))?;

    let new_level = products[idx].stock + delta;
    if new_level < 0 && !acknowledge_negative {
        return Err(Error::NegativeStock {
            product: products[idx].name.clone(),
            would_be: new_level,
        });
    }

    let mut ledger: Vec<StockRecord> = store.read(Collection::StockLedger);
    ledger.push(StockRecord {
        id: format!("stk-{}", Uuid::new_v4()),
        product_id: products[idx].id.clone(),
        product_name: products[idx].name.clone(),
        record_type,
        quantity_change: delta,
        new_stock_level: new_level,
        timestamp: Utc::now(),
        order_id: None,
        note: note.map(str::to_string),
    });
    products[idx].stock = new_level;

    store.write(Collection::Products, &products)?;
    store.write(Collection::StockLedger, &ledger)?;

    info!(
        product = %products[idx].name,
        delta,
        new_level,
        "stock level changed"
    );
    Ok(new_level)
}

/// Decrement stock for every line item of a delivered order, one `sale`
/// ledger entry per affected line item referencing the order.
///
/// Best-effort by contract: an item whose product no longer exists in the
/// catalog (the menu changed after the order was placed) is skipped without
/// failing delivery confirmation. Sales clamp at a floor of 0 — they never
/// push an already-negative level further down nor raise it.
pub(crate) fn record_sales_for_order(store: &Store, order: &DeliveryOrder) -> Result<()> {
    let mut products: Vec<Product> = store.read(Collection::Products);
    let mut ledger: Vec<StockRecord> = store.read(Collection::StockLedger);
    let mut changed = false;

    for item in &order.items {
        if item.quantity <= 0 {
            continue;
        }
        let Some(product) = products
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&item.name))
        else {
            warn!(
                order_id = %order.id,
                item = %item.name,
                "no matching product for sold item, skipping stock update"
            );
            continue;
        };

        // Floor is 0, or the current level when it is already below 0.
        let floor = product.stock.min(0);
        let new_level = (product.stock - item.quantity).max(floor);
        let applied = new_level - product.stock;
        if applied == 0 {
            continue;
        }

        ledger.push(StockRecord {
            id: format!("stk-{}", Uuid::new_v4()),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            record_type: StockRecordType::Sale,
            quantity_change: applied,
            new_stock_level: new_level,
            timestamp: Utc::now(),
            order_id: Some(order.id.clone()),
            note: None,
        });
        product.stock = new_level;
        changed = true;
    }

    if changed {
        store.write(Collection::Products, &products)?;
        store.write(Collection::StockLedger, &ledger)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read side
// ---------------------------------------------------------------------------

/// Products currently below the low-stock threshold.
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    products
        .iter()
        .filter(|p| p.stock < LOW_STOCK_THRESHOLD)
        .collect()
}

/// Replay a product's ledger entries over a baseline. Audit helper: for a
/// product whose full history is in the ledger, this equals its cached
/// `stock` projection.
pub fn ledger_level<'a>(
    baseline: i64,
    records: impl IntoIterator<Item = &'a StockRecord>,
) -> i64 {
    records
        .into_iter()
        .fold(baseline, |level, record| level + record.quantity_change)
}

// ===========================================================================
// Tests
// ===========================================================================
