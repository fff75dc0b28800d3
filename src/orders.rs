//! Delivery order lifecycle.
//!
//! Orders move `pending -> approved -> out-for-delivery -> delivered`,
//! with `cancelled` reachable from `pending` or `approved` (the admin
//! "reject after approval" action included). Transitions never regress;
//! every function here validates the current status before mutating.
//! Orders are never deleted — the collection is the order history.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::inventory;
use crate::models::{AgentStatus, DeliveryAgent, DeliveryOrder, OrderItem, OrderStatus, Product};
use crate::seed::RESTAURANT_NAME;
use crate::store::{ChangeEvent, Collection, Store};

/// Orders below this total are refused at placement.
pub const MINIMUM_ORDER_VALUE: f64 = 10.0;

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Resolve free-text item names against the catalog, case-insensitively.
///
/// The conversational ordering tool sends bare item names; matched names
/// take the current catalog price with quantity 1. Unmatched names are
/// kept at price 0 — order items are free-text snapshots and an off-menu
/// request still belongs in the order history.
pub fn quote_items(store: &Store, names: &[String]) -> Vec<OrderItem> {
    let products: Vec<Product> = store.read(Collection::Products);
    names
        .iter()
        .map(|name| {
            let price = products
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .map(|p| p.price)
                .unwrap_or(0.0);
            OrderItem {
                name: name.clone(),
                quantity: 1,
                price,
            }
        })
        .collect()
}

/// Create a `pending` order with the given item snapshot.
pub fn place_order(
    store: &Store,
    items: Vec<OrderItem>,
    delivery_address: &str,
    customer_name: &str,
    phone_number: &str,
) -> Result<DeliveryOrder> {
    if delivery_address.trim().is_empty() {
        return Err(Error::validation("delivery address cannot be empty"));
    }
    if customer_name.trim().is_empty() {
        return Err(Error::validation("customer name cannot be empty"));
    }
    if phone_number.trim().is_empty() {
        return Err(Error::validation("phone number cannot be empty"));
    }
    if items.is_empty() {
        return Err(Error::validation("order must contain at least one item"));
    }
    if items.iter().any(|i| i.quantity < 1) {
        return Err(Error::validation("item quantities must be at least 1"));
    }

    let total: f64 = items.iter().map(|i| i.price * i.quantity as f64).sum();
    if total < MINIMUM_ORDER_VALUE {
        return Err(Error::validation(format!(
            "order total {total:.2} is below the minimum of {MINIMUM_ORDER_VALUE:.2}"
        )));
    }

    let order = DeliveryOrder {
        id: format!("order-{}", Uuid::new_v4()),
        restaurant_name: RESTAURANT_NAME.to_string(),
        items,
        delivery_address: delivery_address.trim().to_string(),
        timestamp: Utc::now(),
        status: OrderStatus::Pending,
        customer_name: customer_name.trim().to_string(),
        phone_number: phone_number.trim().to_string(),
        agent_id: None,
        estimated_delivery_time: None,
        actual_delivery_time: None,
    };

    let mut orders: Vec<DeliveryOrder> = store.read(Collection::Orders);
    orders.push(order.clone());
    store.write(Collection::Orders, &orders)?;

    info!(order_id = %order.id, total = %format!("{total:.2}"), "order placed");
    Ok(order)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// `pending -> approved`. Requires the estimated delivery time in minutes
/// and stamps it on the order.
pub fn approve_order(
    store: &Store,
    order_id: &str,
    estimated_minutes: i64,
) -> Result<Option<DeliveryOrder>> {
    if estimated_minutes <= 0 {
        return Err(Error::validation(
            "estimated delivery time must be a positive number of minutes",
        ));
    }

    let mut orders: Vec<DeliveryOrder> = store.read(Collection::Orders);
    let Some(idx) = orders.iter().position(|o| o.id == order_id) else {
        warn!(order_id, "approve: order no longer exists, nothing to do");
        return Ok(None);
    };
    expect_status(&orders[idx], OrderStatus::Pending, "approve")?;

    orders[idx].status = OrderStatus::Approved;
    orders[idx].estimated_delivery_time = Some(Utc::now() + Duration::minutes(estimated_minutes));
    store.write(Collection::Orders, &orders)?;

    info!(order_id, estimated_minutes, "order approved");
    Ok(Some(orders[idx].clone()))
}

/// `approved -> out-for-delivery`. The agent must exist and be
/// `available`; this is enforced here regardless of what any surface
/// already disabled. Flips the agent to `on-delivery`.
pub fn assign_agent(
    store: &Store,
    order_id: &str,
    agent_id: &str,
) -> Result<Option<DeliveryOrder>> {
    let mut orders: Vec<DeliveryOrder> = store.read(Collection::Orders);
    let Some(idx) = orders.iter().position(|o| o.id == order_id) else {
        warn!(order_id, "assign: order no longer exists, nothing to do");
        return Ok(None);
    };
    expect_status(&orders[idx], OrderStatus::Approved, "assign")?;

    let mut agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
    let Some(agent_idx) = agents.iter().position(|a| a.id == agent_id) else {
        return Err(Error::validation(format!("unknown agent: {agent_id}")));
    };
    if agents[agent_idx].status != AgentStatus::Available {
        return Err(Error::validation(format!(
            "agent {} is {}, not available",
            agents[agent_idx].name,
            agents[agent_idx].status.as_str()
        )));
    }

    orders[idx].agent_id = Some(agent_id.to_string());
    orders[idx].status = OrderStatus::OutForDelivery;
    agents[agent_idx].status = AgentStatus::OnDelivery;

    store.write(Collection::Orders, &orders)?;
    store.write(Collection::Agents, &agents)?;

    info!(order_id, agent_id, "order out for delivery");
    Ok(Some(orders[idx].clone()))
}

/// `out-for-delivery -> delivered`. Stamps the actual delivery time,
/// releases the assigned agent, and applies the stock decrement for every
/// line item (best-effort — see `inventory::record_sales_for_order`).
pub fn mark_delivered(store: &Store, order_id: &str) -> Result<Option<DeliveryOrder>> {
    let mut orders: Vec<DeliveryOrder> = store.read(Collection::Orders);
    let Some(idx) = orders.iter().position(|o| o.id == order_id) else {
        warn!(order_id, "deliver: order no longer exists, nothing to do");
        return Ok(None);
    };
    expect_status(&orders[idx], OrderStatus::OutForDelivery, "deliver")?;

    orders[idx].status = OrderStatus::Delivered;
    orders[idx].actual_delivery_time = Some(Utc::now());
    let delivered = orders[idx].clone();

    store.write(Collection::Orders, &orders)?;
    release_agent(store, delivered.agent_id.as_deref())?;
    inventory::record_sales_for_order(store, &delivered)?;

    info!(order_id, "order delivered");
    Ok(Some(delivered))
}

/// `pending|approved -> cancelled`. Covers both the customer's
/// pre-approval cancellation and the admin rejecting an approved order.
/// An already-assigned agent is released.
pub fn cancel_order(store: &Store, order_id: &str) -> Result<Option<DeliveryOrder>> {
    let mut orders: Vec<DeliveryOrder> = store.read(Collection::Orders);
    let Some(idx) = orders.iter().position(|o| o.id == order_id) else {
        warn!(order_id, "cancel: order no longer exists, nothing to do");
        return Ok(None);
    };
    if !matches!(
        orders[idx].status,
        OrderStatus::Pending | OrderStatus::Approved
    ) {
        return Err(Error::validation(format!(
            "cannot cancel order {order_id}: status is {}",
            orders[idx].status.as_str()
        )));
    }

    orders[idx].status = OrderStatus::Cancelled;
    let cancelled = orders[idx].clone();

    store.write(Collection::Orders, &orders)?;
    release_agent(store, cancelled.agent_id.as_deref())?;

    info!(order_id, "order cancelled");
    Ok(Some(cancelled))
}

fn expect_status(order: &DeliveryOrder, expected: OrderStatus, action: &str) -> Result<()> {
    if order.status != expected {
        return Err(Error::validation(format!(
            "cannot {action} order {}: status is {}, expected {}",
            order.id,
            order.status.as_str(),
            expected.as_str()
        )));
    }
    Ok(())
}

fn release_agent(store: &Store, agent_id: Option<&str>) -> Result<()> {
    let Some(agent_id) = agent_id else {
        return Ok(());
    };
    let mut agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
    if let Some(agent) = agents.iter_mut().find(|a| a.id == agent_id) {
        agent.status = AgentStatus::Available;
        store.write(Collection::Agents, &agents)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read side
// ---------------------------------------------------------------------------

pub fn order_total(order: &DeliveryOrder) -> f64 {
    order
        .items
        .iter()
        .map(|i| i.price * i.quantity as f64)
        .sum()
}

pub fn pending_count(orders: &[DeliveryOrder]) -> usize {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count()
}

/// Interpret an order-collection change event as (old, new) pending
/// counts. This is the diff other contexts perform to surface a
/// "new pending order received" notice. Non-order events yield `None`;
/// unparsable sides read as empty.
pub fn pending_delta(event: &ChangeEvent) -> Option<(usize, usize)> {
    if event.key != Collection::Orders.key() {
        return None;
    }
    let parse = |raw: Option<&str>| -> Vec<DeliveryOrder> {
        raw.and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    };
    let old = parse(event.old_value.as_deref());
    let new = parse(event.new_value.as_deref());
    Some((pending_count(&old), pending_count(&new)))
}

/// Delivered-order revenue roll-up for the sales dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub today: f64,
    pub month: f64,
    pub year: f64,
    pub recent: Vec<DeliveryOrder>,
}

pub fn sales_summary(orders: &[DeliveryOrder], now: DateTime<Utc>) -> SalesSummary {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let month = now
        .date_naive()
        .with_day0(0)
        .unwrap_or_else(|| now.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc();
    let year = now
        .date_naive()
        .with_ordinal0(0)
        .unwrap_or_else(|| now.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc();

    let delivered: Vec<&DeliveryOrder> = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .collect();

    let sum_since = |cutoff: DateTime<Utc>| -> f64 {
        delivered
            .iter()
            .filter(|o| o.timestamp >= cutoff)
            .map(|o| order_total(o))
            .sum()
    };

    let mut recent: Vec<DeliveryOrder> = delivered.iter().map(|o| (*o).clone()).collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent.truncate(5);

    SalesSummary {
        today: sum_since(today),
        month: sum_since(month),
        year: sum_since(year),
        recent,
    }
}

/// Deliveries completed today, counted per agent.
pub fn deliveries_today_by_agent(
    orders: &[DeliveryOrder],
    now: DateTime<Utc>,
) -> HashMap<String, usize> {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for order in orders {
        if order.status != OrderStatus::Delivered || order.timestamp < today {
            continue;
        }
        if let Some(agent_id) = &order.agent_id {
            *counts.entry(agent_id.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Pre-filled handoff message for the outbound messaging deep link,
/// including the admin approval link for this order.
pub fn share_summary(order: &DeliveryOrder, approval_link: &str) -> String {
    let items: Vec<String> = order
        .items
        .iter()
        .map(|i| format!("- {}x {} @ ${:.2}", i.quantity, i.name, i.price))
        .collect();
    format!(
        "Hello! Please approve my order from {}.\n\n*Order ID:* {}\n*Customer:* {}\n*Phone:* {}\n*Address:* {}\n\n*Items:*\n{}\n*Total:* ${:.2}\n\n*Admin Approval Link:* {}",
        order.restaurant_name,
        order.id,
        order.customer_name,
        order.phone_number,
        order.delivery_address,
        items.join("\n"),
        order_total(order),
        approval_link
    )
}

// ===========================================================================
// Tests
// ===========================================================================
