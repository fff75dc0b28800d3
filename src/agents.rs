//! Delivery agent roster.
//!
//! Assignment and fulfillment flip an agent's availability (see `orders`);
//! this module covers roster management and the availability audit: an
//! agent is `on-delivery` iff exactly one out-for-delivery order
//! references them.

use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{AgentStatus, AttendanceStatus, DeliveryAgent, DeliveryOrder, GeoPoint,
    OrderStatus};
use crate::store::{Collection, Store};

pub fn add_agent(
    store: &Store,
    name: &str,
    phone: &str,
    hourly_rate: f64,
) -> Result<DeliveryAgent> {
    if name.trim().is_empty() {
        return Err(Error::validation("agent name cannot be empty"));
    }
    if phone.trim().is_empty() {
        return Err(Error::validation("agent phone cannot be empty"));
    }
    if !(hourly_rate >= 0.0) {
        return Err(Error::validation("hourly rate cannot be negative"));
    }

    let agent = DeliveryAgent {
        id: format!("agent-{}", Uuid::new_v4()),
        name: name.trim().to_string(),
        phone: phone.trim().to_string(),
        status: AgentStatus::Available,
        current_location: None,
        attendance_status: AttendanceStatus::ClockedOut,
        hourly_rate,
    };

    let mut agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
    agents.push(agent.clone());
    store.write(Collection::Agents, &agents)?;

    info!(agent_id = %agent.id, name = %agent.name, "agent added");
    Ok(agent)
}

/// Change an agent's hourly rate. Takes effect for payroll generated
/// after this point; already-generated records keep their snapshot.
pub fn update_hourly_rate(store: &Store, agent_id: &str, hourly_rate: f64) -> Result<DeliveryAgent> {
    if !(hourly_rate >= 0.0) {
        return Err(Error::validation("hourly rate cannot be negative"));
    }
    update_agent(store, agent_id, |agent| {
        agent.hourly_rate = hourly_rate;
    })
}

/// Record an agent's last known location, as reported by the tracking map.
pub fn update_location(store: &Store, agent_id: &str, lat: f64, lng: f64) -> Result<DeliveryAgent> {
    update_agent(store, agent_id, |agent| {
        agent.current_location = Some(GeoPoint { lat, lng });
    })
}

fn update_agent(
    store: &Store,
    agent_id: &str,
    apply: impl FnOnce(&mut DeliveryAgent),
) -> Result<DeliveryAgent> {
    let mut agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
    let agent = agents
        .iter_mut()
        .find(|a| a.id == agent_id)
        .ok_or_else(|| Error::not_found("agent", agent_id))?;
    apply(agent);
    let updated = agent.clone();
    store.write(Collection::Agents, &agents)?;
    Ok(updated)
}

/// Audit the availability invariant over a snapshot. Returns the ids of
/// agents whose status disagrees with the orders that reference them.
pub fn availability_violations(
    orders: &[DeliveryOrder],
    agents: &[DeliveryAgent],
) -> Vec<String> {
    agents
        .iter()
        .filter_map(|agent| {
            let active = orders
                .iter()
                .filter(|o| {
                    o.status == OrderStatus::OutForDelivery
                        && o.agent_id.as_deref() == Some(agent.id.as_str())
                })
                .count();
            let consistent = match agent.status {
                AgentStatus::OnDelivery => active == 1,
                AgentStatus::Available => active == 0,
            };
            (!consistent).then(|| agent.id.clone())
        })
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================
