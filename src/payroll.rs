//! Payroll generation from attendance records.
//!
//! Records are keyed `(agent, period start)` so re-running generation for
//! the same period is idempotent at the storage layer: duplicate ids are
//! filtered before persisting. An already-generated record is never
//! recomputed or merged, even when the attendance data for its period has
//! changed since.

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{AttendanceRecord, DeliveryAgent, PayrollRecord, PayrollStatus};
use crate::store::{Collection, Store};

/// Deterministic payroll record id for one agent and period.
pub fn payroll_id(agent_id: &str, period_start: NaiveDate) -> String {
    format!("payroll-{agent_id}-{period_start}")
}

/// Generate payroll for every agent with at least one completed
/// attendance record fully contained in the period. The end boundary is
/// inclusive through 23:59:59.999 of the end date. Pay uses the agent's
/// CURRENT hourly rate at generation time. Returns only the newly created
/// records.
pub fn generate_payroll(
    store: &Store,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<Vec<PayrollRecord>> {
    if period_end < period_start {
        return Err(Error::validation(
            "payroll period end cannot be before its start",
        ));
    }

    let window_start = period_start.and_time(NaiveTime::MIN).and_utc();
    let window_end = period_end.and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
        - Duration::milliseconds(1);

    let attendance: Vec<AttendanceRecord> = store.read(Collection::Attendance);
    let mut hours_by_agent: BTreeMap<String, f64> = BTreeMap::new();
    for record in &attendance {
        let Some(clock_out) = record.clock_out_time else {
            continue;
        };
        if record.clock_in_time < window_start || clock_out > window_end {
            continue;
        }
        let hours = (clock_out - record.clock_in_time).num_milliseconds() as f64 / 3_600_000.0;
        *hours_by_agent.entry(record.agent_id.clone()).or_insert(0.0) += hours;
    }

    let agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
    let mut payroll: Vec<PayrollRecord> = store.read(Collection::Payroll);
    let existing: HashSet<String> = payroll.iter().map(|r| r.id.clone()).collect();

    let mut created = Vec::new();
    for (agent_id, hours_worked) in hours_by_agent {
        let id = payroll_id(&agent_id, period_start);
        if existing.contains(&id) {
            continue;
        }
        // The rate snapshot needs the agent's current roster entry; shifts
        // of agents no longer on the roster are left out.
        let Some(agent) = agents.iter().find(|a| a.id == agent_id) else {
            continue;
        };
        created.push(PayrollRecord {
            id,
            agent_id,
            agent_name: agent.name.clone(),
            period_start,
            period_end,
            hours_worked,
            hourly_rate: agent.hourly_rate,
            total_pay: hours_worked * agent.hourly_rate,
            status: PayrollStatus::Pending,
            paid_at: None,
        });
    }

    if !created.is_empty() {
        payroll.extend(created.iter().cloned());
        store.write(Collection::Payroll, &payroll)?;
    }

    info!(
        period_start = %period_start,
        period_end = %period_end,
        created = created.len(),
        "payroll generated"
    );
    Ok(created)
}

/// Flip a record `pending -> paid` and stamp the payment time. The only
/// mutation a generated record ever receives.
pub fn mark_paid(store: &Store, record_id: &str) -> Result<PayrollRecord> {
    let mut payroll: Vec<PayrollRecord> = store.read(Collection::Payroll);
    let record = payroll
        .iter_mut()
        .find(|r| r.id == record_id)
        .ok_or_else(|| Error::not_found("payroll record", record_id))?;
    if record.status == PayrollStatus::Paid {
        return Err(Error::validation(format!(
            "payroll record {record_id} is already marked paid"
        )));
    }

    record.status = PayrollStatus::Paid;
    record.paid_at = Some(Utc::now());
    let updated = record.clone();
    store.write(Collection::Payroll, &payroll)?;

    info!(record_id, "payroll record marked paid");
    Ok(updated)
}

// ===========================================================================
// Tests
// ===========================================================================
