//! Attendance tracking for delivery agents.
//!
//! Clock events are gated on the agent's current attendance status, which
//! is what keeps the invariant of at most one open record per agent: you
//! cannot clock in twice without clocking out, no matter what a surface
//! allows.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{AttendanceRecord, AttendanceStatus, DeliveryAgent};
use crate::store::{Collection, Store};

/// Open a new attendance record and flip the agent to `clocked-in`.
/// Allowed only while the agent is `clocked-out`.
pub fn clock_in(store: &Store, agent_id: &str, photo: Option<&str>) -> Result<AttendanceRecord> {
    if let Some(photo) = photo {
        validate_photo(photo)?;
    }

    let mut agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
    let agent = agents
        .iter_mut()
        .find(|a| a.id == agent_id)
        .ok_or_else(|| Error::not_found("agent", agent_id))?;
    if agent.attendance_status == AttendanceStatus::ClockedIn {
        return Err(Error::validation(format!(
            "{} is already clocked in",
            agent.name
        )));
    }

    let mut records: Vec<AttendanceRecord> = store.read(Collection::Attendance);
    if records.iter().any(|r| r.agent_id == agent_id && r.is_open()) {
        return Err(Error::validation(format!(
            "{} already has an open attendance record",
            agent.name
        )));
    }

    let record = AttendanceRecord {
        id: format!("att-{}", Uuid::new_v4()),
        agent_id: agent.id.clone(),
        agent_name: agent.name.clone(),
        clock_in_time: Utc::now(),
        clock_out_time: None,
        status: AttendanceStatus::ClockedIn,
        clock_in_photo: photo.map(str::to_string),
        clock_out_photo: None,
    };
    records.push(record.clone());
    agent.attendance_status = AttendanceStatus::ClockedIn;

    store.write(Collection::Attendance, &records)?;
    store.write(Collection::Agents, &agents)?;

    info!(agent_id, record_id = %record.id, "agent clocked in");
    Ok(record)
}

/// Complete the agent's single open record and flip them back to
/// `clocked-out`. Allowed only while the agent is `clocked-in`.
pub fn clock_out(store: &Store, agent_id: &str, photo: Option<&str>) -> Result<AttendanceRecord> {
    if let Some(photo) = photo {
        validate_photo(photo)?;
    }

    let mut agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
    let agent = agents
        .iter_mut()
        .find(|a| a.id == agent_id)
        .ok_or_else(|| Error::not_found("agent", agent_id))?;
    if agent.attendance_status != AttendanceStatus::ClockedIn {
        return Err(Error::validation(format!(
            "{} is not clocked in",
            agent.name
        )));
    }

    let mut records: Vec<AttendanceRecord> = store.read(Collection::Attendance);
    let record = records
        .iter_mut()
        .find(|r| r.agent_id == agent_id && r.is_open())
        .ok_or_else(|| {
            Error::validation(format!("no open attendance record for {}", agent.name))
        })?;

    record.clock_out_time = Some(Utc::now());
    record.clock_out_photo = photo.map(str::to_string);
    record.status = AttendanceStatus::ClockedOut;
    let completed = record.clone();
    agent.attendance_status = AttendanceStatus::ClockedOut;

    store.write(Collection::Attendance, &records)?;
    store.write(Collection::Agents, &agents)?;

    info!(agent_id, record_id = %completed.id, "agent clocked out");
    Ok(completed)
}

/// The agent's open record, if any.
pub fn open_record<'a>(
    records: &'a [AttendanceRecord],
    agent_id: &str,
) -> Option<&'a AttendanceRecord> {
    records.iter().find(|r| r.agent_id == agent_id && r.is_open())
}

/// Clock photos arrive as base64 data URLs from the camera capture; only
/// the envelope is validated here, never the image contents.
fn validate_photo(photo: &str) -> Result<()> {
    let payload = photo
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| Error::validation("photo must be a base64 image data URL"))?;
    BASE64
        .decode(payload)
        .map_err(|e| Error::validation(format!("photo payload is not valid base64: {e}")))?;
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentStatus;
    use std::path::PathBuf;

    const PHOTO: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("stanley_attendance_test_{}", Uuid::new_v4()))
    }

    fn store_with_agent(agent_id: &str) -> (Store, PathBuf) {
        let dir = temp_dir();
        let store = Store::open(&dir).expect("open store");
        store
            .write(
                Collection::Agents,
                &[DeliveryAgent {
                    id: agent_id.to_string(),
                    name: "John Doe".into(),
                    phone: "123-456-7890".into(),
                    status: AgentStatus::Available,
                    current_location: None,
                    attendance_status: AttendanceStatus::ClockedOut,
                    hourly_rate: 12.5,
                }],
            )
            .expect("write agent");
        (store, dir)
    }

    #[test]
    fn test_clock_in_then_out_roundtrip() {
        let (store, dir) = store_with_agent("agent-b");

        let opened = clock_in(&store, "agent-b", Some(PHOTO)).expect("clock in");
        assert!(opened.is_open());
        assert_eq!(opened.clock_in_photo.as_deref(), Some(PHOTO));

        let agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
        assert_eq!(agents[0].attendance_status, AttendanceStatus::ClockedIn);

        let closed = clock_out(&store, "agent-b", Some(PHOTO)).expect("clock out");
        assert_eq!(closed.id, opened.id);
        assert!(closed.clock_out_time.is_some());
        assert_eq!(closed.status, AttendanceStatus::ClockedOut);

        let agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
        assert_eq!(agents[0].attendance_status, AttendanceStatus::ClockedOut);

        let records: Vec<AttendanceRecord> = store.read(Collection::Attendance);
        assert_eq!(records.len(), 1);
        assert!(open_record(&records, "agent-b").is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_double_clock_in_rejected() {
        let (store, dir) = store_with_agent("agent-b");

        clock_in(&store, "agent-b", None).expect("first clock in");
        let err = clock_in(&store, "agent-b", None).expect_err("second clock in must fail");
        assert!(matches!(err, Error::Validation(_)));

        // Exactly one open record for the agent
        let records: Vec<AttendanceRecord> = store.read(Collection::Attendance);
        assert_eq!(records.iter().filter(|r| r.is_open()).count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_clock_out_requires_clocked_in() {
        let (store, dir) = store_with_agent("agent-b");

        assert!(matches!(
            clock_out(&store, "agent-b", None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            clock_in(&store, "agent-gone", None),
            Err(Error::NotFound { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_photo_envelope_validated() {
        let (store, dir) = store_with_agent("agent-b");

        assert!(matches!(
            clock_in(&store, "agent-b", Some("not a data url")),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            clock_in(&store, "agent-b", Some("data:image/png;base64,@@not-base64@@")),
            Err(Error::Validation(_))
        ));
        // The refused attempts left no records behind
        let records: Vec<AttendanceRecord> = store.read(Collection::Attendance);
        assert!(records.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
