//! Simple record collections and site content.
//!
//! Expenses, leave requests, tasks, contact submissions, and FAQ entries
//! all follow the same create/mutate pattern over their collections; site
//! content (about text, contact details, assistant instruction, home
//! background) lives in scalar slots with read-time defaults.

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    ContactSubmission, DeliveryAgent, ExpenseCategory, ExpenseRecord, FaqItem, LeaveRequest,
    LeaveStatus, Task, TaskStatus,
};
use crate::seed;
use crate::store::{Collection, Store};

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

pub fn add_expense(
    store: &Store,
    date: NaiveDate,
    category: ExpenseCategory,
    description: &str,
    amount: f64,
) -> Result<ExpenseRecord> {
    if description.trim().is_empty() {
        return Err(Error::validation("expense description cannot be empty"));
    }
    if !(amount > 0.0) {
        return Err(Error::validation("expense amount must be greater than zero"));
    }

    let record = ExpenseRecord {
        id: format!("exp-{}", Uuid::new_v4()),
        date,
        category,
        description: description.trim().to_string(),
        amount,
    };
    let mut expenses: Vec<ExpenseRecord> = store.read(Collection::Expenses);
    expenses.push(record.clone());
    store.write(Collection::Expenses, &expenses)?;
    Ok(record)
}

/// Expense history, newest first.
pub fn list_expenses(store: &Store) -> Vec<ExpenseRecord> {
    let mut expenses: Vec<ExpenseRecord> = store.read(Collection::Expenses);
    expenses.sort_by(|a, b| b.date.cmp(&a.date));
    expenses
}

// ---------------------------------------------------------------------------
// Leave requests
// ---------------------------------------------------------------------------

pub fn submit_leave(
    store: &Store,
    agent_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: &str,
) -> Result<LeaveRequest> {
    if end_date < start_date {
        return Err(Error::validation("leave end date cannot be before its start"));
    }
    if reason.trim().is_empty() {
        return Err(Error::validation("leave reason cannot be empty"));
    }

    let agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
    let agent = agents
        .iter()
        .find(|a| a.id == agent_id)
        .ok_or_else(|| Error::not_found("agent", agent_id))?;

    let request = LeaveRequest {
        id: format!("leave-{}", Uuid::new_v4()),
        agent_id: agent.id.clone(),
        agent_name: agent.name.clone(),
        start_date,
        end_date,
        reason: reason.trim().to_string(),
        status: LeaveStatus::Pending,
        requested_at: Utc::now(),
    };
    let mut requests: Vec<LeaveRequest> = store.read(Collection::LeaveRequests);
    requests.push(request.clone());
    store.write(Collection::LeaveRequests, &requests)?;

    info!(request_id = %request.id, agent_id, "leave requested");
    Ok(request)
}

/// Approve or reject a pending request. Resolved requests are final.
pub fn resolve_leave(store: &Store, request_id: &str, approve: bool) -> Result<LeaveRequest> {
    let mut requests: Vec<LeaveRequest> = store.read(Collection::LeaveRequests);
    let request = requests
        .iter_mut()
        .find(|r| r.id == request_id)
        .ok_or_else(|| Error::not_found("leave request", request_id))?;
    if request.status != LeaveStatus::Pending {
        return Err(Error::validation(format!(
            "leave request {request_id} has already been resolved"
        )));
    }

    request.status = if approve {
        LeaveStatus::Approved
    } else {
        LeaveStatus::Rejected
    };
    let resolved = request.clone();
    store.write(Collection::LeaveRequests, &requests)?;
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub fn add_task(store: &Store, title: &str, description: &str) -> Result<Task> {
    if title.trim().is_empty() {
        return Err(Error::validation("task title cannot be empty"));
    }

    let task = Task {
        id: format!("task-{}", Uuid::new_v4()),
        title: title.trim().to_string(),
        description: description.trim().to_string(),
        status: TaskStatus::Pending,
        created_at: Utc::now(),
    };
    let mut tasks: Vec<Task> = store.read(Collection::Tasks);
    tasks.push(task.clone());
    store.write(Collection::Tasks, &tasks)?;
    Ok(task)
}

pub fn complete_task(store: &Store, task_id: &str) -> Result<Task> {
    let mut tasks: Vec<Task> = store.read(Collection::Tasks);
    let task = tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| Error::not_found("task", task_id))?;
    if task.status == TaskStatus::Completed {
        return Err(Error::validation(format!(
            "task {task_id} is already completed"
        )));
    }
    task.status = TaskStatus::Completed;
    let completed = task.clone();
    store.write(Collection::Tasks, &tasks)?;
    Ok(completed)
}

// ---------------------------------------------------------------------------
// Contact submissions
// ---------------------------------------------------------------------------

pub fn add_submission(
    store: &Store,
    name: &str,
    email: &str,
    message: &str,
) -> Result<ContactSubmission> {
    if name.trim().is_empty() || message.trim().is_empty() {
        return Err(Error::validation("name and message are required"));
    }
    if !email.contains('@') {
        return Err(Error::validation("a valid email address is required"));
    }

    let submission = ContactSubmission {
        id: format!("sub-{}", Uuid::new_v4()),
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        message: message.trim().to_string(),
        timestamp: Utc::now(),
    };
    let mut submissions: Vec<ContactSubmission> = store.read(Collection::ContactSubmissions);
    submissions.push(submission.clone());
    store.write(Collection::ContactSubmissions, &submissions)?;
    Ok(submission)
}

/// Remove a submission. Returns whether anything was deleted; a missing
/// id is a silent no-op.
pub fn delete_submission(store: &Store, submission_id: &str) -> Result<bool> {
    let mut submissions: Vec<ContactSubmission> = store.read(Collection::ContactSubmissions);
    let before = submissions.len();
    submissions.retain(|s| s.id != submission_id);
    if submissions.len() == before {
        return Ok(false);
    }
    store.write(Collection::ContactSubmissions, &submissions)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// FAQ
// ---------------------------------------------------------------------------

/// Insert a new FAQ entry, or replace the one with the same id.
pub fn upsert_faq(store: &Store, faq: FaqItem) -> Result<FaqItem> {
    if faq.question.trim().is_empty() || faq.answer.trim().is_empty() {
        return Err(Error::validation("question and answer are required"));
    }

    let mut faqs: Vec<FaqItem> = store.read(Collection::Faqs);
    match faqs.iter_mut().find(|f| f.id == faq.id) {
        Some(existing) => *existing = faq.clone(),
        None => faqs.push(faq.clone()),
    }
    store.write(Collection::Faqs, &faqs)?;
    Ok(faq)
}

pub fn delete_faq(store: &Store, faq_id: &str) -> Result<bool> {
    let mut faqs: Vec<FaqItem> = store.read(Collection::Faqs);
    let before = faqs.len();
    faqs.retain(|f| f.id != faq_id);
    if faqs.len() == before {
        return Ok(false);
    }
    store.write(Collection::Faqs, &faqs)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Site content
// ---------------------------------------------------------------------------

const ABOUT_SLOT: &str = "about_content";
const CONTACT_PHONE_SLOT: &str = "contact_phone";
const CONTACT_EMAIL_SLOT: &str = "contact_email";
const OUTBOUND_MESSAGE_SLOT: &str = "outbound_message";
const ASSISTANT_INSTRUCTION_SLOT: &str = "assistant_instruction";
const HOME_BACKGROUND_SLOT: &str = "home_background";

pub fn about(store: &Store) -> String {
    store
        .read_text(ABOUT_SLOT)
        .unwrap_or_else(|| seed::DEFAULT_ABOUT.to_string())
}

pub fn set_about(store: &Store, text: &str) -> Result<()> {
    store.write_text(ABOUT_SLOT, text)
}

pub fn contact_phone(store: &Store) -> String {
    store
        .read_text(CONTACT_PHONE_SLOT)
        .unwrap_or_else(|| seed::DEFAULT_CONTACT_PHONE.to_string())
}

pub fn set_contact_phone(store: &Store, phone: &str) -> Result<()> {
    store.write_text(CONTACT_PHONE_SLOT, phone)
}

pub fn contact_email(store: &Store) -> String {
    store
        .read_text(CONTACT_EMAIL_SLOT)
        .unwrap_or_else(|| seed::DEFAULT_CONTACT_EMAIL.to_string())
}

pub fn set_contact_email(store: &Store, email: &str) -> Result<()> {
    store.write_text(CONTACT_EMAIL_SLOT, email)
}

/// Greeting template pre-filled into the outbound messaging deep link.
pub fn outbound_message(store: &Store) -> String {
    store
        .read_text(OUTBOUND_MESSAGE_SLOT)
        .unwrap_or_else(|| seed::DEFAULT_OUTBOUND_MESSAGE.to_string())
}

pub fn set_outbound_message(store: &Store, message: &str) -> Result<()> {
    store.write_text(OUTBOUND_MESSAGE_SLOT, message)
}

/// System instruction handed to the conversational ordering assistant.
pub fn assistant_instruction(store: &Store) -> String {
    store
        .read_text(ASSISTANT_INSTRUCTION_SLOT)
        .unwrap_or_else(|| seed::DEFAULT_ASSISTANT_INSTRUCTION.to_string())
}

pub fn set_assistant_instruction(store: &Store, instruction: &str) -> Result<()> {
    store.write_text(ASSISTANT_INSTRUCTION_SLOT, instruction)
}

pub fn reset_assistant_instruction(store: &Store) -> Result<()> {
    store.write_text(ASSISTANT_INSTRUCTION_SLOT, seed::DEFAULT_ASSISTANT_INSTRUCTION)
}

pub fn home_background(store: &Store) -> Option<String> {
    store.read_text(HOME_BACKGROUND_SLOT)
}

/// Set or clear the home page background image (a data URL).
pub fn set_home_background(store: &Store, image: Option<&str>) -> Result<()> {
    match image {
        Some(data_url) => store.write_text(HOME_BACKGROUND_SLOT, data_url),
        None => store.clear_text(HOME_BACKGROUND_SLOT),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
