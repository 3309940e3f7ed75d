//! Wire types for the dashboard REST API.
//!
//! The backend is loose about optional fields (a workflow that could not be
//! queried comes back with `input: null`, timestamps may be Unix seconds or
//! ISO strings), so everything that can be missing is an `Option` or has a
//! serde default, and malformed timestamps degrade to `None`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── Accounts ──────────────────────────────────────────────────────────────────

/// Balance as last reported by the server. Never computed client-side.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Account {
    pub balance: f64,
}

/// `GET /api/accounts`, keyed by account id. Iteration order is the render order.
pub type AccountMap = BTreeMap<String, Account>;

// ── Workflows ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum WorkflowStatus {
    Running,
    Completed,
    /// FAILED, and every other closed state the server may report
    /// (TERMINATED, CANCELED, TIMED_OUT).
    Failed,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }
}

impl From<String> for WorkflowStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "RUNNING" => WorkflowStatus::Running,
            "COMPLETED" => WorkflowStatus::Completed,
            _ => WorkflowStatus::Failed,
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkflowStatus::Running => "RUNNING",
            WorkflowStatus::Completed => "COMPLETED",
            WorkflowStatus::Failed => "FAILED",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkflowInput {
    pub from_account: Option<String>,
    pub to_account:   Option<String>,
    pub amount:       Option<f64>,
}

/// Result payload of a finished transfer workflow.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransferResult {
    pub success: bool,
    pub from_account: Option<String>,
    pub to_account:   Option<String>,
    pub from_account_starting_balance: Option<f64>,
    pub to_account_starting_balance:   Option<f64>,
    pub error_message: Option<String>,
}

/// One entry of `GET /api/workflows`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Workflow {
    pub workflow_id: String,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub input: Option<WorkflowInput>,
    #[serde(default)]
    pub steps: Option<Vec<String>>,
    #[serde(default)]
    pub completed_steps: Option<Vec<String>>,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub close_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result: Option<TransferResult>,
}

impl Workflow {
    /// Bare workflow with only id and status; used by tests and as a base for
    /// builders.
    #[cfg(test)]
    pub fn new(workflow_id: &str, status: WorkflowStatus) -> Self {
        Self {
            workflow_id: workflow_id.to_owned(),
            status,
            input: None,
            steps: None,
            completed_steps: None,
            current_step: None,
            start_time: None,
            close_time: None,
            result: None,
        }
    }
}

// ── Account history ───────────────────────────────────────────────────────────

/// Totals derived server-side; consumed read-only.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransactionSummary {
    pub total_sent:        f64,
    pub total_received:    f64,
    pub net_change:        f64,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TransferDirection {
    Sent,
    Received,
}

impl From<String> for TransferDirection {
    fn from(raw: String) -> Self {
        if raw == "sent" {
            TransferDirection::Sent
        } else {
            TransferDirection::Received
        }
    }
}

/// A workflow as seen from one account's side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountTransaction {
    #[serde(default)]
    pub input: Option<WorkflowInput>,
    pub direction: TransferDirection,
    #[serde(default)]
    pub counterparty: Option<String>,
    pub status: WorkflowStatus,
}

/// `GET /api/accounts/{id}/workflows`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccountHistory {
    pub summary:   TransactionSummary,
    pub workflows: Vec<AccountTransaction>,
}

// ── Requests / small responses ────────────────────────────────────────────────

/// Body of `POST /api/transfer`. Build through `TransferRequest::new` so the
/// same-account guard always runs before anything goes over the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    pub from_account: String,
    pub to_account:   String,
    pub amount:       f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferStarted {
    pub workflow_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeState {
    pub enabled: bool,
}

/// `{ "error": "..." }` body the API returns alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

// ── Timestamps ────────────────────────────────────────────────────────────────

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_timestamp))
}

/// Unix seconds (integer or fractional) or an ISO-8601 string.
/// Anything else, including out-of-range numbers, yields `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::from_timestamp(whole as i64, nanos)
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|d| d.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|n| n.and_utc())
            }),
        _ => None,
    }
}
