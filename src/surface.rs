//! Retained render surface.
//!
//! The view draws only from this tree; the reconciler is the only thing that
//! mutates it. Account rows carry a [`RowHandle`] that identifies the row for
//! its whole lifetime and doubles as the key of the Iced keyed column, so a
//! row whose handle survives a refresh keeps its widget state.

use std::fmt;

use chrono::{DateTime, Local, Utc};

use crate::model::{AccountHistory, TransferDirection, TransferResult, Workflow, WorkflowStatus};
use crate::progress::{self, StepMarker};

// ── Accounts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    pub handle:       RowHandle,
    pub account_id:   String,
    pub balance_text: String,
    pub expanded:     bool,
    pub history:      HistoryPanel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryPanel {
    Loading,
    Failed,
    Loaded(HistoryView),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccountsRegion {
    /// Nothing fetched yet.
    Pending,
    NoAccounts,
    /// Inline placeholder after a failed accounts fetch.
    Error(String),
    Rows(Vec<AccountRow>),
}

// ── Account history panel ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub direction:    TransferDirection,
    pub counterparty: String,
    pub amount_text:  String,
    pub status_icon:  &'static str,
}

impl HistoryEntry {
    pub fn direction_icon(&self) -> &'static str {
        match self.direction {
            TransferDirection::Sent => "→",
            TransferDirection::Received => "←",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub sent_text:     String,
    pub received_text: String,
    pub net_text:      String,
    pub net_positive:  bool,
    pub count_text:    String,
    pub entries:       Vec<HistoryEntry>,
    /// "Showing N of M transactions" when the list was truncated.
    pub more:          Option<String>,
}

impl HistoryView {
    pub fn build(history: &AccountHistory, limit: usize) -> Self {
        let summary = &history.summary;
        let entries = history
            .workflows
            .iter()
            .take(limit)
            .map(|tx| {
                let amount = tx.input.as_ref().and_then(|i| i.amount).unwrap_or(0.0);
                let sign = match tx.direction {
                    TransferDirection::Sent => "-",
                    TransferDirection::Received => "+",
                };
                HistoryEntry {
                    direction:    tx.direction,
                    counterparty: tx.counterparty.clone().unwrap_or_else(|| "Unknown".into()),
                    amount_text:  format!("{sign}{}", money(amount)),
                    status_icon:  status_icon(tx.status),
                }
            })
            .collect();

        let total = history.workflows.len();
        Self {
            sent_text:     money(summary.total_sent),
            received_text: money(summary.total_received),
            net_text:      signed_money(summary.net_change),
            net_positive:  summary.net_change >= 0.0,
            count_text:    summary.transaction_count.to_string(),
            entries,
            more: (total > limit).then(|| format!("Showing {limit} of {total} transactions")),
        }
    }
}

// ── Account pickers ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerSlot {
    From,
    To,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickerOption {
    pub account_id: String,
    pub label:      String,
}

impl fmt::Display for PickerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Picker {
    pub options:  Vec<PickerOption>,
    pub selected: Option<String>,
}

impl Picker {
    pub fn selected_option(&self) -> Option<&PickerOption> {
        let selected = self.selected.as_deref()?;
        self.options.iter().find(|o| o.account_id == selected)
    }
}

// ── Workflows ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowCard {
    pub workflow_id: String,
    pub status:      WorkflowStatus,
    pub from:        String,
    pub to:          String,
    pub amount_text: String,
    /// Start/close lines; only terminal cards show them.
    pub timestamps:  Option<(String, String)>,
    pub steps:       Vec<StepMarker>,
    pub result_text: Option<String>,
}

impl WorkflowCard {
    pub fn running(workflow: &Workflow) -> Self {
        let input = workflow.input.clone().unwrap_or_default();
        Self {
            workflow_id: workflow.workflow_id.clone(),
            status:      workflow.status,
            from:        input.from_account.unwrap_or_else(|| "Unknown".into()),
            to:          input.to_account.unwrap_or_else(|| "Unknown".into()),
            amount_text: money(input.amount.unwrap_or(0.0)),
            timestamps:  None,
            steps:       progress::for_workflow(workflow),
            result_text: None,
        }
    }

    pub fn terminal(workflow: &Workflow) -> Self {
        Self {
            timestamps: Some((
                format_timestamp(workflow.start_time),
                format_timestamp(workflow.close_time),
            )),
            result_text: workflow
                .result
                .as_ref()
                .and_then(|r| result_text(r, workflow.status)),
            ..Self::running(workflow)
        }
    }

    pub fn status_icon(&self) -> &'static str {
        status_icon(self.status)
    }
}

pub const NO_ACTIVE_WORKFLOWS: &str = "No active workflows";
pub const NO_COMPLETED_WORKFLOWS: &str = "No completed workflows";

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowRegion {
    Empty,
    Cards(Vec<WorkflowCard>),
}

impl WorkflowRegion {
    pub fn from_cards(cards: Vec<WorkflowCard>) -> Self {
        if cards.is_empty() {
            WorkflowRegion::Empty
        } else {
            WorkflowRegion::Cards(cards)
        }
    }
}

// ── Surface ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Surface {
    pub accounts:       AccountsRegion,
    pub from_picker:    Picker,
    pub to_picker:      Picker,
    /// Picker whose dropdown is open; repopulation is skipped while set.
    pub focused_picker: Option<PickerSlot>,
    pub running:        WorkflowRegion,
    pub terminal:       WorkflowRegion,
    next_handle:        u64,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            accounts:       AccountsRegion::Pending,
            from_picker:    Picker::default(),
            to_picker:      Picker::default(),
            focused_picker: None,
            running:        WorkflowRegion::Empty,
            terminal:       WorkflowRegion::Empty,
            next_handle:    1,
        }
    }
}

impl Surface {
    pub fn allocate_handle(&mut self) -> RowHandle {
        let handle = RowHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    pub fn rows(&self) -> &[AccountRow] {
        match &self.accounts {
            AccountsRegion::Rows(rows) => rows,
            _ => &[],
        }
    }

    pub fn row(&self, account_id: &str) -> Option<&AccountRow> {
        self.rows().iter().find(|r| r.account_id == account_id)
    }

    pub fn row_mut(&mut self, account_id: &str) -> Option<&mut AccountRow> {
        match &mut self.accounts {
            AccountsRegion::Rows(rows) => rows.iter_mut().find(|r| r.account_id == account_id),
            _ => None,
        }
    }

    pub fn picker_mut(&mut self, slot: PickerSlot) -> &mut Picker {
        match slot {
            PickerSlot::From => &mut self.from_picker,
            PickerSlot::To => &mut self.to_picker,
        }
    }
}

// ── Formatting ────────────────────────────────────────────────────────────────

pub fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

pub fn signed_money(amount: f64) -> String {
    if amount >= 0.0 {
        format!("+${amount:.2}")
    } else {
        format!("-${:.2}", amount.abs())
    }
}

/// `Mar 1, 2024, 1:05:09 PM` in local time, or `N/A`.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.with_timezone(&Local).format("%b %-d, %Y, %-I:%M:%S %p").to_string(),
        None => "N/A".into(),
    }
}

fn status_icon(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::Completed => "✓",
        WorkflowStatus::Running => "🔄",
        WorkflowStatus::Failed => "✗",
    }
}

fn result_text(result: &TransferResult, status: WorkflowStatus) -> Option<String> {
    match status {
        WorkflowStatus::Completed if result.success => {
            let side = |account: &Option<String>, balance: Option<f64>| {
                format!(
                    "{}: {}",
                    account.as_deref().unwrap_or("Unknown"),
                    balance.map(money).unwrap_or_else(|| "N/A".into()),
                )
            };
            Some(format!(
                "Starting balances: {} | {}",
                side(&result.from_account, result.from_account_starting_balance),
                side(&result.to_account, result.to_account_starting_balance),
            ))
        }
        WorkflowStatus::Failed => Some(format!(
            "Error: {}",
            result.error_message.as_deref().unwrap_or("Workflow execution failed"),
        )),
        _ => None,
    }
}
