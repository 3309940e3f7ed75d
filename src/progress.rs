//! Step-progress markers for transfer workflows.
//!
//! Pure derivation: the same inputs always give the same markers, and nothing
//! is remembered between calls.

use crate::model::{Workflow, WorkflowInput, WorkflowStatus};

/// Step list assumed when a workflow does not report its own.
pub const DEFAULT_STEPS: [&str; 4] = ["check_balance_from", "check_balance_to", "withdraw", "deposit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Current,
    Pending,
}

impl StepState {
    pub fn icon(self) -> &'static str {
        match self {
            StepState::Completed => "✓",
            StepState::Current => "●",
            StepState::Pending => "○",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepMarker {
    pub state: StepState,
    pub label: String,
}

/// Map a step list, the completed set and the current step to markers.
///
/// `all_completed` marks every step completed; it is used for COMPLETED
/// workflows where the server may not enumerate the individual steps.
pub fn derive(
    steps: &[String],
    completed: &[String],
    current: Option<&str>,
    all_completed: bool,
    input: Option<&WorkflowInput>,
) -> Vec<StepMarker> {
    steps
        .iter()
        .map(|step| {
            let is_completed = all_completed || completed.iter().any(|c| c == step);
            let state = if is_completed {
                StepState::Completed
            } else if current == Some(step.as_str()) {
                StepState::Current
            } else {
                StepState::Pending
            };
            StepMarker {
                state,
                label: step_label(step, input),
            }
        })
        .collect()
}

/// Markers for a workflow record, falling back to [`DEFAULT_STEPS`].
pub fn for_workflow(workflow: &Workflow) -> Vec<StepMarker> {
    let default_steps;
    let steps: &[String] = match &workflow.steps {
        Some(steps) => steps,
        None => {
            default_steps = DEFAULT_STEPS.map(String::from);
            &default_steps
        }
    };
    derive(
        steps,
        workflow.completed_steps.as_deref().unwrap_or_default(),
        workflow.current_step.as_deref(),
        workflow.status == WorkflowStatus::Completed,
        workflow.input.as_ref(),
    )
}

fn step_label(step: &str, input: Option<&WorkflowInput>) -> String {
    let from = input.and_then(|i| i.from_account.as_deref()).unwrap_or("...");
    let to = input.and_then(|i| i.to_account.as_deref()).unwrap_or("...");
    match step {
        "check_balance_from" => format!("Check Balance ({from})"),
        "check_balance_to" => format!("Check Balance ({to})"),
        "withdraw" => "Withdraw".into(),
        "deposit" => "Deposit".into(),
        other => other.to_owned(),
    }
}
