//! User commands that talk to the gateway directly, outside the poll cadence.
//!
//! Each function here is the async half of a command: it performs the remote
//! calls and returns an outcome value. Applying the outcome to the dashboard
//! (notices, reconciliation, control state) happens in `dashboard`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::BatchTransfer;
use crate::gateway::{Gateway, GatewayError};
use crate::model::{AccountHistory, TransferRequest, Workflow};

// ── Submit transfer ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub started:   Result<String, GatewayError>,
    /// Immediate workflow refresh, only issued when the transfer started.
    pub workflows: Option<Result<Vec<Workflow>, GatewayError>>,
}

/// Start one transfer and, on success, re-read the workflow list right away
/// so the new workflow shows up without waiting for the next tick.
pub async fn submit_transfer<G: Gateway>(gateway: Arc<G>, request: TransferRequest) -> TransferOutcome {
    let started = gateway.start_transfer(&request).await;
    let workflows = match &started {
        Ok(workflow_id) => {
            info!(%workflow_id, from = %request.from_account, to = %request.to_account, amount = request.amount, "transfer started");
            Some(gateway.get_workflows().await)
        }
        Err(e) => {
            warn!(error = %e, from = %request.from_account, to = %request.to_account, "transfer rejected");
            None
        }
    };
    TransferOutcome { started, workflows }
}

// ── Batch ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSummary {
    AllSucceeded(usize),
    Partial { succeeded: usize, failed: usize },
    AllFailed,
}

impl BatchSummary {
    pub fn message(self) -> String {
        match self {
            BatchSummary::AllSucceeded(n) => format!("Daily batch started! {n} workflows initiated."),
            BatchSummary::Partial { succeeded, failed } => {
                format!("Batch partially started: {succeeded} succeeded, {failed} failed.")
            }
            BatchSummary::AllFailed => {
                "Failed to start daily batch. Check if services are running.".into()
            }
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, BatchSummary::AllSucceeded(_))
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub workflow_ids: Vec<String>,
    pub failures:     Vec<(BatchTransfer, GatewayError)>,
    pub workflows:    Result<Vec<Workflow>, GatewayError>,
}

impl BatchOutcome {
    pub fn success_count(&self) -> usize {
        self.workflow_ids.len()
    }

    pub fn fail_count(&self) -> usize {
        self.failures.len()
    }

    pub fn summary(&self) -> BatchSummary {
        match (self.success_count(), self.fail_count()) {
            (ok, 0) => BatchSummary::AllSucceeded(ok),
            (0, _) => BatchSummary::AllFailed,
            (succeeded, failed) => BatchSummary::Partial { succeeded, failed },
        }
    }
}

/// Start the transfers one after another. Each failure is counted on its own
/// and never stops the rest. The workflow list is re-read at the end.
pub async fn run_batch<G: Gateway>(gateway: Arc<G>, transfers: Vec<BatchTransfer>) -> BatchOutcome {
    let mut workflow_ids = Vec::with_capacity(transfers.len());
    let mut failures = Vec::new();

    for transfer in transfers {
        let started = match TransferRequest::new(&transfer.from_account, &transfer.to_account, transfer.amount) {
            Ok(request) => gateway.start_transfer(&request).await,
            Err(e) => Err(e),
        };
        match started {
            Ok(id) => workflow_ids.push(id),
            Err(e) => {
                warn!(error = %e, from = %transfer.from_account, to = %transfer.to_account, "batch transfer failed");
                failures.push((transfer, e));
            }
        }
    }

    info!(succeeded = workflow_ids.len(), failed = failures.len(), "batch finished");
    let workflows = gateway.get_workflows().await;
    BatchOutcome { workflow_ids, failures, workflows }
}

// ── Single-call commands ──────────────────────────────────────────────────────

pub async fn save_mode<G: Gateway>(gateway: Arc<G>, enabled: bool) -> Result<(), GatewayError> {
    gateway.set_mode(enabled).await
}

pub async fn reset_state<G: Gateway>(gateway: Arc<G>) -> Result<(), GatewayError> {
    gateway.reset_state().await
}

pub async fn clear_history<G: Gateway>(gateway: Arc<G>) -> Result<(), GatewayError> {
    gateway.clear_history().await
}

/// First history load after an account is expanded.
pub async fn load_history<G: Gateway>(
    gateway: Arc<G>,
    account_id: String,
) -> (String, Result<AccountHistory, GatewayError>) {
    let result = gateway.get_account_history(&account_id).await;
    (account_id, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::{Call, MockGateway};

    #[tokio::test]
    async fn transfer_then_immediate_workflow_refresh() {
        let gw = Arc::new(MockGateway::new());
        let request = TransferRequest::new("account_A", "account_B", 30.0).unwrap();

        let outcome = submit_transfer(gw.clone(), request.clone()).await;

        assert_eq!(outcome.started.as_deref(), Ok("transfer-1"));
        assert!(matches!(outcome.workflows, Some(Ok(_))));
        assert_eq!(gw.calls(), vec![Call::StartTransfer(request), Call::GetWorkflows]);
    }

    #[tokio::test]
    async fn rejected_transfer_skips_refresh_and_keeps_server_message() {
        let gw = Arc::new(MockGateway::new());
        gw.reject_transfer(1);
        let request = TransferRequest::new("account_A", "account_B", 500.0).unwrap();

        let outcome = submit_transfer(gw.clone(), request).await;

        assert_eq!(outcome.started, Err(GatewayError::Validation("Insufficient funds in account_A".into())));
        assert!(outcome.workflows.is_none());
        assert_eq!(gw.count(&Call::GetWorkflows), 0);
    }

    #[tokio::test]
    async fn batch_with_third_transfer_failing_is_partial() {
        let gw = Arc::new(MockGateway::new());
        gw.reject_transfer(3);

        let outcome = run_batch(gw.clone(), Config::default().batch_transfers).await;

        assert_eq!(outcome.success_count(), 4);
        assert_eq!(outcome.fail_count(), 1);
        assert_eq!(outcome.failures[0].0.from_account, "account_C");
        assert_eq!(outcome.summary(), BatchSummary::Partial { succeeded: 4, failed: 1 });
        assert_eq!(outcome.summary().message(), "Batch partially started: 4 succeeded, 1 failed.");

        let transfer = |from: &str, to: &str| Call::StartTransfer(TransferRequest::new(from, to, 100.0).unwrap());
        assert_eq!(
            gw.calls(),
            vec![
                transfer("account_A", "account_F"),
                transfer("account_B", "account_G"),
                transfer("account_C", "account_H"),
                transfer("account_D", "account_I"),
                transfer("account_E", "account_J"),
                Call::GetWorkflows,
            ]
        );
    }

    #[tokio::test]
    async fn batch_summaries_for_all_and_none() {
        let gw = Arc::new(MockGateway::new());
        let outcome = run_batch(gw.clone(), Config::default().batch_transfers).await;
        assert!(outcome.summary().is_success());
        assert_eq!(outcome.summary().message(), "Daily batch started! 5 workflows initiated.");

        let gw = Arc::new(MockGateway::new());
        for n in 1..=5 {
            gw.reject_transfer(n);
        }
        let outcome = run_batch(gw, Config::default().batch_transfers).await;
        assert_eq!(outcome.summary(), BatchSummary::AllFailed);
    }

    #[tokio::test]
    async fn invalid_batch_entry_counts_as_failure_without_a_call() {
        let gw = Arc::new(MockGateway::new());
        let transfers = vec![
            BatchTransfer { from_account: "account_A".into(), to_account: "account_A".into(), amount: 10.0 },
            BatchTransfer { from_account: "account_A".into(), to_account: "account_B".into(), amount: 10.0 },
        ];

        let outcome = run_batch(gw.clone(), transfers).await;

        assert_eq!((outcome.success_count(), outcome.fail_count()), (1, 1));
        assert_eq!(gw.calls().len(), 2);
    }
}
