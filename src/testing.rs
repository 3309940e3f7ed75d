//! Scripted gateway for unit tests.
//!
//! Records every call in order, answers from canned data, and can be told to
//! fail individual calls, reject the n-th transfer, or take a while to answer
//! (against tokio's clock, so paused-time tests stay instant).

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::gateway::{Gateway, GatewayError};
use crate::model::{Account, AccountHistory, AccountMap, TransferRequest, Workflow};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetAccounts,
    GetAccountHistory(String),
    GetWorkflows,
    StartTransfer(TransferRequest),
    GetMode,
    SetMode(bool),
    ResetState,
    ClearHistory,
}

pub struct MockGateway {
    calls:     Mutex<Vec<Call>>,
    accounts:  Mutex<AccountMap>,
    workflows: Mutex<Vec<Workflow>>,
    histories: Mutex<BTreeMap<String, AccountHistory>>,
    mode:      Mutex<bool>,
    failing:   Mutex<Vec<Call>>,
    /// 1-based positions of `start_transfer` calls the server rejects.
    rejected_transfers: Mutex<HashSet<usize>>,
    transfers: AtomicUsize,
    latency:   Mutex<Duration>,
}

impl MockGateway {
    /// Two accounts, A=100 and B=50, no workflows, mode off.
    pub fn new() -> Self {
        Self {
            calls:     Mutex::new(Vec::new()),
            accounts:  Mutex::new(accounts(&[("account_A", 100.0), ("account_B", 50.0)])),
            workflows: Mutex::new(Vec::new()),
            histories: Mutex::new(BTreeMap::new()),
            mode:      Mutex::new(false),
            failing:   Mutex::new(Vec::new()),
            rejected_transfers: Mutex::new(HashSet::new()),
            transfers: AtomicUsize::new(0),
            latency:   Mutex::new(Duration::ZERO),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn set_accounts(&self, entries: &[(&str, f64)]) {
        *self.accounts.lock().unwrap() = accounts(entries);
    }

    pub fn set_workflows(&self, workflows: Vec<Workflow>) {
        *self.workflows.lock().unwrap() = workflows;
    }

    pub fn set_history(&self, account_id: &str, history: AccountHistory) {
        self.histories.lock().unwrap().insert(account_id.to_owned(), history);
    }

    /// Make every future call equal to `call` fail with `RemoteUnavailable`.
    pub fn fail(&self, call: Call) {
        self.failing.lock().unwrap().push(call);
    }

    pub fn recover(&self, call: &Call) {
        self.failing.lock().unwrap().retain(|c| c != call);
    }

    pub fn reject_transfer(&self, position: usize) {
        self.rejected_transfers.lock().unwrap().insert(position);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    async fn respond<T>(&self, call: Call, answer: impl FnOnce() -> T) -> Result<T, GatewayError> {
        let failing = self.failing.lock().unwrap().contains(&call);
        self.calls.lock().unwrap().push(call);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if failing {
            Err(GatewayError::RemoteUnavailable("service unavailable".into()))
        } else {
            Ok(answer())
        }
    }
}

impl Gateway for MockGateway {
    async fn get_accounts(&self) -> Result<AccountMap, GatewayError> {
        self.respond(Call::GetAccounts, || self.accounts.lock().unwrap().clone()).await
    }

    async fn get_account_history(&self, account_id: &str) -> Result<AccountHistory, GatewayError> {
        self.respond(Call::GetAccountHistory(account_id.to_owned()), || {
            self.histories.lock().unwrap().get(account_id).cloned().unwrap_or_default()
        })
        .await
    }

    async fn get_workflows(&self) -> Result<Vec<Workflow>, GatewayError> {
        self.respond(Call::GetWorkflows, || self.workflows.lock().unwrap().clone()).await
    }

    async fn start_transfer(&self, request: &TransferRequest) -> Result<String, GatewayError> {
        let position = self.transfers.fetch_add(1, Ordering::SeqCst) + 1;
        let rejected = self.rejected_transfers.lock().unwrap().contains(&position);
        let id = self
            .respond(Call::StartTransfer(request.clone()), || format!("transfer-{position}"))
            .await?;
        if rejected {
            Err(GatewayError::Validation(format!(
                "Insufficient funds in {}",
                request.from_account
            )))
        } else {
            Ok(id)
        }
    }

    async fn get_mode(&self) -> Result<bool, GatewayError> {
        self.respond(Call::GetMode, || *self.mode.lock().unwrap()).await
    }

    async fn set_mode(&self, enabled: bool) -> Result<(), GatewayError> {
        self.respond(Call::SetMode(enabled), || *self.mode.lock().unwrap() = enabled).await
    }

    async fn reset_state(&self) -> Result<(), GatewayError> {
        self.respond(Call::ResetState, || ()).await
    }

    async fn clear_history(&self) -> Result<(), GatewayError> {
        self.respond(Call::ClearHistory, || ()).await
    }
}

pub fn accounts(entries: &[(&str, f64)]) -> AccountMap {
    entries
        .iter()
        .map(|(id, balance)| (id.to_string(), Account { balance: *balance }))
        .collect()
}
