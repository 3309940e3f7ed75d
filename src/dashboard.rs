//! Dashboard application state.
//!
//! One owned object holds everything that used to be loose global state: the
//! view model store, the render surface, the poll scheduler, form input, and
//! transient UI state (notice, pending confirmation, batch in progress).
//!
//! Methods are synchronous state transitions. Anything that needs the network
//! returns a request (a `CycleRequest`, a `TransferRequest`, an account id)
//! that the UI turns into an async task, and the task's outcome comes back
//! through the matching `finish_*` / `apply_*` method.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::commands::{BatchOutcome, TransferOutcome};
use crate::config::{BatchTransfer, Config};
use crate::gateway::GatewayError;
use crate::model::{AccountHistory, TransferRequest, Workflow};
use crate::reconcile::{Mutation, Reconciler};
use crate::scheduler::{CycleReport, CycleRequest, PollScheduler, TickDecision};
use crate::store::ViewModelStore;
use crate::surface::{PickerSlot, Surface, WorkflowRegion};

// ── Notices and confirmations ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Dismissible, auto-expiring message for the outcome of a user command.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind:       NoticeKind,
    pub text:       String,
    pub expires_at: Instant,
}

/// Destructive actions wait for an explicit yes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Reset,
    ClearHistory,
}

impl Confirmation {
    pub fn prompt(self) -> &'static str {
        match self {
            Confirmation::Reset => "Reset all account balances? Running workflows are not cancelled.",
            Confirmation::ClearHistory => "Are you sure you want to clear the workflow history?",
        }
    }
}

// ── Dashboard ─────────────────────────────────────────────────────────────────

pub struct Dashboard {
    config:       Config,
    store:        ViewModelStore,
    surface:      Surface,
    reconciler:   Reconciler,
    scheduler:    PollScheduler,
    amount:       String,
    notice:       Option<Notice>,
    confirmation: Option<Confirmation>,
    batch_running: bool,
}

impl Dashboard {
    pub fn new(config: Config) -> Self {
        let scheduler = PollScheduler::new(config.refresh_interval(), config.auto_refresh);
        let reconciler = Reconciler::new(config.history_preview_limit);
        Self {
            config,
            store: ViewModelStore::default(),
            surface: Surface::default(),
            reconciler,
            scheduler,
            amount: String::new(),
            notice: None,
            confirmation: None,
            batch_running: false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ViewModelStore {
        &self.store
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn confirmation(&self) -> Option<Confirmation> {
        self.confirmation
    }

    pub fn batch_running(&self) -> bool {
        self.batch_running
    }

    // ── Refresh cycle ─────────────────────────────────────────────────────────

    /// First cycle after launch; also reads the mode switch.
    pub fn initial_cycle(&mut self) -> Option<CycleRequest> {
        self.scheduler.request().then(|| self.cycle_request(true))
    }

    pub fn on_poll_tick(&mut self) -> Option<CycleRequest> {
        match self.scheduler.on_tick() {
            TickDecision::Start => Some(self.cycle_request(false)),
            TickDecision::Busy | TickDecision::Disarmed => None,
        }
    }

    /// Out-of-band refresh. `None` means a cycle is already in flight and a
    /// follow-up has been scheduled.
    pub fn request_refresh(&mut self) -> Option<CycleRequest> {
        self.scheduler.request().then(|| self.cycle_request(false))
    }

    fn cycle_request(&self, include_mode: bool) -> CycleRequest {
        CycleRequest {
            cycle: self.scheduler.current_cycle(),
            expanded: self.store.expansion().ids(),
            include_mode,
        }
    }

    /// Apply a finished cycle to the store and the surface in one pass:
    /// accounts, then workflows, then expanded histories.
    ///
    /// Returns the follow-up cycle to start, if one was requested meanwhile.
    pub fn apply_cycle(&mut self, report: CycleReport) -> Option<CycleRequest> {
        let mut mutations = Vec::new();

        match report.accounts {
            Ok(accounts) => {
                self.store.commit_accounts(accounts);
                mutations.extend(self.reconciler.plan_accounts(&self.surface, &self.store));
                mutations.extend(self.reconciler.plan_pickers(&self.surface, &self.store));
            }
            Err(e) => {
                warn!(cycle = report.cycle, error = %e, "accounts refresh failed");
                mutations.extend(self.reconciler.plan_accounts_error(&self.surface, &e));
            }
        }

        match report.mode {
            Some(Ok(enabled)) => self.store.set_mode_enabled(enabled),
            Some(Err(e)) => warn!(cycle = report.cycle, error = %e, "mode status refresh failed"),
            None => {}
        }

        match report.workflows {
            Ok(workflows) => {
                let committed = self.store.commit_workflows(workflows);
                mutations.extend(self.reconciler.plan_workflows(&self.surface, committed));
            }
            Err(e) => warn!(cycle = report.cycle, error = %e, "workflow refresh failed, keeping previous list"),
        }

        // History panels are planned against the surface as it will be once
        // the account mutations above land.
        let applied = self.reconciler.apply(&mut self.surface, mutations);
        let mut history_mutations = Vec::new();
        for (account_id, result) in report.histories {
            if let Err(e) = &result {
                warn!(cycle = report.cycle, %account_id, error = %e, "history refresh failed");
            }
            if let Some(m) = self.reconciler.plan_history(&self.surface, &self.store, &account_id, result.as_ref(), false) {
                history_mutations.push(m);
            }
            if let Ok(history) = result {
                if self.store.expansion().contains(&account_id) {
                    self.store.cache_history(&account_id, history);
                }
            }
        }
        let applied = applied + self.reconciler.apply(&mut self.surface, history_mutations);
        debug!(
            cycle = report.cycle,
            mutations = applied,
            workflows = self.store.workflows().len(),
            dropped_ticks = self.scheduler.dropped_ticks(),
            "cycle applied"
        );

        self.scheduler.finish().then(|| self.cycle_request(false))
    }

    fn apply_workflows(&mut self, result: Result<Vec<Workflow>, GatewayError>) {
        match result {
            Ok(workflows) => {
                let committed = self.store.commit_workflows(workflows);
                let mutations = self.reconciler.plan_workflows(&self.surface, committed);
                self.reconciler.apply(&mut self.surface, mutations);
            }
            Err(e) => warn!(error = %e, "workflow refresh failed, keeping previous list"),
        }
    }

    // ── Auto-refresh ──────────────────────────────────────────────────────────

    /// Arm or disarm the poll timer. Returns `true` if the setting changed.
    pub fn set_auto_refresh(&mut self, enabled: bool) -> bool {
        if self.scheduler.is_armed() == enabled {
            return false;
        }
        if enabled {
            self.scheduler.arm();
        } else {
            self.scheduler.disarm();
        }
        self.config.auto_refresh = enabled;
        info!(enabled, "auto-refresh toggled");
        true
    }

    pub fn refresh_interval(&self) -> Duration {
        self.scheduler.interval()
    }

    // ── Transfer form ─────────────────────────────────────────────────────────

    pub fn picker_opened(&mut self, slot: PickerSlot) {
        self.surface.focused_picker = Some(slot);
    }

    pub fn picker_closed(&mut self, slot: PickerSlot) {
        if self.surface.focused_picker == Some(slot) {
            self.surface.focused_picker = None;
        }
    }

    pub fn select_account(&mut self, slot: PickerSlot, account_id: String) {
        self.surface.picker_mut(slot).selected = Some(account_id);
        self.picker_closed(slot);
    }

    pub fn set_amount(&mut self, amount: String) {
        self.amount = amount;
    }

    /// Validate the form. On failure the notice is set and nothing is sent.
    pub fn prepare_transfer(&mut self, now: Instant) -> Option<TransferRequest> {
        let from = self.surface.from_picker.selected.clone().unwrap_or_default();
        let to = self.surface.to_picker.selected.clone().unwrap_or_default();

        // Unparseable amounts fall through to the positive-amount check.
        let amount = self.amount.trim().parse::<f64>().unwrap_or(f64::NAN);

        match TransferRequest::new(&from, &to, amount) {
            Ok(request) => Some(request),
            Err(e) => {
                info!(error = %e, "transfer rejected client-side");
                self.notify(NoticeKind::Error, e.to_string(), now);
                None
            }
        }
    }

    pub fn finish_transfer(&mut self, outcome: TransferOutcome, now: Instant) {
        match outcome.started {
            Ok(workflow_id) => {
                self.notify(NoticeKind::Success, format!("Transfer started! Workflow ID: {workflow_id}"), now);
                self.reset_form();
            }
            Err(e) => self.notify(NoticeKind::Error, e.to_string(), now),
        }
        if let Some(result) = outcome.workflows {
            self.apply_workflows(result);
        }
    }

    fn reset_form(&mut self) {
        self.surface.from_picker.selected = None;
        self.surface.to_picker.selected = None;
        self.amount.clear();
    }

    // ── Mode switch ───────────────────────────────────────────────────────────

    /// Optimistically flip the switch; the returned value is what to send.
    pub fn toggle_mode(&mut self, enabled: bool) -> bool {
        self.store.set_mode_enabled(enabled);
        enabled
    }

    /// Revert the optimistic flip if the server call failed.
    pub fn finish_mode_change(&mut self, requested: bool, result: Result<(), GatewayError>, now: Instant) {
        match result {
            Ok(()) => info!(enabled = requested, "real world mode changed"),
            Err(e) => {
                warn!(error = %e, requested, "real world mode change failed, reverting");
                self.store.set_mode_enabled(!requested);
                self.notify(NoticeKind::Error, format!("Failed to toggle Real World Mode: {e}"), now);
            }
        }
    }

    // ── Batch ─────────────────────────────────────────────────────────────────

    /// Returns the batch to run, or `None` while a batch is already running.
    pub fn begin_batch(&mut self) -> Option<Vec<BatchTransfer>> {
        if self.batch_running {
            debug!("batch already running");
            return None;
        }
        self.batch_running = true;
        Some(self.config.batch_transfers.clone())
    }

    pub fn finish_batch(&mut self, outcome: BatchOutcome, now: Instant) {
        self.batch_running = false;
        let summary = outcome.summary();
        let kind = if summary.is_success() { NoticeKind::Success } else { NoticeKind::Error };
        self.notify(kind, summary.message(), now);
        self.apply_workflows(outcome.workflows);
    }

    // ── Destructive actions ───────────────────────────────────────────────────

    pub fn request_confirmation(&mut self, confirmation: Confirmation) {
        self.confirmation = Some(confirmation);
    }

    pub fn dismiss_confirmation(&mut self) {
        self.confirmation = None;
    }

    /// The confirmed action, if any. Clears the pending confirmation.
    pub fn accept_confirmation(&mut self) -> Option<Confirmation> {
        self.confirmation.take()
    }

    /// After a reset, forget cached server state and refresh everything.
    pub fn finish_reset(&mut self, result: Result<(), GatewayError>, now: Instant) -> Option<CycleRequest> {
        match result {
            Ok(()) => {
                info!("server state reset");
                self.store.forget_server_state();
                self.notify(NoticeKind::Success, "Database reset successfully!".into(), now);
                self.request_refresh()
            }
            Err(e) => {
                warn!(error = %e, "reset failed");
                self.notify(NoticeKind::Error, format!("Failed to reset database: {e}"), now);
                None
            }
        }
    }

    /// Empties the terminal-workflow region. The server keeps its history, so
    /// the next cycle that sees terminal workflows renders them again.
    pub fn finish_clear_history(&mut self, result: Result<(), GatewayError>, now: Instant) {
        match result {
            Ok(()) => {
                let mutations = vec![Mutation::RenderTerminal(WorkflowRegion::Empty)];
                self.reconciler.apply(&mut self.surface, mutations);
            }
            Err(e) => self.notify(NoticeKind::Error, format!("Failed to clear history: {e}"), now),
        }
    }

    // ── Account history panels ────────────────────────────────────────────────

    /// Flip an account's panel. Returns the account id to fetch when it was
    /// just expanded; collapsing never fetches.
    pub fn toggle_history(&mut self, account_id: &str) -> Option<String> {
        if self.surface.row(account_id).is_none() {
            debug!(account_id, "toggle for account without a row ignored");
            return None;
        }
        let expanded = self.store.toggle_expansion(account_id);
        self.reconciler.apply(
            &mut self.surface,
            vec![Mutation::SetExpanded { account_id: account_id.to_owned(), expanded }],
        );
        expanded.then(|| account_id.to_owned())
    }

    pub fn finish_history_load(&mut self, account_id: &str, result: Result<AccountHistory, GatewayError>) {
        if let Err(e) = &result {
            warn!(account_id, error = %e, "history load failed");
        }
        let planned = self
            .reconciler
            .plan_history(&self.surface, &self.store, account_id, result.as_ref(), true);
        if let Some(mutation) = planned {
            self.reconciler.apply(&mut self.surface, vec![mutation]);
        }
        if let Ok(history) = result {
            if self.store.expansion().contains(account_id) {
                self.store.cache_history(account_id, history);
            }
        }
    }

    // ── Notices ───────────────────────────────────────────────────────────────

    fn notify(&mut self, kind: NoticeKind, text: String, now: Instant) {
        let expires_at = now.checked_add(self.config.notice_ttl()).unwrap_or(now);
        self.notice = Some(Notice { kind, text, expires_at });
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Drop the notice once its lifetime is over. Returns `true` if it did.
    pub fn expire_notice(&mut self, now: Instant) -> bool {
        match &self.notice {
            Some(notice) if notice.expires_at <= now => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::commands;
    use crate::model::{AccountTransaction, TransactionSummary, TransferDirection, WorkflowStatus};
    use crate::scheduler::{run_cycle, PollState};
    use crate::surface::{AccountsRegion, HistoryPanel};
    use crate::testing::{Call, MockGateway};

    fn dashboard() -> Dashboard {
        Dashboard::new(Config::default())
    }

    async fn cycle(dash: &mut Dashboard, gw: &Arc<MockGateway>, request: CycleRequest) -> Option<CycleRequest> {
        let report = run_cycle(gw.clone(), request).await;
        dash.apply_cycle(report)
    }

    async fn boot(gw: &Arc<MockGateway>) -> Dashboard {
        let mut dash = dashboard();
        let request = dash.initial_cycle().unwrap();
        cycle(&mut dash, gw, request).await;
        gw.clear_calls();
        dash
    }

    fn one_tx_history() -> AccountHistory {
        AccountHistory {
            summary: TransactionSummary { total_sent: 30.0, total_received: 0.0, net_change: -30.0, transaction_count: 1 },
            workflows: vec![AccountTransaction {
                input: None,
                direction: TransferDirection::Sent,
                counterparty: Some("account_B".into()),
                status: WorkflowStatus::Running,
            }],
        }
    }

    #[tokio::test]
    async fn startup_renders_accounts_pickers_and_mode() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = dashboard();
        let request = dash.initial_cycle().unwrap();
        assert!(request.include_mode);

        cycle(&mut dash, &gw, request).await;

        assert_eq!(gw.calls(), vec![Call::GetAccounts, Call::GetMode, Call::GetWorkflows]);
        assert_eq!(dash.surface().rows().len(), 2);
        assert_eq!(dash.surface().from_picker.options[0].label, "account_A ($100.00)");
        assert_eq!(dash.surface().running, WorkflowRegion::Empty);
        assert!(!dash.store().mode_enabled());
        assert_eq!(dash.scheduler().state(), PollState::Idle);
    }

    #[tokio::test]
    async fn transfer_scenario_refreshes_workflows_right_after_post() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = boot(&gw).await;
        let now = Instant::now();

        dash.select_account(PickerSlot::From, "account_A".into());
        dash.select_account(PickerSlot::To, "account_B".into());
        dash.set_amount("30".into());
        let request = dash.prepare_transfer(now).unwrap();

        let mut running = Workflow::new("transfer-1", WorkflowStatus::Running);
        running.current_step = Some("check_balance_from".into());
        gw.set_workflows(vec![running]);

        let outcome = commands::submit_transfer(gw.clone(), request.clone()).await;
        dash.finish_transfer(outcome, now);

        assert_eq!(gw.calls(), vec![Call::StartTransfer(request), Call::GetWorkflows]);
        let notice = dash.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.text, "Transfer started! Workflow ID: transfer-1");
        assert_eq!(dash.amount(), "");
        assert_eq!(dash.surface().from_picker.selected, None);
        assert!(matches!(&dash.surface().running, WorkflowRegion::Cards(cards) if cards[0].workflow_id == "transfer-1"));
    }

    #[tokio::test]
    async fn same_account_transfer_makes_no_network_call() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = boot(&gw).await;

        dash.select_account(PickerSlot::From, "account_A".into());
        dash.select_account(PickerSlot::To, "account_A".into());
        dash.set_amount("30".into());

        assert!(dash.prepare_transfer(Instant::now()).is_none());
        let notice = dash.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "Cannot transfer to the same account");
        assert!(gw.calls().is_empty());
    }

    #[tokio::test]
    async fn server_rejection_surfaces_its_message() {
        let gw = Arc::new(MockGateway::new());
        gw.reject_transfer(1);
        let mut dash = boot(&gw).await;
        let request = TransferRequest::new("account_A", "account_B", 1000.0).unwrap();

        let outcome = commands::submit_transfer(gw.clone(), request).await;
        dash.finish_transfer(outcome, Instant::now());

        assert_eq!(dash.notice().unwrap().text, "Insufficient funds in account_A");
    }

    #[tokio::test]
    async fn batch_partial_failure_reports_counts_and_reenables_control() {
        let gw = Arc::new(MockGateway::new());
        gw.reject_transfer(3);
        let mut dash = boot(&gw).await;

        let batch = dash.begin_batch().unwrap();
        assert!(dash.batch_running());
        assert!(dash.begin_batch().is_none());

        let outcome = commands::run_batch(gw.clone(), batch).await;
        assert_eq!((outcome.success_count(), outcome.fail_count()), (4, 1));
        dash.finish_batch(outcome, Instant::now());

        assert!(!dash.batch_running());
        let notice = dash.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "Batch partially started: 4 succeeded, 1 failed.");
    }

    #[tokio::test]
    async fn overlapping_ticks_issue_one_set_of_calls_per_cycle() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = boot(&gw).await;

        let request = dash.on_poll_tick().unwrap();
        assert!(dash.on_poll_tick().is_none());
        assert!(dash.on_poll_tick().is_none());
        cycle(&mut dash, &gw, request).await;

        let request = dash.on_poll_tick().unwrap();
        assert!(dash.on_poll_tick().is_none());
        cycle(&mut dash, &gw, request).await;

        assert_eq!(
            gw.calls(),
            vec![Call::GetAccounts, Call::GetWorkflows, Call::GetAccounts, Call::GetWorkflows]
        );
        assert_eq!(dash.scheduler().dropped_ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_ticks_against_slow_backend_never_overlap() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = boot(&gw).await;
        gw.set_latency(Duration::from_millis(350));

        let mut ticker = tokio::time::interval(Duration::from_millis(50));
        let mut in_flight: Option<tokio::task::JoinHandle<CycleReport>> = None;
        let mut completed = 0;

        for _ in 0..60 {
            ticker.tick().await;
            if in_flight.as_ref().is_some_and(|h| h.is_finished()) {
                if let Some(handle) = in_flight.take() {
                    dash.apply_cycle(handle.await.unwrap());
                    completed += 1;
                }
            }
            if let Some(request) = dash.on_poll_tick() {
                assert!(in_flight.is_none());
                in_flight = Some(tokio::spawn(run_cycle(gw.clone(), request)));
            }
        }
        if let Some(handle) = in_flight.take() {
            dash.apply_cycle(handle.await.unwrap());
            completed += 1;
        }

        assert!(completed > 1);
        assert!(dash.scheduler().dropped_ticks() > 0);
        assert_eq!(gw.count(&Call::GetAccounts), completed);
        assert_eq!(gw.count(&Call::GetWorkflows), completed);
        assert_eq!(gw.calls().len(), 2 * completed);
    }

    #[tokio::test]
    async fn expand_collapse_expand_fetches_once_per_expand() {
        let gw = Arc::new(MockGateway::new());
        gw.set_history("account_A", one_tx_history());
        let mut dash = boot(&gw).await;
        let history_a = Call::GetAccountHistory("account_A".into());

        // On: one immediate fetch.
        let id = dash.toggle_history("account_A").unwrap();
        let (id, result) = commands::load_history(gw.clone(), id).await;
        dash.finish_history_load(&id, result);
        assert_eq!(gw.count(&history_a), 1);
        assert!(matches!(dash.surface().row("account_A").unwrap().history, HistoryPanel::Loaded(_)));

        // Off: no fetch, and cycles stop fetching it.
        assert!(dash.toggle_history("account_A").is_none());
        assert!(!dash.surface().row("account_A").unwrap().expanded);
        let request = dash.on_poll_tick().unwrap();
        assert!(request.expanded.is_empty());
        cycle(&mut dash, &gw, request).await;
        assert_eq!(gw.count(&history_a), 1);

        // On again: exactly one more.
        let id = dash.toggle_history("account_A").unwrap();
        let (id, result) = commands::load_history(gw.clone(), id).await;
        dash.finish_history_load(&id, result);
        assert_eq!(gw.count(&history_a), 2);
        assert!(dash.surface().row("account_A").unwrap().expanded);
    }

    #[tokio::test]
    async fn new_account_keeps_existing_rows_in_place() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = boot(&gw).await;
        dash.toggle_history("account_A");
        let handle_a = dash.surface().row("account_A").unwrap().handle;
        let handle_b = dash.surface().row("account_B").unwrap().handle;

        gw.set_accounts(&[("account_A", 70.0), ("account_B", 50.0), ("account_C", 10.0)]);
        let request = dash.on_poll_tick().unwrap();
        cycle(&mut dash, &gw, request).await;

        let row_a = dash.surface().row("account_A").unwrap();
        assert_eq!(row_a.handle, handle_a);
        assert!(row_a.expanded);
        assert_eq!(row_a.balance_text, "$70.00");
        assert_eq!(dash.surface().row("account_B").unwrap().handle, handle_b);
        assert_eq!(dash.surface().rows().len(), 3);
        assert_eq!(dash.surface().from_picker.options.len(), 3);
    }

    #[tokio::test]
    async fn expanded_histories_are_fetched_after_accounts_and_workflows() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = boot(&gw).await;
        dash.toggle_history("account_B");
        dash.toggle_history("account_A");

        let request = dash.on_poll_tick().unwrap();
        cycle(&mut dash, &gw, request).await;

        assert_eq!(
            gw.calls(),
            vec![
                Call::GetAccounts,
                Call::GetWorkflows,
                Call::GetAccountHistory("account_A".into()),
                Call::GetAccountHistory("account_B".into()),
            ]
        );
    }

    #[tokio::test]
    async fn history_collapsed_mid_cycle_is_not_shown() {
        let gw = Arc::new(MockGateway::new());
        gw.set_history("account_A", one_tx_history());
        let mut dash = boot(&gw).await;
        dash.toggle_history("account_A");

        let request = dash.on_poll_tick().unwrap();
        let report = run_cycle(gw.clone(), request).await;
        dash.toggle_history("account_A");
        dash.apply_cycle(report);

        let row = dash.surface().row("account_A").unwrap();
        assert!(!row.expanded);
        assert_eq!(row.history, HistoryPanel::Loading);
        assert!(dash.store().history("account_A").is_none());
    }

    #[tokio::test]
    async fn accounts_failure_degrades_region_but_workflows_still_apply() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = boot(&gw).await;
        gw.fail(Call::GetAccounts);
        gw.set_workflows(vec![Workflow::new("w-1", WorkflowStatus::Running)]);

        let request = dash.on_poll_tick().unwrap();
        cycle(&mut dash, &gw, request).await;

        assert!(matches!(dash.surface().accounts, AccountsRegion::Error(_)));
        assert!(matches!(dash.surface().running, WorkflowRegion::Cards(_)));
        // Pickers keep their last good options.
        assert_eq!(dash.surface().from_picker.options.len(), 2);
        assert!(dash.notice().is_none());

        gw.recover(&Call::GetAccounts);
        let request = dash.on_poll_tick().unwrap();
        cycle(&mut dash, &gw, request).await;
        assert_eq!(dash.surface().rows().len(), 2);
    }

    #[tokio::test]
    async fn workflow_failure_keeps_previous_rendering() {
        let gw = Arc::new(MockGateway::new());
        gw.set_workflows(vec![Workflow::new("w-1", WorkflowStatus::Running)]);
        let mut dash = boot(&gw).await;
        let before = dash.surface().running.clone();

        gw.fail(Call::GetWorkflows);
        let request = dash.on_poll_tick().unwrap();
        cycle(&mut dash, &gw, request).await;

        assert_eq!(dash.surface().running, before);
    }

    #[tokio::test]
    async fn completed_workflow_is_not_resurrected_by_stale_fetch() {
        let gw = Arc::new(MockGateway::new());
        gw.set_workflows(vec![Workflow::new("w-1", WorkflowStatus::Completed)]);
        let mut dash = boot(&gw).await;

        gw.set_workflows(vec![Workflow::new("w-1", WorkflowStatus::Running)]);
        let request = dash.on_poll_tick().unwrap();
        cycle(&mut dash, &gw, request).await;

        assert_eq!(dash.surface().running, WorkflowRegion::Empty);
        assert!(matches!(dash.surface().terminal, WorkflowRegion::Cards(_)));
    }

    #[tokio::test]
    async fn mode_toggle_reverts_on_failure() {
        let gw = Arc::new(MockGateway::new());
        gw.fail(Call::SetMode(true));
        let mut dash = boot(&gw).await;

        let requested = dash.toggle_mode(true);
        assert!(dash.store().mode_enabled());

        let result = commands::save_mode(gw.clone(), requested).await;
        dash.finish_mode_change(requested, result, Instant::now());

        assert!(!dash.store().mode_enabled());
        assert_eq!(dash.notice().unwrap().kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn reset_requires_confirmation_then_refreshes() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = boot(&gw).await;

        dash.request_confirmation(Confirmation::Reset);
        dash.dismiss_confirmation();
        assert_eq!(dash.accept_confirmation(), None);

        dash.request_confirmation(Confirmation::Reset);
        assert_eq!(dash.accept_confirmation(), Some(Confirmation::Reset));

        let result = commands::reset_state(gw.clone()).await;
        let request = dash.finish_reset(result, Instant::now()).unwrap();
        cycle(&mut dash, &gw, request).await;

        assert_eq!(gw.calls(), vec![Call::ResetState, Call::GetAccounts, Call::GetWorkflows]);
        assert_eq!(dash.notice().unwrap().text, "Database reset successfully!");
    }

    #[tokio::test]
    async fn reset_during_cycle_schedules_a_follow_up() {
        let gw = Arc::new(MockGateway::new());
        let mut dash = boot(&gw).await;

        let in_flight = dash.on_poll_tick().unwrap();
        assert!(dash.finish_reset(Ok(()), Instant::now()).is_none());

        let follow_up = cycle(&mut dash, &gw, in_flight).await;
        assert!(follow_up.is_some());
        assert_eq!(dash.scheduler().state(), PollState::Polling);
    }

    #[tokio::test]
    async fn clear_history_empties_terminal_region_only() {
        let gw = Arc::new(MockGateway::new());
        gw.set_workflows(vec![
            Workflow::new("w-1", WorkflowStatus::Completed),
            Workflow::new("w-2", WorkflowStatus::Running),
        ]);
        let mut dash = boot(&gw).await;

        dash.request_confirmation(Confirmation::ClearHistory);
        assert_eq!(dash.accept_confirmation(), Some(Confirmation::ClearHistory));
        let result = commands::clear_history(gw.clone()).await;
        dash.finish_clear_history(result, Instant::now());

        assert_eq!(dash.surface().terminal, WorkflowRegion::Empty);
        assert!(matches!(dash.surface().running, WorkflowRegion::Cards(_)));
    }

    #[test]
    fn disabling_auto_refresh_stops_ticks() {
        let mut dash = dashboard();
        assert!(dash.set_auto_refresh(false));
        assert!(!dash.set_auto_refresh(false));
        assert!(!dash.config().auto_refresh);
        assert!(dash.on_poll_tick().is_none());

        assert!(dash.set_auto_refresh(true));
        assert!(dash.on_poll_tick().is_some());
    }

    #[test]
    fn notice_expires_after_ttl() {
        let mut dash = dashboard();
        let now = Instant::now();
        dash.set_amount("abc".into());
        dash.select_account(PickerSlot::From, "account_A".into());
        dash.select_account(PickerSlot::To, "account_B".into());
        assert!(dash.prepare_transfer(now).is_none());
        assert_eq!(dash.notice().unwrap().text, "Amount must be positive");

        assert!(!dash.expire_notice(now + Duration::from_secs(4)));
        assert!(dash.expire_notice(now + Duration::from_secs(5)));
        assert!(dash.notice().is_none());
    }

    #[test]
    fn huge_notice_ttl_does_not_overflow() {
        let mut dash = Dashboard::new(Config { notice_ttl_secs: u64::MAX, ..Config::default() });
        let now = Instant::now();
        dash.select_account(PickerSlot::From, "account_A".into());
        dash.select_account(PickerSlot::To, "account_A".into());
        dash.set_amount("1".into());

        assert!(dash.prepare_transfer(now).is_none());
        assert!(dash.notice().unwrap().expires_at >= now + Duration::from_secs(3600));
    }

    #[test]
    fn selecting_an_account_releases_picker_focus() {
        let mut dash = dashboard();
        dash.picker_opened(PickerSlot::From);
        assert_eq!(dash.surface().focused_picker, Some(PickerSlot::From));
        dash.select_account(PickerSlot::From, "account_A".into());
        assert_eq!(dash.surface().focused_picker, None);
    }
}
