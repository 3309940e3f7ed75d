//! Keyed reconciliation of fetched state into the render surface.
//!
//! Planning and applying are split: `plan_*` compares fresh data with the
//! current surface and returns the mutations needed, `apply` performs them.
//! Planning never touches the surface, so a cycle's changes land together.
//!
//! Account rows are keyed by account id. A row keeps its [`RowHandle`] for as
//! long as the account exists; a balance change only rewrites its text. Rows
//! are created or dropped when accounts appear or disappear, and the whole
//! region is rebuilt only when nothing is rendered yet (first load, or after
//! an error or empty placeholder).

use tracing::debug;

use crate::gateway::GatewayError;
use crate::model::{AccountHistory, Workflow};
use crate::store::ViewModelStore;
use crate::surface::{
    money, AccountRow, AccountsRegion, HistoryPanel, HistoryView, PickerOption, Surface,
    WorkflowCard, WorkflowRegion,
};

/// Shown in place of the account list when the accounts fetch fails.
pub const ACCOUNTS_ERROR_TEXT: &str = "Failed to load accounts. Is the Account API running?";

/// A row before it has been given a handle.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSpec {
    pub account_id:   String,
    pub balance_text: String,
    pub expanded:     bool,
    pub history:      HistoryPanel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Full structural render of the accounts region.
    RenderAccounts(Vec<RowSpec>),
    InsertRow { index: usize, row: RowSpec },
    RemoveRow { account_id: String },
    PatchBalance { account_id: String, balance_text: String },
    ShowNoAccounts,
    ShowAccountsError(String),
    RepopulatePickers {
        options: Vec<PickerOption>,
        from:    Option<String>,
        to:      Option<String>,
    },
    RenderRunning(WorkflowRegion),
    RenderTerminal(WorkflowRegion),
    RenderHistory { account_id: String, panel: HistoryPanel },
    SetExpanded { account_id: String, expanded: bool },
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    history_limit: usize,
}

impl Reconciler {
    pub fn new(history_limit: usize) -> Self {
        Self { history_limit }
    }

    // ── Accounts ──────────────────────────────────────────────────────────────

    /// Plan the accounts region from the store's committed account map.
    pub fn plan_accounts(&self, surface: &Surface, store: &ViewModelStore) -> Vec<Mutation> {
        let accounts = store.accounts();
        if accounts.is_empty() {
            return match surface.accounts {
                AccountsRegion::NoAccounts => Vec::new(),
                _ => vec![Mutation::ShowNoAccounts],
            };
        }

        let rows = match &surface.accounts {
            AccountsRegion::Rows(rows) if !rows.is_empty() => rows,
            _ => {
                let specs = accounts
                    .iter()
                    .map(|(id, account)| self.row_spec(store, id, account.balance))
                    .collect();
                return vec![Mutation::RenderAccounts(specs)];
            }
        };

        let mut mutations: Vec<Mutation> = rows
            .iter()
            .filter(|row| !accounts.contains_key(&row.account_id))
            .map(|row| Mutation::RemoveRow { account_id: row.account_id.clone() })
            .collect();

        for (index, (id, account)) in accounts.iter().enumerate() {
            let balance_text = money(account.balance);
            match rows.iter().find(|row| &row.account_id == id) {
                Some(row) if row.balance_text == balance_text => {}
                Some(_) => mutations.push(Mutation::PatchBalance {
                    account_id: id.clone(),
                    balance_text,
                }),
                None => mutations.push(Mutation::InsertRow {
                    index,
                    row: self.row_spec(store, id, account.balance),
                }),
            }
        }
        mutations
    }

    pub fn plan_accounts_error(&self, surface: &Surface, err: &GatewayError) -> Vec<Mutation> {
        debug!(error = %err, "accounts region degraded to error placeholder");
        match &surface.accounts {
            AccountsRegion::Error(text) if text == ACCOUNTS_ERROR_TEXT => Vec::new(),
            _ => vec![Mutation::ShowAccountsError(ACCOUNTS_ERROR_TEXT.into())],
        }
    }

    fn row_spec(&self, store: &ViewModelStore, account_id: &str, balance: f64) -> RowSpec {
        let expanded = store.expansion().contains(account_id);
        let history = match store.history(account_id) {
            Some(history) if expanded => HistoryPanel::Loaded(HistoryView::build(history, self.history_limit)),
            _ => HistoryPanel::Loading,
        };
        RowSpec {
            account_id: account_id.to_owned(),
            balance_text: money(balance),
            expanded,
            history,
        }
    }

    // ── Pickers ───────────────────────────────────────────────────────────────

    /// Repopulate both account pickers, restoring still-valid selections.
    /// Skipped entirely while either picker is open.
    pub fn plan_pickers(&self, surface: &Surface, store: &ViewModelStore) -> Option<Mutation> {
        if let Some(slot) = surface.focused_picker {
            debug!(?slot, "picker open, repopulation skipped");
            return None;
        }

        let accounts = store.accounts();
        let options: Vec<PickerOption> = accounts
            .iter()
            .map(|(id, account)| PickerOption {
                account_id: id.clone(),
                label:      format!("{id} ({})", money(account.balance)),
            })
            .collect();
        let restore = |selected: &Option<String>| {
            selected.clone().filter(|id| accounts.contains_key(id))
        };
        let from = restore(&surface.from_picker.selected);
        let to = restore(&surface.to_picker.selected);

        let unchanged = surface.from_picker.options == options
            && surface.to_picker.options == options
            && surface.from_picker.selected == from
            && surface.to_picker.selected == to;
        (!unchanged).then_some(Mutation::RepopulatePickers { options, from, to })
    }

    // ── Workflows ─────────────────────────────────────────────────────────────

    /// Partition into RUNNING and terminal and plan each region independently.
    pub fn plan_workflows(&self, surface: &Surface, workflows: &[Workflow]) -> Vec<Mutation> {
        let (running, mut terminal): (Vec<&Workflow>, Vec<&Workflow>) =
            workflows.iter().partition(|w| !w.status.is_terminal());
        sort_terminal(&mut terminal);

        let running = WorkflowRegion::from_cards(running.into_iter().map(WorkflowCard::running).collect());
        let terminal = WorkflowRegion::from_cards(terminal.into_iter().map(WorkflowCard::terminal).collect());

        let mut mutations = Vec::new();
        if surface.running != running {
            mutations.push(Mutation::RenderRunning(running));
        }
        if surface.terminal != terminal {
            mutations.push(Mutation::RenderTerminal(terminal));
        }
        mutations
    }

    // ── Account history ───────────────────────────────────────────────────────

    /// Plan one account's history panel.
    ///
    /// Results for accounts that are no longer expanded are dropped. A failed
    /// fetch shows the inline failure only on the first load after expanding
    /// (`initial`); failures during polling leave the previous panel alone.
    pub fn plan_history(
        &self,
        surface: &Surface,
        store: &ViewModelStore,
        account_id: &str,
        result: Result<&AccountHistory, &GatewayError>,
        initial: bool,
    ) -> Option<Mutation> {
        if !store.expansion().contains(account_id) {
            debug!(account_id, "history for collapsed account ignored");
            return None;
        }
        let row = surface.row(account_id)?;
        let panel = match result {
            Ok(history) => HistoryPanel::Loaded(HistoryView::build(history, self.history_limit)),
            Err(_) if initial => HistoryPanel::Failed,
            Err(_) => return None,
        };
        (row.history != panel).then(|| Mutation::RenderHistory {
            account_id: account_id.to_owned(),
            panel,
        })
    }

    // ── Apply ─────────────────────────────────────────────────────────────────

    /// Perform the mutations in order. Returns how many were applied.
    pub fn apply(&self, surface: &mut Surface, mutations: Vec<Mutation>) -> usize {
        let count = mutations.len();
        for mutation in mutations {
            match mutation {
                Mutation::RenderAccounts(specs) => {
                    let rows = specs.into_iter().map(|spec| materialise(surface, spec)).collect();
                    surface.accounts = AccountsRegion::Rows(rows);
                }
                Mutation::InsertRow { index, row } => {
                    let row = materialise(surface, row);
                    if let AccountsRegion::Rows(rows) = &mut surface.accounts {
                        let index = index.min(rows.len());
                        rows.insert(index, row);
                    }
                }
                Mutation::RemoveRow { account_id } => {
                    if let AccountsRegion::Rows(rows) = &mut surface.accounts {
                        rows.retain(|r| r.account_id != account_id);
                    }
                }
                Mutation::PatchBalance { account_id, balance_text } => {
                    if let Some(row) = surface.row_mut(&account_id) {
                        row.balance_text = balance_text;
                    }
                }
                Mutation::ShowNoAccounts => surface.accounts = AccountsRegion::NoAccounts,
                Mutation::ShowAccountsError(text) => surface.accounts = AccountsRegion::Error(text),
                Mutation::RepopulatePickers { options, from, to } => {
                    surface.from_picker.options = options.clone();
                    surface.from_picker.selected = from;
                    surface.to_picker.options = options;
                    surface.to_picker.selected = to;
                }
                Mutation::RenderRunning(region) => surface.running = region,
                Mutation::RenderTerminal(region) => surface.terminal = region,
                Mutation::RenderHistory { account_id, panel } => {
                    if let Some(row) = surface.row_mut(&account_id) {
                        row.history = panel;
                    }
                }
                Mutation::SetExpanded { account_id, expanded } => {
                    if let Some(row) = surface.row_mut(&account_id) {
                        row.expanded = expanded;
                    }
                }
            }
        }
        count
    }
}

fn materialise(surface: &mut Surface, spec: RowSpec) -> AccountRow {
    AccountRow {
        handle:       surface.allocate_handle(),
        account_id:   spec.account_id,
        balance_text: spec.balance_text,
        expanded:     spec.expanded,
        history:      spec.history,
    }
}

/// Most recently closed first; a missing or unparseable close time counts as
/// the earliest, so those sort last. Ties keep fetch order.
pub fn sort_terminal(workflows: &mut [&Workflow]) {
    workflows.sort_by(|a, b| b.close_time.cmp(&a.close_time));
}
