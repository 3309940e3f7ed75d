//! View model store: the last committed snapshot of remote state plus the
//! client-only expansion set.
//!
//! Single writer. The reconciler commits fetched data here as it applies a
//! cycle, command handlers mutate the expansion set; nothing else writes.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::model::{AccountHistory, AccountMap, Workflow};

// ── Expansion set ─────────────────────────────────────────────────────────────

/// Accounts whose history panel is open. Never sent to the server; entries
/// change only through explicit toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet(BTreeSet<String>);

impl ExpansionSet {
    pub fn contains(&self, account_id: &str) -> bool {
        self.0.contains(account_id)
    }

    /// Flip membership and return whether the account is now expanded.
    pub fn toggle(&mut self, account_id: &str) -> bool {
        if self.0.remove(account_id) {
            false
        } else {
            self.0.insert(account_id.to_owned());
            true
        }
    }

    /// Snapshot in iteration order; this is the order histories are fetched in.
    pub fn ids(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ViewModelStore {
    accounts:  AccountMap,
    workflows: Vec<Workflow>,
    histories: HashMap<String, AccountHistory>,
    expansion: ExpansionSet,
    /// Last terminal record per workflow id, so a late RUNNING never wins.
    terminal:  HashMap<String, Workflow>,
    mode_enabled: bool,
}

impl ViewModelStore {
    pub fn accounts(&self) -> &AccountMap {
        &self.accounts
    }

    /// Replace the account map wholesale.
    pub fn commit_accounts(&mut self, accounts: AccountMap) {
        self.accounts = accounts;
    }

    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    /// Replace the workflow list, keeping terminal statuses monotonic.
    ///
    /// A workflow the client has already seen COMPLETED or FAILED keeps that
    /// record even if this fetch reports it RUNNING again.
    pub fn commit_workflows(&mut self, fetched: Vec<Workflow>) -> &[Workflow] {
        let seen: HashSet<&str> = fetched.iter().map(|w| w.workflow_id.as_str()).collect();
        self.terminal.retain(|id, _| seen.contains(id.as_str()));

        let mut merged = Vec::with_capacity(fetched.len());
        for wf in fetched {
            if wf.status.is_terminal() {
                self.terminal.insert(wf.workflow_id.clone(), wf.clone());
                merged.push(wf);
            } else if let Some(done) = self.terminal.get(&wf.workflow_id) {
                debug!(workflow_id = %wf.workflow_id, kept = %done.status, "late RUNNING status ignored");
                merged.push(done.clone());
            } else {
                merged.push(wf);
            }
        }
        self.workflows = merged;
        &self.workflows
    }

    pub fn history(&self, account_id: &str) -> Option<&AccountHistory> {
        self.histories.get(account_id)
    }

    pub fn cache_history(&mut self, account_id: &str, history: AccountHistory) {
        self.histories.insert(account_id.to_owned(), history);
    }

    pub fn expansion(&self) -> &ExpansionSet {
        &self.expansion
    }

    pub fn toggle_expansion(&mut self, account_id: &str) -> bool {
        self.expansion.toggle(account_id)
    }

    pub fn mode_enabled(&self) -> bool {
        self.mode_enabled
    }

    pub fn set_mode_enabled(&mut self, enabled: bool) {
        self.mode_enabled = enabled;
    }

    /// After a server reset cached histories and terminal memory describe a
    /// world that no longer exists.
    pub fn forget_server_state(&mut self) {
        self.histories.clear();
        self.terminal.clear();
    }
}
