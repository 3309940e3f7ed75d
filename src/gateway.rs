//! Remote data gateway for the money transfer API.
//!
//! Every call is a single request/response: no retries, and no timeout beyond
//! reqwest's transport defaults. Failures come back as a typed
//! [`GatewayError`]; callers decide whether to surface or only log them.
//!
//! The [`Gateway`] trait is the seam the poll cycle and command handlers are
//! written against, so tests can drive them with a scripted gateway.

use std::future::Future;

use anyhow::Context;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    AccountHistory, AccountMap, ApiErrorBody, ModeState, TransferRequest, TransferStarted,
    Workflow,
};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Transport failure, or a non-2xx status without a structured body.
    #[error("{0}")]
    RemoteUnavailable(String),
    /// Rejected before sending, or rejected by the server with a message.
    #[error("{0}")]
    Validation(String),
    /// 2xx response whose body could not be decoded.
    #[error("unexpected response from {resource}: {detail}")]
    InvalidResponse { resource: String, detail: String },
}

impl TransferRequest {
    /// Client-side guard: both accounts chosen, distinct, positive amount.
    pub fn new(from_account: &str, to_account: &str, amount: f64) -> Result<Self, GatewayError> {
        let from_account = from_account.trim();
        let to_account = to_account.trim();
        if from_account.is_empty() || to_account.is_empty() {
            return Err(GatewayError::Validation("Select both accounts".into()));
        }
        if from_account == to_account {
            return Err(GatewayError::Validation("Cannot transfer to the same account".into()));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(GatewayError::Validation("Amount must be positive".into()));
        }
        Ok(Self {
            from_account: from_account.to_owned(),
            to_account:   to_account.to_owned(),
            amount,
        })
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// The four logical resources the dashboard reads and writes.
pub trait Gateway: Send + Sync + 'static {
    fn get_accounts(&self) -> impl Future<Output = Result<AccountMap, GatewayError>> + Send;

    fn get_account_history(
        &self,
        account_id: &str,
    ) -> impl Future<Output = Result<AccountHistory, GatewayError>> + Send;

    fn get_workflows(&self) -> impl Future<Output = Result<Vec<Workflow>, GatewayError>> + Send;

    /// Returns the id of the started workflow.
    fn start_transfer(
        &self,
        request: &TransferRequest,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;

    fn get_mode(&self) -> impl Future<Output = Result<bool, GatewayError>> + Send;

    fn set_mode(&self, enabled: bool) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn reset_state(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn clear_history(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

// ── HTTP implementation ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base:   Url,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("parse api base url {base_url:?}"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("api base url {base_url:?} cannot carry a path");
        }
        let client = Client::builder().build().context("build reqwest client")?;
        Ok(Self { client, base })
    }

    /// `base` + path segments, each percent-encoded (account ids end up in paths).
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: &str, url: Url) -> Result<T, GatewayError> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(Action::Load(resource), &e))?;
        decode(resource, ensure_success(Action::Load(resource), resp).await?).await
    }

    async fn post_json<B, T>(&self, action: Action<'_>, url: Url, body: &B) -> Result<T, GatewayError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(%url, "POST");
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| unavailable(action, &e))?;
        decode(action.subject(), ensure_success(action, resp).await?).await
    }
}

impl Gateway for HttpGateway {
    async fn get_accounts(&self) -> Result<AccountMap, GatewayError> {
        self.get_json("accounts", self.endpoint(&["api", "accounts"])).await
    }

    async fn get_account_history(&self, account_id: &str) -> Result<AccountHistory, GatewayError> {
        let url = self.endpoint(&["api", "accounts", account_id, "workflows"]);
        self.get_json("account history", url).await
    }

    async fn get_workflows(&self) -> Result<Vec<Workflow>, GatewayError> {
        self.get_json("workflows", self.endpoint(&["api", "workflows"])).await
    }

    async fn start_transfer(&self, request: &TransferRequest) -> Result<String, GatewayError> {
        let url = self.endpoint(&["api", "transfer"]);
        debug!(%url, from = %request.from_account, to = %request.to_account, amount = request.amount, "POST");
        let resp = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| unavailable(Action::Write("Transfer"), &e))?;

        let status = resp.status();
        if !status.is_success() {
            // A rejected transfer carries `{ "error": "..." }`; propagate it verbatim.
            let text = resp.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) => GatewayError::Validation(body.error),
                Err(_) => GatewayError::RemoteUnavailable(format!("Transfer failed (HTTP {status})")),
            });
        }

        let started: TransferStarted = decode("transfer", resp).await?;
        Ok(started.workflow_id)
    }

    async fn get_mode(&self) -> Result<bool, GatewayError> {
        let mode: ModeState = self
            .get_json("real world mode", self.endpoint(&["api", "real-world-mode"]))
            .await?;
        Ok(mode.enabled)
    }

    async fn set_mode(&self, enabled: bool) -> Result<(), GatewayError> {
        let url = self.endpoint(&["api", "real-world-mode"]);
        let _: serde_json::Value = self
            .post_json(Action::Write("Real world mode update"), url, &ModeState { enabled })
            .await?;
        Ok(())
    }

    async fn reset_state(&self) -> Result<(), GatewayError> {
        let url = self.endpoint(&["api", "reset"]);
        debug!(%url, "POST");
        let resp = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| unavailable(Action::Write("Reset"), &e))?;
        ensure_success(Action::Write("Reset"), resp).await.map(|_| ())
    }

    async fn clear_history(&self) -> Result<(), GatewayError> {
        // The API has no history endpoint; clearing only affects the client view.
        debug!("clear history has no server endpoint, nothing sent");
        Ok(())
    }
}

// ── Response helpers ──────────────────────────────────────────────────────────

/// What a request was doing, for the user-facing failure text.
#[derive(Debug, Clone, Copy)]
enum Action<'a> {
    Load(&'a str),
    Write(&'a str),
}

impl<'a> Action<'a> {
    fn subject(self) -> &'a str {
        match self {
            Action::Load(subject) | Action::Write(subject) => subject,
        }
    }

    fn failed(self) -> String {
        match self {
            Action::Load(resource) => format!("Failed to load {resource}"),
            Action::Write(what) => format!("{what} failed"),
        }
    }
}

fn unavailable(action: Action<'_>, err: &reqwest::Error) -> GatewayError {
    GatewayError::RemoteUnavailable(format!("{}: {err}", action.failed()))
}

/// Non-2xx becomes `RemoteUnavailable`, using the server's `error` text when present.
async fn ensure_success(action: Action<'_>, resp: Response) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(GatewayError::RemoteUnavailable(status_message(action, status, &text)))
}

fn status_message(action: Action<'_>, status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => format!("{}: {}", action.failed(), err.error),
        Err(_) => format!("{} (HTTP {status})", action.failed()),
    }
}

async fn decode<T: DeserializeOwned>(resource: &str, resp: Response) -> Result<T, GatewayError> {
    resp.json().await.map_err(|e| GatewayError::InvalidResponse {
        resource: resource.to_owned(),
        detail:   e.to_string(),
    })
}
